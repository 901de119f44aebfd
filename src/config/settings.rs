//! Configuration for vaayu
//!
//! Defines the CLI surface (clap), the immutable `SessionConfig` an SSH
//! session is built from, and the per-transfer `TransferOptions`. All
//! three are explicit structs rather than ad-hoc dictionaries, so option
//! handling is checked at compile time end to end.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default cipher allow-list, strongest-first.
pub const DEFAULT_CIPHERS: &[&str] = &[
    "chacha20-poly1305@openssh.com",
    "aes256-gcm@openssh.com",
];

/// Immutable configuration for one SSH/SFTP session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub key_path: Option<PathBuf>,
    pub known_hosts: Option<PathBuf>,
    pub strict_host_key: bool,
    pub ciphers: Vec<String>,
}

impl SessionConfig {
    /// Parse a `user@host` or bare `host` target into a config with
    /// defaults; the caller fills in the rest from shared CLI flags.
    pub fn from_target(target: &str) -> Self {
        let (username, host) = match target.split_once('@') {
            Some((user, host)) => (Some(user.to_string()), host.to_string()),
            None => (None, target.to_string()),
        };
        Self {
            host,
            port: 22,
            username,
            password: None,
            key_path: None,
            known_hosts: None,
            strict_host_key: false,
            ciphers: DEFAULT_CIPHERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Compute the default transfer parallelism: `clamp(2, cpu*2, 32)`.
pub fn default_parallelism() -> usize {
    let cpu = num_cpus::get();
    (cpu * 2).clamp(2, 32)
}

/// Per-transfer behavior: concurrency, retries, verification, compression.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub parallel: usize,
    pub retries: u32,
    pub backoff: std::time::Duration,
    pub compress: bool,
    pub zstd_level: i32,
    pub verify: bool,
    pub preserve_mtime: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            parallel: default_parallelism(),
            retries: 5,
            backoff: std::time::Duration::from_millis(500),
            compress: false,
            zstd_level: 3,
            verify: true,
            preserve_mtime: true,
        }
    }
}

/// vaayu - secure, parallel, resumable SFTP transfer
#[derive(Parser, Debug, Clone)]
#[command(name = "vaayu")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Secure parallel resumable SSH/SFTP transfer")]
pub struct CliArgs {
    /// SSH username for authentication
    #[arg(short = 'u', long, global = true)]
    pub username: Option<String>,

    /// SSH port number
    #[arg(short = 'p', long, default_value = "22", global = true)]
    pub port: u16,

    /// SSH password for authentication
    #[arg(short = 'P', long, global = true)]
    pub password: Option<String>,

    /// Path to private key file (PEM/ed25519)
    #[arg(short = 'i', long, value_name = "PATH", global = true)]
    pub identity: Option<PathBuf>,

    /// Enable strict host key verification
    #[arg(short = 'k', long, global = true)]
    pub verify_host_key: bool,

    /// Number of concurrent transfers (default: auto)
    #[arg(short = 'j', long, global = true)]
    pub parallel: Option<usize>,

    /// Maximum retries per file
    #[arg(short = 'r', long, default_value = "5", global = true)]
    pub retries: u32,

    /// Initial backoff seconds for retries
    #[arg(short = 'b', long, default_value = "0.5", global = true)]
    pub backoff: f64,

    /// Skip SHA-256 hash verification
    #[arg(short = 'n', long, global = true)]
    pub no_verify: bool,

    /// Enable zstd compression (parsed, not used by the transfer paths)
    #[arg(short = 'c', long, global = true)]
    pub compress: bool,

    /// zstd compression level 1-22
    #[arg(short = 'z', long, default_value = "3", global = true)]
    pub zstd_level: i32,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl CliArgs {
    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            parallel: self.parallel.unwrap_or_else(default_parallelism),
            retries: self.retries,
            backoff: std::time::Duration::from_secs_f64(self.backoff.max(0.0)),
            compress: self.compress,
            zstd_level: self.zstd_level,
            verify: !self.no_verify,
            preserve_mtime: true,
        }
    }

    pub fn session_config(&self, target: &str) -> SessionConfig {
        let mut cfg = SessionConfig::from_target(target);
        cfg.port = self.port;
        if self.username.is_some() {
            cfg.username = self.username.clone();
        }
        cfg.password = self.password.clone();
        cfg.key_path = self.identity.clone();
        cfg.strict_host_key = self.verify_host_key;
        cfg
    }
}

/// Subcommands: transfer topology.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Transfer files from local to remote (local -> remote)
    Send {
        /// SSH target: user@host
        target: String,
        /// Destination directory on the remote host
        dest: String,
        /// Local files, directories, or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,
        /// Watch local paths for changes and auto-resync
        #[arg(short = 'W', long)]
        watch: bool,
    },
    /// Transfer files from remote to local (remote -> local)
    Get {
        /// SSH target: user@host
        target: String,
        /// Destination directory on the local machine
        dest: String,
        /// Remote files, directories, or wildcard patterns
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Transfer files between two remote hosts (remote -> remote)
    Relay {
        /// Source SSH target: user@host
        src: String,
        /// Destination SSH target: user@host
        dst: String,
        /// Source paths, paired index-wise with dst_paths
        #[arg(required = true, num_args = 1..)]
        src_paths: Vec<String>,
        /// Destination paths, paired index-wise with src_paths
        #[arg(required = true, last = true, num_args = 1..)]
        dst_paths: Vec<String>,
    },
}

/// SSH cipher choice exposed for documentation/testing; the session
/// always negotiates the pair in `DEFAULT_CIPHERS`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SshCipher {
    #[value(name = "chacha20-poly1305")]
    ChaCha20Poly1305,
    #[value(name = "aes256-gcm")]
    Aes256Gcm,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_at_host() {
        let cfg = SessionConfig::from_target("alice@host");
        assert_eq!(cfg.username.as_deref(), Some("alice"));
        assert_eq!(cfg.host, "host");
    }

    #[test]
    fn parses_bare_host() {
        let cfg = SessionConfig::from_target("host");
        assert_eq!(cfg.username, None);
        assert_eq!(cfg.host, "host");
    }

    #[test]
    fn default_parallelism_is_clamped() {
        let p = default_parallelism();
        assert!(p >= 2 && p <= 32);
    }
}

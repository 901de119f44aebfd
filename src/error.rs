//! Error types for vaayu
//!
//! Every error kind named by the engine's error taxonomy gets its own
//! variant so that callers can match on it instead of parsing strings.
//! The retry harness (`crate::retry`) treats every variant identically;
//! only the CLI's display layer classifies them.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for vaayu operations.
#[derive(Error, Debug)]
pub enum VaayuError {
    /// Bad CLI arguments or session configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// SSH authentication failed (password, key, or agent).
    #[error("authentication failed for '{user}@{host}': {message}")]
    Auth {
        user: String,
        host: String,
        message: String,
    },

    /// Strict host-key verification rejected the remote host key.
    #[error("host key verification failed for '{host}': {message}")]
    HostKey { host: String, message: String },

    /// Connect, handshake, or transport-level failure.
    #[error("network error connecting to '{host}': {message}")]
    Network { host: String, message: String },

    /// Source path missing locally or remotely.
    #[error("path not found: {0}")]
    FileNotFound(PathBuf),

    /// Local or remote permission denied.
    #[error("permission denied: {0}")]
    Permission(PathBuf),

    /// I/O error during a local file operation.
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mid-stream SFTP read/write/exec failure.
    #[error("transfer error for '{path}': {message}")]
    Transfer { path: PathBuf, message: String },

    /// End-to-end SHA-256 comparison failed before publish.
    #[error("hash mismatch for '{path}': expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// No usable hashing tool found on the remote host.
    #[error("no hashing tool available on remote host for '{path}'")]
    RemoteTool { path: PathBuf },

    /// Reserved for the compression helpers; not raised by the transfer paths.
    #[error("compression error: {0}")]
    Compression(String),

    /// User interrupted the operation (Ctrl-C).
    #[error("operation interrupted")]
    Interrupted,
}

impl VaayuError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound(path.into()),
            std::io::ErrorKind::PermissionDenied => Self::Permission(path.into()),
            _ => Self::Io {
                path: path.into(),
                source,
            },
        }
    }

    pub fn transfer(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Transfer {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn auth(user: impl Into<String>, host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            user: user.into(),
            host: host.into(),
            message: message.into(),
        }
    }

    pub fn network(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Path associated with this error, if any. Used only for display.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::FileNotFound(p)
            | Self::Permission(p)
            | Self::Io { path: p, .. }
            | Self::Transfer { path: p, .. }
            | Self::HashMismatch { path: p, .. }
            | Self::RemoteTool { path: p } => Some(p),
            _ => None,
        }
    }

    /// Best guess at whether a fresh attempt might succeed. Display-only:
    /// the retry harness stays blind to error kind and retries everything
    /// identically, win or lose.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Transfer { .. }
                | Self::Io { .. }
                | Self::HashMismatch { .. }
                | Self::RemoteTool { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, VaayuError>;

impl From<std::io::Error> for VaayuError {
    fn from(err: std::io::Error) -> Self {
        VaayuError::io(PathBuf::new(), err)
    }
}

impl From<ssh2::Error> for VaayuError {
    fn from(err: ssh2::Error) -> Self {
        VaayuError::Transfer {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}

/// Extension trait for adding path context to `std::io::Result`.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| VaayuError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_classifies_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = VaayuError::io("/tmp/x", io_err);
        assert!(matches!(err, VaayuError::FileNotFound(_)));
        assert_eq!(err.path().unwrap(), &PathBuf::from("/tmp/x"));
    }

    #[test]
    fn io_error_classifies_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = VaayuError::io("/tmp/y", io_err);
        assert!(matches!(err, VaayuError::Permission(_)));
    }
}

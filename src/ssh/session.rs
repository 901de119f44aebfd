//! `SshSession`: connection state machine + SFTP operations.

use crate::config::SessionConfig;
use crate::error::{Result, VaayuError};
use ssh2::{FileStat, OpenFlags, OpenType, RenameFlags, Session, Sftp};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// SFTP protocol code for "no such file" (SSH_FX_NO_SUCH_FILE).
const SFTP_NO_SUCH_FILE: u32 = 2;

/// Connection lifecycle. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Fresh,
    Connected,
    Closed,
}

struct Inner {
    session: Option<Session>,
    sftp: Option<Sftp>,
    state: SessionState,
}

/// An authenticated SSH connection plus its single SFTP channel.
///
/// `inner` is reference-counted so that every `RemoteFile` handed out by
/// `open_remote` can hold the same lock: libssh2's `Session`/`Sftp` (and
/// the `File`s opened against them) are not safe to drive from more than
/// one thread at a time, so every chunked read/write/seek on a handle
/// must serialize against every other operation on this session, not
/// just against the `open_mode` call that created the handle.
pub struct SshSession {
    config: SessionConfig,
    inner: Arc<Mutex<Inner>>,
}

/// Metadata for a remote path, as returned by `stat`/`listdir`.
#[derive(Debug, Clone)]
pub struct RemoteStat {
    pub size: u64,
    pub permissions: u32,
    pub mtime: u64,
}

impl RemoteStat {
    /// SFTP directory bit, per spec.md's walker contract.
    pub fn is_dir(&self) -> bool {
        self.permissions & 0o040000 != 0
    }

    fn from_filestat(st: &FileStat) -> Self {
        Self {
            size: st.size.unwrap_or(0),
            permissions: st.perm.unwrap_or(0),
            mtime: st.mtime.unwrap_or(0),
        }
    }
}

/// One entry returned by `listdir`.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub path: PathBuf,
    pub stat: RemoteStat,
}

impl SshSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(Inner {
                session: None,
                sftp: None,
                state: SessionState::Fresh,
            })),
        }
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state
    }

    /// Establish the connection. Not idempotent; use `ensure_connected`
    /// for the common case.
    pub fn connect(&self) -> Result<()> {
        let mut guard = self.inner.lock().unwrap();
        if guard.state == SessionState::Closed {
            return Err(VaayuError::network(&self.config.host, "session already closed"));
        }

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let tcp = TcpStream::connect(&addr)
            .map_err(|e| VaayuError::network(&self.config.host, e.to_string()))?;
        tcp.set_nodelay(true).ok();

        let mut session = Session::new()
            .map_err(|e| VaayuError::network(&self.config.host, e.to_string()))?;

        let cipher_list = self.config.ciphers.join(",");
        session
            .method_pref(ssh2::MethodType::CryptCs, &cipher_list)
            .map_err(|e| VaayuError::network(&self.config.host, e.to_string()))?;
        session
            .method_pref(ssh2::MethodType::CryptSc, &cipher_list)
            .map_err(|e| VaayuError::network(&self.config.host, e.to_string()))?;
        // Compression is handled at the transfer layer (if at all), not by SSH.
        session.set_compress(false);

        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| VaayuError::network(&self.config.host, e.to_string()))?;

        if self.config.strict_host_key {
            Self::verify_host_key(&session, &self.config)?;
        }

        Self::authenticate(&mut session, &self.config)?;

        let sftp = session
            .sftp()
            .map_err(|e| VaayuError::network(&self.config.host, e.to_string()))?;

        guard.session = Some(session);
        guard.sftp = Some(sftp);
        guard.state = SessionState::Connected;
        tracing::debug!(host = %self.config.host, "ssh session connected");
        Ok(())
    }

    /// No-op if already connected; establishes the connection otherwise.
    pub fn ensure_connected(&self) -> Result<()> {
        if self.state() == SessionState::Connected {
            return Ok(());
        }
        self.connect()
    }

    /// Release the SFTP channel and connection. Swallows close errors.
    pub fn close(&self) {
        let mut guard = self.inner.lock().unwrap();
        guard.sftp = None;
        if let Some(session) = guard.session.take() {
            let _ = session.disconnect(None, "bye", None);
        }
        guard.state = SessionState::Closed;
    }

    fn verify_host_key(session: &Session, cfg: &SessionConfig) -> Result<()> {
        let (key, _kind) = session
            .host_key()
            .ok_or_else(|| VaayuError::HostKey {
                host: cfg.host.clone(),
                message: "remote presented no host key".into(),
            })?;

        let known_hosts_path = cfg
            .known_hosts
            .clone()
            .or_else(|| dirs_home().map(|h| h.join(".ssh/known_hosts")))
            .ok_or_else(|| VaayuError::HostKey {
                host: cfg.host.clone(),
                message: "no known_hosts path available".into(),
            })?;

        let mut known_hosts = session.known_hosts().map_err(|e| VaayuError::HostKey {
            host: cfg.host.clone(),
            message: e.to_string(),
        })?;
        let _ = known_hosts.read_file(&known_hosts_path, ssh2::KnownHostFileKind::OpenSSH);

        match known_hosts.check(&cfg.host, key) {
            ssh2::CheckResult::Match => Ok(()),
            other => Err(VaayuError::HostKey {
                host: cfg.host.clone(),
                message: format!("host key check failed: {other:?}"),
            }),
        }
    }

    fn authenticate(session: &mut Session, cfg: &SessionConfig) -> Result<()> {
        let user = cfg.username.clone().unwrap_or_else(whoami_fallback);

        if let Some(key_path) = &cfg.key_path {
            session
                .userauth_pubkey_file(&user, None, key_path, None)
                .map_err(|e| VaayuError::auth(&user, &cfg.host, e.to_string()))?;
        } else if let Some(password) = &cfg.password {
            session
                .userauth_password(&user, password)
                .map_err(|e| VaayuError::auth(&user, &cfg.host, e.to_string()))?;
        } else {
            let mut agent = session
                .agent()
                .map_err(|e| VaayuError::auth(&user, &cfg.host, e.to_string()))?;
            agent
                .connect()
                .map_err(|e| VaayuError::auth(&user, &cfg.host, e.to_string()))?;
            agent
                .list_identities()
                .map_err(|e| VaayuError::auth(&user, &cfg.host, e.to_string()))?;

            let mut authenticated = false;
            for identity in agent.identities().unwrap_or_default() {
                if agent.userauth(&user, &identity).is_ok() {
                    authenticated = true;
                    break;
                }
            }
            if !authenticated {
                return Err(VaayuError::auth(&user, &cfg.host, "no usable identity in ssh-agent"));
            }
        }

        if !session.authenticated() {
            return Err(VaayuError::auth(&user, &cfg.host, "authentication failed"));
        }
        Ok(())
    }

    fn with_sftp<T>(&self, f: impl FnOnce(&Sftp) -> std::result::Result<T, ssh2::Error>) -> Result<T> {
        let guard = self.inner.lock().unwrap();
        let sftp = guard
            .sftp
            .as_ref()
            .ok_or_else(|| VaayuError::network(&self.config.host, "SFTP channel not connected"))?;
        f(sftp).map_err(|e| VaayuError::transfer(PathBuf::new(), e.to_string()))
    }

    pub fn stat(&self, path: &Path) -> Result<Option<RemoteStat>> {
        let guard = self.inner.lock().unwrap();
        let sftp = guard
            .sftp
            .as_ref()
            .ok_or_else(|| VaayuError::network(&self.config.host, "SFTP channel not connected"))?;
        match sftp.stat(path) {
            Ok(st) => Ok(Some(RemoteStat::from_filestat(&st))),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(VaayuError::transfer(path, e.to_string())),
        }
    }

    /// Create the full ancestor chain under POSIX semantics. Existing
    /// components are not an error.
    pub fn makedirs(&self, path: &Path) -> Result<()> {
        let normalized = path.to_string_lossy().replace('\\', "/");
        let trimmed = normalized.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(());
        }

        let mut current = String::new();
        for component in trimmed.split('/') {
            current.push('/');
            current.push_str(component);
            let _ = self.with_sftp(|sftp| sftp.mkdir(Path::new(&current), 0o755));
        }
        Ok(())
    }

    /// Open a remote file. `mode` is one of `"rb"`, `"wb"`, `"r+b"`.
    pub fn open_remote(&self, path: &Path, mode: &str) -> Result<RemoteFile> {
        let (flags, open_type) = match mode {
            "rb" => (OpenFlags::READ, OpenType::File),
            "wb" => (
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
                OpenType::File,
            ),
            "r+b" => (OpenFlags::READ | OpenFlags::WRITE, OpenType::File),
            other => return Err(VaayuError::Config(format!("unsupported open mode: {other}"))),
        };

        let guard = self.inner.lock().unwrap();
        let sftp = guard
            .sftp
            .as_ref()
            .ok_or_else(|| VaayuError::network(&self.config.host, "SFTP channel not connected"))?;
        let file = sftp
            .open_mode(path, flags, 0o644, open_type)
            .map_err(|e| VaayuError::transfer(path, e.to_string()))?;
        drop(guard);

        Ok(RemoteFile {
            inner: self.inner.clone(),
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn rename(&self, src: &Path, dst: &Path) -> Result<()> {
        self.with_sftp(|sftp| sftp.rename(src, dst, Some(RenameFlags::OVERWRITE)))
            .map_err(|e| VaayuError::transfer(dst, e.to_string()))
    }

    /// Best-effort removal; failures are swallowed (logged at debug).
    pub fn remove(&self, path: &Path) {
        let result = self.with_sftp(|sftp| sftp.unlink(path));
        if let Err(e) = result {
            tracing::debug!(path = %path.display(), error = %e, "best-effort remote remove failed");
        }
    }

    pub fn listdir(&self, path: &Path) -> Result<Vec<RemoteEntry>> {
        let entries = self
            .with_sftp(|sftp| sftp.readdir(path))
            .map_err(|e| VaayuError::transfer(path, e.to_string()))?;

        Ok(entries
            .into_iter()
            .map(|(path, st)| RemoteEntry {
                path,
                stat: RemoteStat::from_filestat(&st),
            })
            .collect())
    }

    /// Run a shell command over a fresh exec channel, returning
    /// `(exit_status, stdout)`.
    pub fn exec(&self, command: &str) -> Result<(i32, String)> {
        let guard = self.inner.lock().unwrap();
        let session = guard
            .session
            .as_ref()
            .ok_or_else(|| VaayuError::network(&self.config.host, "session not connected"))?;

        let mut channel = session
            .channel_session()
            .map_err(|e| VaayuError::network(&self.config.host, e.to_string()))?;
        channel
            .exec(command)
            .map_err(|e| VaayuError::network(&self.config.host, e.to_string()))?;

        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .map_err(|e| VaayuError::transfer(PathBuf::new(), e.to_string()))?;
        channel.wait_close().ok();
        let status = channel.exit_status().unwrap_or(-1);
        Ok((status, stdout))
    }
}

fn is_not_found(err: &ssh2::Error) -> bool {
    matches!(err.code(), ssh2::ErrorCode::SFTP(code) if code as u32 == SFTP_NO_SUCH_FILE)
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn whoami_fallback() -> String {
    std::env::var("USER").unwrap_or_else(|_| "root".to_string())
}

/// A handle to an open remote file. libssh2 multiplexes every channel
/// (including SFTP) over one transport, so a `File`'s reads/writes are
/// not safe to interleave with other operations on the same session from
/// another thread. Every operation here locks the owning `SshSession`'s
/// mutex for the duration of the single syscall it makes, so concurrent
/// units sharing one `Session` serialize at the channel exactly as they
/// do for `stat`/`rename`/`listdir`, rather than only while the handle
/// was being opened.
pub struct RemoteFile {
    inner: Arc<Mutex<Inner>>,
    file: ssh2::File,
    path: PathBuf,
}

impl RemoteFile {
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        let _guard = self.inner.lock().unwrap();
        self.file.seek(offset);
        Ok(())
    }

    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let _guard = self.inner.lock().unwrap();
        self.file
            .read(buf)
            .map_err(|e| VaayuError::transfer(self.path.clone(), e.to_string()))
    }

    pub fn write_all_chunk(&mut self, buf: &[u8]) -> Result<()> {
        let _guard = self.inner.lock().unwrap();
        self.file
            .write_all(buf)
            .map_err(|e| VaayuError::transfer(self.path.clone(), e.to_string()))
    }
}

/// Ephemeral sleep wrapper so callers don't need to import `std::thread`.
pub fn sleep(d: Duration) {
    std::thread::sleep(d);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_not_connected() {
        let cfg = SessionConfig::from_target("example.com");
        let session = SshSession::new(cfg);
        assert_eq!(session.state(), SessionState::Fresh);
    }

    #[test]
    fn close_transitions_to_closed_terminal_state() {
        let cfg = SessionConfig::from_target("example.com");
        let session = SshSession::new(cfg);
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.connect().is_err());
    }
}

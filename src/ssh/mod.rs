//! SSH/SFTP session (C3)
//!
//! Thin façade over `ssh2`. A `SshSession` owns at most one TCP
//! connection and one SFTP channel and is shared (`Arc<SshSession>`)
//! across the worker threads driving one target's transfer units; every
//! method locks the session internally for the duration of a single
//! remote call so concurrent units interleave at the syscall boundary
//! rather than holding the channel for an entire file.

mod session;

pub use session::{RemoteEntry, RemoteFile, RemoteStat, SessionState, SshSession};

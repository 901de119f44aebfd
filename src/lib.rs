//! # vaayu
//!
//! Parallel, resumable, integrity-verified SFTP transfer engine.
//!
//! Three transfer topologies share one per-file state machine
//! (`Prepare -> WriteOrResume -> Verify? -> Publish -> Done`):
//!
//! - `send`   — local files to a remote host
//! - `get`    — remote files to the local machine
//! - `relay`  — files between two remote hosts, streamed through this process
//!
//! Every publish is an atomic rename from a `.part` sibling, so a
//! transfer interrupted mid-stream resumes from the `.part`'s current
//! length on the next run.
//!
//! ```no_run
//! use vaayu::config::{SessionConfig, TransferOptions};
//! use vaayu::path::{expand_local, walk_local_for_upload};
//! use vaayu::ssh::SshSession;
//! use vaayu::transfer::TransferEngine;
//!
//! let session = SshSession::new(SessionConfig::from_target("alice@example.com"));
//! let opts = TransferOptions::default();
//! let inputs = expand_local(&["/data/*.csv".to_string()]).unwrap();
//! let pairs = walk_local_for_upload(&inputs, std::path::Path::new("/remote/incoming")).unwrap();
//!
//! let engine = TransferEngine::new();
//! let stats = engine.send(&session, &opts, pairs).unwrap();
//! println!("sent {} files ({} bytes)", stats.files, stats.bytes);
//! ```

#![warn(missing_docs)]

pub mod cancel;
pub mod cloud;
pub mod config;
pub mod error;
pub mod hash;
pub mod path;
pub mod progress;
pub mod retry;
pub mod ssh;
pub mod stats;
pub mod transfer;
pub mod watch;

#[cfg(feature = "compression")]
pub mod compress;

pub use error::{Result, VaayuError};
pub use stats::Stats;
pub use transfer::TransferEngine;

/// Crate version, matching `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::config::{CliArgs, Commands, SessionConfig, TransferOptions};
    pub use crate::error::{Result, VaayuError};
    pub use crate::path::{expand_local, expand_remote, walk_local_for_upload, walk_remote_for_download, TransferPair};
    pub use crate::progress::ProgressReporter;
    pub use crate::ssh::SshSession;
    pub use crate::stats::Stats;
    pub use crate::transfer::TransferEngine;
}

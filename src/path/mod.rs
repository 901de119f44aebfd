//! Path expansion and tree walking (C4)
//!
//! Turns the user-supplied path arguments and a destination root into the
//! flat list of `TransferPair`s the transfer engine iterates over.

mod expand;
mod walk;

pub use expand::{expand_local, expand_remote};
pub use walk::{walk_local_for_upload, walk_remote_for_download};

use std::path::PathBuf;

/// One file's source and destination, both absolute after expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPair {
    pub source: PathBuf,
    pub destination: PathBuf,
}

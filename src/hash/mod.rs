//! Integrity verification (C1 local hasher, C2 remote hasher)
//!
//! Both halves produce lowercase hex SHA-256 digests so that a local
//! and a remote hash can be compared with a plain string equality.

mod local;
mod remote;

pub use local::sha256_file;
pub use remote::remote_sha256;

/// Chunk size used by every streaming hasher and copy loop (1 MiB).
pub const CHUNK_SIZE: usize = 1024 * 1024;

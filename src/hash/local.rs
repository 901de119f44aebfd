//! Local file hashing (C1)

use crate::error::{IoResultExt, Result};
use crate::hash::CHUNK_SIZE;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Stream `path` through SHA-256 in 1 MiB chunks and return the lowercase
/// hex digest. The file descriptor is released on every exit path by
/// virtue of `File`'s `Drop` impl; large files are never fully buffered.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_path(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buffer).with_path(path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn hashes_known_content() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        let digest = sha256_file(f.path()).unwrap();
        assert_eq!(
            digest,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde"
        );
    }

    #[test]
    fn hashes_multi_chunk_file() {
        let mut f = NamedTempFile::new().unwrap();
        let data = vec![0x42u8; CHUNK_SIZE * 3 + 17];
        f.write_all(&data).unwrap();
        let digest = sha256_file(f.path()).unwrap();
        assert_eq!(digest.len(), 64);

        // Recomputing gives the same digest (determinism / no dangling fd).
        let digest2 = sha256_file(f.path()).unwrap();
        assert_eq!(digest, digest2);
    }
}

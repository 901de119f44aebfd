//! zstd compression helpers
//!
//! Unused by the transfer paths; backs the parsed-but-inert
//! `-c/--compress` and `-z/--zstd-level` flags.

use crate::error::{Result, VaayuError};

pub fn compress_bytes(data: &[u8], level: i32) -> Result<Vec<u8>> {
    zstd::stream::encode_all(data, level).map_err(|e| VaayuError::Compression(e.to_string()))
}

pub fn decompress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    zstd::stream::decode_all(data).map_err(|e| VaayuError::Compression(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_zstd() {
        let original = b"some data that compresses reasonably well well well well".to_vec();
        let compressed = compress_bytes(&original, 3).unwrap();
        let restored = decompress_bytes(&compressed).unwrap();
        assert_eq!(restored, original);
    }
}

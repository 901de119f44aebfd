//! Cloud-URI scheme detection
//!
//! Not a transfer backend. Target parsing calls `is_cloud_uri` to turn
//! an `s3://...`-style argument into a clear `Config` error instead of
//! silently misinterpreting it as an SSH host.

const CLOUD_SCHEMES: &[&str] = &["s3", "gcs", "ftp"];

/// Return the lowercase scheme of a `scheme://...` URI, or empty if none.
pub fn detect_scheme(uri: &str) -> String {
    match uri.split_once("://") {
        Some((scheme, _rest)) => scheme.to_lowercase(),
        None => String::new(),
    }
}

/// Whether `uri` names one of the recognized (but unimplemented) cloud schemes.
pub fn is_cloud_uri(uri: &str) -> bool {
    let scheme = detect_scheme(uri);
    !scheme.is_empty() && CLOUD_SCHEMES.contains(&scheme.as_str())
}

/// Message for the `Config` error raised when a cloud URI is rejected.
pub fn not_implemented_for(scheme: &str) -> String {
    format!("cloud scheme not implemented: {scheme}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_schemes() {
        assert!(is_cloud_uri("s3://bucket/key"));
        assert!(is_cloud_uri("gcs://bucket/key"));
        assert!(is_cloud_uri("ftp://host/path"));
    }

    #[test]
    fn plain_ssh_targets_are_not_cloud() {
        assert!(!is_cloud_uri("alice@example.com"));
        assert!(!is_cloud_uri("example.com"));
    }

    #[test]
    fn scheme_detection_is_case_insensitive() {
        assert_eq!(detect_scheme("S3://bucket"), "s3");
    }
}

//! Remote file hashing (C2)
//!
//! No single hashing tool is guaranteed to exist on a remote host, so
//! this tries a chain of fallbacks in order of how fast each one is,
//! stopping at the first that produces output.

use crate::error::{Result, VaayuError};
use crate::ssh::SshSession;
use std::path::Path;

/// Escape a path for embedding in a single-quoted POSIX shell argument.
fn shell_escape(path: &str) -> String {
    path.replace('\'', r"'\''")
}

fn python_digest_snippet(path: &str) -> String {
    format!(
        "import hashlib;f=open(r'''{path}''','rb');h=hashlib.sha256();b=f.read(1048576);\
         exec(\"while b:\\n h.update(b)\\n b=f.read(1048576)\");print(h.hexdigest())",
    )
}

fn try_command(session: &SshSession, command: &str) -> Option<String> {
    match session.exec(command) {
        Ok((0, stdout)) => {
            let out = stdout.trim();
            if out.is_empty() {
                None
            } else {
                Some(out.to_string())
            }
        }
        _ => None,
    }
}

/// Compute the SHA-256 digest of a remote file, trying `sha256sum`,
/// `shasum -a 256`, `python3 -c`, then `python -c` in that order.
pub fn remote_sha256(session: &SshSession, path: &Path) -> Result<String> {
    let path_str = path.to_string_lossy();
    let escaped = shell_escape(&path_str);

    if let Some(out) = try_command(session, &format!("sha256sum -- '{escaped}'")) {
        if let Some(digest) = out.split_whitespace().next() {
            return Ok(digest.to_string());
        }
    }

    if let Some(out) = try_command(session, &format!("shasum -a 256 -- '{escaped}'")) {
        if let Some(digest) = out.split_whitespace().next() {
            return Ok(digest.to_string());
        }
    }

    let snippet = python_digest_snippet(&path_str);
    let escaped_snippet = shell_escape(&snippet);

    if let Some(digest) = try_command(session, &format!("python3 -c '{escaped_snippet}'")) {
        return Ok(digest);
    }

    if let Some(digest) = try_command(session, &format!("python -c '{escaped_snippet}'")) {
        return Ok(digest);
    }

    Err(VaayuError::RemoteTool {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_single_quotes() {
        assert_eq!(shell_escape("it's/a/path"), r"it'\''s/a/path");
        assert_eq!(shell_escape("/plain/path"), "/plain/path");
    }

    #[test]
    fn python_snippet_embeds_raw_path() {
        let snippet = python_digest_snippet("/tmp/some file.bin");
        assert!(snippet.contains("/tmp/some file.bin"));
        assert!(snippet.contains("hashlib"));
    }
}

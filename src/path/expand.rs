//! Local glob/tilde expansion and remote wildcard expansion.

use crate::error::{Result, VaayuError};
use crate::ssh::SshSession;
use std::path::{Path, PathBuf};

const GLOB_META: &[char] = &['*', '?', '['];

fn has_glob_meta(s: &str) -> bool {
    s.chars().any(|c| GLOB_META.contains(&c))
}

fn expand_tilde(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            if let Some(home) = std::env::var_os("HOME") {
                let mut path = PathBuf::from(home);
                if !rest.is_empty() {
                    path.push(rest.trim_start_matches('/'));
                }
                return path;
            }
        }
    }
    PathBuf::from(input)
}

/// Expand a user-supplied list of local path strings: `~` expansion,
/// then recursive glob expansion for anything containing `* ? [`.
/// Input-item order is preserved; matches within a glob are sorted
/// lexicographically.
pub fn expand_local(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();

    for input in inputs {
        let expanded = expand_tilde(input);
        let as_str = expanded.to_string_lossy().to_string();

        if has_glob_meta(&as_str) {
            let mut matches: Vec<PathBuf> = glob::glob(&as_str)
                .map_err(|e| VaayuError::Config(format!("invalid glob pattern '{as_str}': {e}")))?
                .filter_map(|entry| entry.ok())
                .collect();
            matches.sort();
            out.extend(matches);
        } else {
            out.push(expanded);
        }
    }

    Ok(out)
}

/// Expand a single remote path. If it contains glob metacharacters, list
/// its parent directory and keep entries whose basename matches the tail
/// pattern (POSIX-fnmatch-equivalent via `glob::Pattern`). Non-glob paths
/// pass through unchanged.
pub fn expand_remote(session: &SshSession, input: &str) -> Result<Vec<PathBuf>> {
    if !has_glob_meta(input) {
        return Ok(vec![PathBuf::from(input)]);
    }

    let path = Path::new(input);
    let parent = path.parent().unwrap_or_else(|| Path::new("/"));
    let pattern_str = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| VaayuError::Config(format!("invalid remote glob pattern: {input}")))?;

    let pattern = glob::Pattern::new(pattern_str)
        .map_err(|e| VaayuError::Config(format!("invalid remote glob pattern '{pattern_str}': {e}")))?;

    let entries = session.listdir(parent)?;
    let mut matches: Vec<PathBuf> = entries
        .into_iter()
        .filter(|entry| {
            entry
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|name| pattern.matches(name))
                .unwrap_or(false)
        })
        .map(|entry| entry.path)
        .collect();
    matches.sort();
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_plain_paths() {
        let inputs = vec!["/tmp/a.txt".to_string(), "/tmp/b.txt".to_string()];
        let expanded = expand_local(&inputs).unwrap();
        assert_eq!(expanded, vec![PathBuf::from("/tmp/a.txt"), PathBuf::from("/tmp/b.txt")]);
    }

    #[test]
    fn expands_glob_against_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("b.txt")).unwrap();
        std::fs::File::create(dir.path().join("a.txt")).unwrap();

        let pattern = dir.path().join("*.txt").to_string_lossy().to_string();
        let expanded = expand_local(&[pattern]).unwrap();

        assert_eq!(expanded.len(), 2);
        assert!(expanded[0].to_string_lossy().ends_with("a.txt"));
        assert!(expanded[1].to_string_lossy().ends_with("b.txt"));
    }

    #[test]
    fn detects_glob_metacharacters() {
        assert!(has_glob_meta("foo*.txt"));
        assert!(has_glob_meta("foo?.txt"));
        assert!(has_glob_meta("foo[0-9].txt"));
        assert!(!has_glob_meta("plain/path.txt"));
    }
}

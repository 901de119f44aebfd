//! Directory walking: local trees for upload, remote trees for download.

use crate::error::Result;
use crate::path::TransferPair;
use crate::ssh::SshSession;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn remote_join(dir: &Path, leaf: &str) -> PathBuf {
    let base = dir.to_string_lossy();
    let trimmed = base.trim_end_matches('/');
    if trimmed.is_empty() {
        PathBuf::from(format!("/{leaf}"))
    } else {
        PathBuf::from(format!("{trimmed}/{leaf}"))
    }
}

/// Build `TransferPair`s for an upload: for each already-expanded local
/// path, a directory is walked recursively (destination mirrors the
/// input's basename plus the relative path under it); a plain file maps
/// to `remote_dir/basename`.
pub fn walk_local_for_upload(inputs: &[PathBuf], remote_dir: &Path) -> Result<Vec<TransferPair>> {
    let mut pairs = Vec::new();

    for input in inputs {
        let metadata = std::fs::symlink_metadata(input)
            .map_err(|e| crate::error::VaayuError::io(input.clone(), e))?;
        let basename = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| input.to_string_lossy().to_string());

        if metadata.is_dir() {
            for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry
                    .path()
                    .strip_prefix(input)
                    .unwrap_or(entry.path())
                    .to_string_lossy()
                    .replace('\\', "/");
                let destination = remote_join(&remote_join(remote_dir, &basename), &relative);
                pairs.push(TransferPair {
                    source: entry.path().to_path_buf(),
                    destination,
                });
            }
        } else {
            pairs.push(TransferPair {
                source: input.clone(),
                destination: remote_join(remote_dir, &basename),
            });
        }
    }

    Ok(pairs)
}

fn recurse_remote(
    session: &SshSession,
    root: &Path,
    current: &Path,
    local_dir: &Path,
    pairs: &mut Vec<TransferPair>,
) -> Result<()> {
    for entry in session.listdir(current)? {
        if entry.stat.is_dir() {
            let name = entry
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if name == "." || name == ".." {
                continue;
            }
            recurse_remote(session, root, &entry.path, local_dir, pairs)?;
        } else {
            let relative = entry
                .path
                .strip_prefix(root)
                .unwrap_or(&entry.path)
                .to_string_lossy()
                .trim_start_matches('/')
                .to_string();
            let destination = local_dir.join(relative);
            pairs.push(TransferPair {
                source: entry.path,
                destination,
            });
        }
    }
    Ok(())
}

/// Build `TransferPair`s for a download: each already-expanded remote
/// path is stat'd; directories recurse via `listdir` with destinations
/// relative to the walked root (no extra basename component), flat
/// files map directly to `local_dir/basename`.
pub fn walk_remote_for_download(
    session: &SshSession,
    inputs: &[PathBuf],
    local_dir: &Path,
) -> Result<Vec<TransferPair>> {
    let mut pairs = Vec::new();

    for input in inputs {
        let stat = session
            .stat(input)?
            .ok_or_else(|| crate::error::VaayuError::FileNotFound(input.clone()))?;

        if stat.is_dir() {
            recurse_remote(session, input, input, local_dir, &mut pairs)?;
        } else {
            let basename = input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| input.to_string_lossy().to_string());
            pairs.push(TransferPair {
                source: input.clone(),
                destination: local_dir.join(&basename),
            });
        }
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_plain_file_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"hi").unwrap();

        let pairs = walk_local_for_upload(&[file.clone()], Path::new("/remote/dest")).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].source, file);
        assert_eq!(pairs[0].destination, PathBuf::from("/remote/dest/a.txt"));
    }

    #[test]
    fn walks_directory_tree_preserving_relative_layout() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("data");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("x.bin"), b"x").unwrap();
        std::fs::create_dir(sub.join("nested")).unwrap();
        std::fs::write(sub.join("nested/y.bin"), b"y").unwrap();

        let pairs = walk_local_for_upload(&[sub], Path::new("/remote")).unwrap();
        let destinations: Vec<String> = pairs
            .iter()
            .map(|p| p.destination.to_string_lossy().to_string())
            .collect();

        assert!(destinations.contains(&"/remote/data/x.bin".to_string()));
        assert!(destinations.contains(&"/remote/data/nested/y.bin".to_string()));
    }
}

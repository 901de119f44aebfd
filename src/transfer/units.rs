//! Per-file state machines: `Prepare -> WriteOrResume -> Verify? -> Publish -> Done`.

use crate::cancel::CancelToken;
use crate::config::TransferOptions;
use crate::error::{IoResultExt, Result, VaayuError};
use crate::hash::{remote_sha256, sha256_file, CHUNK_SIZE};
use crate::path::TransferPair;
use crate::progress::ProgressReporter;
use crate::ssh::SshSession;
use crate::stats::Stats;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

fn label_for(pair: &TransferPair) -> String {
    pair.destination.to_string_lossy().to_string()
}

pub fn upload_unit(
    session: &SshSession,
    opts: &TransferOptions,
    pair: &TransferPair,
    progress: Option<&ProgressReporter>,
    cancel: &CancelToken,
) -> Result<Stats> {
    cancel.check()?;

    let tmp = part_path(&pair.destination);
    let parent = pair.destination.parent().unwrap_or_else(|| Path::new("/"));
    session.makedirs(parent)?;

    let offset = session.stat(&tmp)?.map(|s| s.size).unwrap_or(0);
    let total = std::fs::metadata(&pair.source)
        .with_path(&pair.source)?
        .len();

    let bar = progress.map(|p| p.register_task(&label_for(pair), total));
    if let Some(bar) = &bar {
        bar.inc(offset);
    }

    let mode = if offset > 0 { "r+b" } else { "wb" };
    let mut remote = session.open_remote(&tmp, mode)?;
    if offset > 0 {
        remote.seek(offset)?;
    }

    let mut local = File::open(&pair.source).with_path(&pair.source)?;
    if offset > 0 {
        local
            .seek(SeekFrom::Start(offset))
            .with_path(&pair.source)?;
    }

    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        cancel.check()?;
        let n = local.read(&mut buffer).with_path(&pair.source)?;
        if n == 0 {
            break;
        }
        remote.write_all_chunk(&buffer[..n])?;
        if let Some(bar) = &bar {
            bar.inc(n as u64);
        }
        if let Some(p) = progress {
            p.increment_bytes(n as u64);
        }
    }

    if opts.verify {
        cancel.check()?;
        let local_hash = sha256_file(&pair.source)?;
        let remote_hash = remote_sha256(session, &tmp)?;
        if local_hash != remote_hash {
            return Err(VaayuError::HashMismatch {
                path: pair.destination.clone(),
                expected: local_hash,
                actual: remote_hash,
            });
        }
    }

    session.rename(&tmp, &pair.destination)?;
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    if let Some(p) = progress {
        p.increment_files(1);
    }

    Ok(Stats {
        files: 1,
        bytes: total,
        duration_s: 0,
        retries: 0,
    })
}

pub fn download_unit(
    session: &SshSession,
    opts: &TransferOptions,
    pair: &TransferPair,
    progress: Option<&ProgressReporter>,
    cancel: &CancelToken,
) -> Result<Stats> {
    cancel.check()?;

    let tmp = part_path(&pair.destination);
    if let Some(parent) = pair.destination.parent() {
        std::fs::create_dir_all(parent).with_path(parent)?;
    }

    let offset = std::fs::metadata(&tmp).map(|m| m.len()).unwrap_or(0);
    let total = session
        .stat(&pair.source)?
        .map(|s| s.size)
        .unwrap_or(0);

    let bar = progress.map(|p| p.register_task(&label_for(pair), total));
    if let Some(bar) = &bar {
        bar.inc(offset);
    }

    let mut remote = session.open_remote(&pair.source, "rb")?;
    if offset > 0 {
        remote.seek(offset)?;
    }

    let mut local = OpenOptions::new()
        .create(true)
        .write(true)
        .append(offset > 0)
        .truncate(offset == 0)
        .open(&tmp)
        .with_path(&tmp)?;

    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        cancel.check()?;
        let n = remote.read_chunk(&mut buffer)?;
        if n == 0 {
            break;
        }
        local.write_all(&buffer[..n]).with_path(&tmp)?;
        if let Some(bar) = &bar {
            bar.inc(n as u64);
        }
        if let Some(p) = progress {
            p.increment_bytes(n as u64);
        }
    }
    drop(local);

    if opts.verify {
        cancel.check()?;
        let remote_hash = remote_sha256(session, &pair.source)?;
        let local_hash = sha256_file(&tmp)?;
        if remote_hash != local_hash {
            return Err(VaayuError::HashMismatch {
                path: pair.destination.clone(),
                expected: remote_hash,
                actual: local_hash,
            });
        }
    }

    std::fs::rename(&tmp, &pair.destination).with_path(&pair.destination)?;
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    if let Some(p) = progress {
        p.increment_files(1);
    }

    let bytes = std::fs::metadata(&pair.destination)
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(Stats {
        files: 1,
        bytes,
        duration_s: 0,
        retries: 0,
    })
}

pub fn relay_unit(
    src_session: &SshSession,
    dst_session: &SshSession,
    opts: &TransferOptions,
    pair: &TransferPair,
    progress: Option<&ProgressReporter>,
    cancel: &CancelToken,
) -> Result<Stats> {
    cancel.check()?;

    let tmp = part_path(&pair.destination);
    let parent = pair.destination.parent().unwrap_or_else(|| Path::new("/"));
    dst_session.makedirs(parent)?;

    let offset = dst_session.stat(&tmp)?.map(|s| s.size).unwrap_or(0);
    let total = src_session
        .stat(&pair.source)?
        .map(|s| s.size)
        .unwrap_or(0);

    let bar = progress.map(|p| p.register_task(&label_for(pair), total));
    if let Some(bar) = &bar {
        bar.inc(offset);
    }

    let mut src = src_session.open_remote(&pair.source, "rb")?;
    if offset > 0 {
        src.seek(offset)?;
    }

    let mode = if offset > 0 { "r+b" } else { "wb" };
    let mut dst = dst_session.open_remote(&tmp, mode)?;
    if offset > 0 {
        dst.seek(offset)?;
    }

    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        cancel.check()?;
        let n = src.read_chunk(&mut buffer)?;
        if n == 0 {
            break;
        }
        dst.write_all_chunk(&buffer[..n])?;
        if let Some(bar) = &bar {
            bar.inc(n as u64);
        }
        if let Some(p) = progress {
            p.increment_bytes(n as u64);
        }
    }

    if opts.verify {
        cancel.check()?;
        let src_hash = remote_sha256(src_session, &pair.source)?;
        let dst_hash = remote_sha256(dst_session, &tmp)?;
        if src_hash != dst_hash {
            return Err(VaayuError::HashMismatch {
                path: pair.destination.clone(),
                expected: src_hash,
                actual: dst_hash,
            });
        }
    }

    dst_session.rename(&tmp, &pair.destination)?;
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    if let Some(p) = progress {
        p.increment_files(1);
    }

    let bytes = dst_session
        .stat(&pair.destination)?
        .map(|s| s.size)
        .unwrap_or(0);

    Ok(Stats {
        files: 1,
        bytes,
        duration_s: 0,
        retries: 0,
    })
}

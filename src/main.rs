//! vaayu CLI - secure, parallel, resumable SFTP transfer

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vaayu::cancel::CancelToken;
use vaayu::cloud::{is_cloud_uri, not_implemented_for};
use vaayu::config::{CliArgs, Commands};
use vaayu::error::{Result, VaayuError};
use vaayu::path::{expand_local, expand_remote, walk_local_for_upload, walk_remote_for_download};
use vaayu::progress::ProgressReporter;
use vaayu::ssh::SshSession;
use vaayu::stats::Stats;
use vaayu::transfer::TransferEngine;
use vaayu::watch::watch_and_send;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let progress = if args.verbose > 0 {
        Some(Arc::new(ProgressReporter::new()))
    } else {
        None
    };

    match run(&args, progress.clone()) {
        Ok(()) => {
            if let Some(p) = &progress {
                p.finish_success("transfer complete");
            }
        }
        Err(VaayuError::Interrupted) => {
            if let Some(p) = &progress {
                p.finish_error("interrupted");
            }
            eprintln!("interrupted");
            std::process::exit(130);
        }
        Err(err) => {
            if let Some(p) = &progress {
                p.finish_error(&err.to_string());
            }
            print_classified_error(&err);
            std::process::exit(1);
        }
    }
}

fn run(args: &CliArgs, progress: Option<Arc<ProgressReporter>>) -> Result<()> {
    let engine = match &progress {
        Some(p) => TransferEngine::with_progress(p.clone()),
        None => TransferEngine::new(),
    };

    let cancel = engine.cancel_token();
    install_ctrlc_handler(cancel.clone());

    let opts = args.transfer_options();

    match &args.command {
        Commands::Send {
            target,
            dest,
            paths,
            watch,
        } => {
            reject_cloud_uri(target)?;
            let session = connect(args, target)?;
            let stats = run_send(&engine, &session, &opts, paths, dest)?;
            print_stats("send", &stats);

            if *watch {
                run_watch(&engine, &session, &opts, paths, dest, &cancel)?;
            }
            Ok(())
        }
        Commands::Get { target, dest, paths } => {
            reject_cloud_uri(target)?;
            let session = connect(args, target)?;
            let stats = run_get(&engine, &session, &opts, paths, dest)?;
            print_stats("get", &stats);
            Ok(())
        }
        Commands::Relay {
            src,
            dst,
            src_paths,
            dst_paths,
        } => {
            reject_cloud_uri(src)?;
            reject_cloud_uri(dst)?;
            let src_session = connect(args, src)?;
            let dst_session = connect(args, dst)?;
            let stats = run_relay(&engine, &src_session, &dst_session, &opts, src_paths, dst_paths)?;
            print_stats("relay", &stats);
            Ok(())
        }
    }
}

fn reject_cloud_uri(target: &str) -> Result<()> {
    if is_cloud_uri(target) {
        let scheme = vaayu::cloud::detect_scheme(target);
        return Err(VaayuError::Config(not_implemented_for(&scheme)));
    }
    Ok(())
}

fn connect(args: &CliArgs, target: &str) -> Result<SshSession> {
    let session = SshSession::new(args.session_config(target));
    session.connect()?;
    Ok(session)
}

fn run_send(
    engine: &TransferEngine,
    session: &SshSession,
    opts: &vaayu::config::TransferOptions,
    paths: &[String],
    dest: &str,
) -> Result<Stats> {
    let expanded = expand_local(paths)?;
    let pairs = walk_local_for_upload(&expanded, Path::new(dest))?;
    engine.send(session, opts, pairs)
}

fn run_get(
    engine: &TransferEngine,
    session: &SshSession,
    opts: &vaayu::config::TransferOptions,
    paths: &[String],
    dest: &str,
) -> Result<Stats> {
    let mut expanded = Vec::new();
    for raw in paths {
        expanded.extend(expand_remote(session, raw)?);
    }
    let pairs = walk_remote_for_download(session, &expanded, Path::new(dest))?;
    engine.get(session, opts, pairs)
}

fn run_relay(
    engine: &TransferEngine,
    src_session: &SshSession,
    dst_session: &SshSession,
    opts: &vaayu::config::TransferOptions,
    src_paths: &[String],
    dst_paths: &[String],
) -> Result<Stats> {
    if src_paths.len() != dst_paths.len() {
        return Err(VaayuError::Config(format!(
            "relay requires matching src/dst path counts, got {} and {}",
            src_paths.len(),
            dst_paths.len()
        )));
    }

    let mut pairs = Vec::new();
    for (src_raw, dst_raw) in src_paths.iter().zip(dst_paths.iter()) {
        let sources = expand_remote(src_session, src_raw)?;
        for source in sources {
            pairs.push(vaayu::path::TransferPair {
                source,
                destination: PathBuf::from(dst_raw),
            });
        }
    }

    engine.relay(src_session, dst_session, opts, pairs)
}

fn run_watch(
    engine: &TransferEngine,
    session: &SshSession,
    opts: &vaayu::config::TransferOptions,
    paths: &[String],
    dest: &str,
    cancel: &CancelToken,
) -> Result<()> {
    let watch_roots = expand_local(paths)?;
    let debounce = std::time::Duration::from_millis(500);

    watch_and_send(&watch_roots, debounce, cancel, |changed| {
        let changed_strings: Vec<String> = changed
            .iter()
            .filter(|p| p.exists())
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        if changed_strings.is_empty() {
            return Ok(());
        }
        let stats = run_send(engine, session, opts, &changed_strings, dest)?;
        print_stats("watch-sync", &stats);
        Ok(())
    })
}

fn install_ctrlc_handler(cancel: CancelToken) {
    let _ = ctrlc::set_handler(move || {
        cancel.cancel();
    });
}

fn print_stats(op: &str, stats: &Stats) {
    let elapsed = humantime::format_duration(std::time::Duration::from_secs(stats.duration_s));
    println!(
        "{op}: {} files, {} ({} retries, {elapsed})",
        stats.files,
        humansize::format_size(stats.bytes, humansize::BINARY),
        stats.retries,
    );
}

/// Classify an error for display, mirroring the original CLI's
/// connection/auth/path/transfer buckets without reparsing error kinds
/// (the thiserror variant already tells us which bucket).
fn print_classified_error(err: &VaayuError) {
    let (heading, hints): (&str, &[&str]) = match err {
        VaayuError::Network { .. } => (
            "Connection error",
            &[
                "Check your network connection",
                "Verify the server address and port",
                "Test with: ssh user@host",
            ],
        ),
        VaayuError::Auth { .. } | VaayuError::HostKey { .. } => (
            "Authentication error",
            &[
                "Check username, password, or key path",
                "Test manually: ssh user@host",
                "Use -k to enable strict host key verification",
            ],
        ),
        VaayuError::FileNotFound(_) | VaayuError::Permission(_) => (
            "Path error",
            &[
                "Check that source paths exist",
                "Ensure destination directories are writable",
            ],
        ),
        VaayuError::Transfer { .. } | VaayuError::HashMismatch { .. } | VaayuError::RemoteTool { .. } => (
            "Transfer error",
            &[
                "Re-run the command; transfers resume from the .part file",
                "Add -n to skip hash verification",
            ],
        ),
        VaayuError::Config(_) | VaayuError::Compression(_) | VaayuError::Io { .. } => ("Error", &[]),
        VaayuError::Interrupted => ("Interrupted", &[]),
    };

    eprintln!("{}: {err}", console::style(heading).bold().red());
    for hint in hints {
        eprintln!("  {}", console::style(format!("- {hint}")).cyan());
    }
    if err.is_recoverable() {
        eprintln!(
            "  {}",
            console::style("- this error exhausted its retry budget; -r raises the limit").cyan()
        );
    }
}

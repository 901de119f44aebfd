//! Integration coverage for CLI parsing and the local path pipeline.
//!
//! Anything that requires a live SSH server is `#[ignore]`d, matching
//! the teacher's `network/ssh.rs` convention.

use clap::Parser;
use std::fs;
use std::time::Duration;
use vaayu::config::CliArgs;
use vaayu::path::{expand_local, walk_local_for_upload};

#[test]
fn parses_send_with_watch_flag() {
    let args = CliArgs::parse_from([
        "vaayu", "-u", "alice", "send", "bob@example.com", "/remote/dest", "/local/a.txt", "-W",
    ]);
    match args.command {
        vaayu::config::Commands::Send { target, dest, paths, watch } => {
            assert_eq!(target, "bob@example.com");
            assert_eq!(dest, "/remote/dest");
            assert_eq!(paths, vec!["/local/a.txt".to_string()]);
            assert!(watch);
        }
        other => panic!("expected Send, got {other:?}"),
    }
    assert_eq!(args.username.as_deref(), Some("alice"));
}

#[test]
fn parses_relay_with_separator_between_path_lists() {
    let args = CliArgs::parse_from([
        "vaayu", "relay", "a@host1", "b@host2", "/src/one", "/src/two", "--", "/dst/one", "/dst/two",
    ]);
    match args.command {
        vaayu::config::Commands::Relay { src, dst, src_paths, dst_paths } => {
            assert_eq!(src, "a@host1");
            assert_eq!(dst, "b@host2");
            assert_eq!(src_paths, vec!["/src/one".to_string(), "/src/two".to_string()]);
            assert_eq!(dst_paths, vec!["/dst/one".to_string(), "/dst/two".to_string()]);
        }
        other => panic!("expected Relay, got {other:?}"),
    }
}

#[test]
fn no_verify_flag_disables_verification() {
    let args = CliArgs::parse_from(["vaayu", "-n", "get", "host", "/local", "/remote/file"]);
    let opts = args.transfer_options();
    assert!(!opts.verify);
}

#[test]
fn backoff_flag_is_converted_to_duration() {
    let args = CliArgs::parse_from(["vaayu", "-b", "0.25", "get", "host", "/local", "/remote/file"]);
    let opts = args.transfer_options();
    assert_eq!(opts.backoff, Duration::from_millis(250));
}

#[test]
fn local_glob_expansion_feeds_directly_into_upload_walk() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("payload");
    fs::create_dir(&data_dir).unwrap();
    fs::write(data_dir.join("one.csv"), b"a,b,c").unwrap();
    fs::write(data_dir.join("two.csv"), b"d,e,f").unwrap();
    fs::create_dir(data_dir.join("nested")).unwrap();
    fs::write(data_dir.join("nested/three.csv"), b"g,h,i").unwrap();

    let pattern = data_dir.join("*").to_string_lossy().to_string();
    // "*" only matches top-level entries; walk_local_for_upload then
    // recurses into any directories among them.
    let expanded = expand_local(&[pattern]).unwrap();
    let pairs = walk_local_for_upload(&expanded, std::path::Path::new("/remote/incoming")).unwrap();

    let destinations: Vec<String> = pairs
        .iter()
        .map(|p| p.destination.to_string_lossy().to_string())
        .collect();

    assert!(destinations.iter().any(|d| d.ends_with("one.csv")));
    assert!(destinations.iter().any(|d| d.ends_with("two.csv")));
    assert!(destinations.iter().any(|d| d.ends_with("nested/three.csv")));
}

#[test]
#[ignore = "requires a reachable SSH server"]
fn connects_to_a_live_sftp_server() {
    use vaayu::config::SessionConfig;
    use vaayu::ssh::SshSession;

    let session = SshSession::new(SessionConfig::from_target("localhost"));
    session.connect().expect("live SSH server on localhost:22");
}

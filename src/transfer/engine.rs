//! Orchestration skeleton shared by send/get/relay (C6)

use crate::cancel::CancelToken;
use crate::config::TransferOptions;
use crate::error::{Result, VaayuError};
use crate::path::TransferPair;
use crate::progress::ProgressReporter;
use crate::retry::retry;
use crate::ssh::SshSession;
use crate::stats::Stats;
use crate::transfer::units;
use crossbeam::channel::bounded;
use std::cell::Cell;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Drives one transfer topology over a bounded-concurrency worker pool.
pub struct TransferEngine {
    progress: Option<Arc<ProgressReporter>>,
    cancel: CancelToken,
}

impl TransferEngine {
    pub fn new() -> Self {
        Self {
            progress: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_progress(progress: Arc<ProgressReporter>) -> Self {
        Self {
            progress: Some(progress),
            cancel: CancelToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn send(&self, session: &SshSession, opts: &TransferOptions, pairs: Vec<TransferPair>) -> Result<Stats> {
        session.ensure_connected()?;
        self.run(opts, pairs, |pair| {
            self.with_retry(opts, || units::upload_unit(session, opts, pair, self.progress.as_deref(), &self.cancel))
        })
    }

    pub fn get(&self, session: &SshSession, opts: &TransferOptions, pairs: Vec<TransferPair>) -> Result<Stats> {
        session.ensure_connected()?;
        self.run(opts, pairs, |pair| {
            self.with_retry(opts, || units::download_unit(session, opts, pair, self.progress.as_deref(), &self.cancel))
        })
    }

    pub fn relay(
        &self,
        src_session: &SshSession,
        dst_session: &SshSession,
        opts: &TransferOptions,
        pairs: Vec<TransferPair>,
    ) -> Result<Stats> {
        src_session.ensure_connected()?;
        dst_session.ensure_connected()?;
        self.run(opts, pairs, |pair| {
            self.with_retry(opts, || {
                units::relay_unit(src_session, dst_session, opts, pair, self.progress.as_deref(), &self.cancel)
            })
        })
    }

    fn with_retry(&self, opts: &TransferOptions, unit: impl Fn() -> Result<Stats>) -> Result<Stats> {
        let attempts = Cell::new(0u32);
        let result = retry(opts.retries, opts.backoff, |attempt| {
            self.cancel.check()?;
            attempts.set(attempt);
            unit()
        });
        result.map(|mut stats| {
            stats.retries = u64::from(attempts.get().saturating_sub(1));
            stats
        })
    }

    /// Common skeleton: acquire a permit (back-pressure), spawn a unit,
    /// release on every exit path, merge stats, surface the first error
    /// only after every in-flight unit has finished.
    fn run(
        &self,
        opts: &TransferOptions,
        pairs: Vec<TransferPair>,
        unit: impl Fn(&TransferPair) -> Result<Stats> + Sync,
    ) -> Result<Stats> {
        let parallel = opts.parallel.max(1);
        let (tx, rx) = bounded::<()>(parallel);
        for _ in 0..parallel {
            tx.send(()).expect("semaphore channel has capacity");
        }

        if let Some(p) = &self.progress {
            p.set_total_files(pairs.len() as u64);
        }

        let total_stats = Mutex::new(Stats::new());
        let first_error: Mutex<Option<VaayuError>> = Mutex::new(None);
        let start = Instant::now();

        std::thread::scope(|scope| {
            for pair in &pairs {
                if self.cancel.is_cancelled() {
                    break;
                }
                if rx.recv().is_err() {
                    break;
                }
                let tx = tx.clone();
                let unit = &unit;
                let total_stats = &total_stats;
                let first_error = &first_error;
                scope.spawn(move || {
                    match unit(pair) {
                        Ok(stats) => {
                            total_stats.lock().unwrap().merge(&stats);
                        }
                        Err(err) => {
                            tracing::warn!(path = %pair.destination.display(), error = %err, "unit failed after retries");
                            let mut guard = first_error.lock().unwrap();
                            if guard.is_none() {
                                *guard = Some(err);
                            }
                        }
                    }
                    let _ = tx.send(());
                });
            }
        });

        let mut stats = total_stats.into_inner().unwrap();
        stats.add_duration(start.elapsed());

        if let Some(err) = first_error.into_inner().unwrap() {
            return Err(err);
        }
        Ok(stats)
    }
}

impl Default for TransferEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_with_no_pairs_returns_zero_stats() {
        let engine = TransferEngine::new();
        let opts = TransferOptions::default();
        let stats = engine.run(&opts, Vec::new(), |_pair| Ok(Stats::new())).unwrap();
        assert_eq!(stats.files, 0);
        assert_eq!(stats.bytes, 0);
    }

    #[test]
    fn engine_merges_stats_across_units() {
        let engine = TransferEngine::new();
        let mut opts = TransferOptions::default();
        opts.parallel = 2;
        let pairs: Vec<TransferPair> = (0..5)
            .map(|i| TransferPair {
                source: format!("/src/{i}").into(),
                destination: format!("/dst/{i}").into(),
            })
            .collect();

        let stats = engine
            .run(&opts, pairs, |_pair| {
                Ok(Stats {
                    files: 1,
                    bytes: 10,
                    duration_s: 0,
                    retries: 0,
                })
            })
            .unwrap();

        assert_eq!(stats.files, 5);
        assert_eq!(stats.bytes, 50);
    }

    #[test]
    fn engine_surfaces_error_after_all_units_finish() {
        let engine = TransferEngine::new();
        let opts = TransferOptions::default();
        let pairs: Vec<TransferPair> = (0..3)
            .map(|i| TransferPair {
                source: format!("/src/{i}").into(),
                destination: format!("/dst/{i}").into(),
            })
            .collect();

        let result = engine.run(&opts, pairs, |pair| {
            if pair.source == std::path::PathBuf::from("/src/1") {
                Err(VaayuError::Interrupted)
            } else {
                Ok(Stats {
                    files: 1,
                    bytes: 1,
                    duration_s: 0,
                    retries: 0,
                })
            }
        });

        assert!(result.is_err());
    }
}

//! Progress reporter implementation
//!
//! Uses indicatif for beautiful progress bars with:
//! - File count progress
//! - Byte transfer progress
//! - Throughput and ETA display
//! - Multi-bar support for parallel operations

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicU64, AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Progress reporter for copy operations
pub struct ProgressReporter {
    /// Multi-progress container
    multi: MultiProgress,
    /// Main progress bar (bytes)
    bytes_bar: ProgressBar,
    /// File count progress bar
    files_bar: ProgressBar,
    /// Current status message
    status: ProgressBar,
    /// Start time
    start_time: Instant,
    /// Total bytes to copy
    total_bytes: AtomicU64,
    /// Total files to copy
    total_files: AtomicU64,
    /// Bytes copied so far
    bytes_copied: AtomicU64,
    /// Files copied so far
    files_copied: AtomicU64,
    /// Is progress enabled
    enabled: AtomicBool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        // Status line
        let status = multi.add(ProgressBar::new_spinner());
        status.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid template")
        );

        // Files progress bar
        let files_bar = multi.add(ProgressBar::new(0));
        files_bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%)")
                .expect("Invalid template")
                .progress_chars("=> ")
        );
        files_bar.set_prefix("Files");

        // Bytes progress bar
        let bytes_bar = multi.add(ProgressBar::new(0));
        bytes_bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.bold.dim} [{bar:40.green/white}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA {eta})")
                .expect("Invalid template")
                .progress_chars("=> ")
        );
        bytes_bar.set_prefix("Data ");

        Self {
            multi,
            bytes_bar,
            files_bar,
            status,
            start_time: Instant::now(),
            total_bytes: AtomicU64::new(0),
            total_files: AtomicU64::new(0),
            bytes_copied: AtomicU64::new(0),
            files_copied: AtomicU64::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    /// Create a disabled progress reporter (for quiet mode)
    pub fn disabled() -> Self {
        let reporter = Self::new();
        reporter.enabled.store(false, Ordering::SeqCst);
        reporter.multi.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    /// Set total bytes to transfer
    pub fn set_total_bytes(&self, total: u64) {
        self.total_bytes.store(total, Ordering::Relaxed);
        self.bytes_bar.set_length(total);
    }

    /// Set total files to transfer
    pub fn set_total_files(&self, total: u64) {
        self.total_files.store(total, Ordering::Relaxed);
        self.files_bar.set_length(total);
    }

    /// Increment bytes copied
    pub fn increment_bytes(&self, bytes: u64) {
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
        self.bytes_bar.inc(bytes);
    }

    /// Increment files copied
    pub fn increment_files(&self, count: u64) {
        self.files_copied.fetch_add(count, Ordering::Relaxed);
        self.files_bar.inc(count);
    }

    /// Set current status message
    pub fn set_status(&self, msg: &str) {
        self.status.set_message(msg.to_string());
    }

    /// Set current file being copied
    pub fn set_current_file(&self, path: &str) {
        // Truncate long paths
        let display = if path.len() > 60 {
            format!("...{}", &path[path.len() - 57..])
        } else {
            path.to_string()
        };
        self.status.set_message(display);
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get current throughput in bytes/second
    pub fn throughput(&self) -> f64 {
        let bytes = self.bytes_copied.load(Ordering::Relaxed);
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            bytes as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get ETA in seconds
    pub fn eta_seconds(&self) -> Option<u64> {
        let bytes_copied = self.bytes_copied.load(Ordering::Relaxed);
        let total_bytes = self.total_bytes.load(Ordering::Relaxed);

        if bytes_copied == 0 || total_bytes == 0 {
            return None;
        }

        let throughput = self.throughput();
        if throughput <= 0.0 {
            return None;
        }

        let remaining = total_bytes.saturating_sub(bytes_copied);
        Some((remaining as f64 / throughput) as u64)
    }

    /// Register a per-unit progress bar for one in-flight transfer. The
    /// caller advances it with `inc` and removes it with `finish_and_clear`
    /// once the unit publishes.
    pub fn register_task(&self, label: &str, total: u64) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {prefix:.dim} [{bar:30.yellow/white}] {bytes}/{total_bytes}")
                .expect("invalid template")
                .progress_chars("=> "),
        );
        let display = if label.len() > 40 {
            format!("...{}", &label[label.len() - 37..])
        } else {
            label.to_string()
        };
        bar.set_prefix(display);
        bar
    }

    /// Check if progress is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Get progress summary
    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            total_files: self.total_files.load(Ordering::Relaxed),
            files_copied: self.files_copied.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
            throughput: self.throughput(),
        }
    }

    /// Mark the run as finished successfully and clear every bar.
    pub fn finish_success(&self, message: &str) {
        self.status.finish_with_message(format!("done: {message}"));
        self.files_bar.finish_and_clear();
        self.bytes_bar.finish_and_clear();
    }

    /// Mark the run as finished with an error; bars stay visible (abandoned).
    pub fn finish_error(&self, message: &str) {
        self.status.finish_with_message(format!("failed: {message}"));
        self.files_bar.abandon();
        self.bytes_bar.abandon();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress summary
#[derive(Debug, Clone)]
pub struct ProgressSummary {
    /// Total bytes to transfer
    pub total_bytes: u64,
    /// Bytes copied so far
    pub bytes_copied: u64,
    /// Total files to transfer
    pub total_files: u64,
    /// Files copied so far
    pub files_copied: u64,
    /// Elapsed time
    pub elapsed: Duration,
    /// Throughput in bytes/second
    pub throughput: f64,
}

impl ProgressSummary {
    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            (self.bytes_copied as f64 / self.total_bytes as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_reporter() {
        let reporter = ProgressReporter::disabled();

        reporter.set_total_bytes(1000);
        reporter.set_total_files(10);

        reporter.increment_bytes(500);
        reporter.increment_files(5);

        let summary = reporter.summary();
        assert_eq!(summary.bytes_copied, 500);
        assert_eq!(summary.files_copied, 5);
        assert_eq!(summary.percentage(), 50.0);
    }
}

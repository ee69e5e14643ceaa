//! Progress tracking for export runs.
//!
//! The driver reports progress through a plain callback so it stays unaware
//! of how progress is displayed. [`ProgressTracker`] is the CLI-facing
//! implementation: an indicatif bar plus at most one log line per percentage
//! point. All state is owned by the tracker instance, so concurrent or
//! repeated exports cannot step on each other.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Callback invoked once per record with `(current, total)`.
///
/// Runs inline in the export loop, so it must not block.
pub type ProgressFn = Box<dyn FnMut(u64, u64) + Send>;

/// Progress tracker for export runs.
pub struct ProgressTracker {
    /// Last percentage reported in the log, -1 before the first record.
    last_percent: AtomicI64,
    /// Last total seen, used to size the bar lazily.
    total: AtomicU64,
    start: Instant,
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new tracker.
    ///
    /// # Arguments
    /// * `enable_bar` - Whether to display a progress bar (disable for
    ///   non-interactive runs; percent log lines are emitted either way)
    pub fn new(enable_bar: bool) -> Self {
        let bar = if enable_bar {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        Self {
            last_percent: AtomicI64::new(-1),
            total: AtomicU64::new(0),
            start: Instant::now(),
            bar,
        }
    }

    /// Record that `current` of `total` documents have been seen.
    ///
    /// The total comes from a point-in-time count query, so percentages
    /// above 100 are possible when the index grows mid-export.
    pub fn update(&self, current: u64, total: u64) {
        if let Some(ref bar) = self.bar {
            if self.total.swap(total, Ordering::Relaxed) != total {
                bar.set_length(total);
            }
            bar.set_position(current);

            let elapsed = self.start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let speed = current as f64 / elapsed;
                bar.set_message(format!("({speed:.0} docs/sec)"));
            }
        }

        let percent = (current.saturating_mul(100) / total.max(1)) as i64;
        if percent > self.last_percent.swap(percent, Ordering::Relaxed) {
            info!(
                "Exporting... {}% [time elapsed: {:.1?}]",
                percent,
                self.start.elapsed()
            );
        }
    }

    /// Finish and clear the progress bar.
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

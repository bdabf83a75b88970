//! Progress reporting for interactive runs.
//!
//! Bars render on stderr and only when stderr is a TTY, so CI logs and
//! piped output stay clean. Counts come from the store's stats and exist
//! for feedback only; nothing downstream reads them.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// A phase-scoped progress handle. Construct one per pipeline phase.
pub struct PhaseProgress {
    bar: Option<ProgressBar>,
}

impl PhaseProgress {
    /// A bar over a known item count (tests to fingerprint, clusters to
    /// analyze).
    pub fn counted(label: &str, total: usize) -> Self {
        if !std::io::stderr().is_terminal() {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{prefix:>24} [{bar:30}] {pos}/{len}")
                .expect("static template")
                .progress_chars("=> "),
        );
        bar.set_prefix(label.to_string());
        Self { bar: Some(bar) }
    }

    /// A spinner for phases without a known length (the clustering call).
    pub fn spinner(label: &str) -> Self {
        if !std::io::stderr().is_terminal() {
            return Self { bar: None };
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{prefix:>24} {spinner} {elapsed}")
                .expect("static template"),
        );
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar: Some(bar) }
    }

    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for PhaseProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::atomic::{AtomicUsize, Ordering};
use steam_reviews_core::ProgressSink;

/// Log a structured progress line every N reviews when no bar is shown
const LOG_EVERY: usize = 50;

/// Progress display for a single fetch.
///
/// Draws a bar on a terminal; otherwise emits structured log lines so
/// container logs still show progress.
pub struct FetchUI {
    bar: ProgressBar,
    interactive: bool,
    last_logged: AtomicUsize,
}

impl FetchUI {
    pub fn new(target: usize, enabled: bool) -> Self {
        let interactive = enabled && is_interactive();
        let bar = if interactive {
            let bar = ProgressBar::new(target as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ");
            bar.set_style(style);
            bar.set_message("Fetching reviews...");
            bar
        } else {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - progress bar disabled, using structured logging"
            );
            ProgressBar::hidden()
        };

        Self {
            bar,
            interactive,
            last_logged: AtomicUsize::new(0),
        }
    }

    pub fn finish(&self, msg: impl Into<String>) {
        if self.interactive {
            self.bar.finish_with_message(msg.into());
        }
    }

    pub fn abandon(&self) {
        if self.interactive {
            self.bar.abandon();
        }
    }
}

impl ProgressSink for FetchUI {
    fn report(&self, collected: usize, target: usize) {
        if self.interactive {
            self.bar.set_position(collected as u64);
            return;
        }

        let last = self.last_logged.load(Ordering::Relaxed);
        if collected >= last + LOG_EVERY || collected == target {
            self.last_logged.store(collected, Ordering::Relaxed);
            tracing::info!(
                operation = "progress",
                current = collected,
                total = target,
                percent = (collected as f64 / target.max(1) as f64 * 100.0) as u8,
                "Fetch progress update"
            );
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

//! Progress output for batch runs.
//!
//! Result lines always go to stdout. When requested, a spinner on stderr shows
//! how many items have finished; result lines are printed with the spinner
//! suspended so the two never interleave.

use std::time::Duration;

use addon_fetch::BatchProgress;
use indicatif::{ProgressBar, ProgressStyle};

/// Prints one line per finished item, optionally alongside a spinner.
pub(crate) struct ProgressUi {
    spinner: Option<ProgressBar>,
    total: usize,
}

impl ProgressUi {
    /// Creates the UI; the spinner is drawn only when `use_spinner` is true.
    pub(crate) fn new(use_spinner: bool, total: usize) -> Self {
        let spinner = use_spinner.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(format!("[0/{total}] fetching..."));
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });
        Self { spinner, total }
    }

    /// Reports one finished item.
    pub(crate) fn report(&self, progress: &BatchProgress) {
        match &self.spinner {
            Some(spinner) => {
                spinner.suspend(|| println!("{progress}"));
                spinner.set_message(format!(
                    "[{}/{}] fetching...",
                    progress.completed, self.total
                ));
            }
            None => println!("{progress}"),
        }
    }

    /// Clears the spinner, if any.
    pub(crate) fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }
}

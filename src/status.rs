use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Builds the indicator shown while a request is outstanding.
pub type IndicatorFactory = Box<dyn Fn() -> ProgressBar>;

pub fn terminal_indicator() -> IndicatorFactory {
    Box::new(|| {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    })
}

pub fn hidden_indicator() -> IndicatorFactory {
    Box::new(ProgressBar::hidden)
}

/// Loading indicator that is cleared when dropped, whichever way the
/// request ends.
pub struct WaitStatus {
    bar: ProgressBar,
}

impl WaitStatus {
    pub fn start(bar: ProgressBar, message: &'static str) -> Self {
        bar.set_message(message);
        Self { bar }
    }
}

impl Drop for WaitStatus {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

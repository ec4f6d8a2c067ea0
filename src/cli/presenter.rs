//! CLI presenter for output formatting

use std::sync::{Mutex, MutexGuard};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::ProgressListener;
use crate::domain::recording::RecordingSession;

/// Presenter for CLI output formatting.
///
/// The spinner sits behind a lock so progress callbacks can drive it
/// through a shared reference.
pub struct Presenter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        match self.spinner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.red} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        if let Some(previous) = self.spinner().replace(spinner) {
            previous.finish_and_clear();
        }
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = *self.spinner() {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&self, message: &str) {
        if let Some(spinner) = self.spinner().take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&self) {
        if let Some(spinner) = self.spinner().take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Format elapsed recording time as mm:ss
    pub fn format_elapsed(&self, elapsed_ms: u64) -> String {
        let secs = elapsed_ms / 1000;
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Print one session line to stdout
    pub fn session(&self, session: &RecordingSession) {
        println!(
            "{} {} ({})",
            "●".red(),
            session.artifact_name,
            session.masked_number()
        );
    }

    pub fn engine_status(&self, state: &str) {
        eprintln!("{} Engine: {}", "●".cyan(), state);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Recording progress on the terminal
impl ProgressListener for Presenter {
    fn on_start_recording(&self) {
        self.start_spinner("Recording... 00:00");
    }

    fn on_stop_recording(&self) {
        self.spinner_success("Recording stopped");
    }

    fn on_recording_time_progress(&self, elapsed_ms: u64) {
        self.update_spinner(&format!("Recording... {}", self.format_elapsed(elapsed_ms)));
    }
}

//! Spinner shown while an album is scanned.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::model::AlbumId;

const TICK: Duration = Duration::from_millis(120);

/// Spinner for the scan of `album`, drawn on stderr.
pub fn scan_spinner(album: AlbumId) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]") {
        spinner.set_style(style.tick_chars("|/-\\ "));
    }
    spinner.set_message(format!("Hashing and comparing album {}", album));
    spinner.enable_steady_tick(TICK);
    spinner
}

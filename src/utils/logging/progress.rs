//! Progress reporting for long-running operations
//!
//! Thin wrappers over indicatif so every bar in the crate shares one style.

use indicatif::{ProgressBar, ProgressStyle};

/// Default style for a main progress bar
pub const DEFAULT_MAIN_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}) {msg}";

/// Create a main progress bar with a standardized style
///
/// # Arguments
/// * `length` - Total length for the progress bar
/// * `description` - Optional description to display as the initial message
#[must_use]
pub fn create_main_progress_bar(length: u64, description: Option<&str>) -> ProgressBar {
    let pb = ProgressBar::new(length);
    if let Ok(style) = ProgressStyle::default_bar().template(DEFAULT_MAIN_TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }

    if let Some(desc) = description {
        pb.set_message(desc.to_string());
    }

    pb
}

/// Finish a progress bar with an optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}

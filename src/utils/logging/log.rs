//! Logging utilities
//!
//! Standardized log lines for pipeline stages and file operations.

use std::path::Path;
use std::time::Duration;

/// Log the start of a stage over `items` inputs
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `items` - Number of input items
pub fn log_operation_start(operation: &str, items: usize) {
    log::info!("{operation} ({items} items)");
}

/// Log the completion of a stage
///
/// # Arguments
/// * `operation` - Past-tense verb for the operation
/// * `items` - Number of items produced
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, items: usize, elapsed: Option<Duration>) {
    if let Some(duration) = elapsed {
        log::info!("Successfully {operation} {items} items in {duration:?}");
    } else {
        log::info!("Successfully {operation} {items} items");
    }
}

/// Log the start of a file operation
pub fn log_file_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log the completion of a file operation
pub fn log_file_operation_complete(
    operation: &str,
    path: &Path,
    items: usize,
    elapsed: Option<Duration>,
) {
    if let Some(duration) = elapsed {
        log::info!(
            "Successfully {} {} items {} {} in {:?}",
            operation,
            items,
            preposition(operation),
            path.display(),
            duration
        );
    } else {
        log::info!(
            "Successfully {} {} items {} {}",
            operation,
            items,
            preposition(operation),
            path.display()
        );
    }
}

/// Log a warning, optionally tied to a path
pub fn log_warning(message: &str, path: Option<&Path>) {
    if let Some(path) = path {
        log::warn!("{}: {}", message, path.display());
    } else {
        log::warn!("{message}");
    }
}

fn preposition(operation: &str) -> &'static str {
    if operation.starts_with("wrote") || operation.starts_with("saved") {
        "to"
    } else {
        "from"
    }
}

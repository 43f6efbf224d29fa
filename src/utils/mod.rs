//! Utility functions shared across the pipeline
//!
//! - `io`: claim table readers and summary writers (CSV and Parquet)
//! - `logging`: standardized operation logging and progress bars

pub mod io;
pub mod logging;

pub use io::{TableFormat, read_claims, write_table};

//! Algorithm implementations for claim risk profiling
//!
//! This module contains the rule-based health processing stages and the
//! learned classifier that approximates them.

pub mod classifier;
pub mod health;

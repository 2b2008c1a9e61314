//! # Utility Modules
//!
//! - **Logging**: subscriber setup for console and file output
//! - **Metrics**: per-session atomic counters

pub mod logging;
pub mod metrics;

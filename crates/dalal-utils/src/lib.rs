//! Shared utilities for dalal
//!
//! Logging setup and small collection helpers used by the market pipeline
//! and the CLI.

pub mod collections;
pub mod logging;

pub use collections::dedup_preserving_order;
pub use logging::{init_tracing, init_tracing_with_default};

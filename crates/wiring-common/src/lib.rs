//! Shared utilities for wiring crates

pub mod logging;

pub use logging::{build_filter, init_logging, init_test_logging};

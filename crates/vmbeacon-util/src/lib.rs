//! Shared utilities for vmbeacon.
//!
//! Currently this is the logging setup with tracing, shared by the binary
//! and anything embedding the discover crate.

pub mod log;

pub use log::{LogConfig, LogLevel};

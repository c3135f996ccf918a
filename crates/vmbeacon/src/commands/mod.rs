//! CLI command implementations.

pub mod advertise;
pub mod browse;
pub mod parse;

//! CLI-specific functionality for the gated-queue demo runner
//!
//! This module contains argument parsing and configuration discovery. The
//! library itself never depends on it.

pub mod args;
pub mod config;

pub use args::{Args, Commands, DemoOptions};
pub use config::{ConfigDiscovery, DemoConfig};

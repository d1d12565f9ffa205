//! Environment constants and path utilities for the gated-queue binary.
//!
//! Centralizes file names and defaults so the CLI and its tests agree on them.

use std::path::{Path, PathBuf};

/// Hidden directory holding local configuration
pub const APP_DIR_NAME: &str = ".gated-queue";

/// Configuration file name inside [`APP_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Stand-alone configuration file name in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "gated-queue.toml";

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "gated_queue=info";

/// Log filter used with `--verbose`
pub const VERBOSE_LOG_FILTER: &str = "gated_queue=debug";

/// Demo runner defaults
pub mod demo {
    /// Conditions registered when no config names any
    pub const DEFAULT_CONDITIONS: [&str; 3] = ["a", "b", "c"];

    /// Condition toggled by the demo loop
    pub const TOGGLED_CONDITION: &str = "a";

    pub const DEFAULT_TICKS: u32 = 6;
    pub const DEFAULT_INTERVAL_MS: u64 = 5000;
    pub const DEFAULT_TASK_TIMEOUT_MS: u64 = 1200;

    /// Delay before a failed demo task retries itself
    pub const RETRY_DELAY_MS: u64 = 1000;
}

/// Build the stand-alone config file path in a directory
pub fn local_config_file_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_FILE_NAME)
}

/// Build the hidden-directory config file path in a directory
pub fn app_config_file_path(dir: &Path) -> PathBuf {
    dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)
}

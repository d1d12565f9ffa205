//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Explicit `--config` path
//! 2. Current directory: ./gated-queue.toml or ./.gated-queue/config.toml
//! 3. Built-in defaults

use crate::cli::args::DemoOptions;
use crate::env;
use crate::error::ConfigError;
use crate::queue::QueueConfig;
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Full configuration for the demo runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub queue: QueueConfig,
    pub demo: DemoSettings,
}

/// Knobs of the demo loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    pub ticks: u32,
    pub interval_ms: u64,
    pub task_timeout_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig {
                conditions: env::demo::DEFAULT_CONDITIONS
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
                ..Default::default()
            },
            demo: DemoSettings::default(),
        }
    }
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            ticks: env::demo::DEFAULT_TICKS,
            interval_ms: env::demo::DEFAULT_INTERVAL_MS,
            task_timeout_ms: env::demo::DEFAULT_TASK_TIMEOUT_MS,
        }
    }
}

impl DemoConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply command-line overrides on top of the loaded file
    pub fn apply_overrides(&mut self, options: &DemoOptions) {
        if let Some(ticks) = options.ticks {
            self.demo.ticks = ticks;
        }
        if let Some(interval_ms) = options.interval_ms {
            self.demo.interval_ms = interval_ms;
        }
        if let Some(timeout_ms) = options.timeout_ms {
            self.demo.task_timeout_ms = timeout_ms;
        }

        // The demo toggles this condition, so it must exist
        let toggled = env::demo::TOGGLED_CONDITION.to_string();
        if !self.queue.conditions.contains(&toggled) {
            self.queue.conditions.push(toggled);
        }
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load the explicit config if given, otherwise walk the discovery hierarchy
    pub fn discover_config(explicit: Option<&Path>) -> Result<DemoConfig, ConfigError> {
        if let Some(path) = explicit {
            info!("Loading configuration override from: {:?}", path);
            return DemoConfig::from_toml_file(path);
        }

        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return DemoConfig::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(DemoConfig::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        Self::get_config_candidates()
            .into_iter()
            .find(|candidate| {
                debug!("Checking for config file: {:?}", candidate);
                candidate.is_file()
            })
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        match std_env::current_dir() {
            Ok(current_dir) => vec![
                env::local_config_file_path(&current_dir),
                env::app_config_file_path(&current_dir),
            ],
            Err(_) => Vec::new(),
        }
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        for (i, candidate) in Self::get_config_candidates().iter().enumerate() {
            let status = if candidate.is_file() {
                "EXISTS"
            } else if candidate.exists() {
                "NOT A FILE"
            } else {
                "NOT FOUND"
            };
            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match Self::find_config_file() {
            Some(found) => println!("Active configuration: {:?}", found),
            None => println!("Active configuration: Built-in defaults"),
        }
    }
}

//! Command line argument parsing
//!
//! Subcommands:
//! - `demo`: Drive a queue with a flaky task and a randomly toggling condition
//! - `show-config`: Show configuration discovery information

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gated-queue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Condition-gated async task queue demo runner")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the demo: a strict, flaky task gated on a randomly toggled condition
    Demo {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Number of condition toggles before exiting
        #[arg(long = "ticks")]
        ticks: Option<u32>,
        /// Milliseconds between condition toggles
        #[arg(long = "interval-ms")]
        interval_ms: Option<u64>,
        /// Timeout of the demo task in milliseconds (0 disables it)
        #[arg(long = "timeout-ms")]
        timeout_ms: Option<u64>,
        /// Enable verbose output
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
    /// Show configuration discovery information
    ShowConfig,
}

/// Command-line overrides for the demo
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoOptions {
    pub config: Option<PathBuf>,
    pub ticks: Option<u32>,
    pub interval_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub verbose: bool,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Demo options, if the `demo` subcommand was given
    pub fn demo_options(&self) -> Option<DemoOptions> {
        match &self.command {
            Commands::Demo {
                config,
                ticks,
                interval_ms,
                timeout_ms,
                verbose,
            } => Some(DemoOptions {
                config: config.clone(),
                ticks: *ticks,
                interval_ms: *interval_ms,
                timeout_ms: *timeout_ms,
                verbose: *verbose,
            }),
            Commands::ShowConfig => None,
        }
    }
}

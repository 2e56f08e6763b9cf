//! Command-line interface for Mosaic.
//!
//! # Commands
//!
//! - `setup` - List components or write a configuration template
//! - `configure` - Fill defaults and discovered values into a configuration
//! - `extract` - Configure and extract, writing report data as JSON
//! - `render` - Render documents from report data
//! - `report` - Configure, extract and render in one run
//! - `update` - Re-render selected sections of a rendered report
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - Errors only
//! - `--log-path` - Write logs to a file instead of stderr
//!
//! `RUST_LOG` takes precedence over both flags.
//!
//! # Examples
//!
//! ```bash
//! # Write a configuration template for two plugins
//! mosaic setup --components case_overview,findings --out report.toml
//!
//! # Full run
//! mosaic report report.toml --out-dir reports/
//!
//! # Re-render one section of a stored report
//! mosaic update reports/PANX_1249-v1_data.json --component findings --out-dir reports/
//! ```

pub mod common;
mod configure;
mod extract;
mod render;
mod report;
mod setup;
mod update;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Logging settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log file replacing stderr output.
    pub log_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the global tracing subscriber. Later calls are ignored.
    pub fn init_logging(&self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        match &self.log_path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create log file {}", path.display()))?;
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
            }
            None => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .try_init();
            }
        }
        Ok(())
    }
}

#[derive(Parser)]
#[command(
    name = "mosaic",
    about = "Mosaic - Assemble clinical reports from pluggable components",
    version,
    long_about = "Mosaic builds a report from independently developed components. Each component is \
                  configured, extracts its data under a schema-checked contract, and renders a section \
                  of the final documents."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List components or write a configuration template
    Setup(setup::SetupCommand),

    /// Complete a configuration with defaults and discovered values
    Configure(configure::ConfigureCommand),

    /// Configure and extract report data
    Extract(extract::ExtractCommand),

    /// Render documents from extracted report data
    Render(render::RenderCommand),

    /// Configure, extract and render in one run
    Report(report::ReportCommand),

    /// Re-render selected sections of a stored report
    Update(update::UpdateCommand),
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging()?;

        match self.command {
            Commands::Setup(cmd) => cmd.execute(),
            Commands::Configure(cmd) => cmd.execute(),
            Commands::Extract(cmd) => cmd.execute(),
            Commands::Render(cmd) => cmd.execute(),
            Commands::Report(cmd) => cmd.execute(),
            Commands::Update(cmd) => cmd.execute(),
        }
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            log_path: self.log_path.clone(),
        }
    }
}

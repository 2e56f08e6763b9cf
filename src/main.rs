//! Mosaic CLI entry point
//!
//! Parses arguments, runs the selected command and turns failures into a
//! readable message with suggestions.
//!
//! Commands:
//! - `setup` - List components or write a configuration template
//! - `configure` - Complete a configuration
//! - `extract` - Configure and extract report data
//! - `render` - Render documents from report data
//! - `report` - All phases in one run
//! - `update` - Patch selected sections of a stored report

use anyhow::Result;
use clap::Parser;
use mosaic_report::cli;
use mosaic_report::core::error::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}

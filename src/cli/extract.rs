//! Configure and extract, storing the report data as JSON.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common;

#[derive(Args)]
pub struct ExtractCommand {
    /// Configuration file
    #[arg(value_name = "CONFIG")]
    input: PathBuf,

    /// Report data output file
    #[arg(short, long, value_name = "FILE")]
    out: PathBuf,

    /// Keep component workspace files in this directory
    #[arg(short, long, value_name = "DIR")]
    work_dir: Option<PathBuf>,
}

impl ExtractCommand {
    pub fn execute(self) -> Result<()> {
        let raw = common::load_config(&self.input)?;
        let orchestrator = common::build_orchestrator(self.work_dir.as_deref())?;
        let data = orchestrator.extract(&raw)?;
        data.save(&self.out)?;

        println!(
            "{} Extracted {} plugin(s) for {} to {}",
            "✓".green(),
            data.plugins.len(),
            data.core.report_id.bold(),
            self.out.display()
        );
        Ok(())
    }
}

//! Configure, extract and render in a single run.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common;

#[derive(Args)]
pub struct ReportCommand {
    /// Configuration file
    #[arg(value_name = "CONFIG")]
    input: PathBuf,

    /// Directory receiving the documents and the report data
    #[arg(short, long, value_name = "DIR")]
    out_dir: PathBuf,

    /// Keep component workspace files in this directory
    #[arg(short, long, value_name = "DIR")]
    work_dir: Option<PathBuf>,
}

impl ReportCommand {
    pub fn execute(self) -> Result<()> {
        let raw = common::load_config(&self.input)?;
        let orchestrator = common::build_orchestrator(self.work_dir.as_deref())?;
        let (data, rendered) = orchestrator.report(&raw)?;

        let report_id = data.core.report_id.clone();
        common::write_documents(&self.out_dir, &report_id, &rendered.documents)?;
        let data_path = common::data_path(&self.out_dir, &report_id);
        data.save(&data_path)?;

        println!("{} Report {} complete; data saved to {}", "✓".green(), report_id.bold(), data_path.display());
        Ok(())
    }
}

//! Render documents from stored report data.
//!
//! The encoded documents are cached back into the data file so later
//! `update` runs can patch them.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common;

#[derive(Args)]
pub struct RenderCommand {
    /// Report data written by `extract`
    #[arg(value_name = "DATA")]
    data: PathBuf,

    /// Directory receiving one HTML file per document type
    #[arg(short, long, value_name = "DIR")]
    out_dir: PathBuf,
}

impl RenderCommand {
    pub fn execute(self) -> Result<()> {
        let mut data = common::load_data(&self.data)?;
        let orchestrator = common::build_orchestrator(None)?;
        let rendered = orchestrator.render(&mut data)?;

        common::write_documents(&self.out_dir, &data.core.report_id, &rendered.documents)?;
        data.save(&self.data)?;
        Ok(())
    }
}

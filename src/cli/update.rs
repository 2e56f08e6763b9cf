//! Re-render selected sections of a stored report.
//!
//! Only the named plugins and mergers are rendered again. Their sections are
//! patched into the cached documents; every other byte stays as it was.
//!
//! # Examples
//!
//! ```bash
//! mosaic update reports/PANX_1249-v1_data.json --component findings --out-dir reports/
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common;

#[derive(Args)]
pub struct UpdateCommand {
    /// Report data holding rendered documents
    #[arg(value_name = "DATA")]
    data: PathBuf,

    /// Plugin or merger to re-render; repeat for several
    #[arg(short, long = "component", value_name = "ID", required = true)]
    components: Vec<String>,

    /// Directory receiving the patched documents
    #[arg(short, long, value_name = "DIR")]
    out_dir: PathBuf,
}

impl UpdateCommand {
    pub fn execute(self) -> Result<()> {
        let mut data = common::load_data(&self.data)?;
        let orchestrator = common::build_orchestrator(None)?;
        let documents = orchestrator.update(&mut data, &self.components)?;

        common::write_documents(&self.out_dir, &data.core.report_id, &documents)?;
        data.save(&self.data)?;
        println!("{} Updated {}", "✓".green(), self.components.join(", ").bold());
        Ok(())
    }
}

//! Complete a user configuration.
//!
//! Runs the configure phase only: defaults are applied, discovered values
//! filled in and every component's required keys checked. No component
//! extracts anything.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common;

#[derive(Args)]
pub struct ConfigureCommand {
    /// Configuration file to complete
    #[arg(value_name = "CONFIG")]
    input: PathBuf,

    /// Write the completed configuration here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,
}

impl ConfigureCommand {
    pub fn execute(self) -> Result<()> {
        let raw = common::load_config(&self.input)?;
        let orchestrator = common::build_orchestrator(None)?;
        let config = orchestrator.configure(&raw)?;
        common::write_output(self.out.as_deref(), &config.to_toml_string(), "configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::constants::REQUIRED_PLACEHOLDER;
    use tempfile::TempDir;

    #[test]
    fn test_completes_core_section() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("raw.toml");
        let out = temp.path().join("full.toml");
        std::fs::write(&input, "[core]\ndonor = \"PANX_1249\"\nproject = \"PASS01\"\n").unwrap();

        ConfigureCommand {
            input,
            out: Some(out.clone()),
        }
        .execute()
        .unwrap();

        let config = Configuration::load(&out).unwrap();
        assert_eq!(config.get("core", "report_id"), Some("PANX_1249-v1"));
    }

    #[test]
    fn test_placeholder_is_rejected() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("raw.toml");
        std::fs::write(&input, format!("[core]\ndonor = \"{REQUIRED_PLACEHOLDER}\"\nproject = \"PASS01\"\n")).unwrap();

        let err = ConfigureCommand { input, out: None }.execute().unwrap_err();
        assert!(err.to_string().contains("Missing configuration key"));
    }
}

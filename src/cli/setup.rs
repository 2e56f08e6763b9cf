//! List available components or write a configuration template.
//!
//! # Examples
//!
//! ```bash
//! mosaic setup --list
//! mosaic setup --components case_overview,findings
//! mosaic setup --components findings --out report.toml
//! ```

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common;
use crate::core::ComponentKind;
use crate::registry::ComponentRegistry;

#[derive(Args)]
pub struct SetupCommand {
    /// List registered components and exit
    #[arg(long, conflicts_with_all = ["components", "out"])]
    list: bool,

    /// Components to include in the template, comma separated
    #[arg(short, long, value_delimiter = ',', value_name = "IDS")]
    components: Vec<String>,

    /// Write the template here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,
}

impl SetupCommand {
    pub fn execute(self) -> Result<()> {
        if self.list {
            return list_components();
        }
        if self.components.is_empty() {
            bail!("Nothing to do: pass --list or --components");
        }

        let orchestrator = common::build_orchestrator(None)?;
        let template = orchestrator.generate_config(&self.components)?;
        common::write_output(self.out.as_deref(), &template.to_toml_string(), "configuration template")
    }
}

fn list_components() -> Result<()> {
    let registry = ComponentRegistry::with_builtins()?;
    println!("{}", "Available components:".bold());
    for identifier in registry.identifiers() {
        let kind = ComponentKind::from_identifier(identifier);
        println!("  {:<32} {}", identifier.cyan(), kind.to_string().dimmed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use tempfile::TempDir;

    #[test]
    fn test_template_written_to_file() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("report.toml");
        let cmd = SetupCommand {
            list: false,
            components: vec!["findings".to_string()],
            out: Some(out.clone()),
        };
        cmd.execute().unwrap();

        let template = Configuration::load(&out).unwrap();
        assert!(template.has_section("core"));
        assert!(template.has_section("findings"));
        assert!(template.get("findings", "findings_file").is_some());
    }

    #[test]
    fn test_requires_an_action() {
        let cmd = SetupCommand {
            list: false,
            components: Vec::new(),
            out: None,
        };
        assert!(cmd.execute().is_err());
    }

    #[test]
    fn test_unknown_component_fails() {
        let cmd = SetupCommand {
            list: false,
            components: vec!["no_such_plugin".to_string()],
            out: None,
        };
        assert!(cmd.execute().is_err());
    }
}

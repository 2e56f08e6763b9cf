//! Helpers shared by the subcommands.

use crate::config::{Configuration, Settings};
use crate::orchestrator::Orchestrator;
use crate::payload::ReportData;
use crate::registry::ComponentRegistry;
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An orchestrator over the built-in components and the user's settings.
///
/// With `work_dir` the workspace is that directory (created if missing) and
/// survives the run; without it a temporary workspace is used.
pub fn build_orchestrator(work_dir: Option<&Path>) -> Result<Orchestrator> {
    let registry = ComponentRegistry::with_builtins()?;
    let settings = Settings::load().context("Failed to load mosaic settings")?;
    let workspace = match work_dir {
        Some(dir) if dir.exists() => Workspace::open(dir)?,
        Some(dir) => Workspace::create(dir)?,
        None => Workspace::temporary()?,
    };
    Ok(Orchestrator::new(registry, settings).with_workspace(workspace))
}

pub fn load_config(path: &Path) -> Result<Configuration> {
    Ok(Configuration::load(path)?)
}

pub fn load_data(path: &Path) -> Result<ReportData> {
    Ok(ReportData::load(path)?)
}

/// Write text to `out`, or to stdout without one.
pub fn write_output(out: Option<&Path>, text: &str, what: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("Failed to write {what} to {}", path.display()))?;
            println!("{} Wrote {} to {}", "✓".green(), what, path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Path of the document for `document_type` inside `out_dir`.
pub fn document_path(out_dir: &Path, report_id: &str, document_type: &str) -> PathBuf {
    out_dir.join(format!("{report_id}_{document_type}.html"))
}

/// Path of the report data file inside `out_dir`.
pub fn data_path(out_dir: &Path, report_id: &str) -> PathBuf {
    out_dir.join(format!("{report_id}_data.json"))
}

/// Write every document into `out_dir`, creating it if needed.
pub fn write_documents(out_dir: &Path, report_id: &str, documents: &BTreeMap<String, String>) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    for (document_type, html) in documents {
        let path = document_path(out_dir, report_id, document_type);
        std::fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} Wrote {} document to {}", "✓".green(), document_type, path.display());
    }
    if documents.is_empty() {
        println!("{} No sections matched any document type; nothing written", "!".yellow());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_document_paths() {
        let dir = Path::new("/reports");
        assert_eq!(document_path(dir, "PANX_1249-v1", "clinical"), PathBuf::from("/reports/PANX_1249-v1_clinical.html"));
        assert_eq!(data_path(dir, "PANX_1249-v1"), PathBuf::from("/reports/PANX_1249-v1_data.json"));
    }

    #[test]
    fn test_write_documents_creates_directory() {
        let temp = TempDir::new().unwrap();
        let out_dir = temp.path().join("nested").join("out");
        let mut documents = BTreeMap::new();
        documents.insert("clinical".to_string(), "<html></html>".to_string());

        write_documents(&out_dir, "r1", &documents).unwrap();
        assert_eq!(std::fs::read_to_string(out_dir.join("r1_clinical.html")).unwrap(), "<html></html>");
    }

    #[test]
    fn test_build_orchestrator_creates_work_dir() {
        let temp = TempDir::new().unwrap();
        let work_dir = temp.path().join("work");
        build_orchestrator(Some(&work_dir)).unwrap();
        assert!(work_dir.is_dir());
    }
}

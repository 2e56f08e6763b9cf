//! Input fixtures: configuration text and findings files.

use std::path::{Path, PathBuf};

/// Three annotated alterations. KRAS appears twice with the same summary so
/// the gene information merger has a duplicate to drop.
pub const FINDINGS_JSON: &str = r#"[
  {
    "gene": "KRAS",
    "alteration": "G12D",
    "alteration_type": "Mutation",
    "summary": "KRAS encodes a small GTPase that drives proliferation.",
    "treatments": [
      {"tier": "Investigational", "level": "Level 3A", "treatments": "Adagrasib"}
    ]
  },
  {
    "gene": "TP53",
    "alteration": "R273H",
    "alteration_type": "Mutation",
    "summary": "TP53 is a tumor suppressor.",
    "treatments": []
  },
  {
    "gene": "KRAS",
    "alteration": "Amplification",
    "alteration_type": "Copy Number",
    "summary": "KRAS encodes a small GTPase that drives proliferation.",
    "treatments": [
      {"tier": "Approved", "level": "1", "treatments": "Sotorasib"}
    ]
  }
]
"#;

/// Write [`FINDINGS_JSON`] into `dir` and return its path.
pub fn write_findings(dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join("findings.json");
    std::fs::write(&path, FINDINGS_JSON)?;
    Ok(path)
}

/// A core section and nothing else.
pub fn minimal_config() -> String {
    "[core]\ndonor = \"PANX_1249\"\nproject = \"PASS01\"\n".to_string()
}

/// A configuration using every built-in component, reading findings from
/// `findings_path`.
pub fn sample_config(findings_path: &Path) -> String {
    format!(
        r#"[core]
donor = "PANX_1249"
project = "PASS01"
author = "Test Author"
document_types = "clinical,research"

[sample_params_helper]
oncotree_code = "paad"
purity = "0.62"
ploidy = "2.1"

[case_overview]
depends_extract = "sample_params_helper"
attributes = "clinical,research"

[findings]
findings_file = "{}"
attributes = "clinical"
"#,
        findings_path.display().to_string().replace('\\', "/")
    )
}

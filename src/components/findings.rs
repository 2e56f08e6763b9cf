//! Genomic findings plugin.
//!
//! Reads a JSON list of annotated alterations and reports them as a table.
//! Each alteration also contributes a gene description to
//! `gene_information_merger` and, when it carries therapies, rows to
//! `treatment_options_merger`:
//!
//! ```json
//! [
//!   {
//!     "gene": "KRAS",
//!     "alteration": "G12D",
//!     "alteration_type": "Mutation",
//!     "summary": "KRAS is an oncogene ...",
//!     "treatments": [{"tier": "Investigational", "level": "Level 3A", "treatments": "Adagrasib"}]
//!   }
//! ]
//! ```

use crate::config::Configuration;
use crate::constants::PAYLOAD_SCHEMA_VERSION;
use crate::core::error::{MosaicError, Result};
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::core::{ComponentContext, Configurable, ParamSpec, PluginComponent};
use crate::merge::gene_information::gene_url;
use crate::merge::{Contribution, GeneInformationMerger, TreatmentOptionsMerger};
use crate::payload::PluginPayload;
use crate::render::templates::TemplateRenderer;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, info};

pub const FINDINGS_FILE: &str = "findings_file";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub gene: String,
    pub alteration: String,
    pub alteration_type: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub treatments: Vec<TreatmentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentEntry {
    pub tier: String,
    pub level: String,
    pub treatments: String,
}

pub struct Findings {
    ctx: ComponentContext,
}

impl Findings {
    pub const IDENTIFIER: &'static str = "findings";

    pub fn new(ctx: ComponentContext) -> Self {
        Self {
            ctx,
        }
    }

    fn load_findings(&self, path: &Path) -> Result<Vec<Finding>> {
        let text = std::fs::read_to_string(path).with_file_context(FileOperation::Read, path, Self::IDENTIFIER)?;
        serde_json::from_str(&text)
            .map_err(|e| MosaicError::other(format!("Invalid findings file {}: {e}", path.display())))
    }
}

/// Contribution records for both mergers, in input order.
fn merge_records(findings: &[Finding]) -> (Vec<Contribution>, Vec<Contribution>) {
    let genes = findings
        .iter()
        .filter(|f| !f.summary.is_empty())
        .map(|f| GeneInformationMerger::contribution(&f.gene, &f.summary))
        .collect();
    let treatments = findings
        .iter()
        .flat_map(|f| {
            f.treatments.iter().map(move |t| {
                TreatmentOptionsMerger::contribution(&t.tier, &t.level, &t.treatments, &f.gene, &f.alteration)
            })
        })
        .collect();
    (genes, treatments)
}

impl Configurable for Findings {
    fn identifier(&self) -> &str {
        self.ctx.identifier()
    }

    fn params(&self) -> ParamSpec {
        ParamSpec::plugin(300, 300, 200).required(FINDINGS_FILE)
    }
}

impl PluginComponent for Findings {
    fn extract(&self, config: &Configuration) -> Result<PluginPayload> {
        let _guard = self.ctx.span().enter();
        let view = config.view(self.identifier());
        let path = Path::new(view.get(FINDINGS_FILE)?);

        let findings = self.load_findings(path)?;
        info!("Loaded {} findings from {}", findings.len(), path.display());

        let alterations: Vec<Value> = findings
            .iter()
            .map(|f| {
                json!({
                    "gene": f.gene,
                    "gene_url": gene_url(&f.gene),
                    "alteration": f.alteration,
                    "alteration_type": f.alteration_type,
                })
            })
            .collect();
        let (genes, treatments) = merge_records(&findings);
        debug!("Contributing {} gene records and {} treatment records", genes.len(), treatments.len());

        Ok(PluginPayload::from_config(&view, PAYLOAD_SCHEMA_VERSION, json!({ "alterations": alterations }))?
            .with_merge_inputs(GeneInformationMerger::IDENTIFIER, genes)
            .with_merge_inputs(TreatmentOptionsMerger::IDENTIFIER, treatments))
    }

    fn render(&self, payload: &PluginPayload) -> Result<String> {
        TemplateRenderer::builtin()?.render("findings.html", &payload.results)
    }

    fn results_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "required": ["alterations"],
            "properties": {
                "alterations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["gene", "gene_url", "alteration", "alteration_type"]
                    }
                }
            }
        }))
    }
}

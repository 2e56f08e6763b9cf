//! Gene information merger.
//!
//! Collects one description per gene from every plugin that reports on that
//! gene and renders them as a single table, sorted by gene symbol. Occurrences
//! of the gene symbol inside its own summary are italicized.

use crate::core::{ComponentContext, Configurable, MergerComponent, ParamSpec, Result};
use crate::constants::DEFAULT_PRIORITY;
use crate::merge::{Contribution, MergeSpec, field_text};
use crate::render::templates::TemplateRenderer;
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

pub const GENE_URL_BASE: &str = "https://www.oncokb.org/gene";

pub struct GeneInformationMerger {
    ctx: ComponentContext,
}

#[derive(Serialize)]
struct GeneRow {
    gene: String,
    gene_url: String,
    summary_html: String,
}

impl GeneInformationMerger {
    pub const IDENTIFIER: &'static str = "gene_information_merger";

    pub fn new(ctx: ComponentContext) -> Self {
        Self {
            ctx,
        }
    }

    /// Build a contribution record for `gene`.
    pub fn contribution(gene: &str, summary: &str) -> Contribution {
        let mut record = Contribution::new();
        record.insert("gene".to_string(), Value::from(gene));
        record.insert("gene_url".to_string(), Value::from(gene_url(gene)));
        record.insert("summary".to_string(), Value::from(summary));
        record
    }
}

pub fn gene_url(gene: &str) -> String {
    format!("{GENE_URL_BASE}/{gene}")
}

/// Escape `summary` and wrap whole-word occurrences of `gene` in `<i>`.
pub fn italicize_gene(gene: &str, summary: &str) -> String {
    let escaped = tera::escape_html(summary);
    match Regex::new(&format!(r"\b{}\b", regex::escape(gene))) {
        Ok(pattern) => pattern.replace_all(&escaped, "<i>$0</i>").into_owned(),
        Err(_) => escaped,
    }
}

impl Configurable for GeneInformationMerger {
    fn identifier(&self) -> &str {
        self.ctx.identifier()
    }

    fn params(&self) -> ParamSpec {
        ParamSpec::merger(DEFAULT_PRIORITY)
    }
}

impl MergerComponent for GeneInformationMerger {
    fn merge_spec(&self) -> MergeSpec {
        MergeSpec::new(&["gene"], "gene")
    }

    fn record_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["gene", "gene_url", "summary"],
            "properties": {
                "gene": {"type": "string", "minLength": 1},
                "gene_url": {"type": "string"},
                "summary": {"type": "string"}
            }
        })
    }

    fn render(&self, records: &[Contribution]) -> Result<String> {
        let _guard = self.ctx.span().enter();
        debug!("Rendering {} gene descriptions", records.len());

        let rows: Vec<GeneRow> = records
            .iter()
            .map(|record| {
                let gene = field_text(record, "gene");
                GeneRow {
                    summary_html: italicize_gene(&gene, &field_text(record, "summary")),
                    gene_url: field_text(record, "gene_url"),
                    gene,
                }
            })
            .collect();

        TemplateRenderer::builtin()?.render("gene_information.html", &json!({ "records": rows }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::render_merger;

    fn merger() -> GeneInformationMerger {
        GeneInformationMerger::new(ComponentContext::detached(GeneInformationMerger::IDENTIFIER))
    }

    #[test]
    fn test_contribution_builds_url() {
        let record = GeneInformationMerger::contribution("KRAS", "GTPase");
        assert_eq!(record["gene_url"], "https://www.oncokb.org/gene/KRAS");
    }

    #[test]
    fn test_renders_at_default_merger_priority() {
        let params = merger().params();
        assert_eq!(params.default_for(crate::constants::RENDER_PRIORITY), Some("300"));
    }

    #[test]
    fn test_italicize_whole_words_only() {
        let html = italicize_gene("TP53", "TP53 loss, unlike TP53BP1, is common (TP53).");
        assert_eq!(html, "<i>TP53</i> loss, unlike TP53BP1, is common (<i>TP53</i>).");
    }

    #[test]
    fn test_italicize_escapes_markup() {
        let html = italicize_gene("KRAS", "KRAS <b>driver</b>");
        assert!(html.starts_with("<i>KRAS</i> &lt;b&gt;"));
    }

    #[test]
    fn test_render_merges_and_orders() {
        let first = vec![
            GeneInformationMerger::contribution("TP53", "A"),
            GeneInformationMerger::contribution("KRAS", "oncogene"),
        ];
        let second = vec![GeneInformationMerger::contribution("TP53", "B")];

        let html = render_merger(&merger(), &[first.as_slice(), second.as_slice()]).unwrap();
        let kras = html.find("KRAS").unwrap();
        let tp53 = html.find("TP53").unwrap();
        assert!(kras < tp53);
        assert!(html.contains("<td>B</td>"));
        assert!(!html.contains("<td>A</td>"));
    }

    #[test]
    fn test_render_rejects_bad_record() {
        let mut record = GeneInformationMerger::contribution("TP53", "A");
        record.insert("summary".to_string(), json!(42));
        let err = render_merger(&merger(), &[std::slice::from_ref(&record)]).unwrap_err();
        assert!(matches!(err, crate::core::MosaicError::SchemaViolation { .. }));
    }
}

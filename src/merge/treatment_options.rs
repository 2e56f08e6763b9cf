//! Treatment options merger.
//!
//! Therapies are contributed per alteration with an OncoKB actionability
//! level and a tier (`Approved` or `Investigational`). The table groups rows
//! by tier, then orders them by OncoKB level and alteration. Any tier or level
//! outside the known rankings fails the render.

use crate::constants::DEFAULT_PRIORITY;
use crate::core::{ComponentContext, Configurable, MergerComponent, ParamSpec, Result};
use crate::merge::gene_information::gene_url;
use crate::merge::{Contribution, MergeSpec, field_text};
use crate::render::templates::TemplateRenderer;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

pub const TIER_APPROVED: &str = "Approved";
pub const TIER_INVESTIGATIONAL: &str = "Investigational";
pub const TIERS: [&str; 2] = [TIER_APPROVED, TIER_INVESTIGATIONAL];

/// OncoKB levels, most actionable first.
pub const ONCOKB_LEVELS: [&str; 12] =
    ["1", "2", "3A", "3B", "4", "R1", "R2", "N1", "N2", "N3", "N4", "Unknown"];

pub struct TreatmentOptionsMerger {
    ctx: ComponentContext,
}

#[derive(Serialize)]
struct TierGroup<'a> {
    tier: &'a str,
    rows: Vec<&'a Contribution>,
}

impl TreatmentOptionsMerger {
    pub const IDENTIFIER: &'static str = "treatment_options_merger";

    pub fn new(ctx: ComponentContext) -> Self {
        Self {
            ctx,
        }
    }

    /// Build a contribution record. A leading `Level ` on `level` is dropped.
    pub fn contribution(
        tier: &str,
        level: &str,
        treatments: &str,
        gene: &str,
        alteration: &str,
    ) -> Contribution {
        let mut record = Contribution::new();
        record.insert("tier".to_string(), Value::from(tier));
        record.insert("oncokb_level".to_string(), Value::from(normalize_level(level)));
        record.insert("treatments".to_string(), Value::from(treatments));
        record.insert("gene".to_string(), Value::from(gene));
        record.insert("gene_url".to_string(), Value::from(gene_url(gene)));
        record.insert("alteration".to_string(), Value::from(alteration));
        record.insert("alteration_url".to_string(), Value::from(format!("{}/{alteration}", gene_url(gene))));
        record
    }
}

pub fn normalize_level(level: &str) -> &str {
    level.trim().strip_prefix("Level ").unwrap_or(level.trim())
}

impl Configurable for TreatmentOptionsMerger {
    fn identifier(&self) -> &str {
        self.ctx.identifier()
    }

    fn params(&self) -> ParamSpec {
        ParamSpec::merger(DEFAULT_PRIORITY)
    }
}

impl MergerComponent for TreatmentOptionsMerger {
    fn merge_spec(&self) -> MergeSpec {
        MergeSpec::new(&["tier", "oncokb_level", "alteration"], "alteration")
            .with_tier("tier", &TIERS)
            .with_tier("oncokb_level", &ONCOKB_LEVELS)
    }

    fn record_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["tier", "oncokb_level", "treatments", "gene", "gene_url", "alteration", "alteration_url"],
            "properties": {
                "tier": {"type": "string"},
                "oncokb_level": {"type": "string"},
                "treatments": {"type": "string"},
                "gene": {"type": "string", "minLength": 1},
                "gene_url": {"type": "string"},
                "alteration": {"type": "string", "minLength": 1},
                "alteration_url": {"type": "string"}
            }
        })
    }

    fn render(&self, records: &[Contribution]) -> Result<String> {
        let _guard = self.ctx.span().enter();
        debug!("Rendering {} treatment options", records.len());

        let tiers: Vec<TierGroup<'_>> = TIERS
            .iter()
            .map(|tier| TierGroup {
                tier,
                rows: records.iter().filter(|r| field_text(r, "tier") == *tier).collect(),
            })
            .filter(|group| !group.rows.is_empty())
            .collect();

        TemplateRenderer::builtin()?.render("treatment_options.html", &json!({ "tiers": tiers }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MosaicError;
    use crate::merge::{merge_contributions, render_merger};

    fn merger() -> TreatmentOptionsMerger {
        TreatmentOptionsMerger::new(ComponentContext::detached(TreatmentOptionsMerger::IDENTIFIER))
    }

    #[test]
    fn test_level_prefix_is_stripped() {
        let record = TreatmentOptionsMerger::contribution("Approved", "Level 3A", "Sotorasib", "KRAS", "G12C");
        assert_eq!(record["oncokb_level"], "3A");
        assert_eq!(record["alteration_url"], "https://www.oncokb.org/gene/KRAS/G12C");
        assert_eq!(normalize_level(" 1 "), "1");
    }

    #[test]
    fn test_records_ordered_by_tier_then_level() {
        let records = vec![
            TreatmentOptionsMerger::contribution("Investigational", "3B", "Drug C", "BRAF", "V600E"),
            TreatmentOptionsMerger::contribution("Approved", "R1", "Drug B", "EGFR", "T790M"),
            TreatmentOptionsMerger::contribution("Approved", "1", "Drug A", "KRAS", "G12C"),
        ];
        let (merged, _) =
            merge_contributions(TreatmentOptionsMerger::IDENTIFIER, &merger().merge_spec(), None, &[records.as_slice()])
                .unwrap();
        let order: Vec<_> = merged.iter().map(|r| field_text(r, "treatments")).collect();
        assert_eq!(order, vec!["Drug A", "Drug B", "Drug C"]);
    }

    #[test]
    fn test_unknown_tier_fails() {
        let records = vec![TreatmentOptionsMerger::contribution("Experimental", "1", "Drug", "KRAS", "G12C")];
        let err = render_merger(&merger(), &[records.as_slice()]).unwrap_err();
        assert!(matches!(err, MosaicError::UnknownTier { ref value, .. } if value == "Experimental"));

        let records = vec![TreatmentOptionsMerger::contribution("Approved", "5", "Drug", "KRAS", "G12C")];
        let err = render_merger(&merger(), &[records.as_slice()]).unwrap_err();
        assert!(matches!(err, MosaicError::UnknownTier { ref field, .. } if field == "oncokb_level"));
    }

    #[test]
    fn test_render_groups_by_tier() {
        let records = vec![
            TreatmentOptionsMerger::contribution("Investigational", "3B", "Drug C", "BRAF", "V600E"),
            TreatmentOptionsMerger::contribution("Approved", "1", "Drug A", "KRAS", "G12C"),
        ];
        let html = render_merger(&merger(), &[records.as_slice()]).unwrap();
        let approved = html.find("Approved Therapies").unwrap();
        let investigational = html.find("Investigational Therapies").unwrap();
        assert!(approved < investigational);
        assert!(html.find("Drug A").unwrap() < html.find("Drug C").unwrap());
    }

    #[test]
    fn test_render_omits_empty_tier() {
        let records = vec![TreatmentOptionsMerger::contribution("Approved", "1", "Drug A", "KRAS", "G12C")];
        let html = render_merger(&merger(), &[records.as_slice()]).unwrap();
        assert!(!html.contains("Investigational Therapies"));
    }
}

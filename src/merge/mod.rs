//! Merging of shared report sections.
//!
//! Several plugins may contribute rows to the same table, e.g. every plugin
//! that reports an alteration also contributes a gene description. A merger
//! owns such a table. During render the engine:
//!
//! 1. flattens the contribution lists in the order they were handed over,
//! 2. checks each record (key fields present, record schema, tier values),
//! 3. deduplicates by primary key, the **last** record for a key winning
//!    while the key keeps the position of its first occurrence,
//! 4. sorts with a total order (tier ranks, sort key, then primary key),
//! 5. hands the records to the merger's template.
//!
//! Any invalid record aborts the render; nothing is silently dropped.

pub mod gene_information;
pub mod treatment_options;

pub use gene_information::GeneInformationMerger;
pub use treatment_options::TreatmentOptionsMerger;

use crate::core::MergerComponent;
use crate::core::error::{MosaicError, Result};
use crate::schema::SchemaValidator;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// One record contributed to a merger.
pub type Contribution = serde_json::Map<String, Value>;

/// A categorical field and the ranked values it may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSpec {
    pub field: String,
    pub ranking: Vec<String>,
}

impl TierSpec {
    pub fn new(field: &str, ranking: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            ranking: ranking.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn rank(&self, value: &str) -> Option<usize> {
        self.ranking.iter().position(|r| r == value)
    }
}

/// Identity, ordering and categories of a merger's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSpec {
    /// Fields that together identify a record.
    pub primary_key: Vec<String>,
    pub sort_key: String,
    /// Compared in declaration order, before the sort key.
    pub tiers: Vec<TierSpec>,
}

impl MergeSpec {
    pub fn new(primary_key: &[&str], sort_key: &str) -> Self {
        Self {
            primary_key: primary_key.iter().map(|s| s.to_string()).collect(),
            sort_key: sort_key.to_string(),
            tiers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tier(mut self, field: &str, ranking: &[&str]) -> Self {
        self.tiers.push(TierSpec::new(field, ranking));
        self
    }

    /// The primary key of `record`, one value per key field.
    pub fn key_of(&self, record: &Contribution) -> Vec<Value> {
        self.primary_key
            .iter()
            .map(|field| record.get(field).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Total order over validated records.
    pub fn compare(&self, a: &Contribution, b: &Contribution) -> Ordering {
        for tier in &self.tiers {
            let rank_a = tier.rank(&field_text(a, &tier.field));
            let rank_b = tier.rank(&field_text(b, &tier.field));
            match rank_a.cmp(&rank_b) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        compare_values(field(a, &self.sort_key), field(b, &self.sort_key)).then_with(|| {
            let (key_a, key_b) = (self.key_of(a), self.key_of(b));
            key_a
                .iter()
                .zip(&key_b)
                .map(|(x, y)| compare_values(x, y))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
    }

    fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.primary_key
            .iter()
            .chain(std::iter::once(&self.sort_key))
            .chain(self.tiers.iter().map(|t| &t.field))
            .map(String::as_str)
    }
}

fn field<'a>(record: &'a Contribution, name: &str) -> &'a Value {
    record.get(name).unwrap_or(&Value::Null)
}

/// Total order over JSON values.
///
/// Values of different types order by type (null, bool, number, string,
/// array, object). Numbers compare numerically and strings lexically.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn type_rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(x, y)| compare_values(x, y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(_), Value::Object(_)) => a.to_string().cmp(&b.to_string()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// String form of a field: strings verbatim, other values as JSON text.
pub fn field_text(record: &Contribution, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Summary of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub contributed: usize,
    pub merged: usize,
    pub replaced: usize,
}

/// Flatten, check, deduplicate and sort the contributions for `merger_id`.
pub fn merge_contributions(
    merger_id: &str,
    spec: &MergeSpec,
    validator: Option<&SchemaValidator>,
    lists: &[&[Contribution]],
) -> Result<(Vec<Contribution>, MergeStats)> {
    let mut stats = MergeStats::default();

    // Step 1: flatten in hand-over order
    let flattened: Vec<&Contribution> = lists.iter().flat_map(|list| list.iter()).collect();
    stats.contributed = flattened.len();

    // Step 2: every record must be usable before anything is merged
    for (index, record) in flattened.iter().enumerate() {
        check_record(merger_id, spec, validator, index, record)?;
    }

    // Step 3: dedup, last write wins at the first position
    // Keyed on JSON text so that "7" and 7 stay distinct
    let mut positions: BTreeMap<String, usize> = BTreeMap::new();
    let mut merged: Vec<Contribution> = Vec::with_capacity(flattened.len());
    for record in flattened {
        let key = Value::Array(spec.key_of(record)).to_string();
        match positions.get(&key) {
            Some(&position) => {
                debug!("{merger_id}: replacing record with key {key}");
                merged[position] = record.clone();
                stats.replaced += 1;
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(record.clone());
            }
        }
    }

    // Step 4: deterministic order
    merged.sort_by(|a, b| spec.compare(a, b));
    stats.merged = merged.len();

    debug!(
        "{merger_id}: merged {} contributions into {} records ({} replaced)",
        stats.contributed, stats.merged, stats.replaced
    );
    Ok((merged, stats))
}

fn check_record(
    merger_id: &str,
    spec: &MergeSpec,
    validator: Option<&SchemaValidator>,
    index: usize,
    record: &Contribution,
) -> Result<()> {
    for field in spec.required_fields() {
        if record.get(field).is_none_or(Value::is_null) {
            return Err(MosaicError::MalformedContribution {
                merger: merger_id.to_string(),
                field: field.to_string(),
                record: Value::Object(record.clone()).to_string(),
            });
        }
    }

    if let Some(validator) = validator {
        validator.validate(&format!("{merger_id}[{index}]"), &Value::Object(record.clone()))?;
    }

    for tier in &spec.tiers {
        let value = field_text(record, &tier.field);
        if tier.rank(&value).is_none() {
            return Err(MosaicError::UnknownTier {
                merger: merger_id.to_string(),
                field: tier.field.clone(),
                value,
            });
        }
    }
    Ok(())
}

/// Merge and render the contributions for one merger.
pub fn render_merger(merger: &dyn MergerComponent, lists: &[&[Contribution]]) -> Result<String> {
    let id = merger.identifier();
    let validator = SchemaValidator::new(id, &merger.record_schema())?;
    let (records, _) = merge_contributions(id, &merger.merge_spec(), Some(&validator), lists)?;
    merger.render(&records)
}

//! Extracted report data.
//!
//! [`ReportData`] is the hand-off between the extract and render phases, and
//! the JSON document written by `mosaic extract`:
//!
//! ```json
//! {
//!   "core": { "donor": "PANX_1249", "report_id": "PANX_1249-v1", ... },
//!   "plugins": { "case_overview": { "plugin_name": "case_overview", ... } },
//!   "mergers": { "gene_information_merger": { "render_priority": 300, ... } },
//!   "config": [ ... ],
//!   "html_cache": { "clinical": "H4sIAAAA..." }
//! }
//! ```

use crate::config::{ConfigView, Configuration};
use crate::core::Phase;
use crate::core::error::{MosaicError, Result};
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::merge::Contribution;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Priorities a plugin ran with, recorded in its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priorities {
    pub configure: i64,
    pub extract: i64,
    pub render: i64,
}

impl Priorities {
    pub fn from_view(view: &ConfigView<'_>) -> Result<Self> {
        Ok(Self {
            configure: view.priority(Phase::Configure)?,
            extract: view.priority(Phase::Extract)?,
            render: view.priority(Phase::Render)?,
        })
    }
}

/// The data one plugin produced during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginPayload {
    pub plugin_name: String,
    /// Version of the payload contract the plugin targets.
    pub version: String,
    pub priorities: Priorities,
    pub attributes: Vec<String>,
    /// Contribution records keyed by merger identifier.
    #[serde(default)]
    pub merge_inputs: BTreeMap<String, Vec<Contribution>>,
    pub results: serde_json::Value,
}

impl PluginPayload {
    /// Start a payload for the plugin owning `view`, taking priorities and
    /// attributes from its configured section.
    pub fn from_config(view: &ConfigView<'_>, version: &str, results: serde_json::Value) -> Result<Self> {
        Ok(Self {
            plugin_name: view.section_name().to_string(),
            version: version.to_string(),
            priorities: Priorities::from_view(view)?,
            attributes: view.attributes()?,
            merge_inputs: BTreeMap::new(),
            results,
        })
    }

    /// Append contribution records for `merger`.
    #[must_use]
    pub fn with_merge_inputs(mut self, merger: &str, records: Vec<Contribution>) -> Self {
        if !records.is_empty() {
            self.merge_inputs.entry(merger.to_string()).or_default().extend(records);
        }
        self
    }
}

/// Report-wide metadata built from the core section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorePayload {
    pub donor: String,
    pub project: String,
    pub report_id: String,
    pub author: String,
    /// Extraction date, `YYYY/MM/DD`.
    pub report_date: String,
    /// Version of the tool that produced the data.
    pub tool_version: String,
    pub document_types: Vec<String>,
}

/// Render settings for a merger that has contributions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergerSettings {
    pub render_priority: i64,
    pub attributes: Vec<String>,
}

/// Everything the render phase needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub core: CorePayload,
    pub plugins: BTreeMap<String, PluginPayload>,
    #[serde(default)]
    pub mergers: BTreeMap<String, MergerSettings>,
    /// The fully built configuration the data was extracted with.
    #[serde(default)]
    pub config: Configuration,
    /// Encoded rendered documents keyed by document type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub html_cache: BTreeMap<String, String>,
}

impl ReportData {
    pub fn new(core: CorePayload, config: Configuration) -> Self {
        Self {
            core,
            plugins: BTreeMap::new(),
            mergers: BTreeMap::new(),
            config,
            html_cache: BTreeMap::new(),
        }
    }

    /// Distinct merger identifiers referenced by any payload, in lexical order.
    pub fn referenced_mergers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .plugins
            .values()
            .flat_map(|payload| payload.merge_inputs.keys().cloned())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Contribution lists for `merger`, one per contributing plugin, in
    /// extraction order (extract priority, then identifier).
    pub fn contributions_for(&self, merger: &str) -> Vec<(&str, &[Contribution])> {
        let mut lists: Vec<(i64, &str, &[Contribution])> = self
            .plugins
            .iter()
            .filter_map(|(id, payload)| {
                payload
                    .merge_inputs
                    .get(merger)
                    .map(|records| (payload.priorities.extract, id.as_str(), records.as_slice()))
            })
            .collect();
        lists.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        lists.into_iter().map(|(_, id, records)| (id, records)).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MosaicError::other(format!("Invalid report data: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_file_context(FileOperation::Read, path, "report data")?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).with_file_context(FileOperation::Write, path, "report data")?;
        Ok(())
    }
}

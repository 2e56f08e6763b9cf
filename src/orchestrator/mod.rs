//! Three-phase report orchestration.
//!
//! The [`Orchestrator`] drives every component through configure, extract
//! and render, strictly in that order:
//!
//! - **Configure**: `core` first, then every section by configure priority.
//! - **Extract**: the core payload, then plugins and helpers by extract
//!   priority. Each plugin payload is checked against the plugin schema (and
//!   the plugin's own results schema) as soon as it is produced.
//! - **Render**: plugins by render priority, then one merge per merger that
//!   received contributions, then document assembly.
//!
//! Any failure ends the run. Failures inside a component carry its
//! identifier and phase ([`MosaicError::PhaseFailed`]). No partial report is
//! produced; workspace files written so far stay where they are.
//!
//! # Example
//!
//! ```rust,no_run
//! use mosaic_report::config::{Configuration, Settings};
//! use mosaic_report::orchestrator::Orchestrator;
//! use mosaic_report::registry::ComponentRegistry;
//! use mosaic_report::workspace::Workspace;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let orchestrator = Orchestrator::new(ComponentRegistry::with_builtins()?, Settings::load()?)
//!     .with_workspace(Workspace::temporary()?);
//! let raw = Configuration::load(Path::new("report.toml"))?;
//! let (data, rendered) = orchestrator.report(&raw)?;
//! println!("{} documents for {}", rendered.documents.len(), data.core.report_id);
//! # Ok(())
//! # }
//! ```

pub mod ordering;

use crate::components::CoreSection;
use crate::config::{ConfigurationMerger, Configuration, Settings, split_list};
use crate::constants::{ATTRIBUTES, CORE_SECTION, RENDER_PRIORITY};
use crate::core::error::{MosaicError, Result};
use crate::core::{Component, ComponentKind, ParamSpec, Phase, RunContext};
use crate::merge::{Contribution, render_merger};
use crate::patch::{codec, patch_document, section_names};
use crate::payload::{MergerSettings, PluginPayload, ReportData};
use crate::registry::ComponentRegistry;
use crate::render::{Section, assemble_documents};
use crate::schema::SchemaValidator;
use crate::workspace::Workspace;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Output of a render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedReport {
    /// Rendered fragments by component identifier.
    pub fragments: BTreeMap<String, String>,
    /// Composite documents by document type.
    pub documents: BTreeMap<String, String>,
}

pub struct Orchestrator {
    registry: ComponentRegistry,
    settings: Settings,
    workspace: Option<Workspace>,
}

impl Orchestrator {
    pub fn new(registry: ComponentRegistry, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            workspace: None,
        }
    }

    /// Give components a shared workspace. Helpers and plugins that read
    /// helper output need one.
    #[must_use]
    pub fn with_workspace(mut self, workspace: Workspace) -> Self {
        self.workspace = Some(workspace);
        self
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    fn start_run(&self) -> RunContext {
        RunContext::init(self.settings.clone(), self.workspace.clone())
    }

    /// Run `f` inside a fresh run, tearing the run down afterwards.
    fn in_run<T>(&self, f: impl FnOnce(&RunContext) -> Result<T>) -> Result<T> {
        let run = self.start_run();
        let result = f(&run);
        if let Err(e) = &result {
            let _guard = run.span().enter();
            tracing::error!("Run failed: {e}");
        }
        run.teardown();
        result
    }

    /// Build the full configuration from a user-supplied one.
    pub fn configure(&self, raw: &Configuration) -> Result<Configuration> {
        self.in_run(|run| self.configure_phase(run, raw))
    }

    /// Configure, then extract.
    pub fn extract(&self, raw: &Configuration) -> Result<ReportData> {
        self.in_run(|run| {
            let config = self.configure_phase(run, raw)?;
            self.extract_phase(run, &config)
        })
    }

    /// Render previously extracted data, caching the encoded documents in `data`.
    pub fn render(&self, data: &mut ReportData) -> Result<RenderedReport> {
        self.in_run(|run| self.render_phase(run, data))
    }

    /// All three phases in one run.
    pub fn report(&self, raw: &Configuration) -> Result<(ReportData, RenderedReport)> {
        self.in_run(|run| {
            let config = self.configure_phase(run, raw)?;
            let mut data = self.extract_phase(run, &config)?;
            let rendered = self.render_phase(run, &mut data)?;
            Ok((data, rendered))
        })
    }

    /// Re-render `names` from stored payloads and patch every cached document.
    ///
    /// Returns the patched documents by document type.
    pub fn update(&self, data: &mut ReportData, names: &[String]) -> Result<BTreeMap<String, String>> {
        self.in_run(|run| self.update_phase(run, data, names))
    }

    /// A configuration template for `identifiers` with `REQUIRED` placeholders.
    pub fn generate_config(&self, identifiers: &[String]) -> Result<Configuration> {
        self.in_run(|run| ConfigurationMerger::new(&self.registry, run).template(identifiers))
    }

    fn configure_phase(&self, run: &RunContext, raw: &Configuration) -> Result<Configuration> {
        let mut entries = Vec::new();
        for name in raw.component_names() {
            let component = self.registry.resolve(&name, run.component(&name))?;
            let priority = ordering::configure_priority(raw, &name, &component.params())?;
            entries.push((priority, name));
        }
        let order = ordering::by_priority(entries);
        debug!("Configure order: {order:?}");

        ConfigurationMerger::new(&self.registry, run).build_in_order(raw, &order)
    }

    fn extract_phase(&self, run: &RunContext, config: &Configuration) -> Result<ReportData> {
        let core = CoreSection::new(run.component(CORE_SECTION))
            .extract(config)
            .map_err(|e| e.in_phase(CORE_SECTION, Phase::Extract))?;
        let mut data = ReportData::new(core, config.clone());

        let order = ordering::extract_order(config)?;
        ordering::check_dependencies(config, &order, Phase::Extract)?;
        info!("Extract order: {order:?}");

        let plugin_schema = SchemaValidator::plugin()?;
        for id in &order {
            match self.registry.resolve(id, run.component(id))? {
                Component::Plugin(plugin) => {
                    let payload = plugin
                        .extract(config)
                        .and_then(|payload| validate_payload(id, &plugin_schema, plugin.results_schema(), payload))
                        .map_err(|e| e.in_phase(id, Phase::Extract))?;
                    debug!("Accepted payload from {id}");
                    data.plugins.insert(id.clone(), payload);
                }
                Component::Helper(helper) => {
                    helper.extract(config).map_err(|e| e.in_phase(id, Phase::Extract))?;
                }
                Component::Merger(_) => {}
            }
        }

        for merger_id in data.referenced_mergers() {
            let merger = self.registry.resolve_merger(&merger_id, run.component(&merger_id))?;
            let settings = merger_settings(config, &merger_id, &merger.params())?;
            data.mergers.insert(merger_id, settings);
        }
        for name in config.component_names() {
            if ComponentKind::from_identifier(&name) == ComponentKind::Merger && !data.mergers.contains_key(&name) {
                warn!("Merger '{name}' is configured but received no contributions");
            }
        }

        info!("Extracted {} plugin payloads", data.plugins.len());
        Ok(data)
    }

    fn render_phase(&self, run: &RunContext, data: &mut ReportData) -> Result<RenderedReport> {
        let mut sections = self.render_plugins(run, data, None)?;
        sections.extend(self.render_mergers(run, data, None)?);

        let documents = assemble_documents(&data.core, &sections)?;
        data.html_cache.clear();
        for (document_type, html) in &documents {
            data.html_cache.insert(document_type.clone(), codec::encode(html)?);
        }
        info!("Rendered {} sections into {} documents", sections.len(), documents.len());

        Ok(RenderedReport {
            fragments: sections.into_iter().map(|s| (s.identifier, s.html)).collect(),
            documents,
        })
    }

    fn update_phase(
        &self,
        run: &RunContext,
        data: &mut ReportData,
        names: &[String],
    ) -> Result<BTreeMap<String, String>> {
        let referenced = data.referenced_mergers();
        if let Some(unknown) = names.iter().find(|n| !data.plugins.contains_key(*n) && !referenced.contains(*n)) {
            return Err(MosaicError::SectionNotFound {
                name: unknown.clone(),
            });
        }

        let mut sections = self.render_plugins(run, data, Some(names))?;
        sections.extend(self.render_mergers(run, data, Some(names))?);
        let fragments: BTreeMap<String, String> = sections.into_iter().map(|s| (s.identifier, s.html)).collect();

        let mut documents = BTreeMap::new();
        let mut patched_names = Vec::new();
        for (document_type, encoded) in &mut data.html_cache {
            let html = codec::decode(encoded)?;
            let present = section_names(&html)?;
            let replacements: BTreeMap<String, String> = fragments
                .iter()
                .filter(|(name, _)| present.contains(*name))
                .map(|(name, html)| (name.clone(), html.clone()))
                .collect();
            patched_names.extend(replacements.keys().cloned());

            let patched = patch_document(&html, &replacements)?;
            *encoded = codec::encode(&patched)?;
            documents.insert(document_type.clone(), patched);
        }

        if let Some(missing) = fragments.keys().find(|name| !patched_names.contains(*name)) {
            return Err(MosaicError::SectionNotFound {
                name: missing.clone(),
            });
        }
        info!("Updated {} sections in {} documents", fragments.len(), documents.len());
        Ok(documents)
    }

    /// Render plugin sections, all or only those in `only`.
    fn render_plugins(&self, run: &RunContext, data: &ReportData, only: Option<&[String]>) -> Result<Vec<Section>> {
        let order = ordering::by_priority(
            data.plugins
                .iter()
                .filter(|(id, _)| only.is_none_or(|names| names.contains(*id)))
                .map(|(id, payload)| (payload.priorities.render, id.clone()))
                .collect(),
        );

        let mut sections = Vec::with_capacity(order.len());
        for id in order {
            let Some(payload) = data.plugins.get(&id) else {
                continue;
            };
            let plugin = self.registry.resolve_plugin(&id, run.component(&id))?;
            let html = plugin.render(payload).map_err(|e| e.in_phase(&id, Phase::Render))?;
            debug!("Rendered plugin {id}");
            sections.push(Section {
                render_priority: payload.priorities.render,
                attributes: payload.attributes.clone(),
                identifier: id,
                html,
            });
        }
        Ok(sections)
    }

    /// Merge and render every referenced merger, in lexical order.
    fn render_mergers(&self, run: &RunContext, data: &ReportData, only: Option<&[String]>) -> Result<Vec<Section>> {
        let mut sections = Vec::new();
        for merger_id in data.referenced_mergers() {
            if only.is_some_and(|names| !names.contains(&merger_id)) {
                continue;
            }
            let merger = self.registry.resolve_merger(&merger_id, run.component(&merger_id))?;
            let lists: Vec<&[Contribution]> =
                data.contributions_for(&merger_id).into_iter().map(|(_, records)| records).collect();
            let html = render_merger(merger.as_ref(), &lists).map_err(|e| e.in_phase(&merger_id, Phase::Render))?;

            let settings = match data.mergers.get(&merger_id) {
                Some(settings) => settings.clone(),
                None => merger_settings(&data.config, &merger_id, &merger.params())?,
            };
            debug!("Rendered merger {merger_id} from {} contributors", lists.len());
            sections.push(Section {
                identifier: merger_id,
                render_priority: settings.render_priority,
                attributes: settings.attributes,
                html,
            });
        }
        Ok(sections)
    }
}

/// Check a freshly extracted payload before accepting it.
fn validate_payload(
    id: &str,
    plugin_schema: &SchemaValidator,
    results_schema: Option<serde_json::Value>,
    payload: PluginPayload,
) -> Result<PluginPayload> {
    if payload.plugin_name != id {
        return Err(MosaicError::SchemaViolation {
            subject: id.to_string(),
            path: "$/plugin_name".to_string(),
            message: format!("expected \"{id}\", found \"{}\"", payload.plugin_name),
            count: 1,
        });
    }
    plugin_schema.validate(id, &serde_json::to_value(&payload)?)?;
    if let Some(schema) = results_schema {
        SchemaValidator::new(&format!("{id} results"), &schema)?.validate(id, &payload.results)?;
    }
    Ok(payload)
}

/// Render settings for a merger: its configured section, else its defaults.
fn merger_settings(config: &Configuration, merger_id: &str, params: &ParamSpec) -> Result<MergerSettings> {
    if config.has_section(merger_id) {
        let view = config.view(merger_id);
        return Ok(MergerSettings {
            render_priority: view.priority(Phase::Render)?,
            attributes: view.attributes()?,
        });
    }

    let render_priority = params.default_for(RENDER_PRIORITY).unwrap_or_default();
    Ok(MergerSettings {
        render_priority: render_priority.trim().parse().map_err(|_| MosaicError::InvalidConfigValue {
            section: merger_id.to_string(),
            key: RENDER_PRIORITY.to_string(),
            value: render_priority.to_string(),
            expected: "an integer".to_string(),
        })?,
        attributes: split_list(params.default_for(ATTRIBUTES).unwrap_or_default()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::GeneInformationMerger;
    use crate::test_utils::{BadPayload, CallLog, register_bad_plugin, register_recording_helper, register_recording_plugin};

    const CORE: &str = "[core]\ndonor = \"PANX_1249\"\nproject = \"PASS01\"\ndocument_types = \"clinical\"\n";

    fn orchestrator(log: &CallLog) -> Orchestrator {
        let mut registry = ComponentRegistry::with_builtins().unwrap();
        register_recording_plugin(&mut registry, "alpha", log, Vec::new()).unwrap();
        register_recording_plugin(
            &mut registry,
            "beta",
            log,
            vec![(
                GeneInformationMerger::IDENTIFIER.to_string(),
                GeneInformationMerger::contribution("KRAS", "KRAS is an oncogene."),
            )],
        )
        .unwrap();
        register_recording_helper(&mut registry, "gamma_helper", log).unwrap();
        Orchestrator::new(registry, Settings::default()).with_workspace(Workspace::temporary().unwrap())
    }

    fn config(body: &str) -> Configuration {
        Configuration::from_toml_str(&format!("{CORE}{body}"), "test").unwrap()
    }

    #[test]
    fn test_phases_follow_their_own_priorities() {
        let log = CallLog::default();
        let raw = config(
            r#"
[alpha]
configure_priority = "1"
extract_priority = "300"
render_priority = "10"

[beta]
configure_priority = "50"
extract_priority = "100"
render_priority = "20"

[gamma_helper]
configure_priority = "20"
extract_priority = "200"
"#,
        );
        orchestrator(&log).report(&raw).unwrap();

        assert_eq!(log.phase("configure"), vec!["alpha", "gamma_helper", "beta"]);
        assert_eq!(log.phase("extract"), vec!["beta", "gamma_helper", "alpha"]);
        assert_eq!(log.phase("render"), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_missing_key_stops_before_extract() {
        let log = CallLog::default();
        let raw = config("[alpha]\n\n[findings]\nattributes = \"clinical\"\n");
        let err = orchestrator(&log).report(&raw).unwrap_err();

        assert!(matches!(
            err.root(),
            MosaicError::MissingConfigKey { section, key } if section == "findings" && key == "findings_file"
        ));
        assert!(log.phase("extract").is_empty());
    }

    #[test]
    fn test_schema_gate_rejects_bad_payloads() {
        for defect in [BadPayload::WrongName, BadPayload::ResultsMismatch, BadPayload::NotAnObject] {
            let mut registry = ComponentRegistry::with_builtins().unwrap();
            register_bad_plugin(&mut registry, "broken", defect).unwrap();
            let orchestrator = Orchestrator::new(registry, Settings::default());

            let err = orchestrator.extract(&config("[broken]\n")).unwrap_err();
            assert!(
                matches!(&err, MosaicError::PhaseFailed { identifier, phase: Phase::Extract, .. } if identifier == "broken"),
                "{defect:?}: {err}"
            );
            assert!(matches!(err.root(), MosaicError::SchemaViolation { .. }), "{defect:?}: {err}");
        }
    }

    #[test]
    fn test_merger_uses_defaults_when_unconfigured() {
        let log = CallLog::default();
        let (data, rendered) = orchestrator(&log).report(&config("[beta]\n")).unwrap();

        let settings = &data.mergers[GeneInformationMerger::IDENTIFIER];
        assert_eq!(settings.render_priority, 300);
        assert_eq!(settings.attributes, vec!["clinical", "supplementary"]);
        let names = section_names(&rendered.documents["clinical"]).unwrap();
        assert_eq!(names, vec!["beta", GeneInformationMerger::IDENTIFIER]);
    }

    #[test]
    fn test_update_rerenders_only_named_sections() {
        let log = CallLog::default();
        let orchestrator = orchestrator(&log);
        let (mut data, rendered) = orchestrator.report(&config("[alpha]\n\n[beta]\n")).unwrap();
        let before = rendered.documents["clinical"].clone();
        assert!(before.contains("<p>alpha render 1</p>"));

        let documents = orchestrator.update(&mut data, &["alpha".to_string()]).unwrap();
        assert_eq!(log.count("render:alpha"), 2);
        assert_eq!(log.count("render:beta"), 1);

        let after = &documents["clinical"];
        assert_eq!(*after, before.replace("<p>alpha render 1</p>", "<p>alpha render 2</p>"));
        assert_eq!(codec::decode(&data.html_cache["clinical"]).unwrap(), *after);
    }

    #[test]
    fn test_update_unknown_section() {
        let log = CallLog::default();
        let orchestrator = orchestrator(&log);
        let (mut data, _) = orchestrator.report(&config("[alpha]\n")).unwrap();

        let err = orchestrator.update(&mut data, &["nowhere".to_string()]).unwrap_err();
        assert!(matches!(err, MosaicError::SectionNotFound { ref name } if name == "nowhere"));
    }

    #[test]
    fn test_helper_writes_into_workspace() {
        let log = CallLog::default();
        let orchestrator = orchestrator(&log);
        orchestrator.extract(&config("[gamma_helper]\n")).unwrap();

        let workspace = orchestrator.workspace.as_ref().unwrap().for_component("gamma_helper");
        assert_eq!(workspace.read_string("marker.txt").unwrap(), "gamma_helper");
    }
}

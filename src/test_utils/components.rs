//! Components for exercising the orchestrator.
//!
//! Recording components append `"<phase>:<identifier>"` entries to a shared
//! [`CallLog`], so tests can assert on the exact order the orchestrator
//! drove them in.

use crate::config::{ConfigSection, Configuration};
use crate::constants::PAYLOAD_SCHEMA_VERSION;
use crate::core::error::Result;
use crate::core::{ComponentContext, Configurable, HelperComponent, ParamSpec, PluginComponent};
use crate::merge::Contribution;
use crate::payload::PluginPayload;
use crate::registry::ComponentRegistry;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// Ordered record of component calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries for one phase, with the phase prefix removed.
    pub fn phase(&self, phase: &str) -> Vec<String> {
        let prefix = format!("{phase}:");
        self.entries().iter().filter_map(|e| e.strip_prefix(&prefix).map(str::to_string)).collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// A plugin that records its calls and contributes fixed records.
///
/// Its section reads `<p>{identifier} render {n}</p>`, `n` counting the
/// renders so far, so a re-render is visible in the document.
pub struct RecordingPlugin {
    ctx: ComponentContext,
    log: CallLog,
    contributions: Vec<(String, Contribution)>,
}

impl Configurable for RecordingPlugin {
    fn identifier(&self) -> &str {
        self.ctx.identifier()
    }

    fn params(&self) -> ParamSpec {
        ParamSpec::plugin(100, 100, 100)
    }

    fn configure(&self, _config: &Configuration, mut section: ConfigSection) -> Result<ConfigSection> {
        self.log.push(format!("configure:{}", self.identifier()));
        self.params().apply_defaults(&mut section);
        Ok(section)
    }
}

impl PluginComponent for RecordingPlugin {
    fn extract(&self, config: &Configuration) -> Result<PluginPayload> {
        self.log.push(format!("extract:{}", self.identifier()));
        let view = config.view(self.identifier());
        let mut payload = PluginPayload::from_config(&view, PAYLOAD_SCHEMA_VERSION, json!({"identifier": self.identifier()}))?;
        for (merger, record) in &self.contributions {
            payload = payload.with_merge_inputs(merger, vec![record.clone()]);
        }
        Ok(payload)
    }

    fn render(&self, payload: &PluginPayload) -> Result<String> {
        let entry = format!("render:{}", payload.plugin_name);
        self.log.push(entry.clone());
        Ok(format!("<p>{} render {}</p>", payload.plugin_name, self.log.count(&entry)))
    }
}

/// Register a [`RecordingPlugin`] under `identifier`.
pub fn register_recording_plugin(
    registry: &mut ComponentRegistry,
    identifier: &str,
    log: &CallLog,
    contributions: Vec<(String, Contribution)>,
) -> Result<()> {
    let log = log.clone();
    registry.register_plugin(identifier, move |ctx| {
        Box::new(RecordingPlugin {
            ctx,
            log: log.clone(),
            contributions: contributions.clone(),
        })
    })
}

/// A helper that records its calls and leaves a marker file in its workspace.
pub struct RecordingHelper {
    ctx: ComponentContext,
    log: CallLog,
}

impl Configurable for RecordingHelper {
    fn identifier(&self) -> &str {
        self.ctx.identifier()
    }

    fn params(&self) -> ParamSpec {
        ParamSpec::helper(100, 100)
    }

    fn configure(&self, _config: &Configuration, mut section: ConfigSection) -> Result<ConfigSection> {
        self.log.push(format!("configure:{}", self.identifier()));
        self.params().apply_defaults(&mut section);
        Ok(section)
    }
}

impl HelperComponent for RecordingHelper {
    fn extract(&self, _config: &Configuration) -> Result<()> {
        self.log.push(format!("extract:{}", self.identifier()));
        if let Some(workspace) = self.ctx.workspace() {
            workspace.write_string("marker.txt", self.identifier())?;
        }
        Ok(())
    }
}

pub fn register_recording_helper(registry: &mut ComponentRegistry, identifier: &str, log: &CallLog) -> Result<()> {
    let log = log.clone();
    registry.register_helper(identifier, move |ctx| {
        Box::new(RecordingHelper {
            ctx,
            log: log.clone(),
        })
    })
}

/// The defect a [`BadPlugin`] builds into its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadPayload {
    /// `plugin_name` names another component.
    WrongName,
    /// Results violate the plugin's own results schema.
    ResultsMismatch,
    /// Payload breaks the shared plugin schema.
    NotAnObject,
}

pub struct BadPlugin {
    ctx: ComponentContext,
    defect: BadPayload,
}

impl Configurable for BadPlugin {
    fn identifier(&self) -> &str {
        self.ctx.identifier()
    }

    fn params(&self) -> ParamSpec {
        ParamSpec::plugin(100, 100, 100)
    }
}

impl PluginComponent for BadPlugin {
    fn extract(&self, config: &Configuration) -> Result<PluginPayload> {
        let view = config.view(self.identifier());
        let mut payload = PluginPayload::from_config(&view, PAYLOAD_SCHEMA_VERSION, json!({"count": 3}))?;
        match self.defect {
            BadPayload::WrongName => payload.plugin_name = "someone_else".to_string(),
            BadPayload::ResultsMismatch => payload.results = json!({"count": "three"}),
            BadPayload::NotAnObject => payload.results = Value::Null,
        }
        Ok(payload)
    }

    fn render(&self, _payload: &PluginPayload) -> Result<String> {
        Ok("<p>unreachable</p>".to_string())
    }

    fn results_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "required": ["count"],
            "properties": {"count": {"type": "integer"}}
        }))
    }
}

pub fn register_bad_plugin(registry: &mut ComponentRegistry, identifier: &str, defect: BadPayload) -> Result<()> {
    registry.register_plugin(identifier, move |ctx| {
        Box::new(BadPlugin {
            ctx,
            defect,
        })
    })
}

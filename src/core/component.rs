//! Component contracts.
//!
//! Every report section is produced by a component. A component is one of
//! three kinds, each with its own trait:
//!
//! | Kind | Trait | Phases |
//! |------|-------|--------|
//! | plugin | [`PluginComponent`] | configure, extract, render |
//! | helper | [`HelperComponent`] | configure, extract |
//! | merger | [`MergerComponent`] | configure, render |
//!
//! All three build on [`Configurable`], which declares the component's
//! configuration keys through a [`ParamSpec`] and fills defaults and
//! discovered values during the configure phase.
//!
//! Components never read global state. Their dependencies (logging span,
//! workspace, run settings) arrive through the [`ComponentContext`] handed to
//! the factory that builds them.

use crate::config::settings::Settings;
use crate::config::{ConfigSection, Configuration};
use crate::constants::{
    ATTRIBUTES, CONFIGURE_PRIORITY, DEFAULT_MERGER_ATTRIBUTES, DEFAULT_MERGER_PRIORITY,
    DEPENDS_CONFIGURE, DEPENDS_EXTRACT, EXTRACT_PRIORITY, HELPER_SUFFIX, MERGER_SUFFIX,
    RENDER_PRIORITY,
};
use crate::core::error::Result;
use crate::merge::{Contribution, MergeSpec};
use crate::payload::PluginPayload;
use crate::workspace::ComponentWorkspace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the three lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Configure,
    Extract,
    Render,
}

impl Phase {
    /// The configuration key holding a component's priority for this phase.
    pub const fn priority_key(self) -> &'static str {
        match self {
            Phase::Configure => CONFIGURE_PRIORITY,
            Phase::Extract => EXTRACT_PRIORITY,
            Phase::Render => RENDER_PRIORITY,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Configure => "configure",
            Phase::Extract => "extract",
            Phase::Render => "render",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a component, derived from its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    Plugin,
    Helper,
    Merger,
}

impl ComponentKind {
    /// Infer the kind from the naming convention: `*_helper`, `*_merger`, else plugin.
    pub fn from_identifier(identifier: &str) -> Self {
        if identifier.ends_with(HELPER_SUFFIX) {
            ComponentKind::Helper
        } else if identifier.ends_with(MERGER_SUFFIX) {
            ComponentKind::Merger
        } else {
            ComponentKind::Plugin
        }
    }

    /// Phase operations this kind provides.
    pub const fn capabilities(self) -> &'static [&'static str] {
        match self {
            ComponentKind::Plugin => &["configure", "extract", "render"],
            ComponentKind::Helper => &["configure", "extract"],
            ComponentKind::Merger => &["configure", "render"],
        }
    }

    pub const fn participates_in(self, phase: Phase) -> bool {
        match (self, phase) {
            (_, Phase::Configure) => true,
            (ComponentKind::Merger, Phase::Extract) => false,
            (ComponentKind::Helper, Phase::Render) => false,
            _ => true,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Plugin => write!(f, "plugin"),
            ComponentKind::Helper => write!(f, "helper"),
            ComponentKind::Merger => write!(f, "merger"),
        }
    }
}

/// How a configuration key gets its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyClass {
    /// Must be supplied by the user.
    Required,
    /// Filled with the given default when absent.
    Optional(String),
    /// Computed by the component during configure.
    Discovered,
}

/// The configuration keys a component declares.
///
/// Each key belongs to exactly one [`KeyClass`]; declaring a key twice
/// replaces its earlier class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSpec {
    keys: BTreeMap<String, KeyClass>,
}

impl ParamSpec {
    /// An empty declaration. Most components start from [`ParamSpec::plugin`],
    /// [`ParamSpec::helper`] or [`ParamSpec::merger`] instead.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserved keys for a plugin, with default priorities and `clinical` attributes.
    pub fn plugin(configure: i64, extract: i64, render: i64) -> Self {
        Self::new()
            .optional(CONFIGURE_PRIORITY, configure)
            .optional(EXTRACT_PRIORITY, extract)
            .optional(RENDER_PRIORITY, render)
            .optional(ATTRIBUTES, "clinical")
            .optional(DEPENDS_CONFIGURE, "")
            .optional(DEPENDS_EXTRACT, "")
    }

    /// Reserved keys for a helper. Helpers never render.
    pub fn helper(configure: i64, extract: i64) -> Self {
        Self::new()
            .optional(CONFIGURE_PRIORITY, configure)
            .optional(EXTRACT_PRIORITY, extract)
            .optional(DEPENDS_CONFIGURE, "")
            .optional(DEPENDS_EXTRACT, "")
    }

    /// Reserved keys for a merger. Mergers never extract.
    pub fn merger(configure: i64) -> Self {
        Self::new()
            .optional(CONFIGURE_PRIORITY, configure)
            .optional(RENDER_PRIORITY, DEFAULT_MERGER_PRIORITY)
            .optional(ATTRIBUTES, DEFAULT_MERGER_ATTRIBUTES)
            .optional(DEPENDS_CONFIGURE, "")
    }

    #[must_use]
    pub fn required(mut self, key: &str) -> Self {
        self.keys.insert(key.to_string(), KeyClass::Required);
        self
    }

    #[must_use]
    pub fn optional(mut self, key: &str, default: impl ToString) -> Self {
        self.keys.insert(key.to_string(), KeyClass::Optional(default.to_string()));
        self
    }

    #[must_use]
    pub fn discovered(mut self, key: &str) -> Self {
        self.keys.insert(key.to_string(), KeyClass::Discovered);
        self
    }

    pub fn class(&self, key: &str) -> Option<&KeyClass> {
        self.keys.get(key)
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = (&str, &KeyClass)> {
        self.keys.iter().map(|(k, c)| (k.as_str(), c))
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.keys_of(|class| matches!(class, KeyClass::Required))
    }

    pub fn discovered_keys(&self) -> impl Iterator<Item = &str> {
        self.keys_of(|class| matches!(class, KeyClass::Discovered))
    }

    fn keys_of(&self, predicate: fn(&KeyClass) -> bool) -> impl Iterator<Item = &str> {
        self.keys.iter().filter(move |(_, class)| predicate(class)).map(|(k, _)| k.as_str())
    }

    /// The default for `key`, if it is an optional key.
    pub fn default_for(&self, key: &str) -> Option<&str> {
        match self.keys.get(key) {
            Some(KeyClass::Optional(default)) => Some(default.as_str()),
            _ => None,
        }
    }

    /// Fill every absent optional key with its default. Existing values win.
    pub fn apply_defaults(&self, section: &mut ConfigSection) {
        for (key, class) in &self.keys {
            if let KeyClass::Optional(default) = class {
                if !section.has(key) {
                    section.set(key, default.clone());
                }
            }
        }
    }
}

/// Dependencies injected into a component when it is constructed.
#[derive(Debug, Clone)]
pub struct ComponentContext {
    identifier: String,
    span: tracing::Span,
    workspace: Option<ComponentWorkspace>,
    settings: Settings,
}

impl ComponentContext {
    pub fn new(
        identifier: impl Into<String>,
        span: tracing::Span,
        workspace: Option<ComponentWorkspace>,
        settings: Settings,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            span,
            workspace,
            settings,
        }
    }

    /// A context with no workspace, a disabled span and default settings.
    pub fn detached(identifier: impl Into<String>) -> Self {
        Self::new(identifier, tracing::Span::none(), None, Settings::default())
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Logging span scoped to this component within the current run.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn workspace(&self) -> Option<&ComponentWorkspace> {
        self.workspace.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Configuration behaviour shared by all component kinds.
pub trait Configurable {
    fn identifier(&self) -> &str;

    /// Declared configuration keys.
    fn params(&self) -> ParamSpec;

    /// Return `section` with defaults and discovered values filled in.
    ///
    /// `config` holds the sections configured so far (the core section is
    /// always among them). Implementations must be idempotent: configuring an
    /// already complete section returns it unchanged.
    fn configure(&self, _config: &Configuration, mut section: ConfigSection) -> Result<ConfigSection> {
        self.params().apply_defaults(&mut section);
        Ok(section)
    }
}

/// A component that contributes a report section.
pub trait PluginComponent: Configurable {
    /// Produce the payload for this plugin from the fully built configuration.
    fn extract(&self, config: &Configuration) -> Result<PluginPayload>;

    /// Render the section fragment from this plugin's validated payload.
    fn render(&self, payload: &PluginPayload) -> Result<String>;

    /// Optional JSON Schema applied to the payload's `results`.
    fn results_schema(&self) -> Option<serde_json::Value> {
        None
    }
}

/// A component that prepares shared data in the workspace. Never renders.
pub trait HelperComponent: Configurable {
    fn extract(&self, config: &Configuration) -> Result<()>;
}

/// A component that combines contribution records from many plugins into one
/// deduplicated, ordered section.
pub trait MergerComponent: Configurable {
    /// Primary key, sort key and tier rankings for this merger's records.
    fn merge_spec(&self) -> MergeSpec;

    /// JSON Schema every contribution record must satisfy.
    fn record_schema(&self) -> serde_json::Value;

    /// Render the deduplicated, sorted records.
    fn render(&self, records: &[Contribution]) -> Result<String>;
}

/// A resolved component of any kind.
pub enum Component {
    Plugin(Box<dyn PluginComponent>),
    Helper(Box<dyn HelperComponent>),
    Merger(Box<dyn MergerComponent>),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Plugin(_) => ComponentKind::Plugin,
            Component::Helper(_) => ComponentKind::Helper,
            Component::Merger(_) => ComponentKind::Merger,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Component::Plugin(plugin) => plugin.identifier(),
            Component::Helper(helper) => helper.identifier(),
            Component::Merger(merger) => merger.identifier(),
        }
    }

    pub fn params(&self) -> ParamSpec {
        match self {
            Component::Plugin(plugin) => plugin.params(),
            Component::Helper(helper) => helper.params(),
            Component::Merger(merger) => merger.params(),
        }
    }

    pub fn configure(&self, config: &Configuration, section: ConfigSection) -> Result<ConfigSection> {
        match self {
            Component::Plugin(plugin) => plugin.configure(config, section),
            Component::Helper(helper) => helper.configure(config, section),
            Component::Merger(merger) => merger.configure(config, section),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({} '{}')", self.kind(), self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_identifier() {
        assert_eq!(ComponentKind::from_identifier("sample_params_helper"), ComponentKind::Helper);
        assert_eq!(ComponentKind::from_identifier("gene_information_merger"), ComponentKind::Merger);
        assert_eq!(ComponentKind::from_identifier("case_overview"), ComponentKind::Plugin);
        assert_eq!(ComponentKind::from_identifier("merger_stats"), ComponentKind::Plugin);
    }

    #[test]
    fn test_participation() {
        assert!(ComponentKind::Helper.participates_in(Phase::Extract));
        assert!(!ComponentKind::Helper.participates_in(Phase::Render));
        assert!(!ComponentKind::Merger.participates_in(Phase::Extract));
        assert!(ComponentKind::Merger.participates_in(Phase::Render));
    }

    #[test]
    fn test_key_classes_are_disjoint() {
        let spec = ParamSpec::new().required("purity").optional("purity", "NA");
        assert_eq!(spec.class("purity"), Some(&KeyClass::Optional("NA".to_string())));
        assert_eq!(spec.required_keys().count(), 0);

        let spec = spec.discovered("purity");
        assert_eq!(spec.discovered_keys().collect::<Vec<_>>(), vec!["purity"]);
        assert_eq!(spec.default_for("purity"), None);
    }

    #[test]
    fn test_apply_defaults_keeps_existing_values() {
        let spec = ParamSpec::plugin(100, 200, 300);
        let mut section = ConfigSection::new("case_overview");
        section.set(RENDER_PRIORITY, "50");

        spec.apply_defaults(&mut section);
        assert_eq!(section.get(RENDER_PRIORITY), Some("50"));
        assert_eq!(section.get(EXTRACT_PRIORITY), Some("200"));
        assert_eq!(section.get(ATTRIBUTES), Some("clinical"));
        assert_eq!(section.get(DEPENDS_EXTRACT), Some(""));
    }

    #[test]
    fn test_merger_defaults() {
        let spec = ParamSpec::merger(400);
        assert_eq!(spec.default_for(RENDER_PRIORITY), Some("300"));
        assert_eq!(spec.default_for(ATTRIBUTES), Some("clinical,supplementary"));
        assert!(!spec.is_known(EXTRACT_PRIORITY));
    }
}

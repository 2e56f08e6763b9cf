//! Report configuration.
//!
//! A report is described by an ordered set of sections, one per component
//! plus the reserved `core` section. Each section maps keys to string values:
//!
//! ```toml
//! [core]
//! donor = "PANX_1249"
//! project = "PASS01"
//!
//! [sample_params_helper]
//! oncotree_code = "paad"
//!
//! [findings]
//! findings_file = "$MOSAIC_DATA_DIR/findings.json"
//! render_priority = 200
//! ```
//!
//! Section order is the order of the input file and is preserved on output,
//! which is why parsing goes through `toml_edit` rather than a plain
//! deserializer. Scalar TOML values (strings, integers, floats, booleans) are
//! all stored as strings; components interpret them through [`ConfigView`].
//!
//! - [`merger`]: fills defaults and discovered keys for every section
//! - [`parser`]: generic typed TOML parsing for tool settings
//! - [`settings`]: tool settings and environment templates

pub mod merger;
mod parser;
pub mod settings;

pub use merger::ConfigurationMerger;
pub use parser::parse_config;
pub use settings::Settings;

use crate::constants::{
    ATTRIBUTES, CORE_SECTION, DEPENDS_CONFIGURE, DEPENDS_EXTRACT, KNOWN_ATTRIBUTES,
    REQUIRED_PLACEHOLDER,
};
use crate::core::error::{MosaicError, Result};
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::core::Phase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use toml_edit::{DocumentMut, Item, Table, Value};

/// One named section of a report configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSection {
    name: String,
    entries: BTreeMap<String, String>,
}

impl ConfigSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether `key` is present at all, even as a placeholder.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether `key` holds a real value (present and not the `REQUIRED` placeholder).
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| value != REQUIRED_PLACEHOLDER)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply `f` to every value, keeping keys.
    pub fn map_values(mut self, mut f: impl FnMut(&str) -> String) -> Self {
        for value in self.entries.values_mut() {
            *value = f(value);
        }
        self
    }
}

/// An ordered report configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    sections: Vec<ConfigSection>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text. `source_name` only labels error messages.
    pub fn from_toml_str(text: &str, source_name: &str) -> Result<Self> {
        let parse_error = |reason: String| MosaicError::ConfigParse {
            source_name: source_name.to_string(),
            reason,
        };

        let doc: DocumentMut = text.parse().map_err(|e: toml_edit::TomlError| parse_error(e.to_string()))?;

        let mut config = Self::new();
        for (name, item) in doc.iter() {
            let table = item
                .as_table_like()
                .ok_or_else(|| parse_error(format!("top-level key '{name}' is not inside a section")))?;

            let mut section = ConfigSection::new(name);
            for (key, value) in table.iter() {
                let value = value
                    .as_value()
                    .and_then(scalar_to_string)
                    .ok_or_else(|| parse_error(format!("[{name}] {key} must be a string, number or boolean")))?;
                section.set(key, value);
            }
            config.insert_section(section);
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_file_context(
            FileOperation::Read,
            path,
            "report configuration",
        )?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Serialize to TOML, preserving section order. Values are written as strings.
    pub fn to_toml_string(&self) -> String {
        let mut doc = DocumentMut::new();
        for section in &self.sections {
            let mut table = Table::new();
            for (key, value) in section.entries() {
                table.insert(key, toml_edit::value(value));
            }
            doc.insert(section.name(), Item::Table(table));
        }
        doc.to_string()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()).with_file_context(
            FileOperation::Write,
            path,
            "report configuration",
        )?;
        Ok(())
    }

    pub fn section(&self, name: &str) -> Option<&ConfigSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut ConfigSection> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Replace the section with the same name in place, or append it.
    pub fn insert_section(&mut self, section: ConfigSection) {
        match self.section_mut(section.name()) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    pub fn sections(&self) -> impl Iterator<Item = &ConfigSection> {
        self.sections.iter()
    }

    /// Section names in insertion order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(ConfigSection::name)
    }

    /// Names of every component section, i.e. everything but `core`.
    pub fn component_names(&self) -> Vec<String> {
        self.section_names()
            .filter(|name| *name != CORE_SECTION)
            .map(str::to_string)
            .collect()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    /// Set a value, creating the section if needed.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        match self.section_mut(section) {
            Some(existing) => existing.set(key, value),
            None => {
                let mut new_section = ConfigSection::new(section);
                new_section.set(key, value);
                self.sections.push(new_section);
            }
        }
    }

    /// Typed read access scoped to one section.
    pub fn view<'a>(&'a self, section: &'a str) -> ConfigView<'a> {
        ConfigView {
            config: self,
            section,
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.value().clone()),
        Value::Integer(i) => Some(i.value().to_string()),
        Value::Float(f) => Some(f.value().to_string()),
        Value::Boolean(b) => Some(b.value().to_string()),
        _ => None,
    }
}

/// Typed, error-reporting reads from one section of a [`Configuration`].
#[derive(Debug, Clone, Copy)]
pub struct ConfigView<'a> {
    config: &'a Configuration,
    section: &'a str,
}

impl<'a> ConfigView<'a> {
    pub fn section_name(&self) -> &'a str {
        self.section
    }

    /// A value of this section, or [`MosaicError::MissingConfigKey`].
    pub fn get(&self, key: &str) -> Result<&'a str> {
        lookup(self.config, self.section, key)
    }

    /// A value of the core section.
    pub fn core(&self, key: &str) -> Result<&'a str> {
        lookup(self.config, CORE_SECTION, key)
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get(key)?;
        value.trim().parse().map_err(|_| self.invalid(key, value, "an integer"))
    }

    pub fn get_float(&self, key: &str) -> Result<f64> {
        let value = self.get(key)?;
        value.trim().parse().map_err(|_| self.invalid(key, value, "a number"))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get(key)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(self.invalid(key, value, "a boolean")),
        }
    }

    /// A comma-separated list; blank entries are dropped.
    pub fn get_list(&self, key: &str) -> Result<Vec<String>> {
        Ok(split_list(self.get(key)?))
    }

    /// The priority for `phase`.
    pub fn priority(&self, phase: Phase) -> Result<i64> {
        self.get_int(phase.priority_key())
    }

    /// Declared attributes, each checked against the known set.
    pub fn attributes(&self) -> Result<Vec<String>> {
        let value = self.get(ATTRIBUTES)?;
        let attributes = split_list(value);
        if let Some(unknown) = attributes.iter().find(|a| !KNOWN_ATTRIBUTES.contains(&a.as_str())) {
            return Err(self.invalid(
                ATTRIBUTES,
                unknown,
                &format!("one of {}", KNOWN_ATTRIBUTES.join(", ")),
            ));
        }
        Ok(attributes)
    }

    /// Declared dependencies for `phase`; empty when the key is absent.
    pub fn dependencies(&self, phase: Phase) -> Vec<String> {
        let key = match phase {
            Phase::Configure => DEPENDS_CONFIGURE,
            Phase::Extract => DEPENDS_EXTRACT,
            Phase::Render => return Vec::new(),
        };
        self.config.get(self.section, key).map(split_list).unwrap_or_default()
    }

    fn invalid(&self, key: &str, value: &str, expected: &str) -> MosaicError {
        MosaicError::InvalidConfigValue {
            section: self.section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }
}

fn lookup<'a>(config: &'a Configuration, section: &str, key: &str) -> Result<&'a str> {
    config
        .section(section)
        .filter(|s| s.is_set(key))
        .and_then(|s| s.get(key))
        .ok_or_else(|| MosaicError::MissingConfigKey {
            section: section.to_string(),
            key: key.to_string(),
        })
}

/// Split a comma-separated value into trimmed, non-empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

//! Configuration merger.
//!
//! Turns a user-supplied configuration into the fully specified one every
//! later phase reads. For each section, `core` first:
//!
//! 1. resolve the component owning the section,
//! 2. run its `configure` against the configuration built so far,
//! 3. substitute environment templates in the values,
//! 4. check that its `depends_configure` sections are already built.
//!
//! Once every section is built, each required and discovered key must hold a
//! value, otherwise the build fails with [`MosaicError::MissingConfigKey`].
//! Building an already built configuration returns it unchanged.

use crate::components::CoreSection;
use crate::config::{ConfigSection, Configuration, split_list};
use crate::constants::{CORE_SECTION, DEPENDS_CONFIGURE, REQUIRED_PLACEHOLDER};
use crate::core::error::{MosaicError, Result};
use crate::core::{Configurable, KeyClass, ParamSpec, Phase, RunContext};
use crate::registry::ComponentRegistry;
use tracing::{debug, info, warn};

pub struct ConfigurationMerger<'a> {
    registry: &'a ComponentRegistry,
    run: &'a RunContext,
}

impl<'a> ConfigurationMerger<'a> {
    pub fn new(registry: &'a ComponentRegistry, run: &'a RunContext) -> Self {
        Self {
            registry,
            run,
        }
    }

    /// Build `raw` with component sections in insertion order.
    pub fn build(&self, raw: &Configuration) -> Result<Configuration> {
        self.build_in_order(raw, &raw.component_names())
    }

    /// Build `raw` configuring component sections in `order`.
    ///
    /// `core` is always configured first. Sections of `raw` that `order` does
    /// not name follow in insertion order.
    pub fn build_in_order(&self, raw: &Configuration, order: &[String]) -> Result<Configuration> {
        let _guard = self.run.span().enter();
        let mut built = Configuration::new();
        let mut declared: Vec<(String, ParamSpec)> = Vec::new();

        let core = CoreSection::new(self.run.component(CORE_SECTION));
        let section = raw.section(CORE_SECTION).cloned().unwrap_or_else(|| ConfigSection::new(CORE_SECTION));
        let section = self.configure_section(&core, &built, section)?;
        built.insert_section(section);
        declared.push((CORE_SECTION.to_string(), core.params()));

        let remaining = raw.component_names().into_iter().filter(|name| !order.contains(name));
        let names: Vec<String> = order.iter().cloned().chain(remaining).collect();

        for name in names.iter().filter(|name| name.as_str() != CORE_SECTION) {
            let component = self.registry.resolve(name, self.run.component(name))?;
            let section = raw.section(name).cloned().unwrap_or_else(|| ConfigSection::new(name.as_str()));

            warn_unknown_keys(&section, &component.params());
            let section = component
                .configure(&built, section)
                .map(|section| self.expand_templates(section))
                .map_err(|e| e.in_phase(name, Phase::Configure))?;

            check_configure_dependencies(name, &section, &built)?;
            built.insert_section(section);
            declared.push((name.clone(), component.params()));
        }

        for (name, params) in &declared {
            check_keys(&built, name, params)?;
        }

        info!("Configured {} sections", declared.len());
        Ok(built)
    }

    /// A configuration for `identifiers` listing every key a user may set,
    /// with required keys as placeholders and optional keys at their defaults.
    pub fn template(&self, identifiers: &[String]) -> Result<Configuration> {
        let mut config = Configuration::new();
        let core = CoreSection::new(self.run.component(CORE_SECTION));
        config.insert_section(template_section(CORE_SECTION, &core.params()));

        for name in identifiers.iter().filter(|name| name.as_str() != CORE_SECTION) {
            let component = self.registry.resolve(name, self.run.component(name))?;
            config.insert_section(template_section(name, &component.params()));
        }
        Ok(config)
    }

    fn configure_section(
        &self,
        component: &dyn Configurable,
        built: &Configuration,
        section: ConfigSection,
    ) -> Result<ConfigSection> {
        warn_unknown_keys(&section, &component.params());
        component
            .configure(built, section)
            .map(|section| self.expand_templates(section))
            .map_err(|e| e.in_phase(component.identifier(), Phase::Configure))
    }

    fn expand_templates(&self, section: ConfigSection) -> ConfigSection {
        let settings = self.run.settings();
        section.map_values(|value| settings.expand(value).into_owned())
    }
}

fn template_section(name: &str, params: &ParamSpec) -> ConfigSection {
    let mut section = ConfigSection::new(name);
    for (key, class) in params.keys() {
        match class {
            KeyClass::Required => section.set(key, REQUIRED_PLACEHOLDER),
            KeyClass::Optional(default) => section.set(key, default.clone()),
            KeyClass::Discovered => {}
        }
    }
    section
}

fn warn_unknown_keys(section: &ConfigSection, params: &ParamSpec) {
    for (key, _) in section.entries() {
        if !params.is_known(key) {
            warn!("Unknown key '{}' in section [{}]", key, section.name());
        }
    }
}

fn check_configure_dependencies(name: &str, section: &ConfigSection, built: &Configuration) -> Result<()> {
    let missing: Vec<String> = section
        .get(DEPENDS_CONFIGURE)
        .map(split_list)
        .unwrap_or_default()
        .into_iter()
        .filter(|dep| !built.has_section(dep))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MosaicError::DependencyOrder {
            identifier: name.to_string(),
            phase: Phase::Configure,
            missing,
        })
    }
}

fn check_keys(built: &Configuration, name: &str, params: &ParamSpec) -> Result<()> {
    let section = built.section(name);
    for key in params.required_keys().chain(params.discovered_keys()) {
        if !section.is_some_and(|s| s.is_set(key)) {
            return Err(MosaicError::MissingConfigKey {
                section: name.to_string(),
                key: key.to_string(),
            });
        }
    }
    debug!("All keys present in [{name}]");
    Ok(())
}

//! Component registry.
//!
//! Components are resolved from an explicit table of factories instead of
//! being discovered at run time. Each factory receives the
//! [`ComponentContext`] for the run and returns a boxed trait object of the
//! kind it was registered as.
//!
//! ```rust,no_run
//! use mosaic_report::registry::ComponentRegistry;
//! use mosaic_report::core::ComponentContext;
//!
//! let registry = ComponentRegistry::with_builtins().unwrap();
//! let plugin = registry
//!     .resolve_plugin("case_overview", ComponentContext::detached("case_overview"))
//!     .unwrap();
//! ```
//!
//! An identifier's kind follows its name (`*_helper`, `*_merger`, else
//! plugin), and registration refuses factories whose kind disagrees with the
//! name. `core` is reserved and never resolves.

use crate::constants::CORE_SECTION;
use crate::core::error::{MosaicError, ResolutionFailure, Result};
use crate::core::{
    Component, ComponentContext, ComponentKind, HelperComponent, MergerComponent, PluginComponent,
};
use std::collections::BTreeMap;
use strsim::levenshtein;
use tracing::debug;

/// Suggestions must be within this share of the identifier length.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

type PluginFactory = Box<dyn Fn(ComponentContext) -> Box<dyn PluginComponent>>;
type HelperFactory = Box<dyn Fn(ComponentContext) -> Box<dyn HelperComponent>>;
type MergerFactory = Box<dyn Fn(ComponentContext) -> Box<dyn MergerComponent>>;

enum Factory {
    Plugin(PluginFactory),
    Helper(HelperFactory),
    Merger(MergerFactory),
}

impl Factory {
    fn kind(&self) -> ComponentKind {
        match self {
            Factory::Plugin(_) => ComponentKind::Plugin,
            Factory::Helper(_) => ComponentKind::Helper,
            Factory::Merger(_) => ComponentKind::Merger,
        }
    }
}

#[derive(Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, Factory>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry").field("identifiers", &self.identifiers()).finish()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in component.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        crate::components::register_builtins(&mut registry)?;
        Ok(registry)
    }

    pub fn register_plugin<F>(&mut self, identifier: &str, factory: F) -> Result<()>
    where
        F: Fn(ComponentContext) -> Box<dyn PluginComponent> + 'static,
    {
        self.insert(identifier, Factory::Plugin(Box::new(factory)))
    }

    pub fn register_helper<F>(&mut self, identifier: &str, factory: F) -> Result<()>
    where
        F: Fn(ComponentContext) -> Box<dyn HelperComponent> + 'static,
    {
        self.insert(identifier, Factory::Helper(Box::new(factory)))
    }

    pub fn register_merger<F>(&mut self, identifier: &str, factory: F) -> Result<()>
    where
        F: Fn(ComponentContext) -> Box<dyn MergerComponent> + 'static,
    {
        self.insert(identifier, Factory::Merger(Box::new(factory)))
    }

    fn insert(&mut self, identifier: &str, factory: Factory) -> Result<()> {
        check_identifier(identifier)?;
        let by_name = ComponentKind::from_identifier(identifier);
        if factory.kind() != by_name {
            return Err(MosaicError::ComponentResolution {
                identifier: identifier.to_string(),
                failure: ResolutionFailure::KindMismatch {
                    registered: factory.kind(),
                    by_name,
                },
            });
        }
        debug!("Registering {} '{}'", by_name, identifier);
        self.factories.insert(identifier.to_string(), factory);
        Ok(())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Registered identifiers in lexical order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiate the component registered under `identifier`.
    pub fn resolve(&self, identifier: &str, ctx: ComponentContext) -> Result<Component> {
        let factory = self.lookup(identifier)?;
        Ok(match factory {
            Factory::Plugin(make) => Component::Plugin(make(ctx)),
            Factory::Helper(make) => Component::Helper(make(ctx)),
            Factory::Merger(make) => Component::Merger(make(ctx)),
        })
    }

    pub fn resolve_plugin(&self, identifier: &str, ctx: ComponentContext) -> Result<Box<dyn PluginComponent>> {
        match self.lookup(identifier)? {
            Factory::Plugin(make) => Ok(make(ctx)),
            other => Err(missing_capability(identifier, ComponentKind::Plugin, other.kind())),
        }
    }

    pub fn resolve_helper(&self, identifier: &str, ctx: ComponentContext) -> Result<Box<dyn HelperComponent>> {
        match self.lookup(identifier)? {
            Factory::Helper(make) => Ok(make(ctx)),
            other => Err(missing_capability(identifier, ComponentKind::Helper, other.kind())),
        }
    }

    pub fn resolve_merger(&self, identifier: &str, ctx: ComponentContext) -> Result<Box<dyn MergerComponent>> {
        match self.lookup(identifier)? {
            Factory::Merger(make) => Ok(make(ctx)),
            other => Err(missing_capability(identifier, ComponentKind::Merger, other.kind())),
        }
    }

    fn lookup(&self, identifier: &str) -> Result<&Factory> {
        if identifier == CORE_SECTION {
            return Err(MosaicError::ComponentResolution {
                identifier: identifier.to_string(),
                failure: ResolutionFailure::Reserved,
            });
        }
        check_identifier(identifier)?;
        self.factories.get(identifier).ok_or_else(|| MosaicError::ComponentResolution {
            identifier: identifier.to_string(),
            failure: ResolutionFailure::Unknown {
                suggestions: self.suggestions(identifier),
            },
        })
    }

    /// Up to three registered identifiers close to `target`, best first.
    fn suggestions(&self, target: &str) -> Vec<String> {
        let limit = target.len() * SIMILARITY_THRESHOLD_PERCENT / 100;
        let mut scored: Vec<(usize, &String)> = self
            .factories
            .keys()
            .map(|id| (levenshtein(target, id), id))
            .filter(|(distance, _)| *distance <= limit)
            .collect();
        scored.sort();
        scored.into_iter().take(3).map(|(_, id)| id.clone()).collect()
    }
}

fn missing_capability(identifier: &str, expected: ComponentKind, found: ComponentKind) -> MosaicError {
    MosaicError::ComponentResolution {
        identifier: identifier.to_string(),
        failure: ResolutionFailure::MissingCapability {
            expected,
            found,
        },
    }
}

fn check_identifier(identifier: &str) -> Result<()> {
    let valid = !identifier.is_empty()
        && identifier.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(MosaicError::ComponentResolution {
            identifier: identifier.to_string(),
            failure: ResolutionFailure::UnrecognizedKind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::GeneInformationMerger;

    fn ctx(id: &str) -> ComponentContext {
        ComponentContext::detached(id)
    }

    fn failure<T>(result: Result<T>) -> ResolutionFailure {
        match result {
            Err(MosaicError::ComponentResolution {
                failure,
                ..
            }) => failure,
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected a resolution failure"),
        }
    }

    #[test]
    fn test_builtins_resolve_with_matching_kind() {
        let registry = ComponentRegistry::with_builtins().unwrap();
        for id in registry.identifiers() {
            let component = registry.resolve(id, ctx(id)).unwrap();
            assert_eq!(component.kind(), ComponentKind::from_identifier(id));
            assert_eq!(component.identifier(), id);
        }
        assert!(registry.contains("gene_information_merger"));
    }

    #[test]
    fn test_core_is_reserved() {
        let registry = ComponentRegistry::with_builtins().unwrap();
        assert_eq!(failure(registry.resolve("core", ctx("core"))), ResolutionFailure::Reserved);
    }

    #[test]
    fn test_unknown_identifier_suggests_close_names() {
        let registry = ComponentRegistry::with_builtins().unwrap();
        match failure(registry.resolve("case_overveiw", ctx("case_overveiw"))) {
            ResolutionFailure::Unknown {
                suggestions,
            } => assert_eq!(suggestions.first().map(String::as_str), Some("case_overview")),
            other => panic!("unexpected failure: {other:?}"),
        }

        assert_eq!(failure(registry.resolve("zzz", ctx("zzz"))), ResolutionFailure::Unknown { suggestions: vec![] });
    }

    #[test]
    fn test_typed_resolution_reports_missing_capability() {
        let registry = ComponentRegistry::with_builtins().unwrap();
        let result = registry.resolve_plugin("gene_information_merger", ctx("gene_information_merger"));
        assert_eq!(
            failure(result),
            ResolutionFailure::MissingCapability {
                expected: ComponentKind::Plugin,
                found: ComponentKind::Merger,
            }
        );
        assert!(registry.resolve_merger("gene_information_merger", ctx("gene_information_merger")).is_ok());
    }

    #[test]
    fn test_registration_checks_naming() {
        let mut registry = ComponentRegistry::new();
        let result = registry.register_merger("gene_table", |ctx| Box::new(GeneInformationMerger::new(ctx)));
        assert_eq!(
            failure(result),
            ResolutionFailure::KindMismatch {
                registered: ComponentKind::Merger,
                by_name: ComponentKind::Plugin,
            }
        );

        let result = registry.register_merger("bad id_merger", |ctx| Box::new(GeneInformationMerger::new(ctx)));
        assert_eq!(failure(result), ResolutionFailure::UnrecognizedKind);
        assert!(registry.identifiers().is_empty());
    }
}

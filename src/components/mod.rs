//! Built-in components.
//!
//! | Identifier | Kind | Produces |
//! |------------|------|----------|
//! | `sample_params_helper` | helper | `sample_params.json` in the workspace |
//! | `case_overview` | plugin | donor and sample summary |
//! | `findings` | plugin | alteration table, gene and treatment contributions |
//! | `gene_information_merger` | merger | gene descriptions |
//! | `treatment_options_merger` | merger | therapies by tier |
//!
//! The `core` section lives here too but is never registered.

pub mod case_overview;
pub mod core_section;
pub mod findings;
pub mod sample_params_helper;

pub use case_overview::CaseOverview;
pub use core_section::CoreSection;
pub use findings::Findings;
pub use sample_params_helper::SampleParamsHelper;

use crate::core::error::Result;
use crate::merge::{GeneInformationMerger, TreatmentOptionsMerger};
use crate::registry::ComponentRegistry;

/// Register every built-in component with `registry`.
pub fn register_builtins(registry: &mut ComponentRegistry) -> Result<()> {
    registry.register_helper(SampleParamsHelper::IDENTIFIER, |ctx| Box::new(SampleParamsHelper::new(ctx)))?;
    registry.register_plugin(CaseOverview::IDENTIFIER, |ctx| Box::new(CaseOverview::new(ctx)))?;
    registry.register_plugin(Findings::IDENTIFIER, |ctx| Box::new(Findings::new(ctx)))?;
    registry.register_merger(GeneInformationMerger::IDENTIFIER, |ctx| Box::new(GeneInformationMerger::new(ctx)))?;
    registry.register_merger(TreatmentOptionsMerger::IDENTIFIER, |ctx| Box::new(TreatmentOptionsMerger::new(ctx)))?;
    Ok(())
}

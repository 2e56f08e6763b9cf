//! Sample parameters helper.
//!
//! Writes the sample parameters plugins share (`sample_params.json`) into its
//! workspace directory during extract. Plugins read the file back with
//! [`crate::workspace::ComponentWorkspace::read_json_from`].

use crate::config::{ConfigSection, Configuration};
use crate::constants::{CORE_DONOR, CORE_SECTION, DEFAULT_PRIORITY, SAMPLE_PARAMS_FILENAME};
use crate::core::error::{MosaicError, Result};
use crate::core::{ComponentContext, Configurable, HelperComponent, ParamSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const ONCOTREE_CODE: &str = "oncotree_code";
pub const PURITY: &str = "purity";
pub const PLOIDY: &str = "ploidy";
pub const SAMPLE_TYPE: &str = "sample_type";
pub const SAMPLE_LABEL: &str = "sample_label";

const NOT_AVAILABLE: &str = "NA";

/// Contents of `sample_params.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleParams {
    pub oncotree_code: String,
    pub sample_type: String,
    pub purity: String,
    pub ploidy: String,
    pub sample_label: String,
}

pub struct SampleParamsHelper {
    ctx: ComponentContext,
}

impl SampleParamsHelper {
    pub const IDENTIFIER: &'static str = "sample_params_helper";

    pub fn new(ctx: ComponentContext) -> Self {
        Self {
            ctx,
        }
    }
}

impl Configurable for SampleParamsHelper {
    fn identifier(&self) -> &str {
        self.ctx.identifier()
    }

    fn params(&self) -> ParamSpec {
        ParamSpec::helper(DEFAULT_PRIORITY, 100)
            .required(ONCOTREE_CODE)
            .optional(PURITY, NOT_AVAILABLE)
            .optional(PLOIDY, NOT_AVAILABLE)
            .optional(SAMPLE_TYPE, NOT_AVAILABLE)
            .discovered(SAMPLE_LABEL)
    }

    fn configure(&self, config: &Configuration, mut section: ConfigSection) -> Result<ConfigSection> {
        self.params().apply_defaults(&mut section);

        if !section.is_set(SAMPLE_LABEL) && section.is_set(ONCOTREE_CODE) {
            let donor = config.view(CORE_SECTION).core(CORE_DONOR);
            if let (Ok(donor), Some(code)) = (donor, section.get(ONCOTREE_CODE)) {
                let label = format!("{donor}-{}", code.to_ascii_uppercase());
                debug!("Discovered sample label {label}");
                section.set(SAMPLE_LABEL, label);
            }
        }
        Ok(section)
    }
}

impl HelperComponent for SampleParamsHelper {
    fn extract(&self, config: &Configuration) -> Result<()> {
        let _guard = self.ctx.span().enter();
        let workspace = self.ctx.workspace().ok_or_else(|| {
            MosaicError::other(format!("{} needs a workspace to write {SAMPLE_PARAMS_FILENAME}", Self::IDENTIFIER))
        })?;

        let view = config.view(self.identifier());
        let params = SampleParams {
            oncotree_code: view.get(ONCOTREE_CODE)?.to_string(),
            sample_type: view.get(SAMPLE_TYPE)?.to_string(),
            purity: view.get(PURITY)?.to_string(),
            ploidy: view.get(PLOIDY)?.to_string(),
            sample_label: view.get(SAMPLE_LABEL)?.to_string(),
        };
        let path = workspace.write_json(SAMPLE_PARAMS_FILENAME, &params)?;
        info!("Wrote sample parameters to {}", path.display());
        Ok(())
    }
}

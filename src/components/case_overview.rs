//! Case overview plugin: donor, project and sample parameters at a glance.

use crate::components::sample_params_helper::{SampleParams, SampleParamsHelper};
use crate::config::Configuration;
use crate::constants::{
    CORE_DONOR, CORE_PROJECT, DEPENDS_EXTRACT, PAYLOAD_SCHEMA_VERSION, SAMPLE_PARAMS_FILENAME,
};
use crate::core::error::{MosaicError, Result};
use crate::core::{ComponentContext, Configurable, ParamSpec, PluginComponent};
use crate::payload::PluginPayload;
use crate::render::templates::TemplateRenderer;
use serde_json::{Value, json};
use tracing::debug;

pub struct CaseOverview {
    ctx: ComponentContext,
}

impl CaseOverview {
    pub const IDENTIFIER: &'static str = "case_overview";

    pub fn new(ctx: ComponentContext) -> Self {
        Self {
            ctx,
        }
    }
}

impl Configurable for CaseOverview {
    fn identifier(&self) -> &str {
        self.ctx.identifier()
    }

    fn params(&self) -> ParamSpec {
        ParamSpec::plugin(200, 200, 100).optional(DEPENDS_EXTRACT, SampleParamsHelper::IDENTIFIER)
    }
}

impl PluginComponent for CaseOverview {
    fn extract(&self, config: &Configuration) -> Result<PluginPayload> {
        let _guard = self.ctx.span().enter();
        let workspace = self
            .ctx
            .workspace()
            .ok_or_else(|| MosaicError::other(format!("{} needs a workspace", Self::IDENTIFIER)))?;

        let params: SampleParams = workspace.read_json_from(SampleParamsHelper::IDENTIFIER, SAMPLE_PARAMS_FILENAME)?;
        debug!("Read sample parameters for {}", params.sample_label);

        let view = config.view(self.identifier());
        let results = json!({
            "donor": view.core(CORE_DONOR)?,
            "project": view.core(CORE_PROJECT)?,
            "oncotree_code": params.oncotree_code,
            "sample_type": params.sample_type,
            "purity": params.purity,
            "ploidy": params.ploidy,
        });
        PluginPayload::from_config(&view, PAYLOAD_SCHEMA_VERSION, results)
    }

    fn render(&self, payload: &PluginPayload) -> Result<String> {
        TemplateRenderer::builtin()?.render("case_overview.html", &payload.results)
    }

    fn results_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "required": ["donor", "project", "oncotree_code", "sample_type", "purity", "ploidy"],
            "additionalProperties": {"type": "string"}
        }))
    }
}

//! The reserved `core` section.
//!
//! Holds report-wide metadata. It is configured before every other section
//! and its payload is built before any plugin extracts. It is never resolved
//! through the registry.

use crate::config::{ConfigSection, Configuration};
use crate::constants::{
    CORE_AUTHOR, CORE_DOCUMENT_TYPES, CORE_DONOR, CORE_PROJECT, CORE_REPORT_ID,
    CORE_REPORT_VERSION, CORE_SECTION, DEFAULT_AUTHOR, DEFAULT_DOCUMENT_TYPES, KNOWN_ATTRIBUTES,
};
use crate::core::error::{MosaicError, Result};
use crate::core::{ComponentContext, Configurable, ParamSpec};
use crate::payload::CorePayload;
use chrono::Local;
use tracing::debug;

pub const REPORT_DATE_FORMAT: &str = "%Y/%m/%d";

pub struct CoreSection {
    ctx: ComponentContext,
}

impl CoreSection {
    pub fn new(ctx: ComponentContext) -> Self {
        Self {
            ctx,
        }
    }

    /// Build the core payload, dated today.
    pub fn extract(&self, config: &Configuration) -> Result<CorePayload> {
        let _guard = self.ctx.span().enter();
        let view = config.view(CORE_SECTION);

        let document_types = view.get_list(CORE_DOCUMENT_TYPES)?;
        if let Some(unknown) = document_types.iter().find(|t| !KNOWN_ATTRIBUTES.contains(&t.as_str())) {
            return Err(MosaicError::InvalidConfigValue {
                section: CORE_SECTION.to_string(),
                key: CORE_DOCUMENT_TYPES.to_string(),
                value: unknown.clone(),
                expected: format!("one of {}", KNOWN_ATTRIBUTES.join(", ")),
            });
        }

        let payload = CorePayload {
            donor: view.get(CORE_DONOR)?.to_string(),
            project: view.get(CORE_PROJECT)?.to_string(),
            report_id: view.get(CORE_REPORT_ID)?.to_string(),
            author: view.get(CORE_AUTHOR)?.to_string(),
            report_date: Local::now().format(REPORT_DATE_FORMAT).to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            document_types,
        };
        debug!("Built core payload for report {}", payload.report_id);
        Ok(payload)
    }
}

impl Configurable for CoreSection {
    fn identifier(&self) -> &str {
        CORE_SECTION
    }

    fn params(&self) -> ParamSpec {
        ParamSpec::new()
            .required(CORE_DONOR)
            .required(CORE_PROJECT)
            .optional(CORE_AUTHOR, DEFAULT_AUTHOR)
            .optional(CORE_REPORT_VERSION, 1)
            .optional(CORE_DOCUMENT_TYPES, DEFAULT_DOCUMENT_TYPES)
            .discovered(CORE_REPORT_ID)
    }

    fn configure(&self, _config: &Configuration, mut section: ConfigSection) -> Result<ConfigSection> {
        self.params().apply_defaults(&mut section);

        // Left unset when the donor is missing, so the final key check names the donor.
        if !section.is_set(CORE_REPORT_ID) && section.is_set(CORE_DONOR) {
            let report_id = format!(
                "{}-v{}",
                section.get(CORE_DONOR).unwrap_or_default(),
                section.get(CORE_REPORT_VERSION).unwrap_or("1")
            );
            debug!("Discovered report id {report_id}");
            section.set(CORE_REPORT_ID, report_id);
        }
        Ok(section)
    }
}

//! Global constants used throughout the Mosaic codebase.
//!
//! Section names, reserved configuration keys, default priorities and the
//! file-naming conventions shared by the orchestrator, components and the
//! document patch engine live here so they are discoverable in one place.

/// Name of the reserved core section. Never resolved through the registry.
pub const CORE_SECTION: &str = "core";

/// Identifier suffix marking a helper component.
pub const HELPER_SUFFIX: &str = "_helper";

/// Identifier suffix marking a merger component.
pub const MERGER_SUFFIX: &str = "_merger";

/// Placeholder written into generated configuration templates.
///
/// A value equal to this placeholder is treated as absent by the
/// configuration merger.
pub const REQUIRED_PLACEHOLDER: &str = "REQUIRED";

// Reserved keys understood by every component section.
pub const CONFIGURE_PRIORITY: &str = "configure_priority";
pub const EXTRACT_PRIORITY: &str = "extract_priority";
pub const RENDER_PRIORITY: &str = "render_priority";
pub const DEPENDS_CONFIGURE: &str = "depends_configure";
pub const DEPENDS_EXTRACT: &str = "depends_extract";
pub const ATTRIBUTES: &str = "attributes";

/// Default priority for any phase a component does not override.
pub const DEFAULT_PRIORITY: i64 = 10_000;

/// Default render priority for mergers.
pub const DEFAULT_MERGER_PRIORITY: i64 = 300;

/// Default attributes for mergers.
pub const DEFAULT_MERGER_ATTRIBUTES: &str = "clinical,supplementary";

/// Attribute values a section may carry.
pub const ATTRIBUTE_CLINICAL: &str = "clinical";
pub const ATTRIBUTE_SUPPLEMENTARY: &str = "supplementary";
pub const ATTRIBUTE_RESEARCH: &str = "research";
pub const ATTRIBUTE_FAILED: &str = "failed";

/// Every recognised attribute value.
pub const KNOWN_ATTRIBUTES: [&str; 4] = [
    ATTRIBUTE_CLINICAL,
    ATTRIBUTE_SUPPLEMENTARY,
    ATTRIBUTE_RESEARCH,
    ATTRIBUTE_FAILED,
];

// Core section keys.
pub const CORE_DONOR: &str = "donor";
pub const CORE_PROJECT: &str = "project";
pub const CORE_AUTHOR: &str = "author";
pub const CORE_REPORT_VERSION: &str = "report_version";
pub const CORE_REPORT_ID: &str = "report_id";
pub const CORE_DOCUMENT_TYPES: &str = "document_types";

pub const DEFAULT_AUTHOR: &str = "Unknown Author";
pub const DEFAULT_DOCUMENT_TYPES: &str = "clinical,research";

/// Conventional workspace file holding discovered sample parameters.
pub const SAMPLE_PARAMS_FILENAME: &str = "sample_params.json";

/// Separator attribute opening a component section in a composite document.
pub const SECTION_START_ATTR: &str = "data-component-start";

/// Separator attribute closing a component section in a composite document.
pub const SECTION_END_ATTR: &str = "data-component-end";

// Environment variables substituted into configuration values.
pub const ENV_DATA_DIR: &str = "MOSAIC_DATA_DIR";
pub const ENV_PRIVATE_DIR: &str = "MOSAIC_PRIVATE_DIR";
pub const ENV_TEST_DIR: &str = "MOSAIC_TEST_DIR";

/// Environment variable overriding the settings file location.
pub const ENV_CONFIG: &str = "MOSAIC_CONFIG";

/// Version of the plugin payload contract emitted by the built-in plugins.
pub const PAYLOAD_SCHEMA_VERSION: &str = "1.0";

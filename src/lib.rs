//! Mosaic - a component orchestrator for clinical genomics reports
//!
//! A report is assembled from independently developed components. Each one
//! declares its configuration parameters, extracts its data into a
//! schema-checked payload and renders an HTML section. The orchestrator
//! runs them in three phases and combines the sections into one document per
//! document type.
//!
//! # Architecture Overview
//!
//! A run moves through three phases:
//!
//! 1. **Configure** - the user's INI-style TOML is completed: defaults are
//!    applied, discovered values filled in and required keys checked before
//!    any data is touched.
//! 2. **Extract** - helpers write files to a shared workspace, plugins build
//!    payloads. Each payload is validated against the plugin schema and the
//!    plugin's own results schema. Contributions to mergers ride along in
//!    the payload.
//! 3. **Render** - plugins and mergers render HTML, sections are grouped by
//!    attribute into documents and every section is wrapped in separator
//!    tags so a single section can later be patched in place.
//!
//! Components come in three kinds, told apart by identifier suffix:
//!
//! - **Plugins** produce a section of their own
//! - **Helpers** (`*_helper`) prepare shared data for other components
//! - **Mergers** (`*_merger`) combine records contributed by many plugins
//!   into one deduplicated, sorted table
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration model, settings and the configuration merger
//! - [`core`] - Component traits, run context and error handling
//! - [`registry`] - Identifier to component resolution
//! - [`components`] - Built-in components
//! - [`orchestrator`] - Phase execution and ordering
//! - [`payload`] - Plugin payloads and the stored report data
//! - [`schema`] - JSON Schema validation of payloads and contributions
//! - [`merge`] - Merger contracts, deduplication and built-in mergers
//! - [`render`] - Templates and document assembly
//! - [`patch`] - Section separators, document patching and encoding
//! - [`workspace`] - Per-component file storage
//! - [`constants`] - Reserved keys and defaults
//!
//! # Configuration Format
//!
//! ```toml
//! [core]
//! donor = "PANX_1249"
//! project = "PASS01"
//! document_types = "clinical,research"
//!
//! [sample_params_helper]
//! oncotree_code = "paad"
//! purity = "0.62"
//!
//! [case_overview]
//! depends_extract = "sample_params_helper"
//!
//! [findings]
//! findings_file = "$MOSAIC_DATA_DIR/findings.json"
//! attributes = "clinical"
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Show what is available
//! mosaic setup --list
//!
//! # Start a configuration
//! mosaic setup --components case_overview,findings --out report.toml
//!
//! # Run every phase
//! mosaic report report.toml --out-dir reports/
//!
//! # Phase by phase
//! mosaic extract report.toml --out data.json
//! mosaic render data.json --out-dir reports/
//!
//! # Re-render one section of an existing report
//! mosaic update data.json --component findings --out-dir reports/
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

pub mod components;
pub mod orchestrator;
pub mod registry;

pub mod merge;
pub mod payload;
pub mod schema;

pub mod patch;
pub mod render;
pub mod workspace;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

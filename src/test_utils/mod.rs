//! Test utilities for Mosaic
//!
//! Helpers shared by unit and integration tests: logging setup, components
//! that record what the orchestrator asks of them, and input fixtures.
//!
//! # Example
//!
//! ```rust,no_run
//! use mosaic_report::registry::ComponentRegistry;
//! use mosaic_report::test_utils::{CallLog, register_recording_plugin};
//!
//! let log = CallLog::default();
//! let mut registry = ComponentRegistry::new();
//! register_recording_plugin(&mut registry, "alpha", &log, Vec::new()).unwrap();
//! ```

pub mod components;
pub mod fixtures;

pub use components::{
    BadPayload, CallLog, register_bad_plugin, register_recording_helper, register_recording_plugin,
};
pub use fixtures::{FINDINGS_JSON, minimal_config, sample_config, write_findings};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, else `RUST_LOG`. With neither, tests run silent.
///
/// ```bash
/// RUST_LOG=mosaic_report=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

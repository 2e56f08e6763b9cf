//! Core types shared by every part of Mosaic.
//!
//! - [`component`]: the phase model, component kinds, declared configuration
//!   keys and the traits plugins, helpers and mergers implement
//! - [`context`]: the run-scoped context created at the start of a run
//! - [`error`]: the typed error taxonomy and its user-facing presentation
//! - [`file_error`]: file operation context for workspace and report I/O

pub mod component;
pub mod context;
pub mod error;
pub mod file_error;

pub use component::{
    Component, ComponentContext, ComponentKind, Configurable, HelperComponent, KeyClass,
    MergerComponent, ParamSpec, Phase, PluginComponent,
};
pub use context::RunContext;
pub use error::{ErrorContext, MosaicError, ResolutionFailure, Result, user_friendly_error};
pub use file_error::{FileOperation, FileOperationError, FileResultExt};

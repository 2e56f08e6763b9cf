//! Error handling for Mosaic
//!
//! Errors come in two layers, the same way the CLI presents them:
//! 1. [`MosaicError`], a strongly typed enum that callers can branch on
//!    exhaustively. Every failure class the orchestrator can raise has its
//!    own variant.
//! 2. [`ErrorContext`], which wraps a [`MosaicError`] with a user-facing
//!    suggestion and details for terminal display.
//!
//! # Error Categories
//!
//! - **Resolution**: [`MosaicError::ComponentResolution`]
//! - **Configuration**: [`MosaicError::MissingConfigKey`],
//!   [`MosaicError::InvalidConfigValue`], [`MosaicError::ConfigParse`],
//!   [`MosaicError::DependencyOrder`]
//! - **Contract**: [`MosaicError::SchemaViolation`],
//!   [`MosaicError::MalformedContribution`], [`MosaicError::UnknownTier`]
//! - **Document integrity**: [`MosaicError::MismatchedSeparator`],
//!   [`MosaicError::UnterminatedSection`], [`MosaicError::NestedSeparator`],
//!   [`MosaicError::MalformedSeparator`], [`MosaicError::SectionNotFound`],
//!   [`MosaicError::DuplicateSection`], [`MosaicError::DocumentEncoding`]
//!
//! All of them are fatal for the run. Failures raised while a component is
//! executing are wrapped in [`MosaicError::PhaseFailed`], which names the
//! component and the phase; [`MosaicError::root`] recovers the original.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mosaic_report::core::{MosaicError, user_friendly_error};
//!
//! let error = MosaicError::MissingConfigKey {
//!     section: "case_overview".to_string(),
//!     key: "oncotree_code".to_string(),
//! };
//! user_friendly_error(anyhow::Error::from(error)).display();
//! ```

use crate::core::component::{ComponentKind, Phase};
use crate::core::file_error::FileOperationError;
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Result alias used by the orchestration core.
pub type Result<T, E = MosaicError> = std::result::Result<T, E>;

/// Why a component identifier could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// The identifier is reserved and never resolved through the registry.
    Reserved,
    /// Nothing is registered under the identifier.
    Unknown {
        /// Closest registered identifiers, best first.
        suggestions: Vec<String>,
    },
    /// Something is registered, but it is not the kind the caller needs.
    MissingCapability {
        expected: ComponentKind,
        found: ComponentKind,
    },
    /// The identifier is empty or contains characters outside `[A-Za-z0-9_.-]`.
    UnrecognizedKind,
    /// The naming convention of the identifier disagrees with the kind it was
    /// registered as.
    KindMismatch {
        registered: ComponentKind,
        by_name: ComponentKind,
    },
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved => write!(f, "the identifier is reserved for the core section"),
            Self::Unknown {
                suggestions,
            } if suggestions.is_empty() => write!(f, "no component is registered under this name"),
            Self::Unknown {
                suggestions,
            } => write!(
                f,
                "no component is registered under this name (did you mean {}?)",
                suggestions.join(", ")
            ),
            Self::MissingCapability {
                expected,
                found,
            } => write!(
                f,
                "expected a {expected} providing {}, found a {found}",
                expected.capabilities().join("+")
            ),
            Self::UnrecognizedKind => write!(
                f,
                "identifiers must be non-empty and use only letters, digits, '_', '-' or '.'"
            ),
            Self::KindMismatch {
                registered,
                by_name,
            } => write!(f, "registered as a {registered} but named like a {by_name}"),
        }
    }
}

/// The main error type for Mosaic operations.
#[derive(Error, Debug)]
pub enum MosaicError {
    /// A component identifier could not be turned into a usable component.
    #[error("Cannot resolve component '{identifier}': {failure}")]
    ComponentResolution {
        identifier: String,
        failure: ResolutionFailure,
    },

    /// A required or discovered key is absent after configuration.
    #[error("Missing configuration key '{key}' in section [{section}]")]
    MissingConfigKey {
        section: String,
        key: String,
    },

    /// A configuration value could not be interpreted.
    #[error("Invalid value '{value}' for [{section}] {key}: expected {expected}")]
    InvalidConfigValue {
        section: String,
        key: String,
        value: String,
        expected: String,
    },

    /// The configuration document itself is malformed.
    #[error("Failed to parse configuration {source_name}: {reason}")]
    ConfigParse {
        /// File path, or a description of where the text came from.
        source_name: String,
        reason: String,
    },

    /// A declared dependency does not run before the dependent component.
    #[error("Component '{identifier}' depends on [{}] which must precede it in the {phase} phase", missing.join(", "))]
    DependencyOrder {
        identifier: String,
        phase: Phase,
        missing: Vec<String>,
    },

    /// A payload or contribution record failed JSON Schema validation.
    #[error("Schema violation in '{subject}' at {path}: {message}")]
    SchemaViolation {
        /// Component identifier or merger record being validated.
        subject: String,
        path: String,
        message: String,
        /// Total number of violations found; only the first is reported in full.
        count: usize,
    },

    /// The schema itself could not be compiled.
    #[error("Invalid schema for '{subject}': {message}")]
    InvalidSchema {
        subject: String,
        message: String,
    },

    /// A contribution record lacks a field its merger relies on.
    #[error("Malformed contribution to '{merger}': missing field '{field}' in {record}")]
    MalformedContribution {
        merger: String,
        field: String,
        record: String,
    },

    /// A categorical field carries a value outside its declared ranking.
    #[error("Unknown tier '{value}' for field '{field}' in '{merger}'")]
    UnknownTier {
        merger: String,
        field: String,
        value: String,
    },

    /// An end separator names a different section than the open one.
    #[error("Separator mismatch: section '{opened}' closed by end tag for '{closed}'")]
    MismatchedSeparator {
        opened: String,
        closed: String,
    },

    /// The document ends while a replaced section is still open.
    #[error("Section '{name}' is never closed")]
    UnterminatedSection {
        name: String,
    },

    /// A start separator appears inside an open section.
    #[error("Section '{inner}' starts inside section '{outer}'")]
    NestedSeparator {
        outer: String,
        inner: String,
    },

    /// A line carries a separator attribute but is not a well-formed tag.
    #[error("Malformed separator tag on line {line}: {text}")]
    MalformedSeparator {
        line: usize,
        text: String,
    },

    /// A replacement was requested for a section the document does not contain.
    #[error("Section '{name}' does not appear in the document")]
    SectionNotFound {
        name: String,
    },

    /// Two rendered sections claim the same identifier.
    #[error("Section '{name}' appears more than once")]
    DuplicateSection {
        name: String,
    },

    /// Stored document text could not be decoded or encoded.
    #[error("Document encoding error: {reason}")]
    DocumentEncoding {
        reason: String,
    },

    /// A Tera template failed to parse or render.
    #[error("Template '{name}' failed: {reason}")]
    Template {
        name: String,
        reason: String,
    },

    /// Workspace or report file I/O failed.
    #[error(transparent)]
    File(#[from] FileOperationError),

    /// A workspace path escapes its component directory or is unusable.
    #[error("Invalid workspace path '{path}': {reason}")]
    InvalidWorkspacePath {
        path: String,
        reason: String,
    },

    /// Report data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A component failed while executing one of its phases.
    #[error("Component '{identifier}' failed during {phase}: {source}")]
    PhaseFailed {
        identifier: String,
        phase: Phase,
        #[source]
        source: Box<MosaicError>,
    },

    /// Component-specific failure with a free-form message.
    #[error("{message}")]
    Other {
        message: String,
    },
}

impl MosaicError {
    /// Wrap this error as a failure of `identifier` in `phase`.
    ///
    /// Errors that already carry phase context are returned unchanged.
    #[must_use]
    pub fn in_phase(self, identifier: &str, phase: Phase) -> Self {
        match self {
            Self::PhaseFailed {
                ..
            } => self,
            other => Self::PhaseFailed {
                identifier: identifier.to_string(),
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through [`MosaicError::PhaseFailed`].
    pub fn root(&self) -> &MosaicError {
        match self {
            Self::PhaseFailed {
                source,
                ..
            } => source.root(),
            other => other,
        }
    }

    /// Shorthand for [`MosaicError::Other`].
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Error context wrapper that carries user-facing guidance.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: MosaicError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: MosaicError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with actionable suggestions.
///
/// [`MosaicError`]s anywhere in the chain get tailored guidance; anything
/// else is reported with its full cause chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(mosaic_error) = cause.downcast_ref::<MosaicError>() {
            let context = create_error_context(mosaic_error);
            let outer = error.to_string();
            let inner = mosaic_error.to_string();
            return if outer == inner {
                context
            } else {
                ErrorContext {
                    details: Some(match context.details {
                        Some(details) => format!("{outer}\n{details}"),
                        None => outer,
                    }),
                    ..context
                }
            };
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(MosaicError::Other {
        message,
    })
}

/// Rebuild a [`MosaicError`] for display, keeping its message.
///
/// `MosaicError` holds non-clonable sources, so the display copy flattens
/// those into [`MosaicError::Other`] while preserving everything else.
fn display_copy(error: &MosaicError) -> MosaicError {
    match error {
        MosaicError::MissingConfigKey {
            section,
            key,
        } => MosaicError::MissingConfigKey {
            section: section.clone(),
            key: key.clone(),
        },
        MosaicError::ComponentResolution {
            identifier,
            failure,
        } => MosaicError::ComponentResolution {
            identifier: identifier.clone(),
            failure: failure.clone(),
        },
        other => MosaicError::Other {
            message: other.to_string(),
        },
    }
}

fn create_error_context(error: &MosaicError) -> ErrorContext {
    let context = ErrorContext::new(display_copy(error));
    match error.root() {
        MosaicError::ComponentResolution {
            failure: ResolutionFailure::Unknown {
                ..
            },
            ..
        } => context
            .with_suggestion("Check the section name in your configuration against the registered components")
            .with_details("Run 'mosaic setup --list' to print every registered component identifier"),
        MosaicError::ComponentResolution {
            ..
        } => context.with_suggestion(
            "Helpers must end in '_helper', mergers in '_merger'; the 'core' section is reserved",
        ),
        MosaicError::MissingConfigKey {
            section,
            key,
        } => context
            .with_suggestion(format!("Add '{key} = ...' to the [{section}] section of your configuration"))
            .with_details("Required keys have no default and discovered keys could not be computed"),
        MosaicError::InvalidConfigValue {
            ..
        }
        | MosaicError::ConfigParse {
            ..
        } => context.with_suggestion("Check the TOML syntax and value types in your configuration"),
        MosaicError::DependencyOrder {
            phase,
            ..
        } => context.with_suggestion(format!(
            "Lower the {} of the dependencies or raise the dependent's so it runs later",
            phase.priority_key()
        )),
        MosaicError::SchemaViolation {
            count,
            ..
        } => context
            .with_suggestion("Fix the component so its output matches the payload schema")
            .with_details(format!("{count} schema violation(s) found")),
        MosaicError::MalformedContribution {
            ..
        }
        | MosaicError::UnknownTier {
            ..
        } => context.with_suggestion(
            "Check the merge inputs produced by the contributing plugins",
        ),
        MosaicError::MismatchedSeparator {
            ..
        }
        | MosaicError::UnterminatedSection {
            ..
        }
        | MosaicError::NestedSeparator {
            ..
        }
        | MosaicError::MalformedSeparator {
            ..
        }
        | MosaicError::SectionNotFound {
            ..
        }
        | MosaicError::DuplicateSection {
            ..
        } => context
            .with_suggestion("Re-render the full report instead of updating the stored document")
            .with_details("The stored document's section markers are not well formed"),
        MosaicError::File(file_error) => {
            context.with_details(file_error.user_message())
        }
        _ => context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = MosaicError::MissingConfigKey {
            section: "case_overview".to_string(),
            key: "oncotree_code".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Missing configuration key 'oncotree_code' in section [case_overview]"
        );

        let error = MosaicError::MismatchedSeparator {
            opened: "a".to_string(),
            closed: "b".to_string(),
        };
        assert_eq!(error.to_string(), "Separator mismatch: section 'a' closed by end tag for 'b'");
    }

    #[test]
    fn test_resolution_failure_display() {
        let error = MosaicError::ComponentResolution {
            identifier: "gene_info_merger".to_string(),
            failure: ResolutionFailure::Unknown {
                suggestions: vec!["gene_information_merger".to_string()],
            },
        };
        assert!(error.to_string().contains("did you mean gene_information_merger?"));

        let failure = ResolutionFailure::MissingCapability {
            expected: ComponentKind::Plugin,
            found: ComponentKind::Merger,
        };
        assert_eq!(
            failure.to_string(),
            "expected a plugin providing configure+extract+render, found a merger"
        );
    }

    #[test]
    fn test_in_phase_wraps_once() {
        let error = MosaicError::other("boom").in_phase("findings", Phase::Extract);
        let error = error.in_phase("other", Phase::Render);
        match &error {
            MosaicError::PhaseFailed {
                identifier,
                phase,
                ..
            } => {
                assert_eq!(identifier, "findings");
                assert_eq!(*phase, Phase::Extract);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(error.root(), MosaicError::Other { message } if message == "boom"));
    }

    #[test]
    fn test_user_friendly_error_for_missing_key() {
        let error = MosaicError::MissingConfigKey {
            section: "findings".to_string(),
            key: "findings_file".to_string(),
        };
        let ctx = user_friendly_error(anyhow::Error::from(error));
        assert!(ctx.suggestion.unwrap().contains("findings_file"));
        assert!(matches!(ctx.error, MosaicError::MissingConfigKey { .. }));
    }

    #[test]
    fn test_user_friendly_error_for_wrapped_failure() {
        let error = MosaicError::UnknownTier {
            merger: "treatment_options_merger".to_string(),
            field: "tier".to_string(),
            value: "Experimental".to_string(),
        }
        .in_phase("treatment_options_merger", Phase::Render);
        let ctx = user_friendly_error(anyhow::Error::from(error));
        assert!(ctx.to_string().contains("Experimental"));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_user_friendly_error_generic_chain() {
        let error = anyhow::anyhow!("inner").context("outer");
        let ctx = user_friendly_error(error);
        let message = ctx.to_string();
        assert!(message.contains("outer"));
        assert!(message.contains("Caused by:"));
        assert!(message.contains("inner"));
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(MosaicError::other("failed"))
            .with_details("some details")
            .with_suggestion("try again");
        assert_eq!(ctx.to_string(), "failed\nDetails: some details\nSuggestion: try again");
    }
}

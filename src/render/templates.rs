//! Tera rendering for built-in section and document templates.
//!
//! Templates are embedded at compile time and registered under `.html` names,
//! so Tera auto-escapes every interpolated value. Values that are already
//! HTML (gene summaries with markup added by a merger, nested fragments) are
//! passed through the `safe` filter in the template.

use crate::core::error::{MosaicError, Result};
use serde::Serialize;
use tera::{Context as TeraContext, Tera};
use tracing::debug;

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("document_header.html", include_str!("templates/document_header.html")),
    ("document_footer.html", include_str!("templates/document_footer.html")),
    ("case_overview.html", include_str!("templates/case_overview.html")),
    ("findings.html", include_str!("templates/findings.html")),
    ("gene_information.html", include_str!("templates/gene_information.html")),
    ("treatment_options.html", include_str!("templates/treatment_options.html")),
];

pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// A renderer with every built-in template registered.
    pub fn builtin() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied()).map_err(|e| MosaicError::Template {
            name: "built-in templates".to_string(),
            reason: format_tera_error(&e),
        })?;
        Ok(Self {
            tera,
        })
    }

    /// Render the registered template `name` with `data` as its context.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        debug!("Rendering template {name}");
        let context = TeraContext::from_serialize(data).map_err(|e| MosaicError::Template {
            name: name.to_string(),
            reason: format_tera_error(&e),
        })?;
        self.tera.render(name, &context).map_err(|e| MosaicError::Template {
            name: name.to_string(),
            reason: format_tera_error(&e),
        })
    }

    /// Render an ad-hoc template string (no auto-escaping).
    pub fn render_str<T: Serialize>(name: &str, template: &str, data: &T) -> Result<String> {
        let context = TeraContext::from_serialize(data).map_err(|e| MosaicError::Template {
            name: name.to_string(),
            reason: format_tera_error(&e),
        })?;
        let mut tera = Tera::default();
        tera.render_str(template, &context).map_err(|e| MosaicError::Template {
            name: name.to_string(),
            reason: format_tera_error(&e),
        })
    }
}

/// Flatten a Tera error chain into one readable message.
pub fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = vec![error.to_string()];
    let mut current: Option<&dyn Error> = error.source();
    while let Some(err) = current {
        messages.push(err.to_string());
        current = err.source();
    }

    messages
        .into_iter()
        .map(|msg| msg.replace("'__tera_one_off'", "template").trim().to_string())
        .filter(|msg| !msg.is_empty())
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_templates_parse() {
        assert!(TemplateRenderer::builtin().is_ok());
    }

    #[test]
    fn test_values_are_escaped() {
        let renderer = TemplateRenderer::builtin().unwrap();
        let html = renderer
            .render(
                "findings.html",
                &json!({"alterations": [{
                    "gene": "<b>TP53</b>",
                    "alteration": "R175H",
                    "alteration_type": "mutation",
                    "gene_url": "https://www.oncokb.org/gene/TP53",
                }]}),
            )
            .unwrap();
        assert!(html.contains("&lt;b&gt;TP53&lt;&#x2F;b&gt;"));
    }

    #[test]
    fn test_render_str_reports_missing_variable() {
        let err = TemplateRenderer::render_str("inline", "{{ missing }}", &json!({})).unwrap_err();
        match err {
            MosaicError::Template {
                name,
                reason,
            } => {
                assert_eq!(name, "inline");
                assert!(reason.contains("missing"));
                assert!(!reason.contains("__tera_one_off"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

//! Composite document assembly.
//!
//! Rendered sections are grouped into one document per document type listed
//! in the core section. A section belongs to document type `T` when its
//! attributes contain `T`. Within a document, sections follow component
//! order: ascending render priority, ties broken by identifier. Each
//! section is wrapped in its separator pair so the document can be patched
//! later.

pub mod templates;

use crate::core::error::{MosaicError, Result};
use crate::patch::wrap_section;
use crate::payload::CorePayload;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use templates::TemplateRenderer;
use tracing::{debug, info};

/// One rendered section and the settings deciding where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub identifier: String,
    pub render_priority: i64,
    pub attributes: Vec<String>,
    pub html: String,
}

impl Section {
    pub fn belongs_to(&self, document_type: &str) -> bool {
        self.attributes.iter().any(|a| a == document_type)
    }
}

/// Sort `sections` into component order.
pub fn sort_sections(sections: &mut [Section]) {
    sections.sort_by(|a, b| {
        a.render_priority.cmp(&b.render_priority).then_with(|| a.identifier.cmp(&b.identifier))
    });
}

/// Build one document per document type. Types with no sections are omitted.
pub fn assemble_documents(core: &CorePayload, sections: &[Section]) -> Result<BTreeMap<String, String>> {
    let mut seen = BTreeSet::new();
    for section in sections {
        if !seen.insert(section.identifier.as_str()) {
            return Err(MosaicError::DuplicateSection {
                name: section.identifier.clone(),
            });
        }
    }

    let mut ordered = sections.to_vec();
    sort_sections(&mut ordered);

    let renderer = TemplateRenderer::builtin()?;
    let mut documents = BTreeMap::new();
    for document_type in &core.document_types {
        match assemble_document(&renderer, core, document_type, &ordered)? {
            Some(html) => {
                documents.insert(document_type.clone(), html);
            }
            None => info!("No sections for document type '{document_type}', skipping"),
        }
    }
    Ok(documents)
}

/// Assemble the `document_type` document from sections already in component order.
pub fn assemble_document(
    renderer: &TemplateRenderer,
    core: &CorePayload,
    document_type: &str,
    ordered: &[Section],
) -> Result<Option<String>> {
    let body: Vec<String> = ordered
        .iter()
        .filter(|section| section.belongs_to(document_type))
        .map(|section| wrap_section(&section.identifier, &section.html))
        .collect();
    if body.is_empty() {
        return Ok(None);
    }
    debug!("Assembling {document_type} document with {} sections", body.len());

    let context = json!({
        "core": core,
        "document_type": document_type,
        "title": title(document_type),
    });
    let header = renderer.render("document_header.html", &context)?;
    let footer = renderer.render("document_footer.html", &context)?;

    Ok(Some(format!(
        "{}\n{}\n{}",
        header.trim_end_matches('\n'),
        body.join("\n"),
        footer.trim_end_matches('\n')
    )))
}

fn title(document_type: &str) -> String {
    let mut chars = document_type.chars();
    match chars.next() {
        Some(first) => format!("{}{} Report", first.to_uppercase(), chars.as_str()),
        None => "Report".to_string(),
    }
}

//! Partial re-render of stored documents.
//!
//! A composite document wraps every section in a pair of separator tags,
//! each on a line of its own:
//!
//! ```html
//! <span data-component-start="findings" />
//! <section class="findings">...</section>
//! <span data-component-end="findings" />
//! ```
//!
//! [`patch_document`] walks the lines with a two-state machine (outside any
//! section, or inside a named one) and swaps the lines of each replaced
//! section, tags included, for the new fragment wrapped in fresh tags.
//! Sections that are not replaced are copied through untouched, so patching
//! with an empty map returns the input unchanged.
//!
//! Any line that mentions `data-component-start` or `data-component-end` is
//! read as a separator and must be a well-formed tag. Component templates
//! must not emit those attribute names anywhere else, not even in prose or
//! comments, or the document is rejected as malformed.

pub mod codec;

use crate::constants::{SECTION_END_ATTR, SECTION_START_ATTR};
use crate::core::error::{MosaicError, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A parsed separator line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Separator {
    Start(String),
    End(String),
}

enum State {
    Outside,
    Inside {
        name: String,
        replaced: bool,
    },
}

pub fn start_tag(name: &str) -> String {
    format!("<span {SECTION_START_ATTR}=\"{name}\" />")
}

pub fn end_tag(name: &str) -> String {
    format!("<span {SECTION_END_ATTR}=\"{name}\" />")
}

/// `html` between the separator pair for `name`.
pub fn wrap_section(name: &str, html: &str) -> String {
    format!("{}\n{}\n{}", start_tag(name), html.trim_end_matches('\n'), end_tag(name))
}

/// Parse `line` as a separator.
///
/// Lines that mention neither separator attribute are content. Lines that do
/// must be exactly one well-formed tag, otherwise they are
/// [`MosaicError::MalformedSeparator`].
pub fn parse_separator(line_number: usize, line: &str) -> Result<Option<Separator>> {
    let text = line.trim();
    if !text.contains(SECTION_START_ATTR) && !text.contains(SECTION_END_ATTR) {
        return Ok(None);
    }

    let malformed = || MosaicError::MalformedSeparator {
        line: line_number,
        text: line.to_string(),
    };
    let inner = text
        .strip_prefix("<span ")
        .and_then(|rest| rest.strip_suffix("/>"))
        .map(str::trim_end)
        .ok_or_else(malformed)?;

    let (attr, value) = inner.split_once('=').ok_or_else(malformed)?;
    let name = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .filter(|name| is_section_name(name))
        .ok_or_else(malformed)?;

    match attr {
        SECTION_START_ATTR => Ok(Some(Separator::Start(name.to_string()))),
        SECTION_END_ATTR => Ok(Some(Separator::End(name.to_string()))),
        _ => Err(malformed()),
    }
}

fn is_section_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Names of the sections in `html`, in document order, checking structure.
pub fn section_names(html: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    walk(html, &BTreeMap::new(), |_| {}, |name| names.push(name.to_string()))?;
    Ok(names)
}

/// Replace the sections named in `replacements` with new fragments.
pub fn patch_document(html: &str, replacements: &BTreeMap<String, String>) -> Result<String> {
    if replacements.is_empty() {
        return Ok(html.to_string());
    }

    let mut output: Vec<String> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    walk(html, replacements, |line| output.push(line.to_string()), |name| {
        seen.insert(name.to_string());
    })?;

    if let Some(name) = replacements.keys().find(|name| !seen.contains(*name)) {
        return Err(MosaicError::SectionNotFound {
            name: name.clone(),
        });
    }
    debug!("Patched {} section(s)", replacements.len());
    Ok(output.join("\n"))
}

/// Patch a stored, encoded document and re-encode it.
pub fn patch_encoded(encoded: &str, replacements: &BTreeMap<String, String>) -> Result<String> {
    if replacements.is_empty() {
        return Ok(encoded.to_string());
    }
    let html = codec::decode(encoded)?;
    codec::encode(&patch_document(&html, replacements)?)
}

/// Run the separator state machine over `html`.
///
/// `emit` receives every output line, with replaced sections already
/// substituted. `on_section` is called once per section start.
fn walk(
    html: &str,
    replacements: &BTreeMap<String, String>,
    mut emit: impl FnMut(&str),
    mut on_section: impl FnMut(&str),
) -> Result<()> {
    let mut state = State::Outside;
    let mut names: BTreeSet<String> = BTreeSet::new();

    for (index, line) in html.split('\n').enumerate() {
        let separator = parse_separator(index + 1, line)?;
        state = match (state, separator) {
            (State::Outside, None) => {
                emit(line);
                State::Outside
            }
            (State::Outside, Some(Separator::Start(name))) => {
                if !names.insert(name.clone()) {
                    return Err(MosaicError::DuplicateSection {
                        name,
                    });
                }
                on_section(&name);
                let replaced = match replacements.get(&name) {
                    Some(fragment) => {
                        for new_line in wrap_section(&name, fragment).split('\n') {
                            emit(new_line);
                        }
                        true
                    }
                    None => {
                        emit(line);
                        false
                    }
                };
                State::Inside {
                    name,
                    replaced,
                }
            }
            (State::Outside, Some(Separator::End(closed))) => {
                return Err(MosaicError::MismatchedSeparator {
                    opened: "(none)".to_string(),
                    closed,
                });
            }
            (State::Inside { name, replaced }, None) => {
                if !replaced {
                    emit(line);
                }
                State::Inside {
                    name,
                    replaced,
                }
            }
            (State::Inside { name, .. }, Some(Separator::Start(inner))) => {
                return Err(MosaicError::NestedSeparator {
                    outer: name,
                    inner,
                });
            }
            (State::Inside { name, replaced }, Some(Separator::End(closed))) => {
                if closed != name {
                    return Err(MosaicError::MismatchedSeparator {
                        opened: name,
                        closed,
                    });
                }
                if !replaced {
                    emit(line);
                }
                State::Outside
            }
        };
    }

    match state {
        State::Outside => Ok(()),
        State::Inside {
            name,
            ..
        } => Err(MosaicError::UnterminatedSection {
            name,
        }),
    }
}

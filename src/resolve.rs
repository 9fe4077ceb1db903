//! Identifier resolution and locator cross-checking.
//!
//! Identifiers are authoritative. A caller-supplied locator is used as-is
//! only when the identifier agrees with it or cannot be resolved at all.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::adapter::Document;
use crate::adapter::xlsx::is_cell_locator;
use crate::index::{build_structure, check_size};
use crate::placeholder::PlaceholderPatterns;
use crate::types::{
    Answer, DocumentKind, Expectation, FillOptions, ResolutionResult, ResolvedFrom,
};
use crate::{DocfillError, Result};

/// Something that names a location: an answer or an expectation.
pub(crate) trait Addressed {
    fn identifier(&self) -> &str;
    fn locator(&self) -> Option<&str>;
}

impl Addressed for Answer {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn locator(&self) -> Option<&str> {
        self.locator.as_deref().filter(|l| !l.trim().is_empty())
    }
}

impl Addressed for Expectation {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn locator(&self) -> Option<&str> {
        self.locator.as_deref().filter(|l| !l.trim().is_empty())
    }
}

/// Where one entry of a batch will be read or written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedTarget {
    pub locator: String,
    pub resolved_from: ResolvedFrom,
    pub warning: Option<String>,
}

fn mismatch_warning(identifier: &str, supplied: &str, resolved: &str) -> String {
    format!(
        "identifier '{identifier}': supplied locator '{supplied}' differs from resolved locator \
         '{resolved}'; using the resolved locator"
    )
}

/// Keep the entries of `id_to_locator` named by `identifiers`; unknown ones are omitted.
#[must_use]
pub fn filter_resolved<S: AsRef<str>>(
    id_to_locator: &BTreeMap<String, String>,
    identifiers: &[S],
) -> BTreeMap<String, String> {
    identifiers
        .iter()
        .filter_map(|id| {
            let id = id.as_ref();
            id_to_locator
                .get(id)
                .map(|locator| (id.to_string(), locator.clone()))
        })
        .collect()
}

/// Warn about every answer whose explicit locator disagrees with the locator
/// its identifier resolves to. Identity-mapped kinds are never compared.
#[must_use]
pub fn cross_check(
    kind: DocumentKind,
    answers: &[Answer],
    resolved: &BTreeMap<String, String>,
) -> Vec<String> {
    if kind.is_identity_mapped() {
        return Vec::new();
    }
    answers
        .iter()
        .filter_map(|answer| {
            let supplied = Addressed::locator(answer)?;
            let actual = resolved.get(&answer.identifier)?;
            (supplied != actual).then(|| mismatch_warning(&answer.identifier, supplied, actual))
        })
        .collect()
}

/// How a spreadsheet identifier that is not a cell reference is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MalformedCells {
    /// Fail with `UnresolvedIdentifier`.
    Reject,
    /// Pass the identifier through as its own locator.
    Keep,
}

/// Re-index `bytes` and map `identifiers` to locators.
pub(crate) fn resolve_identifiers<S: AsRef<str>>(
    bytes: &[u8],
    identifiers: &[S],
    options: &FillOptions,
) -> Result<ResolutionResult> {
    check_size(bytes, options)?;
    let patterns = PlaceholderPatterns::from_options(options)?;
    let document = Document::parse(bytes)?;
    let structure = build_structure(&document, bytes, &patterns, options);
    let resolved = filter_resolved(&structure.id_to_locator, identifiers);
    debug!(
        target: "docfill::resolve",
        requested = identifiers.len(),
        resolved = resolved.len(),
        "resolved identifiers"
    );
    Ok(ResolutionResult {
        resolved,
        warnings: Vec::new(),
    })
}

/// Resolve every `(batch index, entry)` pair against a parsed document.
///
/// Only flow documents and form entries without a locator need an index
/// pass; spreadsheet identifiers are their own locators.
pub(crate) fn resolve_targets<E: Addressed>(
    document: &Document,
    bytes: &[u8],
    entries: &[(usize, &E)],
    patterns: &PlaceholderPatterns,
    options: &FillOptions,
    malformed: MalformedCells,
) -> Result<Vec<ResolvedTarget>> {
    let kind = document.kind();
    let needs_index = match kind {
        DocumentKind::Flow => !entries.is_empty(),
        DocumentKind::Form => entries.iter().any(|(_, entry)| entry.locator().is_none()),
        DocumentKind::Spreadsheet => false,
    };
    let id_to_locator = if needs_index {
        build_structure(document, bytes, patterns, options).id_to_locator
    } else {
        BTreeMap::new()
    };

    let mut targets = Vec::with_capacity(entries.len());
    for &(index, entry) in entries {
        let identifier = entry.identifier();
        let supplied = entry.locator();
        let target = match kind {
            DocumentKind::Spreadsheet => match supplied {
                Some(locator) => ResolvedTarget {
                    locator: locator.to_string(),
                    resolved_from: ResolvedFrom::Locator,
                    warning: None,
                },
                None if malformed == MalformedCells::Reject && !is_cell_locator(identifier) => {
                    return Err(DocfillError::UnresolvedIdentifier {
                        index,
                        identifier: identifier.to_string(),
                    });
                }
                None => ResolvedTarget {
                    locator: identifier.to_string(),
                    resolved_from: ResolvedFrom::Identifier,
                    warning: None,
                },
            },
            DocumentKind::Form => match supplied {
                Some(locator) => ResolvedTarget {
                    locator: locator.to_string(),
                    resolved_from: ResolvedFrom::Locator,
                    warning: None,
                },
                None => ResolvedTarget {
                    locator: id_to_locator
                        .get(identifier)
                        .cloned()
                        .unwrap_or_else(|| identifier.to_string()),
                    resolved_from: ResolvedFrom::Identifier,
                    warning: None,
                },
            },
            DocumentKind::Flow => match (id_to_locator.get(identifier), supplied) {
                (Some(resolved), Some(locator)) if resolved == locator => ResolvedTarget {
                    locator: locator.to_string(),
                    resolved_from: ResolvedFrom::Locator,
                    warning: None,
                },
                (Some(resolved), Some(locator)) => {
                    let message = mismatch_warning(identifier, locator, resolved);
                    warn!(target: "docfill::resolve", %message, "locator cross-check failed");
                    ResolvedTarget {
                        locator: resolved.clone(),
                        resolved_from: ResolvedFrom::Identifier,
                        warning: Some(message),
                    }
                }
                (Some(resolved), None) => ResolvedTarget {
                    locator: resolved.clone(),
                    resolved_from: ResolvedFrom::Identifier,
                    warning: None,
                },
                (None, Some(locator)) => ResolvedTarget {
                    locator: locator.to_string(),
                    resolved_from: ResolvedFrom::Locator,
                    warning: None,
                },
                (None, None) => {
                    return Err(DocfillError::UnresolvedIdentifier {
                        index,
                        identifier: identifier.to_string(),
                    });
                }
            },
        };
        targets.push(target);
    }
    Ok(targets)
}

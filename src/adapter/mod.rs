//! Format adapters and the single dispatch point over them.
//!
//! Each adapter parses its container once, answers location queries against
//! the parsed form and applies fragments to it in place. [`Document`] is the
//! closed set of adapters; callers never see the concrete types.

pub(crate) mod docx;
pub(crate) mod pdf;
pub(crate) mod xlsx;
pub mod xlsx_styles;

use std::collections::BTreeMap;

use crate::constants::{DOCX_DOCUMENT_PART, XLSX_WORKBOOK_PART};
use crate::package::PackageReader;
use crate::placeholder::{PlaceholderMatcher, PlaceholderPatterns};
use crate::types::{
    ComplexElement, DocumentKind, FormattingProperties, InsertionMode, NativeFragment,
};
use crate::{DocfillError, Result};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const PDF_MAGIC: &[u8] = b"%PDF-";
/// PDF readers accept the header anywhere in the first kilobyte.
const PDF_HEADER_WINDOW: usize = 1024;

impl DocumentKind {
    /// Detect the kind of a document from its bytes.
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(DocfillError::UnsupportedFormat {
                reason: "document is empty".into(),
            });
        }
        let head = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
        if head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
            return Ok(Self::Form);
        }
        if bytes.starts_with(ZIP_MAGIC) {
            let package = PackageReader::open(bytes)?;
            if package.contains(DOCX_DOCUMENT_PART) {
                return Ok(Self::Flow);
            }
            if package.contains(XLSX_WORKBOOK_PART) {
                return Ok(Self::Spreadsheet);
            }
            return Err(DocfillError::UnsupportedFormat {
                reason: "zip package is neither a .docx nor an .xlsx document".into(),
            });
        }
        Err(DocfillError::UnsupportedFormat {
            reason: "expected a .docx, .xlsx or .pdf document".into(),
        })
    }
}

/// Settings that shape the compact rendering.
pub(crate) struct IndexContext<'a> {
    pub patterns: &'a PlaceholderPatterns,
    pub snippet_chars: usize,
}

/// What an adapter's index pass produces.
#[derive(Debug, Default)]
pub(crate) struct IndexParts {
    pub lines: Vec<String>,
    pub id_to_locator: BTreeMap<String, String>,
    pub complex_elements: Vec<ComplexElement>,
}

/// Result of applying one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApplyOutcome {
    Applied,
    TargetMissing,
    PlaceholderMissing,
}

/// A parsed document of one of the supported kinds.
pub(crate) enum Document {
    Flow(docx::FlowDocument),
    Spreadsheet(xlsx::SpreadsheetDocument),
    Form(pdf::FormDocument),
}

impl Document {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        match DocumentKind::detect(bytes)? {
            DocumentKind::Flow => docx::FlowDocument::parse(bytes).map(Self::Flow),
            DocumentKind::Spreadsheet => {
                xlsx::SpreadsheetDocument::parse(bytes).map(Self::Spreadsheet)
            }
            DocumentKind::Form => pdf::FormDocument::parse(bytes).map(Self::Form),
        }
    }

    pub(crate) fn kind(&self) -> DocumentKind {
        match self {
            Self::Flow(_) => DocumentKind::Flow,
            Self::Spreadsheet(_) => DocumentKind::Spreadsheet,
            Self::Form(_) => DocumentKind::Form,
        }
    }

    pub(crate) fn index(&self, ctx: &IndexContext<'_>) -> IndexParts {
        match self {
            Self::Flow(doc) => doc.index(ctx),
            Self::Spreadsheet(doc) => doc.index(),
            Self::Form(doc) => doc.index(),
        }
    }

    /// Whether `locator` addresses something. Malformed locators are errors.
    pub(crate) fn contains(&self, locator: &str) -> Result<bool> {
        match self {
            Self::Flow(doc) => doc.contains(locator),
            Self::Spreadsheet(doc) => doc.contains(locator),
            Self::Form(doc) => Ok(doc.contains(locator)),
        }
    }

    /// Current text at `locator`, `None` when it addresses nothing.
    pub(crate) fn text_at(&self, locator: &str) -> Result<Option<String>> {
        match self {
            Self::Flow(doc) => doc.text_at(locator),
            Self::Spreadsheet(doc) => doc.text_at(locator),
            Self::Form(doc) => Ok(doc.text_at(locator)),
        }
    }

    pub(crate) fn formatting_at(&self, locator: &str) -> Result<Option<FormattingProperties>> {
        match self {
            Self::Flow(doc) => doc.formatting_at(locator),
            Self::Spreadsheet(doc) => doc.formatting_at(locator),
            Self::Form(doc) => Ok(doc.formatting_at(locator)),
        }
    }

    pub(crate) fn apply(
        &mut self,
        locator: &str,
        fragment: &NativeFragment,
        mode: InsertionMode,
        matcher: PlaceholderMatcher<'_>,
    ) -> Result<ApplyOutcome> {
        match (self, fragment) {
            (Self::Flow(doc), NativeFragment::Ooxml(markup)) => {
                doc.apply(locator, markup, mode, matcher)
            }
            (Self::Spreadsheet(doc), NativeFragment::InlineString(markup)) => {
                doc.apply(locator, markup, mode, matcher)
            }
            (Self::Form(doc), NativeFragment::FieldValue(value)) => {
                doc.apply(locator, value, mode, matcher)
            }
            (doc, _) => Err(DocfillError::UnsupportedFormat {
                reason: format!("fragment kind does not match a {} document", doc.kind()),
            }),
        }
    }

    /// Integrity problems of the document structure (flow documents only).
    pub(crate) fn structural_issues(&self) -> Vec<String> {
        match self {
            Self::Flow(doc) => doc.structural_issues(),
            Self::Spreadsheet(_) | Self::Form(_) => Vec::new(),
        }
    }

    /// Serialize the document. `source` is the buffer it was parsed from.
    pub(crate) fn to_bytes(&mut self, source: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Flow(doc) => doc.to_bytes(source),
            Self::Spreadsheet(doc) => doc.to_bytes(source),
            Self::Form(doc) => doc.to_bytes(),
        }
    }
}

/// Whether `actual` contains `expected` under the kind's comparison rule.
pub(crate) fn text_matches(kind: DocumentKind, expected: &str, actual: &str) -> bool {
    match kind {
        DocumentKind::Flow => actual.contains(expected),
        DocumentKind::Spreadsheet | DocumentKind::Form => {
            actual.to_lowercase().contains(&expected.to_lowercase())
        }
    }
}

/// Trim `snippet` to `max_chars` characters, marking the cut.
pub(crate) fn truncate_snippet(snippet: &str, max_chars: usize) -> String {
    match snippet.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &snippet[..cut]),
        None => snippet.to_string(),
    }
}

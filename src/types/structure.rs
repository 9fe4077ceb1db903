//! Index output: the compact, addressable view of a document.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The three supported document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Word-processing documents (`.docx`).
    #[serde(alias = "word", alias = "docx")]
    Flow,
    /// Spreadsheets (`.xlsx`).
    #[serde(alias = "excel", alias = "xlsx")]
    Spreadsheet,
    /// Fixed-layout forms (AcroForm `.pdf`).
    #[serde(alias = "pdf")]
    Form,
}

impl DocumentKind {
    /// Transport label (`word`, `excel`, `pdf`).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Flow => "word",
            Self::Spreadsheet => "excel",
            Self::Form => "pdf",
        }
    }

    /// Parse a transport label or file extension.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "word" | "docx" | "flow" => Some(Self::Flow),
            "excel" | "xlsx" | "spreadsheet" => Some(Self::Spreadsheet),
            "pdf" | "form" => Some(Self::Form),
            _ => None,
        }
    }

    /// Whether the identifier is itself the native locator.
    #[must_use]
    pub fn is_identity_mapped(self) -> bool {
        !matches!(self, Self::Flow)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A location that could not be rendered as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexElement {
    pub identifier: String,
    pub locator: String,
    /// What made it complex: `sdt`, `fldChar`, `txbxContent`, `object`,
    /// `nested_table`, `gridSpan=N` or `vMerge`.
    pub kind: String,
}

/// Result of indexing one document snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactStructure {
    pub kind: DocumentKind,
    /// Human and model readable rendering, one line per location.
    pub compact_text: String,
    /// Identifier → native locator, in identifier order.
    pub id_to_locator: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complex_elements: Vec<ComplexElement>,
    /// BLAKE3 hex digest of the indexed bytes.
    pub source_digest: String,
}

impl CompactStructure {
    #[must_use]
    pub fn locator(&self, identifier: &str) -> Option<&str> {
        self.id_to_locator.get(identifier).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_locator.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_locator.is_empty()
    }

    #[must_use]
    pub fn is_complex(&self, identifier: &str) -> bool {
        self.complex_elements
            .iter()
            .any(|el| el.identifier == identifier)
    }
}

/// Identifier → locator mapping for one call, plus cross-check warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub resolved: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

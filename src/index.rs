//! Compact indexing of fillable locations.

use tracing::debug;

use crate::adapter::{Document, IndexContext};
use crate::placeholder::PlaceholderPatterns;
use crate::types::{CompactStructure, FillOptions};
use crate::{DocfillError, Result};

/// BLAKE3 hex digest of `bytes`.
#[must_use]
pub fn source_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

pub(crate) fn check_size(bytes: &[u8], options: &FillOptions) -> Result<()> {
    let size = bytes.len() as u64;
    if size > options.max_document_bytes {
        return Err(DocfillError::DocumentTooLarge {
            size,
            limit: options.max_document_bytes,
        });
    }
    Ok(())
}

/// Index an already parsed document.
pub(crate) fn build_structure(
    document: &Document,
    bytes: &[u8],
    patterns: &PlaceholderPatterns,
    options: &FillOptions,
) -> CompactStructure {
    let ctx = IndexContext {
        patterns,
        snippet_chars: options.snippet_chars,
    };
    let parts = document.index(&ctx);
    CompactStructure {
        kind: document.kind(),
        compact_text: parts.lines.join("\n"),
        id_to_locator: parts.id_to_locator,
        complex_elements: parts.complex_elements,
        source_digest: source_digest(bytes),
    }
}

/// Parse `bytes` and index every fillable location.
pub(crate) fn index_document(bytes: &[u8], options: &FillOptions) -> Result<CompactStructure> {
    check_size(bytes, options)?;
    let patterns = PlaceholderPatterns::from_options(options)?;
    let document = Document::parse(bytes)?;
    let structure = build_structure(&document, bytes, &patterns, options);
    debug!(
        target: "docfill::index",
        kind = %structure.kind,
        locations = structure.len(),
        complex = structure.complex_elements.len(),
        "indexed document"
    );
    Ok(structure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let digest = source_digest(b"abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, source_digest(b"abc"));
        assert_ne!(digest, source_digest(b"abd"));
    }

    #[test]
    fn oversized_documents_are_rejected_before_parsing() {
        let options = FillOptions::builder().max_document_bytes(4).build();
        let err = index_document(b"not a document", &options).unwrap_err();
        assert!(matches!(err, DocfillError::DocumentTooLarge { size: 14, limit: 4 }));
    }
}

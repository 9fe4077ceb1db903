//! Constants shared across the format adapters.

/// Reserved plain-text answer meaning "leave this location untouched".
///
/// Compared case-insensitively after trimming surrounding whitespace, so it can
/// never be written as a literal value.
pub const SKIP_SENTINEL: &str = "SKIP";

/// Default placeholder patterns recognised in template text.
pub const DEFAULT_PLACEHOLDER_PATTERNS: &[&str] = &[r"\[Enter[^\]]*\]", r"_{3,}"];

/// Default cap on answers per write/verify batch.
pub const DEFAULT_MAX_ANSWERS: usize = 500;
/// Default cap on input document size (50 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;
/// Default length of raw XML shown for complex elements in compact text.
pub const DEFAULT_SNIPPET_CHARS: usize = 500;

/// Marker appended to compact lines that look like answer slots.
pub const ANSWER_TARGET_MARKER: &str = " \u{2190} answer target";

/// Main part of a WordprocessingML package.
pub const DOCX_DOCUMENT_PART: &str = "word/document.xml";
/// Workbook part of a SpreadsheetML package.
pub const XLSX_WORKBOOK_PART: &str = "xl/workbook.xml";
pub const XLSX_WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub const XLSX_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
pub const XLSX_STYLES_PART: &str = "xl/styles.xml";

/// Values that switch a checkbox field on.
pub const CHECKBOX_TRUTHY_VALUES: &[&str] = &["true", "yes", "1", "checked", "on"];

/// Returns true when `text` is the skip sentinel.
#[must_use]
pub fn is_skip_sentinel(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(SKIP_SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_sentinel_ignores_case_and_padding() {
        assert!(is_skip_sentinel("SKIP"));
        assert!(is_skip_sentinel("  skip\n"));
        assert!(is_skip_sentinel("Skip"));
        assert!(!is_skip_sentinel("skipped"));
        assert!(!is_skip_sentinel(""));
    }
}

//! Fill and verify of AcroForm `.pdf` documents.

mod common;

use docfill_core::{
    Answer, ContentStatus, DocfillError, DocumentKind, Expectation, InsertionMode, ResolvedFrom,
    formatting_at, index, verify, write,
};

use common::intake_pdf;

#[test]
fn fields_are_listed_in_page_order() {
    let structure = index(&intake_pdf()).unwrap();
    assert_eq!(structure.kind, DocumentKind::Form);
    assert_eq!(structure.locator("F1"), Some("name"));
    assert_eq!(structure.locator("F2"), Some("agree"));
    assert_eq!(structure.locator("F3"), Some("ref"));
    let text = &structure.compact_text;
    assert!(text.starts_with("=== PDF Form: 3 fields across 1 page ==="));
    assert!(text.contains("[F2] \"agree\" (checkbox) \u{2014} unchecked"));
    assert!(text.contains("[F3] \"ref\" (text) \u{2014} \"R-001\" [read-only]"));
}

#[test]
fn text_and_checkbox_round_trip() {
    let bytes = intake_pdf();
    let outcome = write(
        &bytes,
        &[
            Answer::plain("F1", "Ada Lovelace"),
            Answer::plain("F2", "yes"),
        ],
    )
    .unwrap();
    assert_eq!(outcome.summary.written, 2);

    let report = verify(
        &outcome.bytes,
        &[
            Expectation::new("F1", "ada lovelace"),
            Expectation::new("F2", "yes"),
            Expectation::new("F3", "R-001").with_locator("ref"),
        ],
    )
    .unwrap();
    assert!(report.summary.is_clean(), "{report:?}");
    assert_eq!(report.content_results[0].locator, "name");
    assert_eq!(report.content_results[0].resolved_from, ResolvedFrom::Identifier);
    assert_eq!(report.content_results[2].resolved_from, ResolvedFrom::Locator);

    let structure = index(&outcome.bytes).unwrap();
    assert!(structure.compact_text.contains("(checkbox) \u{2014} checked"));
}

#[test]
fn placeholder_values_are_substituted() {
    let outcome = write(
        &intake_pdf(),
        &[Answer::plain("name", "Grace").with_mode(InsertionMode::ReplacePlaceholder)],
    )
    .unwrap();
    let report = verify(&outcome.bytes, &[Expectation::new("F1", "Grace")]).unwrap();
    assert_eq!(report.content_results[0].actual, "Grace");
}

#[test]
fn read_only_fields_are_still_written() {
    let outcome = write(&intake_pdf(), &[Answer::plain("F3", "R-002")]).unwrap();
    let report = verify(&outcome.bytes, &[Expectation::new("F3", "R-002")]).unwrap();
    assert_eq!(report.content_results[0].status, ContentStatus::Matched);
}

#[test]
fn field_appearance_gives_formatting() {
    let props = formatting_at(&intake_pdf(), "F1").unwrap();
    assert_eq!(props.font_ascii.as_deref(), Some("Helv"));
    assert_eq!(props.size.as_deref(), Some("10"));
    let inherited = formatting_at(&intake_pdf(), "agree").unwrap();
    assert_eq!(inherited.size.as_deref(), Some("12"));
}

#[test]
fn unknown_fields_are_not_found() {
    let err = write(&intake_pdf(), &[Answer::plain("F9", "x")]).unwrap_err();
    assert!(matches!(err, DocfillError::TargetNotFound { .. }), "{err}");
    let err = formatting_at(&intake_pdf(), "nope").unwrap_err();
    assert!(matches!(err, DocfillError::TargetNotFound { .. }), "{err}");
}

//! Fill and verify of `.xlsx` workbooks.

mod common;

use docfill_core::{
    Answer, ContentStatus, DocfillError, DocumentKind, Expectation, InsertionMode, ResolvedFrom,
    formatting_at, index, preview, resolve, verify, write,
};

use common::{Sheet, intake_xlsx, read_part, xlsx};

#[test]
fn identifiers_are_their_own_locators() {
    let structure = index(&intake_xlsx()).unwrap();
    assert_eq!(structure.kind, DocumentKind::Spreadsheet);
    assert_eq!(structure.len(), 4);
    for (id, locator) in &structure.id_to_locator {
        assert_eq!(id, locator);
    }
    let lines: Vec<&str> = structure.compact_text.lines().collect();
    assert_eq!(lines[0], "=== Sheet 1: \"Intake\" ===");
    assert_eq!(lines[1], "S1-R1-C1: \"Name\" [bold]");
    assert!(lines[2].starts_with("S1-R1-C2: \"\" [empty, bold]"));
    assert!(lines.iter().any(|line| line.starts_with("S1-R2-C2: \"42\"")));
}

#[test]
fn written_cells_keep_their_style() {
    let bytes = intake_xlsx();
    let before = formatting_at(&bytes, "S1-R1-C2").unwrap();
    assert!(before.bold);
    assert_eq!(before.size.as_deref(), Some("12"));

    let outcome = write(&bytes, &[Answer::plain("S1-R1-C2", "Ada Lovelace")]).unwrap();
    assert_eq!(outcome.summary.written, 1);
    assert_eq!(formatting_at(&outcome.bytes, "S1-R1-C2").unwrap(), before);

    let sheet = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"<c r="B1" s="1" t="inlineStr">"#), "{sheet}");

    let report = verify(&outcome.bytes, &[Expectation::new("S1-R1-C2", "ada lovelace")]).unwrap();
    let result = &report.content_results[0];
    assert_eq!(result.status, ContentStatus::Matched);
    assert_eq!(result.actual, "Ada Lovelace");
    assert_eq!(result.resolved_from, ResolvedFrom::Identifier);
}

#[test]
fn placeholder_append_and_new_cells() {
    let outcome = write(
        &intake_xlsx(),
        &[
            Answer::plain("S1-R2-C1", "ACME").with_mode(InsertionMode::ReplacePlaceholder),
            Answer::plain("S1-R2-C2", " units").with_mode(InsertionMode::Append),
            Answer::plain("S1-R6-C4", "late entry"),
        ],
    )
    .unwrap();
    assert_eq!(outcome.summary.written, 3);

    let report = verify(
        &outcome.bytes,
        &[
            Expectation::new("S1-R2-C1", "Fill ACME here"),
            Expectation::new("S1-R2-C2", "42 units"),
            Expectation::new("S1-R6-C4", "late entry"),
        ],
    )
    .unwrap();
    assert_eq!(report.summary.matched, 3, "{report:?}");

    let structure = index(&outcome.bytes).unwrap();
    assert_eq!(structure.len(), 24);
}

#[test]
fn explicit_locator_wins_without_cross_check() {
    let outcome = write(
        &intake_xlsx(),
        &[Answer::plain("S1-R1-C1", "written").with_locator("S1-R3-C1")],
    )
    .unwrap();
    assert!(outcome.warnings.is_empty());
    let report = verify(
        &outcome.bytes,
        &[
            Expectation::new("S1-R3-C1", "written"),
            Expectation::new("S1-R1-C1", "Name"),
        ],
    )
    .unwrap();
    assert!(report.summary.is_clean());
}

#[test]
fn unknown_sheet_and_bad_locator_are_errors() {
    let bytes = intake_xlsx();
    let err = write(&bytes, &[Answer::plain("S4-R1-C1", "x")]).unwrap_err();
    assert!(matches!(err, DocfillError::TargetNotFound { .. }), "{err}");

    let err = write(&bytes, &[Answer::plain("S1-R1-C1", "x").with_locator("B2")]).unwrap_err();
    assert!(matches!(err, DocfillError::InvalidLocator { .. }), "{err}");

    let report = verify(&bytes, &[Expectation::new("S4-R1-C1", "x")]).unwrap();
    assert_eq!(report.content_results[0].status, ContentStatus::Missing);
}

#[test]
fn foreign_identifiers_are_unresolved_for_writes() {
    let bytes = intake_xlsx();
    for id in ["P3", "T1-R1-C1", "B2"] {
        let answers = [Answer::plain("S1-R3-C1", "ok"), Answer::plain(id, "x")];
        match write(&bytes, &answers).unwrap_err() {
            DocfillError::UnresolvedIdentifier { index, identifier } => {
                assert_eq!(index, 1);
                assert_eq!(identifier, id);
            }
            other => panic!("expected UnresolvedIdentifier for {id}, got {other}"),
        }
    }

    let err = preview(&bytes, &[Answer::plain("T1-R1-C1", "x")]).unwrap_err();
    assert!(matches!(err, DocfillError::UnresolvedIdentifier { .. }), "{err}");
    let err = formatting_at(&bytes, "P1").unwrap_err();
    assert!(matches!(err, DocfillError::UnresolvedIdentifier { .. }), "{err}");
}

#[test]
fn foreign_identifiers_verify_as_missing() {
    let report = verify(
        &intake_xlsx(),
        &[
            Expectation::new("T1-R1-C1", "x"),
            Expectation::new("S1-R1-C1", "name"),
            Expectation::new("S1-R2-C2", "42").with_locator("B2"),
        ],
    )
    .unwrap();
    let statuses: Vec<ContentStatus> =
        report.content_results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![ContentStatus::Missing, ContentStatus::Matched, ContentStatus::Missing]
    );
    assert_eq!(report.content_results[0].locator, "T1-R1-C1");
    assert_eq!(report.content_results[0].actual, "");
    assert_eq!(report.summary.missing, 2);
    assert_eq!(report.summary.matched, 1);
}

#[test]
fn prebuilt_inline_strings_are_checked() {
    let bytes = intake_xlsx();
    let err = write(
        &bytes,
        &[Answer::prebuilt("S1-R1-C2", "<t>bare</t>", InsertionMode::ReplaceContent)],
    )
    .unwrap_err();
    assert!(matches!(err, DocfillError::InvalidFragment { .. }));

    let outcome = write(
        &bytes,
        &[Answer::prebuilt(
            "S1-R1-C2",
            "<is><r><rPr><i/></rPr><t>styled</t></r></is>",
            InsertionMode::ReplaceContent,
        )],
    )
    .unwrap();
    let report = verify(&outcome.bytes, &[Expectation::new("S1-R1-C2", "styled")]).unwrap();
    assert_eq!(report.summary.matched, 1);
}

#[test]
fn every_sheet_is_addressable() {
    let bytes = xlsx(
        &[
            Sheet {
                name: "First",
                xml_body: r#"<sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row></sheetData>"#,
            },
            Sheet {
                name: "Second",
                xml_body: r#"<sheetData><row r="1"><c r="A1" t="s"><v>1</v></c></row></sheetData>"#,
            },
        ],
        &["one", "two"],
    );
    let resolved = resolve(&bytes, &["S2-R1-C1", "S3-R1-C1"]).unwrap();
    assert_eq!(resolved.resolved.len(), 1);

    let outcome = write(&bytes, &[Answer::plain("S2-R1-C1", "deux")]).unwrap();
    let first = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    assert_eq!(first, read_part(&bytes, "xl/worksheets/sheet1.xml"));
    let report = verify(
        &outcome.bytes,
        &[Expectation::new("S2-R1-C1", "deux"), Expectation::new("S1-R1-C1", "one")],
    )
    .unwrap();
    assert_eq!(report.summary.matched, 2);
}

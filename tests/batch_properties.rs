//! Batch-level behaviour shared by every document kind: preview, limits,
//! raw input, concurrency and on-disk round trips.

mod common;

use std::thread;

use docfill_core::{
    Answer, ContentStatus, DocfillError, DocumentFiller, Expectation, FillOptions, InsertionMode,
    PreviewStatus, RawAnswer, RawExpectation, index, preview, verify, write,
};
use serde_json::json;
use tempfile::TempDir;

use common::{intake_docx, intake_pdf, intake_xlsx};

#[test]
fn preview_classifies_targets_without_writing() {
    let bytes = intake_docx();
    let answers = vec![
        Answer::plain("T1-R2-C2", "Acme Corp"),
        Answer::plain("P1", "New heading"),
        Answer::plain("P2", "Ada").with_mode(InsertionMode::ReplacePlaceholder),
        Answer::plain("T1-R1-C1", "SKIP"),
        Answer::plain("T1-R1-C2", "x").with_locator("./w:p"),
    ];
    let entries = preview(&bytes, &answers).unwrap();
    assert_eq!(entries.len(), 5);

    assert_eq!(entries[0].status, PreviewStatus::Ok);
    assert_eq!(entries[0].current_text, "");
    assert_eq!(entries[0].would_write, "Acme Corp");
    assert_eq!(entries[0].locator, "./w:tbl/w:tr[2]/w:tc[2]");

    assert_eq!(entries[1].status, PreviewStatus::Occupied);
    assert_eq!(entries[1].current_text, "Vendor intake");
    assert!(entries[1].message.as_deref().unwrap().contains("replaced"));

    assert_eq!(entries[2].status, PreviewStatus::Ok);
    assert_eq!(entries[3].status, PreviewStatus::Skip);

    let warned = entries[4].message.as_deref().unwrap();
    assert!(warned.contains("differs from resolved locator"), "{warned}");

    assert_eq!(index(&bytes).unwrap(), index(&intake_docx()).unwrap());
}

#[test]
fn preview_of_missing_target_fails_like_write() {
    let err = preview(&intake_xlsx(), &[Answer::plain("S9-R1-C1", "x")]).unwrap_err();
    assert!(matches!(err, DocfillError::TargetNotFound { .. }));
}

#[test]
fn raw_batches_are_validated_before_writing() {
    let filler = DocumentFiller::new();
    let raw: Vec<RawAnswer> = serde_json::from_value(json!([
        {"pair_id": "T1-R2-C2", "answer_text": "Acme", "confidence": "known", "note": "from crm"},
        {"pair_id": "P2", "answer_text": "Ada", "mode": "replace_placeholder", "placeholder": "[Enter name]"}
    ]))
    .unwrap();
    let outcome = filler.write_raw(&intake_docx(), &raw).unwrap();
    assert_eq!(outcome.summary.written, 2);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("note"));

    let expectations: Vec<RawExpectation> = serde_json::from_value(json!([
        {"pair_id": "T1-R2-C2", "expected_text": "Acme"},
        {"pair_id": "P2", "expected_text": "Signed by Ada", "confidence": "uncertain"}
    ]))
    .unwrap();
    let report = filler.verify_raw(&outcome.bytes, &expectations).unwrap();
    assert_eq!(report.summary.matched, 2);
    assert_eq!(report.summary.confidence_uncertain, 1);
    assert!(report.summary.confidence_note.ends_with("manual review needed"));
}

#[test]
fn configured_limits_are_enforced() {
    let filler = DocumentFiller::with_options(FillOptions::builder().max_answers(1).build());
    let err = filler
        .write(
            &intake_docx(),
            &[Answer::plain("P1", "a"), Answer::plain("P2", "b")],
        )
        .unwrap_err();
    assert!(matches!(err, DocfillError::InvalidAnswers { .. }));

    let tiny = DocumentFiller::with_options(FillOptions::builder().max_document_bytes(16).build());
    let err = tiny.index(&intake_pdf()).unwrap_err();
    assert!(matches!(err, DocfillError::DocumentTooLarge { .. }));
}

#[test]
fn custom_placeholder_patterns_drive_replacement() {
    let filler = DocumentFiller::with_options(
        FillOptions::builder()
            .placeholder_patterns(["Vendor"])
            .build(),
    );
    let outcome = filler
        .write(
            &intake_docx(),
            &[Answer::plain("P1", "Supplier").with_mode(InsertionMode::ReplacePlaceholder)],
        )
        .unwrap();
    let report = verify(&outcome.bytes, &[Expectation::new("P1", "Supplier intake")]).unwrap();
    assert_eq!(report.content_results[0].status, ContentStatus::Matched);

    let broken = DocumentFiller::with_options(FillOptions::builder().placeholder_patterns(["("]).build());
    assert!(matches!(
        broken.index(&intake_docx()),
        Err(DocfillError::InvalidOptions { .. })
    ));
}

#[test]
fn concurrent_calls_match_sequential_results() {
    let documents = [intake_docx(), intake_xlsx(), intake_pdf()];
    let expected: Vec<_> = documents.iter().map(|bytes| index(bytes).unwrap()).collect();
    let filler = DocumentFiller::new();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..12)
            .map(|i| {
                let bytes = &documents[i % documents.len()];
                let filler = &filler;
                scope.spawn(move || filler.index(bytes).unwrap())
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), expected[i % documents.len()]);
        }
    });
}

#[test]
fn filled_document_survives_disk_round_trip() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("intake.docx");
    std::fs::write(&template, intake_docx()).unwrap();

    let bytes = std::fs::read(&template).unwrap();
    let outcome = write(&bytes, &[Answer::plain("T1-R2-C2", "Acme Corp")]).unwrap();
    let filled = dir.path().join("intake.filled.docx");
    std::fs::write(&filled, &outcome.bytes).unwrap();

    let reread = std::fs::read(&filled).unwrap();
    let report = verify(&reread, &[Expectation::new("T1-R2-C2", "Acme Corp")]).unwrap();
    assert!(report.summary.is_clean());
    assert_ne!(
        index(&reread).unwrap().source_digest,
        index(&bytes).unwrap().source_digest
    );
}

#[test]
fn random_batches_write_what_they_verify() {
    let bytes = intake_xlsx();
    let mut rng = fastrand::Rng::with_seed(0x5EED);
    for _ in 0..20 {
        let mut answers = Vec::new();
        let mut expectations = Vec::new();
        for row in 1..=rng.usize(1..8) {
            let id = format!("S1-R{}-C{}", row + 2, rng.u32(1..5));
            if answers.iter().any(|a: &Answer| a.identifier == id) {
                continue;
            }
            if rng.bool() {
                answers.push(Answer::plain(&id, "skip"));
            } else {
                let value = format!("value-{}", rng.u32(..1000));
                expectations.push(Expectation::new(&id, &value));
                answers.push(Answer::plain(&id, value));
            }
        }
        let outcome = write(&bytes, &answers).unwrap();
        assert_eq!(outcome.summary.written, expectations.len());
        assert_eq!(
            outcome.summary.written + outcome.summary.skipped,
            answers.len()
        );
        let report = verify(&outcome.bytes, &expectations).unwrap();
        assert_eq!(report.summary.matched, expectations.len());
    }
}

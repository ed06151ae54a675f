//! Partial-success linking behavior through the facade.

use crate::integration::test_utils::{breakdown_table, harness, science_request};
use currigen::error::PipelineError;
use currigen::store::DocumentStore;
use currigen::types::{DocumentId, DocumentType};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_failed_link_keeps_derived_document() {
    let lesson_notes = "\
| Week | Concept | Notes | Examples |
|---|---|---|---|
| Week 1 | Parts of a plant | Roots anchor the plant | Bean seedling |";
    let h = harness(vec![Ok(breakdown_table()), Ok(lesson_notes.to_string())]);

    let source = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    h.store.fail_next_link.store(true, Ordering::SeqCst);
    let derived = h
        .pipeline
        .derive(&source.id, DocumentType::LessonNotes, &science_request())
        .await
        .unwrap();

    // The derived document survived the failed parent patch.
    assert!(h.store.get(&derived.id).await.unwrap().is_some());
    let warning = derived.metadata.link_warning.unwrap();
    assert!(warning.contains(source.id.as_str()));

    let parent = h.store.get(&source.id).await.unwrap().unwrap();
    assert!(parent.child_documents.is_empty());
}

#[tokio::test]
async fn test_derive_from_missing_source() {
    let h = harness(vec![Ok(breakdown_table())]);
    let err = h
        .pipeline
        .derive(
            &DocumentId::new("doc-0-404"),
            DocumentType::LessonPlan,
            &science_request(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));
}

#[tokio::test]
async fn test_derive_from_wrong_document_type() {
    let h = harness(vec![Ok(breakdown_table())]);
    let scheme = h
        .pipeline
        .generate(DocumentType::SchemeOfWork, &science_request())
        .await
        .unwrap();

    let err = h
        .pipeline
        .derive(&scheme.id, DocumentType::LessonPlan, &science_request())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::WrongSourceType {
            expected: DocumentType::ConceptBreakdown,
            ..
        }
    ));
}

#[tokio::test]
async fn test_derive_from_degraded_source_reports_no_concepts() {
    // A breakdown whose stored content lost every recoverable row.
    let h = harness(vec![Ok(
        "| Term | Week | Strand | Sub-strand | Concept |\n|---|---|---|---|---|\n| Term 1 | sometime | x | y | too short |"
            .to_string(),
    )]);
    let source = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    let err = h
        .pipeline
        .derive(&source.id, DocumentType::LessonPlan, &science_request())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoConceptsFound(_)));
}

//! End-to-end generation and derivation through the pipeline facade.

use crate::integration::test_utils::{breakdown_table, harness, science_request};
use currigen::error::PipelineError;
use currigen::store::DocumentStore;
use currigen::types::{DocumentStatus, DocumentType};

#[tokio::test]
async fn test_generate_persists_completed_document() {
    let h = harness(vec![Ok(breakdown_table())]);

    let document = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    assert_eq!(document.status, DocumentStatus::Completed);
    assert_eq!(document.doc_type, DocumentType::ConceptBreakdown);
    assert!(!document.metadata.used_fallback);
    assert_eq!(document.subject, "Science");

    let stored = h.store.get(&document.id).await.unwrap().unwrap();
    assert_eq!(stored.content, breakdown_table());
}

#[tokio::test]
async fn test_exhausted_model_yields_partial_fallback() {
    let h = harness(vec![Err(PipelineError::ModelEmptyResponse)]);

    let document = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    assert_eq!(document.status, DocumentStatus::Partial);
    assert!(document.metadata.used_fallback);
    // The fallback obeys the column contract, so it still renders.
    let rendered = h.pipeline.render_html(&document.id).await.unwrap();
    assert!(rendered.row_count > 0);
}

#[tokio::test]
async fn test_unmapped_curriculum_still_generates() {
    let h = harness(vec![Ok(breakdown_table())]);

    let mut request = science_request();
    request.strand = "Energy".to_string();
    request.substrand = "Light".to_string();

    let document = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &request)
        .await
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Completed);
    assert_eq!(document.strand, "Energy");
}

#[tokio::test]
async fn test_blank_request_field_rejected() {
    let h = harness(vec![Ok(breakdown_table())]);
    let mut request = science_request();
    request.grade = String::new();

    let err = h
        .pipeline
        .generate(DocumentType::SchemeOfWork, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidRequest(_)));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_derive_links_child_to_source() {
    let lesson_plan = "\
| Week | Lesson | Concept | Activities | Resources |
|---|---|---|---|---|
| Week 1 | 1 | Identify the external parts of flowering plants | Garden walk | Chart |";
    let h = harness(vec![Ok(breakdown_table()), Ok(lesson_plan.to_string())]);

    let source = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    let derived = h
        .pipeline
        .derive(&source.id, DocumentType::LessonPlan, &science_request())
        .await
        .unwrap();

    assert_eq!(derived.parent_document, Some(source.id.clone()));
    assert!(derived.metadata.link_warning.is_none());

    // Six concepts in the source, so six lesson detail rows.
    let details = derived.lesson_details.unwrap();
    assert_eq!(details.len(), 6);
    assert_eq!(details[0].week, 1);
    assert_eq!(details[0].lesson, 1);
    assert_eq!(details[1].lesson, 2);

    let parent = h.store.get(&source.id).await.unwrap().unwrap();
    assert_eq!(parent.child_documents, vec![derived.id]);
}

#[tokio::test]
async fn test_derive_repairs_wrapped_source_rows() {
    // The stored breakdown carries a row the model wrapped onto a second
    // line; the derived document must pin the whole concept, not a fragment.
    let wrapped = "\
| Term | Week | Strand | Sub-strand | Concept |
|---|---|---|---|---|
| Term 1 | Week 1 | Living Things | Plants | Identify the external
parts of flowering plants |
| Term 1 | Week 2 | Living Things | Plants | Describe how seeds germinate in soil |";
    let lesson_plan = "\
| Week | Lesson | Concept | Activities | Resources |
|---|---|---|---|---|
| Week 1 | 1 | Identify the external parts of flowering plants | Garden walk | Chart |";
    let h = harness(vec![Ok(wrapped.to_string()), Ok(lesson_plan.to_string())]);

    let source = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();
    let derived = h
        .pipeline
        .derive(&source.id, DocumentType::LessonPlan, &science_request())
        .await
        .unwrap();

    let details = derived.lesson_details.unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(
        details[0].concept,
        "Identify the external parts of flowering plants"
    );
}

#[tokio::test]
async fn test_derive_caps_concepts_at_declared_row_count() {
    let lesson_plan = "\
| Week | Lesson | Concept | Activities | Resources |
|---|---|---|---|---|
| Week 1 | 1 | Identify the external parts of flowering plants | Garden walk | Chart |";
    let h = harness(vec![Ok(breakdown_table()), Ok(lesson_plan.to_string())]);

    let source = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    // The request declares a 2x2 term shape, so only the first four of the
    // source's six concepts survive into the derived document.
    let mut request = science_request();
    request.weeks = Some(2);
    request.lessons_per_week = Some(2);
    let derived = h
        .pipeline
        .derive(&source.id, DocumentType::LessonPlan, &request)
        .await
        .unwrap();

    let details = derived.lesson_details.unwrap();
    assert_eq!(details.len(), 4);
}

#[tokio::test]
async fn test_derive_rejects_breakdown_target() {
    let h = harness(vec![Ok(breakdown_table())]);
    let source = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    let err = h
        .pipeline
        .derive(&source.id, DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_select_visual_concepts_from_source() {
    let h = harness(vec![Ok(breakdown_table())]);
    let source = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    let selected = h
        .pipeline
        .select_visual_concepts(&source.id, 2)
        .await
        .unwrap();
    assert_eq!(selected.len(), 2);
    // The discursive concept never outranks the observable ones.
    for choice in &selected {
        assert!(!choice.record.concept.contains("opinions"));
        assert!(!choice.visual.layout.is_empty());
    }
}

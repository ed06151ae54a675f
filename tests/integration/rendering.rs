//! Rendering stored documents, including degraded content.

use crate::integration::test_utils::{breakdown_table, harness, science_request};
use currigen::error::{PipelineError, RenderError};
use currigen::types::{DocumentId, DocumentType};

#[tokio::test]
async fn test_render_generated_document() {
    let h = harness(vec![Ok(breakdown_table())]);
    let document = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    let rendered = h.pipeline.render_html(&document.id).await.unwrap();
    assert_eq!(rendered.row_count, 6);
    assert!(rendered.landscape);
    assert!(rendered.html.contains("<table class=\"doc-table landscape\">"));
}

#[tokio::test]
async fn test_render_survives_split_rows_in_stored_content() {
    // Stored content with a row the model wrapped onto a second line.
    let degraded = "\
| Term | Week | Strand | Sub-strand | Concept |
|---|---|---|---|---|
| Term 1 | Week 1 | Living Things | Plants | Identify the external
parts of flowering plants |
| Term 1 | Week 2 | Living Things | Plants | Describe how seeds germinate in soil |";
    let h = harness(vec![Ok(degraded.to_string())]);
    let document = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    let rendered = h.pipeline.render_html(&document.id).await.unwrap();
    assert_eq!(rendered.row_count, 2);
    assert!(rendered.html.contains("Identify the external parts of flowering plants"));
}

#[tokio::test]
async fn test_render_prose_only_content_is_parse_exhausted() {
    let prose = "I could not produce a table this time, sorry about that.";
    let h = harness(vec![Ok(prose.to_string())]);
    let document = h
        .pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    let err = h.pipeline.render_html(&document.id).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Render(RenderError::ParseExhausted { .. })
    ));
}

#[tokio::test]
async fn test_render_missing_document() {
    let h = harness(vec![Ok(breakdown_table())]);
    let err = h
        .pipeline
        .render_html(&DocumentId::new("doc-0-404"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));
}

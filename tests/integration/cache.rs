//! Curriculum cache behavior observed through the facade.

use crate::integration::test_utils::{breakdown_table, harness, science_request};
use currigen::types::DocumentType;

#[tokio::test]
async fn test_repeat_generation_hits_cache() {
    let h = harness(vec![Ok(breakdown_table())]);
    let request = science_request();

    h.pipeline
        .generate(DocumentType::ConceptBreakdown, &request)
        .await
        .unwrap();
    assert_eq!(h.source.lookups(), 1);

    // Same key inside the TTL window: served from cache.
    h.pipeline
        .generate(DocumentType::SchemeOfWork, &request)
        .await
        .unwrap();
    assert_eq!(h.source.lookups(), 1);
}

#[tokio::test]
async fn test_distinct_keys_are_cached_separately() {
    let h = harness(vec![Ok(breakdown_table())]);

    h.pipeline
        .generate(DocumentType::ConceptBreakdown, &science_request())
        .await
        .unwrap();

    let mut other = science_request();
    other.substrand = "Animals".to_string();
    h.pipeline
        .generate(DocumentType::ConceptBreakdown, &other)
        .await
        .unwrap();

    assert_eq!(h.source.lookups(), 2);
}

#[tokio::test]
async fn test_misses_are_not_cached() {
    let h = harness(vec![Ok(breakdown_table())]);
    let mut request = science_request();
    request.strand = "Energy".to_string();

    h.pipeline
        .generate(DocumentType::ConceptBreakdown, &request)
        .await
        .unwrap();
    h.pipeline
        .generate(DocumentType::ConceptBreakdown, &request)
        .await
        .unwrap();

    // Each miss went back to the source.
    assert_eq!(h.source.lookups(), 2);
}

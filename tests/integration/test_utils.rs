//! Shared test utilities for integration tests
//!
//! Builders for curriculum fixtures, scripted model responses, and a fully
//! wired pipeline over in-memory collaborators.

use currigen::api::GenerationPipeline;
use currigen::config::GenerationConfig;
use currigen::curriculum::{CurriculumKey, GenerationSettings, InMemoryCurriculumSource};
use currigen::error::PipelineError;
use currigen::provider::MockCompletionClient;
use currigen::store::InMemoryDocumentStore;
use currigen::types::{CurriculumEntry, GenerationRequest};
use std::sync::Arc;

pub fn settings() -> GenerationSettings {
    GenerationSettings {
        lesson_duration_minutes: 35,
        lessons_per_week: 5,
        weeks_per_term: 12,
    }
}

pub fn science_entry() -> CurriculumEntry {
    CurriculumEntry {
        grade: "Grade 4".to_string(),
        learning_area: "Science".to_string(),
        strand: "Living Things".to_string(),
        substrand: "Plants".to_string(),
        specific_learning_outcomes: vec![
            "Identify the external parts of flowering plants".to_string(),
            "Describe the life cycle of a flowering plant".to_string(),
        ],
        learning_experiences: vec!["Observe plants in the school garden".to_string()],
        key_inquiry_questions: vec!["How do plants grow?".to_string()],
        resources: vec!["Seed samples".to_string()],
        assessments: Vec::new(),
        reflection_notes: None,
        lesson_count: Some(6),
    }
}

pub fn science_request() -> GenerationRequest {
    GenerationRequest {
        school: Some("Hilltop Primary".to_string()),
        teacher_name: Some("J. Mwangi".to_string()),
        grade: "Grade 4".to_string(),
        learning_area: "Science".to_string(),
        strand: "Living Things".to_string(),
        substrand: "Plants".to_string(),
        term: Some("Term 1".to_string()),
        weeks: None,
        lessons_per_week: None,
        concepts: None,
    }
}

/// A well-formed concept breakdown table matching the science fixture, six
/// rows across three weeks.
pub fn breakdown_table() -> String {
    let mut out = String::from(
        "| Term | Week | Strand | Sub-strand | Concept |\n|---|---|---|---|---|\n",
    );
    let concepts = [
        ("Week 1", "Identify the external parts of flowering plants"),
        ("Week 1", "Describe the function of roots and stems"),
        ("Week 2", "Observe the life cycle stages of a bean plant"),
        ("Week 2", "Describe how seeds germinate in soil"),
        ("Week 3", "Classify plants by leaf shape and habitat"),
        ("Week 3", "Discuss opinions about caring for plants"),
    ];
    for (week, concept) in concepts {
        out.push_str(&format!(
            "| Term 1 | {week} | Living Things | Plants | {concept} |\n"
        ));
    }
    out
}

/// Fast-retry generation config so failure-path tests finish quickly.
pub fn fast_config() -> GenerationConfig {
    GenerationConfig {
        retry_delay_ms: 1,
        min_response_length: 20,
        ..Default::default()
    }
}

pub struct TestHarness {
    pub pipeline: GenerationPipeline,
    pub store: Arc<InMemoryDocumentStore>,
    pub source: Arc<InMemoryCurriculumSource>,
}

/// Wire a pipeline over in-memory collaborators with scripted model output.
pub fn harness(responses: Vec<Result<String, PipelineError>>) -> TestHarness {
    let source = Arc::new(InMemoryCurriculumSource::new(settings()));
    source.insert(
        CurriculumKey::new("Grade 4", "Science", "Living Things", "Plants"),
        science_entry(),
    );
    let store = Arc::new(InMemoryDocumentStore::new());
    let client = Arc::new(MockCompletionClient::new(responses));

    let pipeline = GenerationPipeline::new(
        fast_config(),
        client,
        source.clone(),
        store.clone(),
    );
    TestHarness {
        pipeline,
        store,
        source,
    }
}

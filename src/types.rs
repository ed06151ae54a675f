//! Core record types for the curriculum generation pipeline.
//!
//! `CurriculumEntry` is read-only reference input, `GenerationRequest` is the
//! ephemeral per-call value object, and `GeneratedDocument` is the persisted
//! artifact. Concept records carry the normalized dedup key used across the
//! extractor and selector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The five generated document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    SchemeOfWork,
    ConceptBreakdown,
    LessonPlan,
    LessonNotes,
    AssessmentRecord,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::SchemeOfWork,
        DocumentType::ConceptBreakdown,
        DocumentType::LessonPlan,
        DocumentType::LessonNotes,
        DocumentType::AssessmentRecord,
    ];

    /// Expected pipe-delimited column count in model output for this type.
    pub fn expected_columns(self) -> usize {
        match self {
            DocumentType::SchemeOfWork => 10,
            DocumentType::ConceptBreakdown => 5,
            DocumentType::LessonPlan => 5,
            DocumentType::LessonNotes => 4,
            DocumentType::AssessmentRecord => 6,
        }
    }

    /// Wide column counts print landscape; everything else stays portrait.
    pub fn is_landscape(self) -> bool {
        self.expected_columns() >= 5
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DocumentType::SchemeOfWork => "Scheme of Work",
            DocumentType::ConceptBreakdown => "Concept Breakdown",
            DocumentType::LessonPlan => "Lesson Plan",
            DocumentType::LessonNotes => "Lesson Notes",
            DocumentType::AssessmentRecord => "Assessment Record",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheme-of-work" | "scheme" => Some(DocumentType::SchemeOfWork),
            "concept-breakdown" | "breakdown" => Some(DocumentType::ConceptBreakdown),
            "lesson-plan" => Some(DocumentType::LessonPlan),
            "lesson-notes" | "notes" => Some(DocumentType::LessonNotes),
            "assessment-record" | "assessment" => Some(DocumentType::AssessmentRecord),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lifecycle status of a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Completed,
    Failed,
    Partial,
}

/// One assessment skill with its four proficiency-level descriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRubric {
    pub skill: String,
    pub exceeds_expectations: String,
    pub meets_expectations: String,
    pub approaches_expectations: String,
    pub below_expectations: String,
}

/// Immutable curriculum reference record. Read-only input to generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumEntry {
    pub grade: String,
    pub learning_area: String,
    pub strand: String,
    pub substrand: String,
    #[serde(default)]
    pub specific_learning_outcomes: Vec<String>,
    #[serde(default)]
    pub learning_experiences: Vec<String>,
    #[serde(default)]
    pub key_inquiry_questions: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub assessments: Vec<AssessmentRubric>,
    #[serde(default)]
    pub reflection_notes: Option<String>,
    #[serde(default)]
    pub lesson_count: Option<u32>,
}

/// Ephemeral request for one generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub school: Option<String>,
    pub teacher_name: Option<String>,
    pub grade: String,
    pub learning_area: String,
    pub strand: String,
    pub substrand: String,
    pub term: Option<String>,
    pub weeks: Option<u32>,
    pub lessons_per_week: Option<u32>,
    /// Present only when the request is derived from an existing document.
    #[serde(default)]
    pub concepts: Option<Vec<ConceptRecord>>,
}

/// A request after validation: every field populated from the request itself,
/// the curriculum entry, or a generic default. Downstream stages never observe
/// a missing field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRequest {
    pub school: String,
    pub teacher_name: String,
    pub grade: String,
    pub learning_area: String,
    pub strand: String,
    pub substrand: String,
    pub term: String,
    pub weeks: u32,
    pub lessons_per_week: u32,
    /// Canonical target row count for table output.
    pub target_rows: u32,
    #[serde(default)]
    pub concepts: Option<Vec<ConceptRecord>>,
}

/// One structured concept extracted from a table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRecord {
    pub term: String,
    pub week: String,
    pub strand: String,
    pub substrand: String,
    pub concept: String,
}

impl ConceptRecord {
    /// Normalized (week, concept) key: case- and whitespace-insensitive.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}::{}",
            normalize_key_part(&self.week),
            normalize_key_part(&self.concept)
        )
    }

    /// First ordinal embedded in the week cell ("Week 2" -> 2).
    pub fn week_ordinal(&self) -> Option<u32> {
        extract_ordinal(&self.week)
    }
}

fn normalize_key_part(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Pull the first run of digits out of a string.
pub fn extract_ordinal(s: &str) -> Option<u32> {
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Week/lesson/concept row stored on derived documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonDetail {
    pub week: u32,
    pub lesson: u32,
    pub concept: String,
}

/// Timing and quality metadata recorded per generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub elapsed_ms: u64,
    pub attempts: u32,
    pub used_fallback: bool,
    pub quality_score: Option<f32>,
    pub model: Option<String>,
    /// Set when the post-persist link step failed (partial-success policy).
    #[serde(default)]
    pub link_warning: Option<String>,
}

/// Persisted generation artifact. Type, term, and strand are immutable after
/// creation; content may be patched (e.g. media reference rewrites).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub id: DocumentId,
    pub doc_type: DocumentType,
    pub term: String,
    pub grade: String,
    pub subject: String,
    pub strand: String,
    pub substrand: String,
    pub content: String,
    #[serde(default)]
    pub parent_document: Option<DocumentId>,
    #[serde(default)]
    pub child_documents: Vec<DocumentId>,
    #[serde(default)]
    pub lesson_details: Option<Vec<LessonDetail>>,
    pub status: DocumentStatus,
    pub metadata: GenerationMetadata,
    pub created_at: DateTime<Utc>,
}

/// Diagram archetypes the visual synthesizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagramArchetype {
    LabeledParts,
    CyclicProcess,
    FlowSequence,
    ClassificationTree,
    GeographicMap,
    DataChart,
    ComparisonGrid,
    SceneIllustration,
}

/// Ephemeral visual treatment for a selected concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualSpec {
    pub archetype: DiagramArchetype,
    pub layout: String,
    pub key_elements: Vec<String>,
    pub requires_local_context: bool,
}

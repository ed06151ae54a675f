//! Prompt construction.
//!
//! One [`PromptBuilder`] per document type, selected through a registry map.
//! Builders are pure: the same request and curriculum entry always render the
//! same instruction text. Every builder embeds the full curriculum reference
//! and an explicit formatting contract (exact column names, order, count, one
//! row per physical line, exact target row count) because the model's output
//! format is the single least reliable part of the system.

use crate::types::{CurriculumEntry, DocumentType, ResolvedRequest};
use std::collections::HashMap;

mod assessment;
mod breakdown;
mod lesson_plan;
mod notes;
mod scheme;

pub use assessment::AssessmentRecordPrompt;
pub use breakdown::ConceptBreakdownPrompt;
pub use lesson_plan::LessonPlanPrompt;
pub use notes::LessonNotesPrompt;
pub use scheme::SchemeOfWorkPrompt;

/// Renders a deterministic instruction text for one document type.
pub trait PromptBuilder: Send + Sync {
    fn doc_type(&self) -> DocumentType;

    /// System instruction sent alongside every prompt of this type.
    fn system_instruction(&self) -> &'static str;

    /// Render the user prompt. Pure function of its inputs.
    fn build(&self, request: &ResolvedRequest, entry: &CurriculumEntry) -> String;
}

/// Registry of all prompt builders, keyed by document type.
pub struct PromptRegistry {
    builders: HashMap<DocumentType, Box<dyn PromptBuilder>>,
}

impl PromptRegistry {
    pub fn with_defaults() -> Self {
        let mut builders: HashMap<DocumentType, Box<dyn PromptBuilder>> = HashMap::new();
        builders.insert(
            DocumentType::SchemeOfWork,
            Box::new(SchemeOfWorkPrompt),
        );
        builders.insert(
            DocumentType::ConceptBreakdown,
            Box::new(ConceptBreakdownPrompt),
        );
        builders.insert(DocumentType::LessonPlan, Box::new(LessonPlanPrompt));
        builders.insert(DocumentType::LessonNotes, Box::new(LessonNotesPrompt));
        builders.insert(
            DocumentType::AssessmentRecord,
            Box::new(AssessmentRecordPrompt),
        );
        Self { builders }
    }

    pub fn get(&self, doc_type: DocumentType) -> Option<&dyn PromptBuilder> {
        self.builders.get(&doc_type).map(|b| b.as_ref())
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Column names, in order, for each document type's table contract.
pub fn column_names(doc_type: DocumentType) -> &'static [&'static str] {
    match doc_type {
        DocumentType::SchemeOfWork => &[
            "Week",
            "Lesson",
            "Strand",
            "Sub-strand",
            "Specific Learning Outcomes",
            "Learning Experiences",
            "Key Inquiry Questions",
            "Learning Resources",
            "Assessment",
            "Reflection",
        ],
        DocumentType::ConceptBreakdown => {
            &["Term", "Week", "Strand", "Sub-strand", "Concept"]
        }
        DocumentType::LessonPlan => {
            &["Week", "Lesson", "Concept", "Activities", "Resources"]
        }
        DocumentType::LessonNotes => &["Week", "Concept", "Notes", "Examples"],
        DocumentType::AssessmentRecord => &[
            "Week",
            "Skill",
            "Exceeds Expectations",
            "Meets Expectations",
            "Approaches Expectations",
            "Below Expectations",
        ],
    }
}

/// The formatting contract every builder appends. The wording is strict on
/// purpose; the normalizer and extractor still assume the model ignores it.
pub(crate) fn format_contract(doc_type: DocumentType, target_rows: u32) -> String {
    let columns = column_names(doc_type);
    let header = columns.join(" | ");
    format!(
        "OUTPUT FORMAT (follow exactly):\n\
         - Produce a markdown table with exactly {count} columns in this order: | {header} |\n\
         - The first line is the header row, the second line is a separator row of dashes.\n\
         - Produce exactly {rows} data rows, one row per physical line. Never wrap a row onto a second line.\n\
         - Every row starts and ends with a pipe character.\n\
         - Do not add commentary before or after the table.",
        count = columns.len(),
        header = header,
        rows = target_rows,
    )
}

/// Render a list section, substituting a generic default when the curriculum
/// entry has nothing. Builders never omit a required section.
pub(crate) fn bullet_section(title: &str, items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        format!("{}:\n- {}", title, fallback)
    } else {
        let bullets: Vec<String> = items.iter().map(|i| format!("- {}", i)).collect();
        format!("{}:\n{}", title, bullets.join("\n"))
    }
}

/// Header block shared by all builders: school, teacher, grade, term shape.
pub(crate) fn request_header(request: &ResolvedRequest) -> String {
    format!(
        "School: {school}\nTeacher: {teacher}\nGrade: {grade}\nLearning Area: {area}\n\
         Strand: {strand}\nSub-strand: {substrand}\nTerm: {term}\n\
         Duration: {weeks} weeks, {lpw} lessons per week",
        school = request.school,
        teacher = request.teacher_name,
        grade = request.grade,
        area = request.learning_area,
        strand = request.strand,
        substrand = request.substrand,
        term = request.term,
        weeks = request.weeks,
        lpw = request.lessons_per_week,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::{CurriculumEntry, ResolvedRequest};

    pub fn sample_request() -> ResolvedRequest {
        ResolvedRequest {
            school: "Hilltop Primary".to_string(),
            teacher_name: "J. Mwangi".to_string(),
            grade: "Grade 4".to_string(),
            learning_area: "Science".to_string(),
            strand: "Living Things".to_string(),
            substrand: "Plants".to_string(),
            term: "Term 1".to_string(),
            weeks: 10,
            lessons_per_week: 3,
            target_rows: 30,
            concepts: None,
        }
    }

    pub fn sample_entry() -> CurriculumEntry {
        CurriculumEntry {
            grade: "Grade 4".to_string(),
            learning_area: "Science".to_string(),
            strand: "Living Things".to_string(),
            substrand: "Plants".to_string(),
            specific_learning_outcomes: vec![
                "Identify parts of a plant".to_string(),
                "Describe the life cycle of a flowering plant".to_string(),
            ],
            learning_experiences: vec!["Observe plants in the school garden".to_string()],
            key_inquiry_questions: vec!["How do plants grow?".to_string()],
            resources: vec!["Seed samples".to_string()],
            assessments: Vec::new(),
            reflection_notes: None,
            lesson_count: Some(30),
        }
    }
}

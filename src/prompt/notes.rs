//! Lesson-notes prompt: the 4-column document type.

use super::{bullet_section, format_contract, request_header, PromptBuilder};
use crate::types::{CurriculumEntry, DocumentType, ResolvedRequest};

pub struct LessonNotesPrompt;

impl PromptBuilder for LessonNotesPrompt {
    fn doc_type(&self) -> DocumentType {
        DocumentType::LessonNotes
    }

    fn system_instruction(&self) -> &'static str {
        "You are an experienced teacher writing learner notes. You answer with a \
         strict markdown table and nothing else."
    }

    fn build(&self, request: &ResolvedRequest, entry: &CurriculumEntry) -> String {
        let mut sections = vec![
            format!(
                "Write concise learner notes for the class below.\n\n{}",
                request_header(request)
            ),
            bullet_section(
                "Specific Learning Outcomes",
                &entry.specific_learning_outcomes,
                "Outcomes as per the approved curriculum design",
            ),
            bullet_section(
                "Key Inquiry Questions",
                &entry.key_inquiry_questions,
                "Questions that guide learner exploration of the sub-strand",
            ),
        ];

        if let Some(concepts) = &request.concepts {
            let pinned: Vec<String> = concepts
                .iter()
                .map(|c| format!("- {}: {}", c.week, c.concept))
                .collect();
            sections.push(format!(
                "Write one notes row per concept, in this exact order:\n{}",
                pinned.join("\n")
            ));
        }

        sections.push(
            "Notes cells use simple language a learner of this grade can read alone. \
             Examples cells name concrete, locally familiar examples."
                .to_string(),
        );
        sections.push(format_contract(self.doc_type(), request.target_rows));
        sections.join("\n\n")
    }
}

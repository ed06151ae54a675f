//! Lesson-plan prompt. When the request carries concepts extracted from a
//! breakdown document, those concepts are pinned row by row.

use super::{bullet_section, format_contract, request_header, PromptBuilder};
use crate::types::{CurriculumEntry, DocumentType, ResolvedRequest};

pub struct LessonPlanPrompt;

impl PromptBuilder for LessonPlanPrompt {
    fn doc_type(&self) -> DocumentType {
        DocumentType::LessonPlan
    }

    fn system_instruction(&self) -> &'static str {
        "You are an experienced teacher writing lesson plans. You answer with a \
         strict markdown table and nothing else."
    }

    fn build(&self, request: &ResolvedRequest, entry: &CurriculumEntry) -> String {
        let mut sections = vec![
            format!(
                "Write lesson plans for the class below.\n\n{}",
                request_header(request)
            ),
            bullet_section(
                "Specific Learning Outcomes",
                &entry.specific_learning_outcomes,
                "Outcomes as per the approved curriculum design",
            ),
            bullet_section(
                "Learning Resources",
                &entry.resources,
                "Locally available materials and approved course books",
            ),
        ];

        if let Some(concepts) = &request.concepts {
            let pinned: Vec<String> = concepts
                .iter()
                .map(|c| format!("- {}: {}", c.week, c.concept))
                .collect();
            sections.push(format!(
                "Plan one lesson per concept, in this exact order:\n{}",
                pinned.join("\n")
            ));
        }

        sections.push(
            "The Activities cell describes what learners do, not what the teacher says. \
             Keep each cell on one line."
                .to_string(),
        );
        sections.push(format_contract(self.doc_type(), request.target_rows));
        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::test_support::{sample_entry, sample_request};
    use crate::types::ConceptRecord;

    #[test]
    fn test_lesson_plan_pins_derived_concepts() {
        let mut request = sample_request();
        request.concepts = Some(vec![ConceptRecord {
            term: "Term 1".to_string(),
            week: "Week 1".to_string(),
            strand: "Living Things".to_string(),
            substrand: "Plants".to_string(),
            concept: "Identify the main external parts of a flowering plant".to_string(),
        }]);

        let prompt = LessonPlanPrompt.build(&request, &sample_entry());
        assert!(prompt.contains("in this exact order"));
        assert!(prompt.contains("external parts of a flowering plant"));
    }
}

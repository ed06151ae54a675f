//! Assessment-record prompt: skill rows with four proficiency-level columns.

use super::{format_contract, request_header, PromptBuilder};
use crate::types::{CurriculumEntry, DocumentType, ResolvedRequest};

pub struct AssessmentRecordPrompt;

impl PromptBuilder for AssessmentRecordPrompt {
    fn doc_type(&self) -> DocumentType {
        DocumentType::AssessmentRecord
    }

    fn system_instruction(&self) -> &'static str {
        "You are an experienced teacher preparing assessment rubrics. You answer \
         with a strict markdown table and nothing else."
    }

    fn build(&self, request: &ResolvedRequest, entry: &CurriculumEntry) -> String {
        let rubric_section = if entry.assessments.is_empty() {
            "Assessment Skills:\n- Derive assessable skills from the learning outcomes above"
                .to_string()
        } else {
            let rows: Vec<String> = entry
                .assessments
                .iter()
                .map(|a| {
                    format!(
                        "- {} (exceeds: {}; meets: {}; approaches: {}; below: {})",
                        a.skill,
                        a.exceeds_expectations,
                        a.meets_expectations,
                        a.approaches_expectations,
                        a.below_expectations
                    )
                })
                .collect();
            format!("Assessment Skills:\n{}", rows.join("\n"))
        };

        let outcomes = if entry.specific_learning_outcomes.is_empty() {
            "Learning Outcomes:\n- Outcomes as per the approved curriculum design".to_string()
        } else {
            let bullets: Vec<String> = entry
                .specific_learning_outcomes
                .iter()
                .map(|o| format!("- {}", o))
                .collect();
            format!("Learning Outcomes:\n{}", bullets.join("\n"))
        };

        let sections = vec![
            format!(
                "Create an assessment record for the class below.\n\n{}",
                request_header(request)
            ),
            outcomes,
            rubric_section,
            "Each row assesses one skill in one week. Proficiency cells describe observable \
             learner behaviour, one short sentence each."
                .to_string(),
            format_contract(self.doc_type(), request.target_rows),
        ];
        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::test_support::{sample_entry, sample_request};
    use crate::types::AssessmentRubric;

    #[test]
    fn test_assessment_prompt_embeds_rubrics() {
        let mut entry = sample_entry();
        entry.assessments.push(AssessmentRubric {
            skill: "Classifying plants".to_string(),
            exceeds_expectations: "Classifies and justifies".to_string(),
            meets_expectations: "Classifies correctly".to_string(),
            approaches_expectations: "Classifies with prompts".to_string(),
            below_expectations: "Needs direct support".to_string(),
        });

        let prompt = AssessmentRecordPrompt.build(&sample_request(), &entry);
        assert!(prompt.contains("Classifying plants"));
        assert!(prompt.contains("exactly 6 columns"));
    }
}

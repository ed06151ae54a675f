//! Schemes-of-work prompt: the 10-column document type.

use super::{bullet_section, format_contract, request_header, PromptBuilder};
use crate::types::{CurriculumEntry, DocumentType, ResolvedRequest};

pub struct SchemeOfWorkPrompt;

impl PromptBuilder for SchemeOfWorkPrompt {
    fn doc_type(&self) -> DocumentType {
        DocumentType::SchemeOfWork
    }

    fn system_instruction(&self) -> &'static str {
        "You are an experienced curriculum planner. You produce schemes of work \
         as strict markdown tables and nothing else. You follow the requested \
         column layout and row count exactly."
    }

    fn build(&self, request: &ResolvedRequest, entry: &CurriculumEntry) -> String {
        let mut sections = vec![
            format!(
                "Create a scheme of work for the following class.\n\n{}",
                request_header(request)
            ),
            bullet_section(
                "Specific Learning Outcomes",
                &entry.specific_learning_outcomes,
                "Outcomes as per the approved curriculum design",
            ),
            bullet_section(
                "Learning Experiences",
                &entry.learning_experiences,
                "Learner-centred activities appropriate to the sub-strand",
            ),
            bullet_section(
                "Key Inquiry Questions",
                &entry.key_inquiry_questions,
                "Questions that guide learner exploration of the sub-strand",
            ),
            bullet_section(
                "Learning Resources",
                &entry.resources,
                "Locally available materials and approved course books",
            ),
        ];

        if !entry.assessments.is_empty() {
            let skills: Vec<String> = entry
                .assessments
                .iter()
                .map(|a| a.skill.clone())
                .collect();
            sections.push(bullet_section(
                "Assessment Focus",
                &skills,
                "Observation, oral questions, written exercises",
            ));
        }

        if let Some(notes) = &entry.reflection_notes {
            sections.push(format!("Reflection Guidance:\n- {}", notes));
        }

        sections.push(
            "Distribute the outcomes across the weeks so every lesson row has a distinct, \
             teachable focus. The Reflection column may be left as a short placeholder phrase."
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

    #[test]
    fn test_scheme_prompt_lists_all_ten_columns() {
        let prompt = SchemeOfWorkPrompt.build(&sample_request(), &sample_entry());
        for column in crate::prompt::column_names(DocumentType::SchemeOfWork) {
            assert!(prompt.contains(column), "missing column {column}");
        }
        assert!(prompt.contains("exactly 10 columns"));
    }
}

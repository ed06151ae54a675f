//! Concept-breakdown prompt: the 5-column table that seeds derived documents.

use super::{bullet_section, format_contract, request_header, PromptBuilder};
use crate::types::{CurriculumEntry, DocumentType, ResolvedRequest};

pub struct ConceptBreakdownPrompt;

impl PromptBuilder for ConceptBreakdownPrompt {
    fn doc_type(&self) -> DocumentType {
        DocumentType::ConceptBreakdown
    }

    fn system_instruction(&self) -> &'static str {
        "You are an experienced curriculum planner. You break a sub-strand into \
         one teachable concept per lesson and present the result as a strict \
         markdown table, nothing else."
    }

    fn build(&self, request: &ResolvedRequest, entry: &CurriculumEntry) -> String {
        let sections = vec![
            format!(
                "Break the sub-strand below into one concept per lesson.\n\n{}",
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
            "Each Concept cell must be a complete teachable statement of at least eight words. \
             Week cells must read \"Week N\". Repeat the Term, Strand, and Sub-strand values on \
             every row."
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

    #[test]
    fn test_breakdown_prompt_requires_week_format() {
        let prompt = ConceptBreakdownPrompt.build(&sample_request(), &sample_entry());
        assert!(prompt.contains("Week N"));
        assert!(prompt.contains("exactly 5 columns"));
        assert!(prompt.contains("Term 1"));
    }
}

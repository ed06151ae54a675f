//! Table repair, extraction, and reconstruction.
//!
//! The model's pseudo-markdown tables arrive with rows split across lines,
//! inconsistent column counts, and duplicated cells. This module recovers
//! schema-stable records from that text in tolerant stages: each stage returns
//! an optional result and never panics, and callers advance to the next stage
//! only on an empty result.

pub mod extractor;
pub mod normalizer;
pub mod renderer;

pub use extractor::{ConceptDefaults, ConceptExtractor};
pub use normalizer::normalize;
pub use renderer::{RenderedTable, TableRenderer};

/// A line is a separator row when its cells contain only dashes, colons, and
/// whitespace (`|---|:---:|`).
pub(crate) fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || !trimmed.contains('-') {
        return false;
    }
    trimmed
        .chars()
        .all(|c| c == '|' || c == '-' || c == ':' || c.is_whitespace())
}

/// Split a pipe-delimited row into trimmed, non-empty cells.
pub(crate) fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_detection() {
        assert!(is_separator_row("|---|---|---|"));
        assert!(is_separator_row("| :--- | :---: | ---: |"));
        assert!(!is_separator_row("| Week | Concept |"));
        assert!(!is_separator_row(""));
        assert!(!is_separator_row("| a - b |"));
    }

    #[test]
    fn test_split_cells_drops_border_artifacts() {
        assert_eq!(
            split_cells("| Term 1 | Week 2 |  | Concept |"),
            vec!["Term 1", "Week 2", "Concept"]
        );
    }
}

//! Concept extraction from normalized table text.
//!
//! Multi-stage, tolerant parsing: header location by keyword, column-count
//! dependent cell mapping with 5-, 4-, and 2-column fallbacks, per-row
//! validation, first-wins dedup on the normalized (week, concept) key, and a
//! heuristic pass over the raw text when the table yields nothing. Never
//! returns an error; an empty result is the caller's signal.

use crate::types::ConceptRecord;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{is_separator_row, split_cells};

static WEEK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:week|wk)\s*\.?\s*\d+\b|^\s*\d{1,2}\s*$").unwrap());

static WEEK_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bweek\s*(\d{1,2})\b\s*[:\-–]?\s*(.+)").unwrap());

static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2})[.)]\s+(.+)").unwrap());

/// Header-like phrases that must never become concept text.
const CONCEPT_DENYLIST: &[&str] = &[
    "concept",
    "concepts",
    "concept breakdown",
    "learning outcomes",
    "specific learning outcomes",
    "week",
    "strand",
    "sub-strand",
    "substrand",
    "term",
    "activities",
    "notes",
    "lesson",
];

const HEADER_KEYWORDS: &[&str] = &["term", "week", "concept", "strand", "lesson"];

/// Values substituted for cells a degraded row layout cannot supply.
#[derive(Debug, Clone, Default)]
pub struct ConceptDefaults {
    pub term: String,
    pub strand: String,
    pub substrand: String,
}

/// Parses normalized table text into ordered, deduplicated concept records.
pub struct ConceptExtractor {
    min_concept_length: usize,
}

impl ConceptExtractor {
    pub fn new(min_concept_length: usize) -> Self {
        Self { min_concept_length }
    }

    /// Extract concept records. Never fails; returns an empty list when the
    /// content defeats every strategy. Callers must treat an empty list as a
    /// reportable condition, not silently proceed.
    pub fn extract(&self, content: &str, defaults: &ConceptDefaults) -> Vec<ConceptRecord> {
        let mut records = self.extract_from_table(content, defaults);
        if records.is_empty() {
            tracing::debug!("table extraction produced zero rows, trying heuristic pass");
            records = self.extract_heuristic(content, defaults);
        }
        dedup_first_wins(records)
    }

    /// Extract with an upper bound on record count (the declared lesson count).
    pub fn extract_bounded(
        &self,
        content: &str,
        defaults: &ConceptDefaults,
        max_records: usize,
    ) -> Vec<ConceptRecord> {
        let mut records = self.extract(content, defaults);
        records.truncate(max_records);
        records
    }

    fn extract_from_table(&self, content: &str, defaults: &ConceptDefaults) -> Vec<ConceptRecord> {
        let lines: Vec<&str> = content.lines().collect();
        let header_index = match locate_header(&lines) {
            Some(i) => i,
            None => return Vec::new(),
        };

        let mut records = Vec::new();
        for line in lines.iter().skip(header_index + 1) {
            if is_separator_row(line) || !line.contains('|') {
                continue;
            }
            let cells = split_cells(line);
            if let Some(record) = self.map_row(&cells, defaults) {
                records.push(record);
            }
        }
        records
    }

    /// Column-count-dependent cell mapping, widest layout first.
    fn map_row(&self, cells: &[String], defaults: &ConceptDefaults) -> Option<ConceptRecord> {
        let candidate = match cells.len() {
            n if n >= 5 => ConceptRecord {
                term: cells[0].clone(),
                week: cells[1].clone(),
                strand: cells[2].clone(),
                substrand: cells[3].clone(),
                // Extra trailing cells are usually one concept the model
                // split with stray pipes.
                concept: cells[4..].join(" "),
            },
            4 => ConceptRecord {
                term: cells[0].clone(),
                week: cells[1].clone(),
                strand: cells[2].clone(),
                substrand: defaults.substrand.clone(),
                concept: cells[3].clone(),
            },
            3 => ConceptRecord {
                term: defaults.term.clone(),
                week: cells[0].clone(),
                strand: cells[1].clone(),
                substrand: defaults.substrand.clone(),
                concept: cells[2].clone(),
            },
            2 => ConceptRecord {
                term: defaults.term.clone(),
                week: cells[0].clone(),
                strand: defaults.strand.clone(),
                substrand: defaults.substrand.clone(),
                concept: cells[1].clone(),
            },
            _ => return None,
        };
        self.validate(candidate)
    }

    fn validate(&self, record: ConceptRecord) -> Option<ConceptRecord> {
        if record.concept.trim().len() < self.min_concept_length {
            return None;
        }
        if !WEEK_PATTERN.is_match(&record.week) {
            return None;
        }
        let lowered = record.concept.trim().to_lowercase();
        if CONCEPT_DENYLIST.iter().any(|deny| lowered == *deny) {
            return None;
        }
        Some(record)
    }

    /// Secondary heuristic pass over non-tabular prose: "Week N" markers and
    /// numbered list items. Pipe rows are the table pass's territory; if that
    /// pass rejected them, re-scanning here would fabricate records out of
    /// leftover cells.
    fn extract_heuristic(&self, content: &str, defaults: &ConceptDefaults) -> Vec<ConceptRecord> {
        let mut records = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.contains('|') || is_separator_row(line) {
                continue;
            }

            let (week, text) = if let Some(caps) = WEEK_MARKER.captures(line) {
                (format!("Week {}", &caps[1]), caps[2].trim().to_string())
            } else if let Some(caps) = NUMBERED_ITEM.captures(line) {
                (format!("Week {}", &caps[1]), caps[2].trim().to_string())
            } else {
                continue;
            };

            let candidate = ConceptRecord {
                term: defaults.term.clone(),
                week,
                strand: defaults.strand.clone(),
                substrand: defaults.substrand.clone(),
                concept: text,
            };
            // Week cell is synthesized, so only concept validation applies.
            if candidate.concept.trim().len() >= self.min_concept_length {
                let lowered = candidate.concept.trim().to_lowercase();
                if !CONCEPT_DENYLIST.iter().any(|deny| lowered == *deny) {
                    records.push(candidate);
                }
            }
        }
        records
    }
}

/// Find the header row: a pipe row matching at least two header keywords.
fn locate_header(lines: &[&str]) -> Option<usize> {
    lines.iter().position(|line| {
        if !line.contains('|') || is_separator_row(line) {
            return false;
        }
        let lowered = line.to_lowercase();
        HEADER_KEYWORDS
            .iter()
            .filter(|kw| lowered.contains(*kw))
            .count()
            >= 2
    })
}

/// Keep the first occurrence of each normalized (week, concept) key.
fn dedup_first_wins(records: Vec<ConceptRecord>) -> Vec<ConceptRecord> {
    let mut seen = std::collections::HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect()
}

//! Multi-stage table reconstruction for print output.
//!
//! Stored content may still be imperfect at render time, so an HTML table is
//! recovered through a priority chain: a strict type-specific parser, a
//! tolerant type-specific parser that carries forward missing context, and a
//! generic shape-based extractor. Each stage activates only when the previous
//! produced zero rows.

use crate::error::RenderError;
use crate::prompt::column_names;
use crate::types::DocumentType;
use once_cell::sync::Lazy;
use regex::Regex;

use super::normalizer::normalize;
use super::{is_separator_row, split_cells};

static WEEKISH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:week|wk)\s*\.?\s*\d+\b|^\s*\d{1,2}\s*$").unwrap());

/// Reconstructed table ready for the layout engine.
#[derive(Debug, Clone)]
pub struct RenderedTable {
    pub html: String,
    pub landscape: bool,
    pub row_count: usize,
}

#[derive(Debug)]
struct ParsedTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Reconstructs an HTML table from stored document content.
pub struct TableRenderer;

impl TableRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        doc_type: DocumentType,
        content: &str,
    ) -> Result<RenderedTable, RenderError> {
        if content.trim().is_empty() {
            return Err(RenderError::EmptyContent);
        }

        let normalized = normalize(content, doc_type.expected_columns());

        let parsed = parse_strict(doc_type, &normalized)
            .or_else(|| {
                tracing::debug!(?doc_type, "strict table parse empty, trying tolerant parser");
                parse_tolerant(doc_type, &normalized)
            })
            .or_else(|| {
                tracing::debug!(?doc_type, "tolerant table parse empty, trying generic parser");
                parse_generic(&normalized)
            })
            .ok_or(RenderError::ParseExhausted { doc_type })?;

        Ok(RenderedTable {
            row_count: parsed.rows.len(),
            landscape: doc_type.is_landscape(),
            html: to_html(doc_type, &parsed),
        })
    }
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Stage (a): exact header signature and exact column count per row.
fn parse_strict(doc_type: DocumentType, content: &str) -> Option<ParsedTable> {
    let expected = column_names(doc_type);
    let lines: Vec<&str> = content.lines().collect();

    let header_index = lines.iter().position(|line| {
        let cells = split_cells(line);
        cells.len() == expected.len()
            && cells
                .iter()
                .zip(expected.iter())
                .all(|(cell, name)| cell.eq_ignore_ascii_case(name))
    })?;

    let rows: Vec<Vec<String>> = lines
        .iter()
        .skip(header_index + 1)
        .filter(|line| line.contains('|') && !is_separator_row(line))
        .map(|line| split_cells(line))
        .filter(|cells| cells.len() == expected.len())
        .collect();

    if rows.is_empty() {
        return None;
    }
    Some(ParsedTable {
        header: expected.iter().map(|s| s.to_string()).collect(),
        rows,
    })
}

/// Stage (b): type-specific but tolerant. Short rows inherit leading context
/// (week/strand cells) from the previous row; long rows fold extra cells into
/// the last column.
fn parse_tolerant(doc_type: DocumentType, content: &str) -> Option<ParsedTable> {
    let expected = column_names(doc_type);
    let lines: Vec<&str> = content.lines().collect();

    let header_index = lines.iter().position(|line| {
        if !line.contains('|') || is_separator_row(line) {
            return false;
        }
        let lowered = line.to_lowercase();
        expected
            .iter()
            .filter(|name| lowered.contains(&name.to_lowercase()))
            .count()
            >= 2
    })?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut previous: Option<Vec<String>> = None;

    for line in lines.iter().skip(header_index + 1) {
        if !line.contains('|') || is_separator_row(line) {
            continue;
        }
        let mut cells = split_cells(line);
        if cells.len() < 2 {
            continue;
        }

        if cells.len() > expected.len() {
            let tail = cells.split_off(expected.len() - 1).join(" ");
            cells.push(tail);
        } else if cells.len() < expected.len() {
            let missing = expected.len() - cells.len();
            // A row that doesn't open with a week-like cell lost its leading
            // context columns; carry them forward from the previous row.
            if !WEEKISH.is_match(&cells[0]) {
                if let Some(prev) = &previous {
                    let mut rebuilt: Vec<String> = prev[..missing.min(prev.len())].to_vec();
                    rebuilt.extend(cells);
                    cells = rebuilt;
                }
            }
            while cells.len() < expected.len() {
                cells.push(String::new());
            }
        }

        previous = Some(cells.clone());
        rows.push(cells);
    }

    if rows.is_empty() {
        return None;
    }
    Some(ParsedTable {
        header: expected.iter().map(|s| s.to_string()).collect(),
        rows,
    })
}

/// Stage (c): the first row with at least three cells is the header; all
/// subsequent rows of the same shape are data.
fn parse_generic(content: &str) -> Option<ParsedTable> {
    let lines: Vec<&str> = content.lines().collect();

    let (header_index, header) = lines.iter().enumerate().find_map(|(i, line)| {
        if !line.contains('|') || is_separator_row(line) {
            return None;
        }
        let cells = split_cells(line);
        (cells.len() >= 3).then_some((i, cells))
    })?;

    let rows: Vec<Vec<String>> = lines
        .iter()
        .skip(header_index + 1)
        .filter(|line| line.contains('|') && !is_separator_row(line))
        .map(|line| split_cells(line))
        .filter(|cells| cells.len() == header.len())
        .collect();

    if rows.is_empty() {
        return None;
    }
    Some(ParsedTable { header, rows })
}

/// Column width percentages per document type. Wide types spread the long
/// free-text columns; portrait types weight the concept column.
fn column_widths(doc_type: DocumentType) -> &'static [u8] {
    match doc_type {
        DocumentType::SchemeOfWork => &[5, 5, 8, 8, 16, 16, 12, 10, 10, 10],
        DocumentType::ConceptBreakdown => &[10, 10, 15, 15, 50],
        DocumentType::LessonPlan => &[8, 8, 30, 34, 20],
        DocumentType::LessonNotes => &[10, 25, 40, 25],
        DocumentType::AssessmentRecord => &[8, 20, 18, 18, 18, 18],
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn to_html(doc_type: DocumentType, table: &ParsedTable) -> String {
    let widths = column_widths(doc_type);
    let orientation = if doc_type.is_landscape() {
        "landscape"
    } else {
        "portrait"
    };

    let mut html = format!("<table class=\"doc-table {}\">\n<thead>\n<tr>", orientation);
    for (i, name) in table.header.iter().enumerate() {
        let width = widths.get(i).copied().unwrap_or(10);
        html.push_str(&format!(
            "<th style=\"width:{}%\">{}</th>",
            width,
            html_escape(name)
        ));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", html_escape(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

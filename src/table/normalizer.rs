//! Row normalization: repair of table rows split across physical lines.
//!
//! A full row for a type with N columns carries N+1 pipe characters
//! (`| a | b |`). Fragments are accumulated, joined with a single space, until
//! the running pipe count reaches that threshold, then flushed as one logical
//! row. Separator rows, blank lines, and already-complete rows pass through
//! unchanged, which is what makes the pass idempotent.

use super::is_separator_row;

fn pipe_count(s: &str) -> usize {
    s.chars().filter(|c| *c == '|').count()
}

/// Repair rows split across multiple physical lines.
///
/// `expected_columns` is the type-specific column count (5 for concept
/// breakdowns, 10 for schemes of work). Idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(content: &str, expected_columns: usize) -> String {
    let full_row_pipes = expected_columns + 1;
    let mut out: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut buffered_pipes = 0usize;

    let flush = |buffer: &mut String, buffered_pipes: &mut usize, out: &mut Vec<String>| {
        if !buffer.is_empty() {
            out.push(std::mem::take(buffer));
            *buffered_pipes = 0;
        }
    };

    for line in content.lines() {
        let trimmed = line.trim_end();

        // Blank lines and separator rows terminate any pending fragment and
        // pass through unchanged.
        if trimmed.trim().is_empty() || is_separator_row(trimmed) {
            flush(&mut buffer, &mut buffered_pipes, &mut out);
            out.push(trimmed.to_string());
            continue;
        }

        let pipes = pipe_count(trimmed);

        if buffer.is_empty() {
            if pipes == 0 || pipes >= full_row_pipes {
                // Prose or an already-complete row: untouched.
                out.push(trimmed.to_string());
            } else {
                buffer.push_str(trimmed);
                buffered_pipes = pipes;
            }
            continue;
        }

        // A complete row arriving while a fragment is pending means the
        // fragment will never finish; emit it as-is.
        if pipes >= full_row_pipes {
            flush(&mut buffer, &mut buffered_pipes, &mut out);
            out.push(trimmed.to_string());
            continue;
        }

        buffer.push(' ');
        buffer.push_str(trimmed.trim_start());
        buffered_pipes += pipes;

        if buffered_pipes >= full_row_pipes {
            flush(&mut buffer, &mut buffered_pipes, &mut out);
        }
    }

    flush(&mut buffer, &mut buffered_pipes, &mut out);
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = "| Term 1 | Week 2 | Strand | Sub | Understand basic addition of two numbers |";

    #[test]
    fn test_complete_rows_pass_through() {
        let text = format!("| Term | Week | Strand | Sub-strand | Concept |\n|---|---|---|---|---|\n{ROW}");
        assert_eq!(normalize(&text, 5), text);
    }

    #[test]
    fn test_split_row_is_merged() {
        let split = "| Term 1 | Week 2 | Strand | Sub | Understand basic\naddition of two numbers |";
        assert_eq!(normalize(split, 5), ROW);
    }

    #[test]
    fn test_three_way_split_is_merged() {
        let split = "| Term 1 | Week 2\n| Strand | Sub | Understand basic\naddition of two numbers |";
        assert_eq!(normalize(split, 5), ROW);
    }

    #[test]
    fn test_idempotent_on_merged_output() {
        let split = "| Term 1 | Week 2 | Strand | Sub | Understand basic\naddition of two numbers |";
        let once = normalize(split, 5);
        assert_eq!(normalize(&once, 5), once);
    }

    #[test]
    fn test_prose_lines_untouched() {
        let text = "Here is your table:\n\n| Term | Week | Strand | Sub-strand | Concept |";
        assert_eq!(normalize(text, 5), text);
    }

    #[test]
    fn test_trailing_fragment_is_flushed() {
        let text = "| Term 1 | Week 2 | Strand";
        assert_eq!(normalize(text, 5), text);
        // And a second pass leaves it alone too.
        assert_eq!(normalize(&normalize(text, 5), 5), text);
    }

    #[test]
    fn test_separator_terminates_fragment() {
        let text = "| Term 1 | Week 2\n|---|---|\n| a | b |";
        let normalized = normalize(text, 5);
        assert!(normalized.contains("| Term 1 | Week 2"));
        assert!(normalized.contains("|---|---|"));
    }
}

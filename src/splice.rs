//! Line/column text splicing.
//!
//! Every surgical edit compiles down to a [`Splice`]: a single-line span in
//! the original text plus its replacement. [`splice`] rewrites only those
//! columns and copies every other byte, line terminators included, verbatim.

use crate::ts::{Position, Span};
use std::collections::BTreeMap;
use thiserror::Error;

/// Replacement of one single-line span of the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Splice does nothing until passed to splice()"]
pub struct Splice {
    pub span: Span,
    pub replacement: String,
    /// Text the span must currently hold.
    pub expected: String,
}

impl Splice {
    pub fn new(span: Span, replacement: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
            expected: expected.into(),
        }
    }

    fn line(&self) -> usize {
        self.span.start.line
    }

    fn columns(&self) -> (usize, usize) {
        (self.span.start.column, self.span.end.column)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpliceError {
    #[error("span {start}..{end} covers several lines; only single-line values can be replaced")]
    MultiLineSpan { start: Position, end: Position },

    #[error("line {line} is out of range (document has {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("invalid columns {start}..{end} on line {line} of length {line_len}")]
    InvalidColumns {
        line: usize,
        start: usize,
        end: usize,
        line_len: usize,
    },

    #[error("column {column} on line {line} is not a UTF-8 character boundary")]
    NotCharBoundary { line: usize, column: usize },

    #[error("before-text verification failed at {line}:{column}: expected {expected:?}, found {found:?}")]
    BeforeTextMismatch {
        line: usize,
        column: usize,
        expected: String,
        found: String,
    },

    #[error("overlapping edits on line {line} at column {column}")]
    Overlapping { line: usize, column: usize },
}

/// Apply `edits` to `original`, touching only the spanned columns.
///
/// Edits sharing a line are applied right to left so replacement lengths
/// never shift the columns of edits still pending on that line. Edits on
/// different lines are independent; input order does not matter.
pub fn splice(original: &str, edits: &[Splice]) -> Result<String, SpliceError> {
    let lines: Vec<&str> = original.split_inclusive('\n').collect();

    let mut by_line: BTreeMap<usize, Vec<&Splice>> = BTreeMap::new();
    for edit in edits {
        if !edit.span.is_single_line() {
            return Err(SpliceError::MultiLineSpan {
                start: edit.span.start,
                end: edit.span.end,
            });
        }
        if edit.line() >= lines.len() {
            return Err(SpliceError::LineOutOfRange {
                line: edit.line(),
                line_count: lines.len(),
            });
        }
        by_line.entry(edit.line()).or_default().push(edit);
    }

    let mut rewritten: BTreeMap<usize, String> = BTreeMap::new();
    for (line_no, mut line_edits) in by_line {
        // Rightmost first
        line_edits.sort_by(|a, b| b.columns().cmp(&a.columns()));
        for window in line_edits.windows(2) {
            let (right, left) = (window[0], window[1]);
            if left.columns().1 > right.columns().0 {
                return Err(SpliceError::Overlapping {
                    line: line_no,
                    column: right.columns().0,
                });
            }
        }

        let (content, terminator) = split_terminator(lines[line_no]);
        let mut line = content.to_string();
        for edit in line_edits {
            let (start, end) = edit.columns();
            check_columns(content, line_no, start, end)?;

            let found = &content[start..end];
            if found != edit.expected {
                return Err(SpliceError::BeforeTextMismatch {
                    line: line_no,
                    column: start,
                    expected: edit.expected.clone(),
                    found: found.to_string(),
                });
            }

            // Columns right of `start` may already be rewritten; left of it never are.
            line.replace_range(start..end, &edit.replacement);
        }
        line.push_str(terminator);
        rewritten.insert(line_no, line);
    }

    let mut output = String::with_capacity(original.len());
    for (line_no, line) in lines.iter().enumerate() {
        match rewritten.get(&line_no) {
            Some(new_line) => output.push_str(new_line),
            None => output.push_str(line),
        }
    }

    Ok(output)
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

fn check_columns(content: &str, line: usize, start: usize, end: usize) -> Result<(), SpliceError> {
    if start > end || end > content.len() {
        return Err(SpliceError::InvalidColumns {
            line,
            start,
            end,
            line_len: content.len(),
        });
    }
    for column in [start, end] {
        if !content.is_char_boundary(column) {
            return Err(SpliceError::NotCharBoundary { line, column });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(line: usize, start: usize, end: usize) -> Span {
        Span {
            byte_start: 0,
            byte_end: 0,
            start: Position {
                line,
                column: start,
            },
            end: Position { line, column: end },
        }
    }

    #[test]
    fn replaces_only_the_span() {
        let text = "[a]\npytest = \"7.*\"  # pinned\n";
        let edit = Splice::new(span(1, 9, 14), "\"8.*\"", "\"7.*\"");
        let out = splice(text, &[edit]).unwrap();
        assert_eq!(out, "[a]\npytest = \"8.*\"  # pinned\n");
    }

    #[test]
    fn same_line_edits_apply_right_to_left() {
        let text = "a: x, b: y\n";
        // Given in left-to-right order; the longer first replacement must not
        // shift the second one.
        let edits = vec![
            Splice::new(span(0, 3, 4), "longer", "x"),
            Splice::new(span(0, 9, 10), "z", "y"),
        ];
        let out = splice(text, &edits).unwrap();
        assert_eq!(out, "a: longer, b: z\n");
    }

    #[test]
    fn cross_line_order_does_not_matter() {
        let text = "one\ntwo\nthree\n";
        let a = Splice::new(span(0, 0, 3), "1", "one");
        let b = Splice::new(span(2, 0, 5), "3", "three");
        let forward = splice(text, &[a.clone(), b.clone()]).unwrap();
        let backward = splice(text, &[b, a]).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward, "1\ntwo\n3\n");
    }

    #[test]
    fn preserves_crlf_and_missing_final_newline() {
        let text = "a = \"1\"\r\nb = \"2\"";
        let edits = vec![
            Splice::new(span(0, 4, 7), "\"x\"", "\"1\""),
            Splice::new(span(1, 4, 7), "\"y\"", "\"2\""),
        ];
        let out = splice(text, &edits).unwrap();
        assert_eq!(out, "a = \"x\"\r\nb = \"y\"");
    }

    #[test]
    fn multi_line_span_is_rejected() {
        let mut s = span(0, 0, 1);
        s.end.line = 1;
        let result = splice("a\nb\n", &[Splice::new(s, "x", "a\nb")]);
        assert!(matches!(result, Err(SpliceError::MultiLineSpan { .. })));
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let edits = vec![
            Splice::new(span(0, 0, 3), "x", "abc"),
            Splice::new(span(0, 2, 4), "y", "cd"),
        ];
        let result = splice("abcd\n", &edits);
        assert!(matches!(result, Err(SpliceError::Overlapping { .. })));
    }

    #[test]
    fn before_text_is_verified() {
        let result = splice("abc\n", &[Splice::new(span(0, 0, 1), "x", "z")]);
        assert!(matches!(result, Err(SpliceError::BeforeTextMismatch { .. })));
    }

    #[test]
    fn columns_are_bytes() {
        let text = "k = \"é\" # ü\n";
        let out = splice(text, &[Splice::new(span(0, 4, 8), "\"e\"", "\"é\"")]).unwrap();
        assert_eq!(out, "k = \"e\" # ü\n");

        let result = splice(text, &[Splice::new(span(0, 5, 6), "x", "?")]);
        assert!(matches!(result, Err(SpliceError::NotCharBoundary { .. })));
    }

    #[test]
    fn line_out_of_range() {
        let result = splice("a\n", &[Splice::new(span(3, 0, 0), "x", "")]);
        assert!(matches!(
            result,
            Err(SpliceError::LineOutOfRange { line: 3, .. })
        ));
    }
}

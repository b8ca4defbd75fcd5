use crate::ts::errors::TreeSitterError;
use crate::ts::grammar::Grammar;
use crate::ts::parser::{ParsedDocument, SyntaxNode};
use std::ops::Range;
use tree_sitter::{Query, QueryCursor, StreamingIterator};

/// A captured node paired with the capture label assigned by the pattern.
#[derive(Debug, Clone)]
pub struct QueryCapture<'t> {
    pub node: SyntaxNode<'t>,
    pub label: String,
}

impl<'t> QueryCapture<'t> {
    pub fn is(&self, label: &str) -> bool {
        self.label == label
    }
}

/// Engine for executing a compiled tree-sitter query against parsed documents.
pub struct QueryEngine {
    query: Query,
    grammar: Grammar,
    capture_names: Vec<String>,
}

impl QueryEngine {
    /// Compile a structural query for a grammar.
    ///
    /// # Query Syntax
    ///
    /// Tree-sitter queries use S-expression syntax:
    /// ```text
    /// (table
    ///   (dotted_key) @key
    ///   (pair) @entry) @table
    /// ```
    ///
    /// Captures are prefixed with `@`; the name becomes the capture label.
    pub fn new(grammar: Grammar, pattern: &str) -> Result<Self, TreeSitterError> {
        let query = Query::new(&grammar.language(), pattern).map_err(|e| {
            TreeSitterError::InvalidQuery {
                message: e.to_string(),
            }
        })?;

        let capture_names = query.capture_names().iter().map(|s| s.to_string()).collect();

        Ok(Self {
            query,
            grammar,
            capture_names,
        })
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Get capture names defined in the query.
    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    /// Run the query, optionally restricted to a byte range of the document.
    ///
    /// Captures come back in tree order (by node start), not grouped by label.
    /// A node captured by several matches appears once per match.
    pub fn captures<'t>(
        &self,
        parsed: &'t ParsedDocument<'_>,
        scope: Option<Range<usize>>,
    ) -> Vec<QueryCapture<'t>> {
        let source = parsed.source();
        let mut cursor = QueryCursor::new();
        if let Some(range) = scope {
            cursor.set_byte_range(range);
        }

        let mut captures = cursor.captures(&self.query, parsed.tree().root_node(), source.as_bytes());
        let mut results = Vec::new();

        // tree-sitter 0.25+ uses StreamingIterator
        while let Some((m, index)) = captures.next() {
            let capture = m.captures[*index];
            results.push(QueryCapture {
                node: SyntaxNode::new(capture.node, source),
                label: self.capture_names[capture.index as usize].clone(),
            });
        }

        results
    }

    /// Run the query scoped to one node's byte range.
    pub fn captures_in<'t>(
        &self,
        parsed: &'t ParsedDocument<'_>,
        node: &SyntaxNode<'_>,
    ) -> Vec<QueryCapture<'t>> {
        self.captures(parsed, Some(node.byte_range()))
    }
}

/// Canned structural patterns for the supported recipes.
pub mod patterns {
    /// TOML tables with their key and every `key = value` entry.
    pub const TOML_TABLE_ENTRIES: &str = r#"(table
        [(bare_key) (quoted_key) (dotted_key)] @key
        (pair) @entry) @table"#;

    /// YAML sequence items holding a block mapping, e.g. a workflow step.
    /// Which keys the mapping must carry is left to the selector, so
    /// comments between pairs do not hide a step.
    pub const YAML_ACTION_STEP: &str = r#"(block_sequence_item
        (block_node
          (block_mapping))) @step"#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::parser::DocumentParser;

    const TWO_TABLES: &str = r#"[tool.poetry.dependencies]
python = "^3.11"
pytest = "7.*"

[tool.poetry.group.test.dependencies]
pytest = "7.*"
"#;

    #[test]
    fn captures_tables_in_document_order() {
        let mut parser = DocumentParser::new(Grammar::Toml).unwrap();
        let parsed = parser.parse_with_source(TWO_TABLES).unwrap();
        let engine = QueryEngine::new(Grammar::Toml, patterns::TOML_TABLE_ENTRIES).unwrap();

        let captures = engine.captures(&parsed, None);
        let keys: Vec<_> = captures
            .iter()
            .filter(|c| c.is("key"))
            .map(|c| c.node.text())
            .collect();

        assert_eq!(keys.first(), Some(&"tool.poetry.dependencies"));
        assert_eq!(keys.last(), Some(&"tool.poetry.group.test.dependencies"));

        let starts: Vec<_> = captures.iter().map(|c| c.node.span().byte_start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn scoped_captures_stay_in_range() {
        let mut parser = DocumentParser::new(Grammar::Toml).unwrap();
        let parsed = parser.parse_with_source(TWO_TABLES).unwrap();
        let engine = QueryEngine::new(Grammar::Toml, patterns::TOML_TABLE_ENTRIES).unwrap();

        let second = parsed.root().named_children()[1];
        let scoped = engine.captures_in(&parsed, &second);
        let entries: Vec<_> = scoped
            .iter()
            .filter(|c| c.is("entry") && second.contains(&c.node))
            .map(|c| c.node.text().trim_end())
            .collect();

        assert!(!entries.is_empty());
        assert!(entries.iter().all(|e| *e == "pytest = \"7.*\""));
    }

    #[test]
    fn deterministic_capture_sequence() {
        let mut parser = DocumentParser::new(Grammar::Toml).unwrap();
        let parsed = parser.parse_with_source(TWO_TABLES).unwrap();
        let engine = QueryEngine::new(Grammar::Toml, patterns::TOML_TABLE_ENTRIES).unwrap();

        let first: Vec<_> = engine
            .captures(&parsed, None)
            .iter()
            .map(|c| (c.node.span(), c.label.clone()))
            .collect();
        let second: Vec<_> = engine
            .captures(&parsed, None)
            .iter()
            .map(|c| (c.node.span(), c.label.clone()))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn yaml_step_query_compiles_and_matches() {
        let source = "steps:\n  - uses: actions-rs/toolchain@v1\n    with:\n      profile: minimal\n";
        let mut parser = DocumentParser::new(Grammar::Yaml).unwrap();
        let parsed = parser.parse_with_source(source).unwrap();
        let engine = QueryEngine::new(Grammar::Yaml, patterns::YAML_ACTION_STEP).unwrap();

        let steps: Vec<_> = engine
            .captures(&parsed, None)
            .into_iter()
            .filter(|c| c.is("step"))
            .collect();
        assert!(!steps.is_empty());
        assert_eq!(steps[0].node.kind(), "block_sequence_item");
    }

    #[test]
    fn yaml_step_query_sees_past_comments() {
        let source = "- uses: actions-rs/toolchain@v1 # pin\n  with:\n    profile: minimal\n- run: make\n";
        let mut parser = DocumentParser::new(Grammar::Yaml).unwrap();
        let parsed = parser.parse_with_source(source).unwrap();
        let engine = QueryEngine::new(Grammar::Yaml, patterns::YAML_ACTION_STEP).unwrap();

        let steps: Vec<_> = engine
            .captures(&parsed, None)
            .into_iter()
            .filter(|c| c.is("step"))
            .map(|c| c.node.span().start.line)
            .collect();
        assert_eq!(steps, vec![0, 3]);
    }

    #[test]
    fn invalid_query_error() {
        let result = QueryEngine::new(Grammar::Toml, "(no_such_node) @x");
        assert!(matches!(result, Err(TreeSitterError::InvalidQuery { .. })));
    }
}

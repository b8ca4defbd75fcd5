use crate::ts::errors::TreeSitterError;
use crate::ts::grammar::Grammar;
use std::fmt;
use std::ops::Range;
use tree_sitter::{Node, Parser, Point, Tree};

/// A 0-indexed (line, byte column) position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl From<Point> for Position {
    fn from(point: Point) -> Self {
        Self {
            line: point.row,
            column: point.column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Byte range plus line/column span of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.byte_start..self.byte_end
    }
}

/// Tree-sitter parser wrapper bound to one grammar.
pub struct DocumentParser {
    parser: Parser,
    grammar: Grammar,
}

impl DocumentParser {
    pub fn new(grammar: Grammar) -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        parser
            .set_language(&grammar.language())
            .map_err(|_| TreeSitterError::LanguageSet {
                grammar: grammar.id(),
            })?;

        Ok(Self { parser, grammar })
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Parse a document into a concrete syntax tree.
    ///
    /// Trees with recoverable ERROR nodes are returned. Fails only when the
    /// parser produces no tree or when nothing in the document parsed.
    pub fn parse_with_source<'a>(
        &mut self,
        source: &'a str,
    ) -> Result<ParsedDocument<'a>, TreeSitterError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(TreeSitterError::ParseFailed {
                grammar: self.grammar.id(),
            })?;

        let parsed = ParsedDocument {
            source,
            tree,
            grammar: self.grammar,
        };

        if parsed.is_unparsable() {
            return Err(TreeSitterError::Unparsable {
                grammar: self.grammar.id(),
                errors: parsed.error_nodes().len(),
            });
        }

        Ok(parsed)
    }
}

/// A parsed document: the tree plus the source it borrows text from.
pub struct ParsedDocument<'a> {
    source: &'a str,
    tree: Tree,
    grammar: Grammar,
}

impl<'a> ParsedDocument<'a> {
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode::new(self.tree.root_node(), self.source)
    }

    /// Check if the tree contains any ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Get all ERROR and MISSING nodes in the tree.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }

    fn is_unparsable(&self) -> bool {
        let root = self.tree.root_node();
        if root.is_error() {
            return true;
        }
        if !root.has_error() {
            return false;
        }
        let mut cursor = root.walk();
        let mut named = root.named_children(&mut cursor).peekable();
        named.peek().is_some() && named.all(|child| child.is_error())
    }
}

/// Information about an ERROR or MISSING node in the parse tree.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start: Position,
    pub end: Position,
}

fn collect_error_nodes(node: Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start: node.start_position().into(),
            end: node.end_position().into(),
        });
    }

    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}

/// A syntax node viewed together with the source text it was parsed from.
///
/// The view borrows both the tree and the source, so it can never outlive
/// the document it came from.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    node: Node<'t>,
    source: &'t str,
}

impl<'t> SyntaxNode<'t> {
    pub(crate) fn new(node: Node<'t>, source: &'t str) -> Self {
        Self { node, source }
    }

    /// Grammar-defined kind tag.
    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    /// Identity of the node within its tree.
    pub fn id(&self) -> usize {
        self.node.id()
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.node.byte_range()
    }

    pub fn span(&self) -> Span {
        Span {
            byte_start: self.node.start_byte(),
            byte_end: self.node.end_byte(),
            start: self.node.start_position().into(),
            end: self.node.end_position().into(),
        }
    }

    pub fn text(&self) -> &'t str {
        &self.source[self.node.byte_range()]
    }

    pub fn is_error(&self) -> bool {
        self.node.is_error() || self.node.is_missing()
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.node.parent().map(|node| Self::new(node, self.source))
    }

    pub fn children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|node| Self::new(node, self.source))
            .collect()
    }

    pub fn named_children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .map(|node| Self::new(node, self.source))
            .collect()
    }

    /// First named child of the given kind.
    pub fn child_of_kind(&self, kind: &str) -> Option<SyntaxNode<'t>> {
        self.named_children()
            .into_iter()
            .find(|child| child.kind() == kind)
    }

    pub fn child_by_field(&self, field: &str) -> Option<SyntaxNode<'t>> {
        self.node
            .child_by_field_name(field)
            .map(|node| Self::new(node, self.source))
    }

    /// True when `other` lies entirely within this node's byte range.
    pub fn contains(&self, other: &SyntaxNode<'_>) -> bool {
        self.node.start_byte() <= other.node.start_byte()
            && other.node.end_byte() <= self.node.end_byte()
    }

    /// True when this node's parent is `other`.
    pub fn is_child_of(&self, other: &SyntaxNode<'_>) -> bool {
        self.parent().is_some_and(|parent| parent.id() == other.id())
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let span = self.span();
        f.debug_struct("SyntaxNode")
            .field("kind", &self.kind())
            .field("start", &span.start)
            .field("end", &span.end)
            .field("text", &self.text())
            .finish()
    }
}

//! The editor orchestrator: parse, query, select, refine, splice, persist.
//!
//! Every stage returns `Result<_, EditError>`. [`SurgicalEditor`] converts
//! the first error into [`EditResult::Failed`] at its public boundary, so a
//! caller only ever sees one of the four outcomes.

use crate::cache::get_or_compile_query;
use crate::document::Document;
use crate::pool::with_parser;
use crate::recipe::{Occurrence, Refinement, Refiner, ReplacementStyle, Selector, TargetSpec};
use crate::safety::SafetyError;
use crate::splice::{splice, Splice, SpliceError};
use crate::toml::{self, TomlError};
use crate::ts::{validate_splice, ErrorNode, Grammar, Position, QueryEngine, TreeSitterError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Minimum Jaro-Winkler similarity for a did-you-mean suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

#[derive(Error, Debug)]
pub enum EditError {
    #[error(transparent)]
    TreeSitter(#[from] TreeSitterError),

    #[error(transparent)]
    Splice(#[from] SpliceError),

    #[error(transparent)]
    Toml(#[from] TomlError),

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("construct `{path}` is ambiguous: {count} distinct key paths in one construct")]
    AmbiguousTarget { path: String, count: usize },

    #[error("value at {start}..{end} spans several lines; only single-line values can be replaced")]
    UnsupportedSpan { start: Position, end: Position },

    #[error("replacement would corrupt the document: {message}")]
    InvalidReplacement { message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", path.display())]
    Utf8 { path: PathBuf },
}

/// Stages of a single edit, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EditStage {
    Start,
    Parsed,
    Queried,
    Selected,
    Refined,
    Spliced,
    Persisted,
}

impl fmt::Display for EditStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditStage::Start => "start",
            EditStage::Parsed => "parsed",
            EditStage::Queried => "queried",
            EditStage::Selected => "selected",
            EditStage::Refined => "refined",
            EditStage::Spliced => "spliced",
            EditStage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Outcome of one edit operation.
#[derive(Debug)]
#[must_use = "EditResult should be checked for Applied/NotApplicable/Failed"]
pub enum EditResult {
    /// The document was rewritten; `text` is the full mutated document.
    Applied { text: String, edits: Vec<Splice> },
    /// The target construct or entry is absent.
    NotApplicable { stage: EditStage, reason: String },
    /// The target already holds the desired value.
    AlreadyPatched,
    Failed(EditError),
}

impl EditResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditResult::Applied { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, EditResult::Failed(_))
    }

    /// Short status label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            EditResult::Applied { .. } => "applied",
            EditResult::NotApplicable { .. } => "not-applicable",
            EditResult::AlreadyPatched => "already-patched",
            EditResult::Failed(_) => "failed",
        }
    }

    /// The mutated text, when applied.
    pub fn text(&self) -> Option<&str> {
        match self {
            EditResult::Applied { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl From<EditError> for EditResult {
    fn from(err: EditError) -> Self {
        EditResult::Failed(err)
    }
}

/// A grammar, compiled query and selector/refiner pair ready to edit documents.
///
/// Holds no per-document state: every call parses its input afresh, so one
/// editor can be reused across documents.
pub struct SurgicalEditor {
    grammar: Grammar,
    engine: Arc<QueryEngine>,
    selector: Box<dyn Selector>,
    refiner: Box<dyn Refiner>,
}

impl SurgicalEditor {
    pub fn new(
        grammar: Grammar,
        pattern: &str,
        selector: Box<dyn Selector>,
        refiner: Box<dyn Refiner>,
    ) -> Result<Self, EditError> {
        let engine = get_or_compile_query(grammar, pattern)?;
        Ok(Self {
            grammar,
            engine,
            selector,
            refiner,
        })
    }

    /// Like [`SurgicalEditor::new`], resolving the grammar from its identifier.
    ///
    /// An unregistered id fails with [`TreeSitterError::UnknownGrammar`].
    pub fn for_grammar_id(
        grammar_id: &str,
        pattern: &str,
        selector: Box<dyn Selector>,
        refiner: Box<dyn Refiner>,
    ) -> Result<Self, EditError> {
        Self::new(grammar_id.parse()?, pattern, selector, refiner)
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Apply `target` to in-memory text. Nothing is written anywhere.
    pub fn apply_text(&self, text: &str, target: &TargetSpec) -> EditResult {
        match self.run(text, target) {
            Ok(result) => result,
            Err(err) => {
                warn!(edit = %target, error = %err, "edit failed");
                EditResult::Failed(err)
            }
        }
    }

    /// Apply `target` to a document's contents.
    pub fn apply_document(&self, document: &Document, target: &TargetSpec) -> EditResult {
        match document.text() {
            Ok(text) => self.apply_text(text, target),
            Err(err) => EditResult::Failed(err),
        }
    }

    /// Read, edit and atomically rewrite a file.
    ///
    /// The file is written only when the result is [`EditResult::Applied`].
    pub fn apply_file(&self, path: impl AsRef<Path>, target: &TargetSpec) -> EditResult {
        let document = match Document::read(path.as_ref()) {
            Ok(document) => document,
            Err(err) => return EditResult::Failed(err),
        };

        let result = self.apply_document(&document, target);
        if let EditResult::Applied { text, .. } = &result {
            if let Err(err) = document.with_text(text.as_str()).persist() {
                return EditResult::Failed(err);
            }
            info!(path = %document.path().display(), edit = %target, "document persisted");
            debug!(stage = %EditStage::Persisted);
        }
        result
    }

    fn run(&self, text: &str, target: &TargetSpec) -> Result<EditResult, EditError> {
        let grammar = self.grammar;
        debug!(stage = %EditStage::Start, grammar = %grammar, edit = %target);

        if target.style == ReplacementStyle::Verbatim && grammar == Grammar::Toml {
            toml::validate_value(&target.replacement)?;
        }

        let parsed = with_parser(grammar, |parser| parser.parse_with_source(text))??;
        let syntax_errors = parsed.error_nodes();
        if !syntax_errors.is_empty() {
            warn!(
                errors = syntax_errors.len(),
                "document has syntax errors; only well-formed regions are editable"
            );
        }
        debug!(stage = %EditStage::Parsed);

        let captures = self.engine.captures(&parsed, None);
        debug!(stage = %EditStage::Queried, captures = captures.len());

        let selection = self
            .selector
            .select(&parsed, &self.engine, &captures, target)?;
        if selection.constructs.is_empty() {
            return Ok(EditResult::NotApplicable {
                stage: EditStage::Selected,
                reason: missing_construct(&target.path, &selection.seen),
            });
        }
        debug!(
            stage = %EditStage::Selected,
            selector = self.selector.name(),
            constructs = selection.constructs.len()
        );

        let mut edits = Vec::new();
        let mut satisfied = 0;
        for construct in &selection.constructs {
            let value = match self.refiner.refine(grammar, &construct.entries, target) {
                Refinement::Replace(value) => value,
                Refinement::Satisfied(value) => {
                    debug!(path = construct.path, value = value.text(), "entry already satisfied");
                    satisfied += 1;
                    continue;
                }
                Refinement::Missing => {
                    debug!(path = construct.path, key = %target.entry_key, "entry not found");
                    continue;
                }
            };

            let current = value.text();
            let replacement = self.render(target, current);
            if self.holds_replacement(target, current, &replacement) {
                satisfied += 1;
                continue;
            }
            if target.style == ReplacementStyle::Scalar
                && grammar.decode_scalar(&replacement) != target.replacement.as_str()
            {
                return Err(EditError::InvalidReplacement {
                    message: format!(
                        "`{replacement}` does not read back as `{}`",
                        target.replacement
                    ),
                });
            }

            let span = value.span();
            if !span.is_single_line() {
                return Err(EditError::UnsupportedSpan {
                    start: span.start,
                    end: span.end,
                });
            }
            debug!(
                path = construct.path,
                line = span.start.line + 1,
                from = current,
                to = %replacement,
                "found entry value"
            );
            edits.push(Splice::new(span, replacement, current));
        }
        debug!(
            stage = %EditStage::Refined,
            refiner = self.refiner.name(),
            edits = edits.len(),
            satisfied
        );

        if edits.is_empty() {
            if satisfied > 0 {
                return Ok(EditResult::AlreadyPatched);
            }
            return Ok(EditResult::NotApplicable {
                stage: EditStage::Refined,
                reason: missing_entry(target),
            });
        }

        let mutated = splice(text, &edits)?;
        self.validate(&syntax_errors, text, &mutated)?;
        debug!(stage = %EditStage::Spliced, edits = edits.len());

        Ok(EditResult::Applied {
            text: mutated,
            edits,
        })
    }

    fn render(&self, target: &TargetSpec, current: &str) -> String {
        match target.style {
            ReplacementStyle::Scalar => self.grammar.render_scalar(&target.replacement, current),
            ReplacementStyle::Verbatim => target.replacement.clone(),
        }
    }

    fn holds_replacement(&self, target: &TargetSpec, current: &str, rendered: &str) -> bool {
        current == rendered
            || (target.style == ReplacementStyle::Scalar
                && self.grammar.decode_scalar(current) == target.replacement.as_str())
    }

    /// Reject a splice that breaks the document.
    fn validate(
        &self,
        before_errors: &[ErrorNode],
        before: &str,
        after: &str,
    ) -> Result<(), EditError> {
        validate_splice(self.grammar, before_errors, after).map_err(|err| {
            EditError::InvalidReplacement {
                message: err.to_string(),
            }
        })?;

        // toml_edit is stricter than the grammar; only hold the edit to it
        // when the original document passed.
        if self.grammar == Grammar::Toml && toml::validate_document(before).is_ok() {
            toml::validate_document(after).map_err(|err| EditError::InvalidReplacement {
                message: err.to_string(),
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for SurgicalEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurgicalEditor")
            .field("grammar", &self.grammar)
            .field("selector", &self.selector.name())
            .field("refiner", &self.refiner.name())
            .finish()
    }
}

fn missing_construct(path: &str, seen: &[String]) -> String {
    match closest_match(path, seen) {
        Some(suggestion) => format!("no construct `{path}` (did you mean `{suggestion}`?)"),
        None => format!("no construct `{path}`"),
    }
}

fn missing_entry(target: &TargetSpec) -> String {
    match (&target.current_value, target.occurrence) {
        (Some(current), _) => format!(
            "no entry `{}` = `{current}` in `{}`",
            target.entry_key, target.path
        ),
        (None, Occurrence::All) => format!(
            "no entry `{}` in any `{}`",
            target.entry_key, target.path
        ),
        (None, Occurrence::First) => {
            format!("no entry `{}` in `{}`", target.entry_key, target.path)
        }
    }
}

/// Closest candidate to `wanted` by Jaro-Winkler similarity, if close enough.
fn closest_match<'a>(wanted: &str, candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|candidate| (candidate, strsim::jaro_winkler(wanted, candidate)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate.as_str())
}

use crate::editor::EditError;
use crate::recipe::target::{Occurrence, TargetSpec};
use crate::recipe::{entry_key, entry_value, mapping_entries};
use crate::ts::{ParsedDocument, QueryCapture, QueryEngine, SyntaxNode};
use std::collections::HashSet;
use tracing::{debug, trace};

/// A construct whose identifying path matched the target, with its entries.
#[derive(Debug, Clone)]
pub struct Construct<'t> {
    pub node: SyntaxNode<'t>,
    pub path: &'t str,
    /// Entry (key/value pair) nodes belonging to the construct, in order.
    pub entries: Vec<SyntaxNode<'t>>,
}

/// Outcome of a selection pass.
#[derive(Debug, Clone, Default)]
pub struct Selection<'t> {
    /// Matching constructs in document order.
    pub constructs: Vec<Construct<'t>>,
    /// Identifying paths of every construct inspected, matching or not.
    pub seen: Vec<String>,
}

/// Narrows raw query captures down to the constructs a target names.
pub trait Selector: Send + Sync {
    fn name(&self) -> &'static str;

    fn select<'t>(
        &self,
        parsed: &'t ParsedDocument<'_>,
        engine: &QueryEngine,
        captures: &[QueryCapture<'t>],
        target: &TargetSpec,
    ) -> Result<Selection<'t>, EditError>;
}

/// Selects TOML tables by their header key path.
///
/// Expects captures labelled `table`, `key` and `entry` (see
/// [`patterns::TOML_TABLE_ENTRIES`](crate::ts::patterns::TOML_TABLE_ENTRIES)).
/// A table header has exactly one key node; a pattern that captures several
/// `key` children of one table fails with [`EditError::AmbiguousTarget`]
/// rather than picking one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableSelector;

impl Selector for TableSelector {
    fn name(&self) -> &'static str {
        "toml-table"
    }

    fn select<'t>(
        &self,
        parsed: &'t ParsedDocument<'_>,
        engine: &QueryEngine,
        captures: &[QueryCapture<'t>],
        target: &TargetSpec,
    ) -> Result<Selection<'t>, EditError> {
        let mut selection = Selection::default();

        for table in distinct(captures, "table") {
            // Re-query inside this table only, so structurally identical
            // tables elsewhere cannot contribute keys or entries.
            let scoped = engine.captures_in(parsed, &table);
            let own = |c: &QueryCapture<'t>| c.node.is_child_of(&table);

            let keys = distinct_where(&scoped, "key", own);
            let key = match keys.as_slice() {
                [] => continue,
                [key] => key.text(),
                _ => {
                    return Err(EditError::AmbiguousTarget {
                        path: target.path.clone(),
                        count: keys.len(),
                    })
                }
            };
            selection.seen.push(key.to_string());

            if key.as_bytes() != target.path.as_bytes() {
                trace!(key, "table key does not match target");
                continue;
            }

            let entries = distinct_where(&scoped, "entry", own);
            let span = table.span();
            debug!(
                key,
                start_line = span.start.line,
                end_line = span.end.line,
                entries = entries.len(),
                "found target table"
            );
            selection.constructs.push(Construct {
                node: table,
                path: key,
                entries,
            });

            if target.occurrence == Occurrence::First {
                break;
            }
        }

        Ok(selection)
    }
}

/// Selects GitHub Actions workflow steps by their `uses:` value.
///
/// The construct's entries are the pairs of the step's `with:` mapping.
/// Steps without a `with:` block are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionStepSelector;

impl Selector for ActionStepSelector {
    fn name(&self) -> &'static str {
        "yaml-action-step"
    }

    fn select<'t>(
        &self,
        _parsed: &'t ParsedDocument<'_>,
        _engine: &QueryEngine,
        captures: &[QueryCapture<'t>],
        target: &TargetSpec,
    ) -> Result<Selection<'t>, EditError> {
        let mut selection = Selection::default();

        for step in distinct(captures, "step") {
            // block_sequence_item -> block_node -> block_mapping -> pairs
            let Some(pairs) = step
                .child_of_kind("block_node")
                .and_then(|node| mapping_entries(&node))
            else {
                continue;
            };

            let Some(uses) = find_entry(&pairs, "uses").and_then(|pair| entry_value(&pair)) else {
                continue;
            };
            let action = uses.text();
            selection.seen.push(action.to_string());

            if action.as_bytes() != target.path.as_bytes() {
                trace!(action, "step action does not match target");
                continue;
            }

            let Some(entries) = find_entry(&pairs, "with")
                .and_then(|pair| entry_value(&pair))
                .and_then(|value| mapping_entries(&value))
            else {
                debug!(action, "matching step has no `with` mapping");
                continue;
            };

            debug!(
                action,
                line = step.span().start.line,
                entries = entries.len(),
                "found target step"
            );
            selection.constructs.push(Construct {
                node: step,
                path: action,
                entries,
            });

            if target.occurrence == Occurrence::First {
                break;
            }
        }

        Ok(selection)
    }
}

fn find_entry<'t>(pairs: &[SyntaxNode<'t>], key: &str) -> Option<SyntaxNode<'t>> {
    pairs
        .iter()
        .find(|pair| entry_key(pair).is_some_and(|k| k.text() == key))
        .copied()
}

/// Nodes captured under `label`, first occurrence only, in capture order.
fn distinct<'t>(captures: &[QueryCapture<'t>], label: &str) -> Vec<SyntaxNode<'t>> {
    distinct_where(captures, label, |_| true)
}

fn distinct_where<'t>(
    captures: &[QueryCapture<'t>],
    label: &str,
    keep: impl Fn(&QueryCapture<'t>) -> bool,
) -> Vec<SyntaxNode<'t>> {
    let mut seen = HashSet::new();
    captures
        .iter()
        .filter(|c| c.is(label) && keep(c))
        .filter(|c| seen.insert(c.node.id()))
        .map(|c| c.node)
        .collect()
}

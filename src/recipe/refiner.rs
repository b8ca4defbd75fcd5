use crate::recipe::target::TargetSpec;
use crate::recipe::{entry_key, entry_value};
use crate::ts::{Grammar, SyntaxNode};
use tracing::trace;

/// Result of refining a construct's entries down to one value node.
#[derive(Debug, Clone, Copy)]
pub enum Refinement<'t> {
    /// This value node should be replaced.
    Replace(SyntaxNode<'t>),
    /// The entry exists and already satisfies the target.
    Satisfied(SyntaxNode<'t>),
    /// No entry matched.
    Missing,
}

/// Picks the value node to rewrite from a selected construct's entries.
pub trait Refiner: Send + Sync {
    fn name(&self) -> &'static str;

    fn refine<'t>(
        &self,
        grammar: Grammar,
        entries: &[SyntaxNode<'t>],
        target: &TargetSpec,
    ) -> Refinement<'t>;
}

/// Matches the entry by key and, when the target carries one, by current value.
///
/// Keys compare byte-for-byte. The current-value filter accepts either the
/// raw value text or its decoded scalar, so `7.*` matches `"7.*"`. A filtered
/// entry that already holds the replacement is reported as satisfied, so
/// re-running a filtered edit is idempotent.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryRefiner;

impl Refiner for EntryRefiner {
    fn name(&self) -> &'static str {
        "entry"
    }

    fn refine<'t>(
        &self,
        grammar: Grammar,
        entries: &[SyntaxNode<'t>],
        target: &TargetSpec,
    ) -> Refinement<'t> {
        let mut satisfied = None;
        for entry in entries {
            let Some(key) = entry_key(entry) else {
                continue;
            };
            if key.text().as_bytes() != target.entry_key.as_bytes() {
                continue;
            }
            let Some(value) = entry_value(entry) else {
                continue;
            };
            if let Some(filter) = &target.current_value {
                if !matches_scalar(grammar, value.text(), filter) {
                    trace!(key = key.text(), value = value.text(), "value filter rejected entry");
                    if matches_scalar(grammar, value.text(), &target.replacement) {
                        satisfied.get_or_insert(value);
                    }
                    continue;
                }
            }
            return Refinement::Replace(value);
        }
        satisfied.map_or(Refinement::Missing, Refinement::Satisfied)
    }
}

/// [`EntryRefiner`] that only replaces when the major version goes up.
///
/// An entry whose leading major number is already at or above the
/// replacement's is reported as satisfied. Values without a readable major
/// (`*`, git sources, inline tables) are always replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorBumpRefiner;

impl Refiner for MajorBumpRefiner {
    fn name(&self) -> &'static str {
        "major-bump"
    }

    fn refine<'t>(
        &self,
        grammar: Grammar,
        entries: &[SyntaxNode<'t>],
        target: &TargetSpec,
    ) -> Refinement<'t> {
        match EntryRefiner.refine(grammar, entries, target) {
            Refinement::Replace(value) => {
                let current = grammar.decode_scalar(value.text());
                match (leading_major(&current), leading_major(&target.replacement)) {
                    (Some(have), Some(want)) if have >= want => {
                        trace!(have, want, "major version already satisfied");
                        Refinement::Satisfied(value)
                    }
                    _ => Refinement::Replace(value),
                }
            }
            other => other,
        }
    }
}

fn matches_scalar(grammar: Grammar, raw: &str, expected: &str) -> bool {
    raw == expected || grammar.decode_scalar(raw) == expected
}

/// Leading major version number of a constraint such as `^7.2`, `>=7,<8`
/// or `7.*`.
pub fn leading_major(constraint: &str) -> Option<u64> {
    let rest = constraint.trim_start_matches(|c: char| !c.is_ascii_digit());
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

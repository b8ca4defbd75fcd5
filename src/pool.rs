//! Thread-local parser pooling.
//!
//! Keeps one reusable parser per grammar per thread. Parsers are reused;
//! syntax trees never are, every call parses its input afresh.

use crate::ts::{DocumentParser, Grammar, TreeSitterError};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<Grammar, DocumentParser>> = RefCell::new(HashMap::new());
}

/// Execute function with the pooled parser for `grammar`.
///
/// On first call per thread and grammar, creates a new parser. Subsequent
/// calls reuse the same instance.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use surgical_edit::pool::with_parser;
/// use surgical_edit::ts::Grammar;
///
/// let has_errors = with_parser(Grammar::Toml, |parser| {
///     parser.parse_with_source("[a]\nb = 1\n").map(|parsed| parsed.has_errors())
/// })??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(grammar: Grammar, f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut DocumentParser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(grammar) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(DocumentParser::new(grammar)?)
            }
        };
        Ok(f(parser))
    })
}

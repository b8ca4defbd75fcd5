//! Thread-local compiled query cache.
//!
//! Compiling a tree-sitter query walks the grammar's symbol tables; editors
//! built repeatedly for the same recipe reuse the compiled engine instead.
//! Cache is capped at 64 entries and cleared wholesale when full.

use crate::ts::{Grammar, QueryEngine, TreeSitterError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

const MAX_CACHE_ENTRIES: usize = 64;

thread_local! {
    // Keyed by grammar as well: the same pattern text compiles differently
    // (or not at all) against another grammar.
    static QUERY_CACHE: RefCell<HashMap<(Grammar, String), Arc<QueryEngine>>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled query from cache, or compile and cache it.
pub fn get_or_compile_query(
    grammar: Grammar,
    pattern: &str,
) -> Result<Arc<QueryEngine>, TreeSitterError> {
    QUERY_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let key = (grammar, pattern.to_string());

        if let Some(engine) = cache.get(&key) {
            return Ok(Arc::clone(engine));
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let engine = Arc::new(QueryEngine::new(grammar, pattern)?);
        cache.insert(key, Arc::clone(&engine));
        Ok(engine)
    })
}

/// Clear the query cache (mainly for testing).
pub fn clear_cache() {
    QUERY_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

/// Number of compiled queries cached on this thread.
pub fn cache_size() -> usize {
    QUERY_CACHE.with(|cache| cache.borrow().len())
}

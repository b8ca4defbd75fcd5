use crate::pool::with_parser;
use crate::ts::errors::TreeSitterError;
use crate::ts::grammar::Grammar;
use crate::ts::parser::ErrorNode;

/// Validate that a splice doesn't introduce syntax errors.
///
/// `before_errors` are the ERROR/MISSING nodes of the tree the splice was
/// computed from; only the mutated text is parsed here. Documents that were
/// already broken stay acceptable as long as the edit adds no new errors.
pub fn validate_splice(
    grammar: Grammar,
    before_errors: &[ErrorNode],
    after: &str,
) -> Result<(), TreeSitterError> {
    let after_errors = with_parser(grammar, |parser| {
        parser
            .parse_with_source(after)
            .map(|parsed| parsed.error_nodes())
    })??;

    if after_errors.len() <= before_errors.len() {
        return Ok(());
    }

    let first_new = after_errors
        .iter()
        .find(|e| {
            !before_errors
                .iter()
                .any(|o| o.byte_start == e.byte_start && o.byte_end == e.byte_end)
        })
        .or(after_errors.first())
        .map(|e| e.byte_start)
        .unwrap_or_default();

    Err(TreeSitterError::IntroducedErrors {
        count: after_errors.len() - before_errors.len(),
        byte_start: first_new,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::parser::DocumentParser;

    fn check(grammar: Grammar, before: &str, after: &str) -> Result<(), TreeSitterError> {
        let mut parser = DocumentParser::new(grammar).unwrap();
        let before_errors = parser.parse_with_source(before).unwrap().error_nodes();
        validate_splice(grammar, &before_errors, after)
    }

    #[test]
    fn value_swap_is_valid() {
        let before = "[a]\nkey = \"1\"\n";
        let after = "[a]\nkey = \"2\"\n";
        assert!(check(Grammar::Toml, before, after).is_ok());
    }

    #[test]
    fn unterminated_string_is_rejected() {
        let before = "[a]\nkey = \"1\"\nother = 2\n";
        let after = "[a]\nkey = \"1\nother = 2\n";
        let result = check(Grammar::Toml, before, after);
        assert!(matches!(result, Err(TreeSitterError::IntroducedErrors { .. })));
    }

    #[test]
    fn already_broken_document_is_tolerated() {
        let before = "[a]\nkey = \"1\"\n[broken\n";
        let after = "[a]\nkey = \"2\"\n[broken\n";
        assert!(check(Grammar::Toml, before, after).is_ok());
    }

    #[test]
    fn yaml_plain_value_swap_is_valid() {
        let before = "with:\n  profile: minimal\n";
        let after = "with:\n  profile: default\n";
        assert!(check(Grammar::Yaml, before, after).is_ok());
    }
}

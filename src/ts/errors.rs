use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeSitterError {
    #[error("unknown grammar '{id}' (expected one of: toml, yaml)")]
    UnknownGrammar { id: String },

    #[error("failed to set {grammar} language for parser")]
    LanguageSet { grammar: &'static str },

    #[error("failed to parse {grammar} document")]
    ParseFailed { grammar: &'static str },

    #[error("{grammar} document is unparsable: no well-formed region ({errors} ERROR nodes)")]
    Unparsable { grammar: &'static str, errors: usize },

    #[error("invalid tree-sitter query: {message}")]
    InvalidQuery { message: String },

    #[error("edit introduced {count} new syntax error(s), first at byte {byte_start}")]
    IntroducedErrors { count: usize, byte_start: usize },
}

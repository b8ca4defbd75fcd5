//! TOML helpers backed by `toml_edit`: whole-document validation and the
//! scalar quoting rules used when splicing replacement values.

pub mod errors;
pub mod scalar;
pub mod validator;

pub use errors::TomlError;
pub use scalar::{decode_string, render_string, validate_value};
pub use validator::validate_document;

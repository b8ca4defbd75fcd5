use thiserror::Error;

#[derive(Error, Debug)]
pub enum TomlError {
    #[error("invalid TOML syntax: {message}")]
    InvalidTomlSyntax { message: String },

    #[error("invalid TOML value '{value}': {message}")]
    InvalidValue { value: String, message: String },
}

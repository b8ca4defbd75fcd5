use crate::toml::errors::TomlError;
use std::borrow::Cow;
use toml_edit::Value;

/// Render `value` as a TOML string literal.
///
/// A literal (single-quoted) existing value stays literal when the new value
/// fits the literal-string rules; otherwise `toml_edit` picks the encoding.
pub fn render_string(value: &str, existing: &str) -> String {
    let literal_ok = !value.contains('\'') && !value.chars().any(|c| c.is_control() && c != '\t');
    if existing.starts_with('\'') && !existing.starts_with("'''") && literal_ok {
        return format!("'{value}'");
    }
    Value::from(value).to_string()
}

/// Decode a raw TOML value to its string content.
///
/// Values that are not strings (integers, arrays, inline tables) come back
/// unchanged.
pub fn decode_string(raw: &str) -> Cow<'_, str> {
    match raw.parse::<Value>() {
        Ok(Value::String(s)) => Cow::Owned(s.value().to_string()),
        _ => Cow::Borrowed(raw),
    }
}

/// Check that verbatim replacement text is a single TOML value.
pub fn validate_value(raw: &str) -> Result<(), TomlError> {
    raw.parse::<Value>()
        .map(|_| ())
        .map_err(|err| TomlError::InvalidValue {
            value: raw.to_string(),
            message: err.to_string(),
        })
}

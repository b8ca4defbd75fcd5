//! Grammar registry: maps grammar identifiers to tree-sitter languages and
//! knows each grammar's scalar quoting convention.

use crate::toml;
use crate::ts::errors::TreeSitterError;
use ast_grep_language::{LanguageExt, SupportLang};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tree_sitter::Language;

/// A registered document grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    Toml,
    Yaml,
}

impl Grammar {
    /// Canonical identifier, as accepted by [`Grammar::from_str`].
    pub fn id(&self) -> &'static str {
        match self {
            Grammar::Toml => "toml",
            Grammar::Yaml => "yaml",
        }
    }

    /// Guess the grammar from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Some(Grammar::Toml),
            Some("yaml") | Some("yml") => Some(Grammar::Yaml),
            _ => None,
        }
    }

    /// The tree-sitter language backing this grammar.
    pub fn language(&self) -> Language {
        match self {
            Grammar::Toml => tree_sitter_toml_ng::LANGUAGE.into(),
            Grammar::Yaml => SupportLang::Yaml.get_ts_language(),
        }
    }

    /// Render a replacement scalar in this grammar's convention.
    ///
    /// `existing` is the raw text of the value being replaced; its quoting
    /// style is kept when the replacement can be expressed in it.
    pub fn render_scalar(&self, value: &str, existing: &str) -> String {
        match self {
            Grammar::Toml => toml::render_string(value, existing),
            Grammar::Yaml => render_yaml_scalar(value, existing),
        }
    }

    /// Decode the scalar value of a raw value node text, stripping quotes.
    ///
    /// Non-string values are returned unchanged.
    pub fn decode_scalar<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        match self {
            Grammar::Toml => toml::decode_string(raw),
            Grammar::Yaml => decode_yaml_scalar(raw),
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Grammar {
    type Err = TreeSitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toml" => Ok(Grammar::Toml),
            "yaml" | "yml" => Ok(Grammar::Yaml),
            _ => Err(TreeSitterError::UnknownGrammar { id: s.to_string() }),
        }
    }
}

fn render_yaml_scalar(value: &str, existing: &str) -> String {
    if is_quoted(existing, '\'') && !value.chars().any(char::is_control) {
        format!("'{}'", value.replace('\'', "''"))
    } else if is_quoted(existing, '"') || !is_plain_safe(value) {
        double_quoted(value)
    } else {
        value.to_string()
    }
}

/// Characters that cannot start a plain scalar.
const YAML_INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
    '`',
];

/// Whether `value` reads back unchanged as a plain scalar in block context.
fn is_plain_safe(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    !YAML_INDICATORS.contains(&first)
        && value.trim() == value
        && !value.ends_with(':')
        && !value.contains(": ")
        && !value.contains(" #")
        && !value.chars().any(char::is_control)
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn decode_yaml_scalar(raw: &str) -> Cow<'_, str> {
    if is_quoted(raw, '"') {
        let inner = &raw[1..raw.len() - 1];
        if inner.contains('\\') {
            Cow::Owned(unescape_double_quoted(inner))
        } else {
            Cow::Borrowed(inner)
        }
    } else if is_quoted(raw, '\'') {
        let inner = &raw[1..raw.len() - 1];
        if inner.contains("''") {
            Cow::Owned(inner.replace("''", "'"))
        } else {
            Cow::Borrowed(inner)
        }
    } else {
        Cow::Borrowed(raw)
    }
}

/// Resolve the escapes of a double-quoted scalar body. Unknown escapes are
/// kept as written.
fn unescape_double_quoted(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(' ') => out.push(' '),
            Some('/') => out.push('/'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let valid = digits.len() == width && digits.chars().all(|d| d.is_ascii_hexdigit());
                let decoded = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32);
                match decoded {
                    Some(decoded) if valid => {
                        out.push(decoded);
                        chars.nth(width - 1);
                    }
                    _ => {
                        out.push('\\');
                        out.push(kind);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn is_quoted(raw: &str, quote: char) -> bool {
    raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote)
}

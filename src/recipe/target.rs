use serde::Deserialize;
use std::fmt;

/// Which matching constructs an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occurrence {
    /// First matching construct in document order.
    #[default]
    First,
    /// Every matching construct.
    All,
}

/// How the replacement text is written into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacementStyle {
    /// Quoted according to the grammar's scalar convention.
    #[default]
    Scalar,
    /// Inserted exactly as given.
    Verbatim,
}

/// What to change: the construct path, the entry within it, and the new value.
///
/// Absence of the construct or entry is a normal outcome, not a
/// construction-time error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Identifying path of the construct, compared byte-for-byte
    /// (a TOML table key such as `tool.poetry.dependencies`, or a workflow
    /// step's `uses:` value).
    pub path: String,
    /// Key of the entry whose value is replaced.
    pub entry_key: String,
    /// Only replace when the current value matches this.
    pub current_value: Option<String>,
    pub replacement: String,
    pub style: ReplacementStyle,
    pub occurrence: Occurrence,
}

impl TargetSpec {
    pub fn new(
        path: impl Into<String>,
        entry_key: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            entry_key: entry_key.into(),
            current_value: None,
            replacement: replacement.into(),
            style: ReplacementStyle::default(),
            occurrence: Occurrence::default(),
        }
    }

    /// Target a package in a poetry dependency table, optionally within a group.
    pub fn poetry_dependency(
        package: impl Into<String>,
        group: Option<&str>,
        version: impl Into<String>,
    ) -> Self {
        Self::new(poetry_dependency_key(group), package, version)
    }

    pub fn with_current_value(mut self, current: impl Into<String>) -> Self {
        self.current_value = Some(current.into());
        self
    }

    pub fn with_style(mut self, style: ReplacementStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_occurrence(mut self, occurrence: Occurrence) -> Self {
        self.occurrence = occurrence;
        self
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.path, self.entry_key)
    }
}

/// Key path of poetry's dependency table for `group` (poetry >= 1.2 groups).
pub fn poetry_dependency_key(group: Option<&str>) -> String {
    match group {
        Some(group) => format!("tool.poetry.group.{group}.dependencies"),
        None => "tool.poetry.dependencies".to_string(),
    }
}

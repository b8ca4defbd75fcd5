use crate::recipe::{Occurrence, Recipe, ReplacementStyle, TargetSpec};
use crate::ts::Grammar;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// A plan of surgical edits, loaded from a TOML file.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditPlan {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub edits: Vec<EditDefinition>,
}

impl EditPlan {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }

        let mut ids = HashSet::new();
        for edit in &self.edits {
            let edit_id = (!edit.id.trim().is_empty()).then(|| edit.id.clone());
            if edit_id.is_none() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: None,
                    field: "id",
                });
            } else if !ids.insert(edit.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    edit_id: edit.id.clone(),
                });
            }

            if edit.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: edit_id.clone(),
                    field: "file",
                });
            }

            for field in edit.recipe.missing_fields() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: edit_id.clone(),
                    field,
                });
            }

            match edit.grammar() {
                Err(grammar) => issues.push(ValidationIssue::UnknownGrammar {
                    edit_id: edit_id.clone(),
                    grammar,
                }),
                Ok(Some(grammar)) if grammar != edit.recipe.recipe().grammar() => {
                    issues.push(ValidationIssue::InvalidCombo {
                        edit_id: edit_id.clone(),
                        message: format!(
                            "recipe '{}' edits {} documents, but '{}' is {}",
                            edit.recipe.recipe(),
                            edit.recipe.recipe().grammar(),
                            edit.file,
                            grammar
                        ),
                    });
                }
                Ok(_) => {}
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditDefinition {
    pub id: String,
    /// Repo-relative path of the document to edit.
    pub file: String,
    /// Grammar override; guessed from the file extension when absent.
    #[serde(default)]
    pub grammar: Option<String>,
    #[serde(default)]
    pub occurrence: Occurrence,
    pub recipe: RecipeConfig,
}

impl EditDefinition {
    /// Grammar named by the definition or implied by the file extension.
    ///
    /// `Err` carries an unrecognised grammar id.
    pub fn grammar(&self) -> Result<Option<Grammar>, String> {
        match &self.grammar {
            Some(id) => id.parse().map(Some).map_err(|_| id.clone()),
            None => Ok(Grammar::from_path(Path::new(&self.file))),
        }
    }

    pub fn target(&self) -> TargetSpec {
        self.recipe.target().with_occurrence(self.occurrence)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RecipeConfig {
    DependencyVersionBump {
        package: String,
        #[serde(default)]
        group: Option<String>,
        version: String,
        /// Only replace this current constraint.
        #[serde(default)]
        current: Option<String>,
        /// Insert `version` as a raw TOML value (e.g. an inline table).
        #[serde(default)]
        verbatim: bool,
    },
    DependencyMajorBump {
        package: String,
        #[serde(default)]
        group: Option<String>,
        version: String,
    },
    ActionParameterReplace {
        action: String,
        key: String,
        #[serde(default)]
        current: Option<String>,
        replacement: String,
    },
}

impl RecipeConfig {
    pub fn recipe(&self) -> Recipe {
        match self {
            RecipeConfig::DependencyVersionBump { .. } => Recipe::DependencyVersionBump,
            RecipeConfig::DependencyMajorBump { .. } => Recipe::DependencyMajorBump,
            RecipeConfig::ActionParameterReplace { .. } => Recipe::ActionParameterReplace,
        }
    }

    pub fn target(&self) -> TargetSpec {
        match self {
            RecipeConfig::DependencyVersionBump {
                package,
                group,
                version,
                current,
                verbatim,
            } => {
                let style = if *verbatim {
                    ReplacementStyle::Verbatim
                } else {
                    ReplacementStyle::Scalar
                };
                let target = TargetSpec::poetry_dependency(package, group.as_deref(), version)
                    .with_style(style);
                match current {
                    Some(current) => target.with_current_value(current),
                    None => target,
                }
            }
            RecipeConfig::DependencyMajorBump {
                package,
                group,
                version,
            } => TargetSpec::poetry_dependency(package, group.as_deref(), version),
            RecipeConfig::ActionParameterReplace {
                action,
                key,
                current,
                replacement,
            } => {
                let target = TargetSpec::new(action, key, replacement);
                match current {
                    Some(current) => target.with_current_value(current),
                    None => target,
                }
            }
        }
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let required: Vec<(&'static str, &str)> = match self {
            RecipeConfig::DependencyVersionBump {
                package, version, ..
            }
            | RecipeConfig::DependencyMajorBump {
                package, version, ..
            } => vec![
                ("recipe.package", package.as_str()),
                ("recipe.version", version.as_str()),
            ],
            RecipeConfig::ActionParameterReplace {
                action,
                key,
                replacement,
                ..
            } => vec![
                ("recipe.action", action.as_str()),
                ("recipe.key", key.as_str()),
                ("recipe.replacement", replacement.as_str()),
            ],
        };
        required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyEditList,
    MissingField {
        edit_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        edit_id: String,
    },
    UnknownGrammar {
        edit_id: Option<String>,
        grammar: String,
    },
    InvalidCombo {
        edit_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "edit plan contains no edits"),
            ValidationIssue::MissingField { edit_id, field } => match edit_id {
                Some(id) => write!(f, "edit '{id}' missing required field '{field}'"),
                None => write!(f, "edit missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { edit_id } => {
                write!(f, "edit id '{edit_id}' is used more than once")
            }
            ValidationIssue::UnknownGrammar { edit_id, grammar } => match edit_id {
                Some(id) => write!(f, "edit '{id}' names unknown grammar '{grammar}'"),
                None => write!(f, "edit names unknown grammar '{grammar}'"),
            },
            ValidationIssue::InvalidCombo { edit_id, message } => match edit_id {
                Some(id) => write!(f, "edit '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid edit configuration: {message}"),
            },
        }
    }
}

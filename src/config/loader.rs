use crate::config::schema::{EditPlan, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    NoPlans {
        dir: PathBuf,
    },
}

impl ConfigError {
    fn at(self, path: &Path) -> Self {
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path.to_path_buf()),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read edit plan {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(f, "failed to parse edit plan {}: {}", path.display(), source),
                None => write!(f, "failed to parse edit plan: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid edit plan {}:\n{}", path.display(), source),
                None => write!(f, "invalid edit plan:\n{}", source),
            },
            ConfigError::NoPlans { dir } => {
                write!(f, "no edit plans (*.toml) found in {}", dir.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::NoPlans { .. } => None,
        }
    }
}

/// Parse and validate a plan from TOML text.
pub fn load_from_str(input: &str) -> Result<EditPlan, ConfigError> {
    let plan: EditPlan = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    plan.validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(plan)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditPlan, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.at(path))
}

/// Plan files to load for `path`: the file itself, or every `*.toml`
/// directly inside a directory, sorted by name.
pub fn discover_plans(path: impl AsRef<Path>) -> Result<Vec<PathBuf>, ConfigError> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut plans = Vec::new();
    for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            source: err.into(),
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|ext| ext.to_str()) == Some("toml")
        {
            plans.push(entry.into_path());
        }
    }

    if plans.is_empty() {
        return Err(ConfigError::NoPlans {
            dir: path.to_path_buf(),
        });
    }
    Ok(plans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RecipeConfig;
    use crate::recipe::Occurrence;

    const PLAN: &str = r#"
[meta]
name = "bump-test-deps"

[[edits]]
id = "pytest-8"
file = "pyproject.toml"
[edits.recipe]
type = "dependency-version-bump"
package = "pytest"
group = "test"
version = "8.*"

[[edits]]
id = "toolchain-profile"
file = ".github/workflows/ci.yml"
occurrence = "all"
[edits.recipe]
type = "action-parameter-replace"
action = "actions-rs/toolchain@v1"
key = "profile"
current = "minimal"
replacement = "default"
"#;

    #[test]
    fn parses_plan() {
        let plan = load_from_str(PLAN).unwrap();
        assert_eq!(plan.meta.name, "bump-test-deps");
        assert_eq!(plan.edits.len(), 2);
        assert_eq!(plan.edits[0].occurrence, Occurrence::First);
        assert_eq!(plan.edits[1].occurrence, Occurrence::All);
        assert!(matches!(
            &plan.edits[0].recipe,
            RecipeConfig::DependencyVersionBump { group: Some(group), .. } if group == "test"
        ));
    }

    #[test]
    fn unknown_recipe_type_is_a_toml_error() {
        let input = "[[edits]]\nid = \"x\"\nfile = \"a.toml\"\n[edits.recipe]\ntype = \"rename\"\n";
        assert!(matches!(
            load_from_str(input),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn validation_errors_carry_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("empty.toml");
        fs::write(&path, "[meta]\nname = \"nothing\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { path: Some(_), .. }));
        assert!(err.to_string().contains("empty.toml"));
    }

    #[test]
    fn discovers_toml_files_in_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("b.toml"), PLAN).unwrap();
        fs::write(temp_dir.path().join("a.toml"), PLAN).unwrap();
        fs::write(temp_dir.path().join("notes.md"), "").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested/c.toml"), PLAN).unwrap();

        let plans = discover_plans(temp_dir.path()).unwrap();
        let names: Vec<_> = plans
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.toml", "b.toml"]);
    }

    #[test]
    fn empty_directory_has_no_plans() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_plans(temp_dir.path()),
            Err(ConfigError::NoPlans { .. })
        ));
    }
}

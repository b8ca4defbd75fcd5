//! Edit plans: TOML files listing the edits to run against a repository.

pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{apply_plan, ApplyMode, Change, EditOutcome, EditReport, Summary};
pub use loader::{discover_plans, load_from_path, load_from_str, ConfigError};
pub use schema::{
    EditDefinition, EditPlan, Metadata, RecipeConfig, ValidationError, ValidationIssue,
};

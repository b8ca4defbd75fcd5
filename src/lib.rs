//! Surgical Edit: format-preserving structural edits for TOML and YAML files
//!
//! Locates a value with tree-sitter structural queries and rewrites only the
//! bytes of that value. Comments, whitespace, key order and quoting elsewhere
//! in the document survive untouched, which a deserialize/serialize round
//! trip cannot guarantee.
//!
//! # Architecture
//!
//! An edit is a strict pipeline:
//!
//! 1. [`ts::DocumentParser`] parses the document into a concrete syntax tree
//! 2. [`ts::QueryEngine`] runs the recipe's structural pattern
//! 3. a [`recipe::Selector`] picks the construct named by the target path
//! 4. a [`recipe::Refiner`] picks the entry value to replace
//! 5. [`splice::splice`] rewrites that value's columns on its line
//!
//! [`SurgicalEditor`] drives the pipeline and returns an [`EditResult`].
//!
//! # Safety
//!
//! - Spliced spans are verified against their expected text
//! - The mutated document is re-parsed; new syntax errors reject the edit
//! - Atomic file writes (tempfile + fsync + rename)
//! - Repository boundary enforcement for plan edits
//!
//! # Example
//!
//! ```no_run
//! use surgical_edit::{EditResult, Recipe, TargetSpec};
//!
//! # fn main() -> Result<(), surgical_edit::EditError> {
//! let editor = Recipe::DependencyVersionBump.editor()?;
//! let target = TargetSpec::poetry_dependency("pytest", Some("test"), "8.*");
//!
//! match editor.apply_file("pyproject.toml", &target) {
//!     EditResult::Applied { edits, .. } => println!("{} value(s) rewritten", edits.len()),
//!     EditResult::AlreadyPatched => println!("already up to date"),
//!     EditResult::NotApplicable { reason, .. } => println!("skipped: {reason}"),
//!     EditResult::Failed(err) => eprintln!("failed: {err}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod editor;
pub mod logging;
pub mod pool;
pub mod recipe;
pub mod safety;
pub mod splice;
pub mod toml;
pub mod ts;

// Re-exports
pub use config::{
    apply_plan, load_from_path, load_from_str, ApplyMode, ConfigError, EditOutcome, EditPlan,
    EditReport,
};
pub use document::Document;
pub use editor::{EditError, EditResult, EditStage, SurgicalEditor};
pub use recipe::{Occurrence, Recipe, ReplacementStyle, TargetSpec};
pub use safety::{RepoGuard, SafetyError};
pub use splice::{splice, Splice, SpliceError};
pub use ts::{Grammar, TreeSitterError};

//! Plan applicator: runs every edit of a plan against a repository.
//!
//! Edits run in plan order. Each file is read once; later edits on the same
//! file see the output of earlier ones. In dry-run mode the pending text stays
//! in memory and nothing is written.

use crate::config::schema::{EditDefinition, EditPlan};
use crate::document::Document;
use crate::editor::{EditError, EditResult, SurgicalEditor};
use crate::recipe::Recipe;
use crate::safety::{RepoGuard, SafetyError};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Persist every applied edit.
    Write,
    /// Compute results only.
    DryRun,
}

/// One replaced value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    /// 1-based line number.
    pub line: usize,
    pub before: String,
    pub after: String,
}

/// Outcome of a single plan edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
#[must_use = "EditOutcome should be checked for failure"]
pub enum EditOutcome {
    Applied {
        changes: Vec<Change>,
        /// Document text before and after this edit.
        #[serde(skip)]
        before: String,
        #[serde(skip)]
        after: String,
    },
    NotApplicable {
        reason: String,
    },
    AlreadyPatched,
    Failed {
        reason: String,
    },
}

impl EditOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            EditOutcome::Applied { .. } => "applied",
            EditOutcome::NotApplicable { .. } => "not-applicable",
            EditOutcome::AlreadyPatched => "already-patched",
            EditOutcome::Failed { .. } => "failed",
        }
    }

    fn failed(err: impl fmt::Display) -> Self {
        EditOutcome::Failed {
            reason: err.to_string(),
        }
    }
}

/// Result of one plan edit, as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditReport {
    pub id: String,
    /// Path as written in the plan.
    pub file: PathBuf,
    pub recipe: String,
    #[serde(flatten)]
    pub outcome: EditOutcome,
}

/// Counts of outcomes across reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub applied: usize,
    pub already_patched: usize,
    pub not_applicable: usize,
    pub failed: usize,
}

impl Summary {
    pub fn of(reports: &[EditReport]) -> Self {
        let mut summary = Summary::default();
        for report in reports {
            match report.outcome {
                EditOutcome::Applied { .. } => summary.applied += 1,
                EditOutcome::AlreadyPatched => summary.already_patched += 1,
                EditOutcome::NotApplicable { .. } => summary.not_applicable += 1,
                EditOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applied, {} already patched, {} not applicable, {} failed",
            self.applied, self.already_patched, self.not_applicable, self.failed
        )
    }
}

/// Apply every edit of `plan` to the repository at `repo_root`.
///
/// Fails only when the repository root cannot be resolved; per-edit
/// problems are reported as [`EditOutcome::Failed`].
pub fn apply_plan(
    plan: &EditPlan,
    repo_root: &Path,
    mode: ApplyMode,
) -> Result<Vec<EditReport>, SafetyError> {
    let guard = RepoGuard::new(repo_root)?;
    let mut run = PlanRun {
        guard,
        mode,
        editors: HashMap::new(),
        pending: HashMap::new(),
    };

    info!(
        plan = %plan.meta.name,
        edits = plan.edits.len(),
        dry_run = mode == ApplyMode::DryRun,
        "applying edit plan"
    );

    Ok(plan
        .edits
        .iter()
        .map(|edit| {
            let outcome = run.apply(edit);
            debug!(id = %edit.id, outcome = outcome.label());
            EditReport {
                id: edit.id.clone(),
                file: PathBuf::from(&edit.file),
                recipe: edit.recipe.recipe().id().to_string(),
                outcome,
            }
        })
        .collect())
}

struct PlanRun {
    guard: RepoGuard,
    mode: ApplyMode,
    editors: HashMap<Recipe, SurgicalEditor>,
    /// Latest text of every file touched so far.
    pending: HashMap<PathBuf, String>,
}

impl PlanRun {
    fn apply(&mut self, edit: &EditDefinition) -> EditOutcome {
        let path = match self.guard.validate_path(&edit.file) {
            Ok(path) => path,
            Err(err) => return EditOutcome::failed(err),
        };

        let before = match self.current_text(&path) {
            Ok(text) => text,
            Err(err) => return EditOutcome::failed(err),
        };

        let recipe = edit.recipe.recipe();
        let editor = match self.editor(recipe) {
            Ok(editor) => editor,
            Err(err) => return EditOutcome::failed(err),
        };

        match editor.apply_text(&before, &edit.target()) {
            EditResult::Applied { text, edits } => {
                if self.mode == ApplyMode::Write {
                    if let Err(err) = self.persist(&path, &text) {
                        return EditOutcome::failed(err);
                    }
                }
                self.pending.insert(path, text.clone());
                EditOutcome::Applied {
                    changes: edits
                        .into_iter()
                        .map(|splice| Change {
                            line: splice.span.start.line + 1,
                            before: splice.expected,
                            after: splice.replacement,
                        })
                        .collect(),
                    before,
                    after: text,
                }
            }
            EditResult::NotApplicable { reason, .. } => EditOutcome::NotApplicable { reason },
            EditResult::AlreadyPatched => EditOutcome::AlreadyPatched,
            EditResult::Failed(err) => EditOutcome::failed(err),
        }
    }

    fn current_text(&self, path: &Path) -> Result<String, EditError> {
        if let Some(text) = self.pending.get(path) {
            return Ok(text.clone());
        }
        let document = Document::read(path)?;
        Ok(document.text()?.to_string())
    }

    fn editor(&mut self, recipe: Recipe) -> Result<&SurgicalEditor, EditError> {
        let editor = match self.editors.entry(recipe) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(recipe.editor()?),
        };
        Ok(editor)
    }

    fn persist(&self, path: &Path, text: &str) -> Result<(), EditError> {
        let path = self.guard.revalidate(path)?;
        Document::new(&path, text.as_bytes()).persist()?;
        info!(path = %self.guard.relative(&path).display(), "document persisted");
        Ok(())
    }
}

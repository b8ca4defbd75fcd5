//! Edit recipes: which constructs to select and which entry value to rewrite.
//!
//! A recipe pairs a grammar and query pattern with a [`Selector`] and a
//! [`Refiner`]. The set is closed; [`Recipe`] enumerates it.

pub mod refiner;
pub mod selector;
pub mod target;

pub use refiner::{EntryRefiner, MajorBumpRefiner, Refinement, Refiner};
pub use selector::{ActionStepSelector, Construct, Selection, Selector, TableSelector};
pub use target::{poetry_dependency_key, Occurrence, ReplacementStyle, TargetSpec};

use crate::editor::{EditError, SurgicalEditor};
use crate::ts::{patterns, Grammar, SyntaxNode};
use std::fmt;

/// The supported edit recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipe {
    /// Set a poetry dependency's version constraint.
    DependencyVersionBump,
    /// Set a poetry dependency's constraint only when it raises the major version.
    DependencyMajorBump,
    /// Replace a `with:` parameter of a GitHub Actions workflow step.
    ActionParameterReplace,
}

impl Recipe {
    pub const ALL: [Recipe; 3] = [
        Recipe::DependencyVersionBump,
        Recipe::DependencyMajorBump,
        Recipe::ActionParameterReplace,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Recipe::DependencyVersionBump => "dependency-version-bump",
            Recipe::DependencyMajorBump => "dependency-major-bump",
            Recipe::ActionParameterReplace => "action-parameter-replace",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Recipe::DependencyVersionBump => "set a poetry dependency constraint",
            Recipe::DependencyMajorBump => {
                "set a poetry dependency constraint when the major version goes up"
            }
            Recipe::ActionParameterReplace => "replace a `with:` parameter of a workflow step",
        }
    }

    pub fn grammar(&self) -> Grammar {
        match self {
            Recipe::DependencyVersionBump | Recipe::DependencyMajorBump => Grammar::Toml,
            Recipe::ActionParameterReplace => Grammar::Yaml,
        }
    }

    /// Query pattern the recipe's selector consumes.
    pub fn pattern(&self) -> &'static str {
        match self {
            Recipe::DependencyVersionBump | Recipe::DependencyMajorBump => {
                patterns::TOML_TABLE_ENTRIES
            }
            Recipe::ActionParameterReplace => patterns::YAML_ACTION_STEP,
        }
    }

    pub fn selector(&self) -> Box<dyn Selector> {
        match self {
            Recipe::DependencyVersionBump | Recipe::DependencyMajorBump => Box::new(TableSelector),
            Recipe::ActionParameterReplace => Box::new(ActionStepSelector),
        }
    }

    pub fn refiner(&self) -> Box<dyn Refiner> {
        match self {
            Recipe::DependencyMajorBump => Box::new(MajorBumpRefiner),
            Recipe::DependencyVersionBump | Recipe::ActionParameterReplace => {
                Box::new(EntryRefiner)
            }
        }
    }

    /// Build an editor wired with this recipe's grammar, query and strategies.
    pub fn editor(&self) -> Result<SurgicalEditor, EditError> {
        SurgicalEditor::new(self.grammar(), self.pattern(), self.selector(), self.refiner())
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Key node of a key/value entry (TOML `pair`, YAML mapping pair).
pub(crate) fn entry_key<'t>(entry: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    entry
        .child_by_field("key")
        .or_else(|| significant_children(entry).next())
}

/// Value node of a key/value entry.
pub(crate) fn entry_value<'t>(entry: &SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    entry
        .child_by_field("value")
        .or_else(|| significant_children(entry).nth(1))
}

/// Pairs of the mapping held by a YAML block or flow node.
pub(crate) fn mapping_entries<'t>(node: &SyntaxNode<'t>) -> Option<Vec<SyntaxNode<'t>>> {
    let (mapping, pair_kind) = match node.kind() {
        "block_node" => (node.child_of_kind("block_mapping")?, "block_mapping_pair"),
        "flow_node" => (node.child_of_kind("flow_mapping")?, "flow_pair"),
        _ => return None,
    };
    Some(
        mapping
            .named_children()
            .into_iter()
            .filter(|child| child.kind() == pair_kind)
            .collect(),
    )
}

fn significant_children<'t>(node: &SyntaxNode<'t>) -> impl Iterator<Item = SyntaxNode<'t>> {
    node.named_children()
        .into_iter()
        .filter(|child| child.kind() != "comment")
}

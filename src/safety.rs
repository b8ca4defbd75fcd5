use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keeps document paths inside the repository working copy being edited.
#[derive(Debug, Clone)]
pub struct RepoGuard {
    /// Canonical repository root
    repo_root: PathBuf,
    /// Canonical paths that are never edited, even inside the root
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside the repository: {path} (root: {root})")]
    OutsideRepository { path: PathBuf, root: PathBuf },

    #[error("path is in a protected directory: {path} (protected: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("failed to resolve {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RepoGuard {
    /// Create a guard for the repository at `repo_root`.
    ///
    /// The root is canonicalized so symlinked checkouts compare correctly.
    /// `.git` under the root and the cargo caches in the home directory are
    /// protected.
    pub fn new(repo_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let repo_root = canonicalize(repo_root.as_ref())?;

        let mut forbidden_paths = Vec::new();
        if let Ok(git_dir) = repo_root.join(".git").canonicalize() {
            forbidden_paths.push(git_dir);
        }

        // Dependency sources checked out by cargo
        if let Some(home) = home::home_dir() {
            for cache in [".cargo/registry", ".cargo/git"] {
                if let Ok(path) = home.join(cache).canonicalize() {
                    forbidden_paths.push(path);
                }
            }
        }

        Ok(Self {
            repo_root,
            forbidden_paths,
        })
    }

    /// Resolve a repo-relative or absolute path and check it is editable.
    ///
    /// Returns the canonical path. The file must exist.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.repo_root.join(path)
        };

        // Resolves symlinks and `..` before the containment check
        let canonical = canonicalize(&absolute)?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    /// Re-check a previously validated path right before writing to it.
    pub fn revalidate(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let canonical = canonicalize(path)?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.repo_root) {
            return Err(SafetyError::OutsideRepository {
                path: canonical.to_path_buf(),
                root: self.repo_root.clone(),
            });
        }

        if let Some(forbidden) = self
            .forbidden_paths
            .iter()
            .find(|forbidden| canonical.starts_with(forbidden))
        {
            return Err(SafetyError::ForbiddenPath {
                path: canonical.to_path_buf(),
                forbidden: forbidden.clone(),
            });
        }

        Ok(())
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Path relative to the repository root, for display.
    pub fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.repo_root).unwrap_or(path)
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize()
        .map_err(|source| SafetyError::Canonicalize {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn accepts_file_inside_repository() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = temp_dir.path();
        let guard = RepoGuard::new(repo).unwrap();

        let file = repo.join(".github/workflows/ci.yml");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"on: push\n").unwrap();

        let validated = guard.validate_path(&file).unwrap();
        assert_eq!(
            guard.relative(&validated),
            Path::new(".github/workflows/ci.yml")
        );
    }

    #[test]
    fn accepts_relative_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = temp_dir.path();
        fs::write(repo.join("pyproject.toml"), b"").unwrap();

        let guard = RepoGuard::new(repo).unwrap();
        assert!(guard.validate_path("pyproject.toml").is_ok());
    }

    #[test]
    fn rejects_path_outside_repository() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = temp_dir.path().join("repo");
        fs::create_dir_all(&repo).unwrap();
        fs::write(temp_dir.path().join("pyproject.toml"), b"").unwrap();

        let guard = RepoGuard::new(&repo).unwrap();
        let result = guard.validate_path("../pyproject.toml");
        assert!(matches!(result, Err(SafetyError::OutsideRepository { .. })));
    }

    #[test]
    fn rejects_git_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = temp_dir.path();
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::write(repo.join(".git/config"), b"[core]\n").unwrap();

        let guard = RepoGuard::new(repo).unwrap();
        let result = guard.validate_path(".git/config");
        assert!(matches!(result, Err(SafetyError::ForbiddenPath { .. })));
    }

    #[test]
    fn missing_file_cannot_be_resolved() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = RepoGuard::new(temp_dir.path()).unwrap();
        let result = guard.validate_path("absent.toml");
        assert!(matches!(result, Err(SafetyError::Canonicalize { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn rejects_symlink_escape() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let repo = temp_dir.path().join("repo");
        fs::create_dir_all(&repo).unwrap();

        let outside = temp_dir.path().join("outside.toml");
        fs::write(&outside, b"").unwrap();
        symlink(&outside, repo.join("pyproject.toml")).unwrap();

        let guard = RepoGuard::new(&repo).unwrap();
        let result = guard.validate_path("pyproject.toml");
        assert!(matches!(result, Err(SafetyError::OutsideRepository { .. })));
    }
}

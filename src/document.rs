use crate::editor::EditError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Original file contents plus the path they were read from.
///
/// A document is never mutated in place: edits produce a new value via
/// [`Document::with_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, EditError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| EditError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, bytes))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The contents as UTF-8 text.
    pub fn text(&self) -> Result<&str, EditError> {
        std::str::from_utf8(&self.bytes).map_err(|_| EditError::Utf8 {
            path: self.path.clone(),
        })
    }

    /// A new document at the same path holding `text`.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self::new(self.path.clone(), text.into().into_bytes())
    }

    /// Write the document to its path atomically.
    pub fn persist(&self) -> Result<(), EditError> {
        atomic_write(&self.path, &self.bytes).map_err(|source| EditError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Readers see either the old file or the complete new one.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Tempfile in the same directory so the rename stays on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Keep the original file's permissions
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_persist_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("pyproject.toml");
        fs::write(&file_path, b"[a]\nb = 1\n").unwrap();

        let doc = Document::read(&file_path).unwrap();
        assert_eq!(doc.text().unwrap(), "[a]\nb = 1\n");

        let updated = doc.with_text("[a]\nb = 2\n");
        assert_eq!(doc.text().unwrap(), "[a]\nb = 1\n");
        updated.persist().unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "[a]\nb = 2\n");
    }

    #[test]
    fn missing_file_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = Document::read(temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(EditError::Io { .. })));
    }

    #[test]
    fn non_utf8_is_reported() {
        let doc = Document::new("bad.toml", vec![0xff, 0xfe]);
        assert!(matches!(doc.text(), Err(EditError::Utf8 { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn persist_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("ci.yml");
        fs::write(&file_path, b"a: 1\n").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o640)).unwrap();

        Document::new(&file_path, b"a: 2\n".to_vec()).persist().unwrap();

        let mode = fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}

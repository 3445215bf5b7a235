use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use stage::{Editor, EditorError};
use tracing::{debug, info};

/// Program text backed by a file the user edits in their own editor. The
/// file is re-read on every play.
#[derive(Debug, Clone)]
pub(crate) struct FileEditor {
    path: PathBuf,
}

impl FileEditor {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Writes `seed` to the file when it does not exist yet.
    pub(crate) fn seed_if_missing(&self, seed: &str) -> Result<bool, EditorError> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.read_error(source))?;
        }
        fs::write(&self.path, seed).map_err(|source| self.read_error(source))?;
        info!(path = %self.path.display(), "program_source_seeded");
        Ok(true)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn read_error(&self, source: io::Error) -> EditorError {
        EditorError::Read {
            location: self.path.display().to_string(),
            source,
        }
    }
}

impl Editor for FileEditor {
    fn text(&mut self) -> Result<String, EditorError> {
        let text = fs::read_to_string(&self.path).map_err(|source| self.read_error(source))?;
        debug!(path = %self.path.display(), bytes = text.len(), "program_source_read");
        Ok(text)
    }
}

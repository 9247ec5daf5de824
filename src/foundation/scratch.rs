use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::SlideResult;

/// Owned path to a run-scoped intermediate file, removed on drop.
///
/// The guard does not create the file; it only takes responsibility for deleting whatever
/// ends up at `path`. [`ScratchFile::persist`] moves the file into its final location and
/// disarms the guard.
#[derive(Debug)]
pub struct ScratchFile(Option<PathBuf>);

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    pub fn path(&self) -> &Path {
        // Only `persist` takes the path, and it consumes `self`.
        self.0.as_deref().unwrap_or_else(|| Path::new(""))
    }

    pub fn exists(&self) -> bool {
        self.0.as_deref().is_some_and(Path::exists)
    }

    /// Rename into `dest`, replacing any file already there.
    ///
    /// `dest` must be on the same filesystem so the replacement is a single rename and a
    /// concurrent reader never observes a half-written file.
    pub fn persist(mut self, dest: &Path) -> SlideResult<()> {
        let Some(src) = self.0.take() else {
            return Ok(());
        };
        if let Err(err) = std::fs::rename(&src, dest) {
            self.0 = Some(src);
            return Err(anyhow::Error::new(err)
                .context(format!(
                    "move '{}' into place at '{}'",
                    self.path().display(),
                    dest.display()
                ))
                .into());
        }
        Ok(())
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> SlideResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/scratch.rs"]
mod tests;

//! On-disk layout for originals and their derivative families.
//!
//! Originals are written as `images/<uuid>.<ext>` under the storage root.
//! Derivatives share the original's base name, so deletion sweeps the
//! whole family with a substring match.

use std::{
    fs,
    path::{Path, PathBuf},
};

use {tracing::warn, uuid::Uuid};

use crate::{Error, Result};

/// Subdirectory of the storage root holding originals and derivatives.
pub const IMAGES_DIR: &str = "images";

/// Writes originals under the storage root and locates/removes their
/// derivative families.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute path for a storage-root-relative path.
    pub fn absolute(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative.as_ref())
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    /// Persist `bytes` under a fresh random token, returning the relative
    /// path (`images/<uuid>.<ext>`). The write goes through a temporary
    /// sibling and an atomic rename, so a crash never leaves a partial
    /// file at the final path.
    pub async fn store(&self, bytes: Vec<u8>, extension: &str) -> Result<String> {
        let file_name = format!("{}.{extension}", Uuid::new_v4());
        let relative = format!("{IMAGES_DIR}/{file_name}");
        let dir = self.images_dir();
        let path = dir.join(&file_name);

        tokio::task::spawn_blocking(move || -> Result<()> {
            fs::create_dir_all(&dir)?;
            write_atomic(&path, &bytes)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)??;

        Ok(relative)
    }

    /// Delete the original at `relative` and every file in the storage
    /// directory sharing its base name (the derivative family). Returns
    /// the number of files removed.
    ///
    /// Fails with [`Error::NotFound`] when the original is already gone.
    /// Otherwise best-effort: individual failures are logged and skipped.
    pub async fn sweep(&self, relative: &str) -> Result<usize> {
        let original = self.absolute(relative);
        let stem = original
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or(Error::NotFound)?;
        let dir = self.images_dir();

        tokio::task::spawn_blocking(move || -> Result<usize> {
            if !original.exists() {
                return Err(Error::NotFound);
            }
            let mut removed = 0;
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                if !entry.file_name().to_string_lossy().contains(&stem) {
                    continue;
                }
                match fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(error) => {
                        warn!(path = %entry.path().display(), %error, "sweep could not remove file");
                    },
                }
            }
            Ok(removed)
        })
        .await
        .map_err(std::io::Error::other)?
    }
}

/// Write to a temporary sibling, then rename into place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4()));

    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

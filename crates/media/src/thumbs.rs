//! Lazy thumbnail derivation with cache-by-existence.
//!
//! A derivative lives next to its original as
//! `<stem>_<size>x<size><extension>`; its presence on disk is the cache.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{ImageFormat, ImageReader, imageops::FilterType};

use crate::{Error, Result, storage};

/// Derivative path for `original` at `size`.
pub fn derivative_path(original: &Path, size: u32) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = original
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    original.with_file_name(format!("{stem}_{size}x{size}{ext}"))
}

/// Return the path of the `size`×`size` derivative of `original`,
/// generating it on first request and reusing it thereafter.
///
/// `size` must be one of `supported`. Both dimensions are forced to the
/// size class; aspect ratio is not preserved. Generation publishes through
/// a temp file + rename, so racing first requests for the same derivative
/// both land an intact file.
pub async fn thumbnail(original: PathBuf, size: u32, supported: &[u32]) -> Result<PathBuf> {
    if !supported.contains(&size) {
        return Err(Error::UnsupportedSize { size });
    }

    let derivative = derivative_path(&original, size);
    if derivative.exists() {
        return Ok(derivative);
    }
    if !original.exists() {
        return Err(Error::NotFound);
    }

    let out = derivative.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let img = ImageReader::open(&original)?
            .with_guessed_format()?
            .decode()
            .map_err(|source| Error::decode(&original, source))?;

        let resized = img.resize_exact(size, size, FilterType::Lanczos3);

        let format = ImageFormat::from_path(&out).unwrap_or(ImageFormat::Png);
        let mut buf = Cursor::new(Vec::new());
        resized
            .write_to(&mut buf, format)
            .map_err(|source| Error::decode(&out, source))?;

        storage::write_atomic(&out, buf.get_ref())?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)??;

    Ok(derivative)
}

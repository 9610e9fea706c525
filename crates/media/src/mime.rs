//! Content-type to file-extension derivation.

/// Derive a file extension from an `image/*` content type.
///
/// Parameters after `;` are dropped; whatever follows `image/` is used
/// verbatim as the extension (`image/png; charset=binary` → `png`).
/// Returns `None` when the value is not an image media type. The result is
/// not checked against a codec allowlist, so unusual media types produce
/// unusual extensions (`image/svg+xml` → `svg+xml`).
pub fn image_extension(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next().unwrap_or(content_type).trim();
    let ext = essence.strip_prefix("image/")?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

//! Path utilities for storage names.
//!
//! Storage names are relative, `/`-separated paths such as
//! `images/2024/cat.jpg`. These helpers reject names that could escape a
//! storage root and split a name into the pieces used to build derived
//! artifact names.

use crate::{Error, Result};

/// Validate a storage name.
///
/// Names must be non-empty, relative, and free of `..` components.
pub fn validate_storage_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input("storage name is empty"));
    }
    if name.starts_with('/') || name.starts_with('\\') {
        return Err(Error::invalid_input(format!(
            "storage name must be relative: {}",
            name
        )));
    }
    if name.split(['/', '\\']).any(|part| part == "..") {
        return Err(Error::invalid_input(format!(
            "storage name escapes the storage root: {}",
            name
        )));
    }
    Ok(())
}

/// The pieces of a storage name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts<'a> {
    /// Directory part without trailing slash, empty at the root.
    pub dir: &'a str,
    /// File name without its extension.
    pub stem: &'a str,
    /// Extension without the leading dot, empty when there is none.
    pub extension: &'a str,
}

/// Split a storage name into directory, stem, and extension.
///
/// # Examples
///
/// ```
/// use thumbforge_common::paths::split_name;
///
/// let parts = split_name("images/2024/cat.photo.jpg");
/// assert_eq!(parts.dir, "images/2024");
/// assert_eq!(parts.stem, "cat.photo");
/// assert_eq!(parts.extension, "jpg");
/// ```
pub fn split_name(name: &str) -> NameParts<'_> {
    let (dir, file) = match name.rfind('/') {
        Some(idx) => (&name[..idx], &name[idx + 1..]),
        None => ("", name),
    };
    // A leading dot marks a hidden file, not an extension.
    let (stem, extension) = match file.rfind('.') {
        Some(idx) if idx > 0 => (&file[..idx], &file[idx + 1..]),
        _ => (file, ""),
    };
    NameParts {
        dir,
        stem,
        extension,
    }
}

/// Join storage name segments with `/`, skipping empty ones.
pub fn join_name(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

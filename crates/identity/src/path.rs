//! Canonical resource path form.
//!
//! Scripts hand us paths copy-pasted from all over: backslashes, mixed
//! case, doubled separators. Everything that compares or hashes a path
//! goes through [`canonicalize`] first so that `"Base\\Characters//X.ent"`
//! and `"base/characters/x.ent"` are the same file.

use crate::error::{ErrorKind, Result};

/// Normalize a resource path to its canonical form.
///
/// - backslashes become forward slashes,
/// - ASCII case folds to lowercase,
/// - empty and `.` components are dropped,
/// - leading/trailing/doubled separators are collapsed.
///
/// Paths that try to escape the root (`..`), carry drive prefixes, embed
/// null bytes, or normalize to nothing are rejected as
/// [`InvalidPath`](ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use depot_identity::canonicalize;
///
/// assert_eq!(canonicalize(r"Base\Characters\Nathan.ent").unwrap(), "base/characters/nathan.ent");
/// assert_eq!(canonicalize("a//b/./c/").unwrap(), "a/b/c");
/// assert!(canonicalize("../escape").is_err());
/// assert!(canonicalize("").is_err());
/// ```
pub fn canonicalize(path: &str) -> Result<String> {
    let invalid = || ErrorKind::InvalidPath(path.to_string());
    if path.contains('\0') {
        exn::bail!(invalid());
    }
    let mut components: Vec<String> = Vec::new();
    for component in path.replace('\\', "/").split('/') {
        match component {
            "" | "." => {},
            // Unlike filesystem paths there is no "inside the root" for a
            // resource path to climb back down into; any `..` is a reach
            // outside the namespace.
            ".." => exn::bail!(invalid()),
            c if c.contains(':') => exn::bail!(invalid()),
            c => components.push(c.to_ascii_lowercase()),
        }
    }
    match components.is_empty() {
        true => exn::bail!(invalid()),
        false => Ok(components.join("/")),
    }
}

/// Swap the extension of a path string, appending one if none exists.
///
/// Operates on the final component only; a leading dot on `extension` is
/// optional.
///
/// # Examples
///
/// ```
/// use depot_identity::change_extension;
///
/// assert_eq!(change_extension("chars/nathan.mesh", "json"), "chars/nathan.json");
/// assert_eq!(change_extension("chars/nathan", ".json"), "chars/nathan.json");
/// ```
pub fn change_extension(path: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    let stem_end = match path.rsplit_once('/') {
        // A dot inside a parent directory name is not an extension.
        Some((_, file)) => path.len() - file.len() + file.rfind('.').unwrap_or(file.len()),
        None => path.rfind('.').unwrap_or(path.len()),
    };
    format!("{}.{}", &path[..stem_end], extension)
}

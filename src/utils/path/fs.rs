//! Path normalization utilities.
//!
//! - `normalize_path_in` - absolute form relative to an explicit base
//! - `lexical_clean` - resolve `.` and `..` without touching the filesystem

use std::path::{Component, Path, PathBuf};

/// Normalize `path` to an absolute, canonical form, resolving relative paths against `base`.
///
/// The path does not need to exist: the longest existing prefix is
/// canonicalized (resolving symlinks) and the remaining components are
/// appended after lexical `.`/`..` cleanup. Two spellings of the same
/// location therefore compare equal even before the location is created.
///
/// # Example
/// ```ignore
/// let abs = normalize_path_in(Path::new("dist/../src"), Path::new("/site"));
/// assert_eq!(abs, PathBuf::from("/site/src"));
/// ```
pub fn normalize_path_in(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let cleaned = lexical_clean(&joined);

    // Walk up until something exists, canonicalize that, re-append the rest
    let mut existing = cleaned.as_path();
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut out = canonical;
            out.extend(rest.iter().rev());
            return out;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return cleaned,
        }
    }
}

/// Resolve `.` and `..` components lexically.
///
/// `..` above the root is dropped, matching how the OS resolves `/..`.
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

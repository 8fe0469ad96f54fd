//! Sandbox path resolution for file tools.
//!
//! Tool paths are workspace-relative; anything that resolves outside the
//! workspace root is rejected before approval or IO happens.

use std::path::{Component, Path, PathBuf};

use crate::tools::ToolSourceError;

/// Resolves a tool-supplied path inside the workspace root.
///
/// Absolute paths are accepted only when they already point inside the root.
/// `..` components that would climb out of the root are rejected.
pub(super) fn resolve_in_workspace(
    root: &Path,
    raw: &str,
) -> Result<PathBuf, ToolSourceError> {
    let candidate = Path::new(raw);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };

    // Normalize lexically; the target may not exist yet, so canonicalize
    // cannot be used for writes.
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(escape_error(raw));
                }
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }

    if !normalized.starts_with(root) {
        return Err(escape_error(raw));
    }
    Ok(normalized)
}

fn escape_error(raw: &str) -> ToolSourceError {
    ToolSourceError::Denied(format!("path escapes the workspace: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_inside_root() {
        let root = Path::new("/workspace");
        let p = resolve_in_workspace(root, "notes/summary.md").unwrap();
        assert_eq!(p, PathBuf::from("/workspace/notes/summary.md"));
    }

    #[test]
    fn inside_absolute_path_accepted() {
        let root = Path::new("/workspace");
        let p = resolve_in_workspace(root, "/workspace/qc.md").unwrap();
        assert_eq!(p, PathBuf::from("/workspace/qc.md"));
    }

    /// **Scenario**: climbing out with `..` or absolute outside paths is denied.
    #[test]
    fn escapes_rejected() {
        let root = Path::new("/workspace");
        assert!(matches!(
            resolve_in_workspace(root, "../etc/passwd"),
            Err(ToolSourceError::Denied(_))
        ));
        assert!(matches!(
            resolve_in_workspace(root, "notes/../../etc/passwd"),
            Err(ToolSourceError::Denied(_))
        ));
        assert!(matches!(
            resolve_in_workspace(root, "/etc/passwd"),
            Err(ToolSourceError::Denied(_))
        ));
    }

    #[test]
    fn dot_components_are_normalized() {
        let root = Path::new("/workspace");
        let p = resolve_in_workspace(root, "./a/./b.md").unwrap();
        assert_eq!(p, PathBuf::from("/workspace/a/b.md"));
    }
}

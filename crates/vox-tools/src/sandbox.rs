//! Sandbox that restricts file tools to a configured root directory.

use std::path::{Path, PathBuf};

use crate::ToolError;

/// Sensitive path segments that must never be accessed, regardless of where
/// the sandbox is rooted.
const BLOCKED_PATH_SEGMENTS: &[&str] = &[
    ".ssh",
    ".aws",
    ".gnupg",
    ".env",
    "/etc/passwd",
    "/etc/shadow",
];

/// Confines tool-supplied paths to a single directory tree.
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Root the sandbox at `root`. The directory must exist; it is
    /// canonicalized once here so later containment checks compare like
    /// with like.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ToolError> {
        let root = std::fs::canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a tool-supplied path and validate it stays inside the root.
    ///
    /// Relative paths resolve against the sandbox root, not the process
    /// working directory. A path that does not exist yet is canonicalized
    /// through its parent so file creation still validates.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, ToolError> {
        let path = Path::new(raw);
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let canonical = std::fs::canonicalize(&joined).or_else(|_| {
            let parent = joined.parent().ok_or_else(|| {
                ToolError::Failed("Access denied: cannot resolve parent directory".to_string())
            })?;
            let canon_parent = std::fs::canonicalize(parent).map_err(|e| {
                ToolError::Failed(format!(
                    "Access denied: cannot resolve '{}': {e}",
                    parent.display()
                ))
            })?;
            let file_name = joined.file_name().ok_or_else(|| {
                ToolError::Failed("Access denied: path has no file name".to_string())
            })?;
            Ok::<PathBuf, ToolError>(canon_parent.join(file_name))
        })?;

        if !canonical.starts_with(&self.root) {
            return Err(ToolError::Failed(format!(
                "Access denied: '{}' is outside the allowed directory '{}'",
                canonical.display(),
                self.root.display(),
            )));
        }

        let path_str = canonical.to_string_lossy();
        for segment in BLOCKED_PATH_SEGMENTS {
            if path_str.contains(segment) {
                return Err(ToolError::Failed(format!(
                    "Access denied: '{}' contains blocked segment '{segment}'",
                    canonical.display(),
                )));
            }
        }

        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> (tempfile::TempDir, Sandbox) {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        (dir, sandbox)
    }

    #[test]
    fn relative_path_resolves_against_root() {
        let (_dir, sandbox) = sandbox();
        std::fs::write(sandbox.root().join("notes.txt"), "hi").unwrap();

        let resolved = sandbox.resolve("notes.txt").unwrap();
        assert!(resolved.starts_with(sandbox.root()));
        assert!(resolved.ends_with("notes.txt"));
    }

    #[test]
    fn nonexistent_file_with_existing_parent_resolves() {
        let (_dir, sandbox) = sandbox();

        let resolved = sandbox.resolve("new-file.txt").unwrap();
        assert!(resolved.starts_with(sandbox.root()));
    }

    #[test]
    fn path_outside_root_is_denied() {
        let (_dir, sandbox) = sandbox();
        let other = tempfile::tempdir().unwrap();
        std::fs::write(other.path().join("secret.txt"), "no").unwrap();

        let err = sandbox
            .resolve(other.path().join("secret.txt").to_str().unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("outside the allowed directory"));
    }

    #[test]
    fn dotdot_escape_is_denied() {
        let (_dir, sandbox) = sandbox();

        let err = sandbox.resolve("../escaped.txt").unwrap_err();
        assert!(err.to_string().contains("Access denied"));
    }

    #[test]
    fn blocked_segment_is_denied() {
        let (_dir, sandbox) = sandbox();
        std::fs::create_dir(sandbox.root().join(".ssh")).unwrap();

        let err = sandbox.resolve(".ssh/id_rsa").unwrap_err();
        assert!(err.to_string().contains("blocked segment"));
    }
}

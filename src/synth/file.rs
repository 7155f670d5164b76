// src/synth/file.rs

use std::any::Any;
use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};

use crate::errors::{Result, SynthkitError};
use crate::synth::marker::DEFAULT_MARKER;
use crate::types::ConflictPolicy;

/// Per-file synthesis options.
///
/// Defaults describe a fully machine-owned file: stamped with the marker,
/// readonly on disk, committed to version control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOptions {
    /// Embed the generated-file marker.
    pub marker: bool,
    /// Make the file readonly on disk; implies the `Protect` policy unless
    /// `conflict` says otherwise.
    pub readonly: bool,
    /// Expected to be checked into version control. Uncommitted files are
    /// added to the project's ignore file.
    pub committed: bool,
    pub executable: bool,
    /// Replace a previous registration of the same path instead of failing.
    pub override_existing: bool,
    pub conflict: Option<ConflictPolicy>,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            marker: true,
            readonly: true,
            committed: true,
            executable: false,
            override_existing: false,
            conflict: None,
        }
    }
}

impl FileOptions {
    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict.unwrap_or(if self.readonly {
            ConflictPolicy::Protect
        } else {
            ConflictPolicy::Overwrite
        })
    }
}

/// Immutable inputs shared by every file during one synthesis pass.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub project_name: String,
    /// Marker text to embed when `FileOptions::marker` is set.
    pub marker: String,
}

impl RenderContext {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

/// A file-producing component.
///
/// `render` is called exactly once per synthesis pass, through a shared
/// borrow: the file's state at that moment is the snapshot it renders.
/// Returning `Ok(None)` means "produce nothing this pass".
pub trait SynthFile: Any + Debug + Send + Sync {
    fn path(&self) -> &Path;
    fn options(&self) -> &FileOptions;
    fn render(&self, ctx: &RenderContext) -> Result<Option<Vec<u8>>>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Normalise a project-relative path: drop `.` components, reject absolute
/// paths and `..`.
pub fn normalize_relative(path: &Path) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(SynthkitError::ConfigError(format!(
                    "file path {:?} must be relative to the project and must not contain '..'",
                    path
                )));
            }
        }
    }
    if out.as_os_str().is_empty() {
        return Err(SynthkitError::ConfigError("file path must not be empty".to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readonly_files_are_protected_by_default() {
        let opts = FileOptions::default();
        assert_eq!(opts.conflict_policy(), ConflictPolicy::Protect);

        let opts = FileOptions {
            readonly: false,
            ..FileOptions::default()
        };
        assert_eq!(opts.conflict_policy(), ConflictPolicy::Overwrite);

        let opts = FileOptions {
            conflict: Some(ConflictPolicy::CreateOnly),
            ..FileOptions::default()
        };
        assert_eq!(opts.conflict_policy(), ConflictPolicy::CreateOnly);
    }

    #[test]
    fn paths_are_normalised() {
        assert_eq!(
            normalize_relative(Path::new("./a/./b.txt")).unwrap(),
            PathBuf::from("a/b.txt")
        );
        assert!(normalize_relative(Path::new("../escape")).is_err());
        assert!(normalize_relative(Path::new("/abs")).is_err());
        assert!(normalize_relative(Path::new(".")).is_err());
    }
}

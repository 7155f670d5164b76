// src/synth/registry.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{Result, SynthkitError};
use crate::synth::file::{normalize_relative, SynthFile};
use crate::types::DuplicatePathPolicy;

/// Per-project registry of files, in registration order.
#[derive(Debug, Default)]
pub struct FileRegistry {
    files: Vec<Box<dyn SynthFile>>,
    duplicates: DuplicatePathPolicy,
}

impl FileRegistry {
    pub fn new(duplicates: DuplicatePathPolicy) -> Self {
        Self {
            files: Vec::new(),
            duplicates,
        }
    }

    pub fn register<F: SynthFile>(&mut self, file: F) -> Result<()> {
        self.register_boxed(Box::new(file))
    }

    /// Record a path → file binding.
    ///
    /// - New path: appended.
    /// - Taken path, newcomer sets `override_existing`: replaces the earlier
    ///   file at its original position.
    /// - Taken path otherwise: `DuplicatePath`, or (with the `warn` policy) a
    ///   warning and the newcomer is dropped.
    pub fn register_boxed(&mut self, file: Box<dyn SynthFile>) -> Result<()> {
        let path = normalize_relative(file.path())?;
        if path.as_path() != file.path() {
            return Err(SynthkitError::ConfigError(format!(
                "file path {:?} is not normalised (expected {:?})",
                file.path(),
                path
            )));
        }

        match self.position(&path) {
            None => {
                debug!(path = ?path, "registering file");
                self.files.push(file);
                Ok(())
            }
            Some(idx) if file.options().override_existing => {
                info!(path = ?path, "overriding previously registered file");
                self.files[idx] = file;
                Ok(())
            }
            Some(_) => match self.duplicates {
                DuplicatePathPolicy::Error => Err(SynthkitError::DuplicatePath(path)),
                DuplicatePathPolicy::Warn => {
                    warn!(path = ?path, "file path registered twice; keeping the first registration");
                    Ok(())
                }
            },
        }
    }

    fn position(&self, path: &Path) -> Option<usize> {
        self.files.iter().position(|f| f.path() == path)
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.position(path.as_ref()).is_some()
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&dyn SynthFile> {
        self.position(path.as_ref()).map(|i| self.files[i].as_ref())
    }

    /// Typed mutable access, e.g. `files.get_mut::<JsonFile>("package.json")`.
    pub fn get_mut<F: SynthFile>(&mut self, path: impl AsRef<Path>) -> Option<&mut F> {
        let idx = self.position(path.as_ref())?;
        self.files[idx].as_any_mut().downcast_mut::<F>()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SynthFile> {
        self.files.iter().map(|f| f.as_ref())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path().to_path_buf()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::file::FileOptions;
    use crate::synth::text::TextFile;

    fn text(path: &str, line: &str, options: FileOptions) -> TextFile {
        let mut f = TextFile::new(path, options);
        f.add_line(line);
        f
    }

    #[test]
    fn duplicate_path_is_rejected_by_default() {
        let mut reg = FileRegistry::new(DuplicatePathPolicy::Error);
        reg.register(text("a.txt", "one", FileOptions::default())).unwrap();
        let err = reg
            .register(text("a.txt", "two", FileOptions::default()))
            .unwrap_err();
        assert!(matches!(err, SynthkitError::DuplicatePath(ref p) if p == Path::new("a.txt")));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn warn_policy_keeps_first() {
        let mut reg = FileRegistry::new(DuplicatePathPolicy::Warn);
        reg.register(text("a.txt", "one", FileOptions::default())).unwrap();
        reg.register(text("a.txt", "two", FileOptions::default())).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get_mut::<TextFile>("a.txt").unwrap().lines(), &["one"]);
    }

    #[test]
    fn override_replaces_in_place() {
        let mut reg = FileRegistry::new(DuplicatePathPolicy::Error);
        reg.register(text("a.txt", "one", FileOptions::default())).unwrap();
        reg.register(text("b.txt", "b", FileOptions::default())).unwrap();
        reg.register(text(
            "a.txt",
            "two",
            FileOptions {
                override_existing: true,
                ..FileOptions::default()
            },
        ))
        .unwrap();

        assert_eq!(reg.paths(), vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert_eq!(reg.get_mut::<TextFile>("a.txt").unwrap().lines(), &["two"]);
    }

    #[test]
    fn unnormalised_or_escaping_paths_are_rejected() {
        let mut reg = FileRegistry::new(DuplicatePathPolicy::Error);
        assert!(reg.register(text("../x", "x", FileOptions::default())).is_err());
        assert!(reg.register(text("./x", "x", FileOptions::default())).is_err());
        assert!(reg.is_empty());
    }
}

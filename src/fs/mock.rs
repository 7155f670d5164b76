// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
struct MockEntry {
    contents: Vec<u8>,
    readonly: bool,
    executable: bool,
}

#[derive(Debug, Default)]
struct MockState {
    files: BTreeMap<PathBuf, MockEntry>,
    /// Every path passed to `write`, in call order.
    writes: Vec<PathBuf>,
    removals: Vec<PathBuf>,
}

/// In-memory filesystem that records writes, for idempotence tests.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned mock only happens after a panicking test; keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a file without counting it as a write.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.lock().files.insert(
            path.as_ref().to_path_buf(),
            MockEntry {
                contents: content.into(),
                ..MockEntry::default()
            },
        );
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock()
            .files
            .get(path.as_ref())
            .map(|e| e.contents.clone())
    }

    pub fn contents_str(&self, path: impl AsRef<Path>) -> Option<String> {
        self.contents(path)
            .map(|c| String::from_utf8_lossy(&c).into_owned())
    }

    pub fn is_readonly(&self, path: impl AsRef<Path>) -> bool {
        self.lock()
            .files
            .get(path.as_ref())
            .is_some_and(|e| e.readonly)
    }

    pub fn is_executable(&self, path: impl AsRef<Path>) -> bool {
        self.lock()
            .files
            .get(path.as_ref())
            .is_some_and(|e| e.executable)
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.lock().writes.clone()
    }

    pub fn removed_paths(&self) -> Vec<PathBuf> {
        self.lock().removals.clone()
    }

    pub fn clear_log(&self) {
        let mut state = self.lock();
        state.writes.clear();
        state.removals.clear();
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        Ok(self.lock().files.get(path).map(|e| e.contents.clone()))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.lock();
        let entry = state.files.entry(path.to_path_buf()).or_default();
        entry.contents = contents.to_vec();
        entry.readonly = false;
        state.writes.push(path.to_path_buf());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut state = self.lock();
        if state.files.remove(path).is_none() {
            return Err(anyhow!("File not found: {:?}", path));
        }
        state.removals.push(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    fn set_readonly(&self, path: &Path, readonly: bool) -> Result<()> {
        match self.lock().files.get_mut(path) {
            Some(entry) => {
                entry.readonly = readonly;
                Ok(())
            }
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn set_executable(&self, path: &Path, executable: bool) -> Result<()> {
        match self.lock().files.get_mut(path) {
            Some(entry) => {
                entry.executable = executable;
                Ok(())
            }
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}

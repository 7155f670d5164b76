// src/synth/checksum.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Path of the checksum store, relative to the project outdir.
///
/// The file format is a simple line-based mapping, sorted by path:
///
/// ```text
/// <hex_hash_1> <relative/path/1>
/// <hex_hash_2> <relative/path/2>
/// ...
/// ```
///
/// Each entry is the hash of the bytes the engine last wrote (or found
/// identical) at that path. A file whose current hash differs was edited
/// by hand.
pub const CHECKSUM_FILE_PATH: &str = ".synthkit/checksums";

/// Deterministic hash of a file's contents.
pub fn hash_bytes(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    hasher.finalize().to_hex().to_string()
}

/// In-memory view of the checksum store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumStore {
    entries: BTreeMap<PathBuf, String>,
}

impl ChecksumStore {
    pub fn parse(contents: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in contents.lines() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            // Everything after the first space is the path, spaces included.
            if let Some((hash, path)) = line.split_once(' ') {
                if !hash.is_empty() && !path.is_empty() {
                    entries.insert(PathBuf::from(path), hash.to_string());
                }
            }
        }
        Self { entries }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (path, hash) in &self.entries {
            out.push_str(hash);
            out.push(' ');
            out.push_str(&path.to_string_lossy().replace('\\', "/"));
            out.push('\n');
        }
        out
    }

    /// Load the store from `outdir`; a missing store is empty.
    pub fn load(fs: &dyn FileSystem, outdir: &Path) -> Result<Self> {
        let path = outdir.join(CHECKSUM_FILE_PATH);
        match fs.read(&path)? {
            Some(bytes) => {
                let contents = String::from_utf8(bytes)
                    .with_context(|| format!("checksum store {:?} is not UTF-8", path))?;
                Ok(Self::parse(&contents))
            }
            None => Ok(Self::default()),
        }
    }

    /// Persist the store, skipping the write if nothing changed on disk.
    pub fn save(&self, fs: &dyn FileSystem, outdir: &Path) -> Result<bool> {
        let path = outdir.join(CHECKSUM_FILE_PATH);
        let rendered = self.render();
        match fs.read(&path)? {
            Some(current) if current == rendered.as_bytes() => return Ok(false),
            None if self.entries.is_empty() => return Ok(false),
            _ => {}
        }
        fs.write(&path, rendered.as_bytes())?;
        debug!(entries = self.entries.len(), "stored file checksums");
        Ok(true)
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.entries.get(path).map(|s| s.as_str())
    }

    pub fn record(&mut self, path: impl Into<PathBuf>, hash: String) {
        self.entries.insert(path.into(), hash);
    }

    pub fn forget(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(|p| p.as_path())
    }
}

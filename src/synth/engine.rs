// src/synth/engine.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::synth::checksum::{hash_bytes, ChecksumStore};
use crate::synth::file::{FileOptions, RenderContext};
use crate::synth::marker::contains_marker;
use crate::synth::registry::FileRegistry;
use crate::types::ConflictPolicy;

/// What happened to each path during a synthesis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Existing files kept because they belong to the user.
    pub conflicts: Vec<PathBuf>,
    /// Files from a previous pass that are no longer registered.
    pub removed: Vec<PathBuf>,
}

impl SynthReport {
    pub fn changed(&self) -> bool {
        !self.written.is_empty() || !self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Written,
    Unchanged,
    Conflict,
}

/// One synthesis pass over an output directory.
///
/// Typical use: `new`, then `synthesize_files` and/or `write_generated`
/// for every output, then `finish` to clean stale files and persist the
/// checksum store.
#[derive(Debug)]
pub struct Synthesizer {
    fs: Arc<dyn FileSystem>,
    outdir: PathBuf,
    previous: ChecksumStore,
    store: ChecksumStore,
    seen: BTreeSet<PathBuf>,
    report: SynthReport,
}

impl Synthesizer {
    pub fn new(fs: Arc<dyn FileSystem>, outdir: impl Into<PathBuf>) -> Result<Self> {
        let outdir = outdir.into();
        let previous = ChecksumStore::load(fs.as_ref(), &outdir)?;
        Ok(Self {
            fs,
            store: previous.clone(),
            previous,
            outdir,
            seen: BTreeSet::new(),
            report: SynthReport::default(),
        })
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Render and write every registered file, in registration order.
    pub fn synthesize_files(&mut self, files: &FileRegistry, ctx: &RenderContext) -> Result<()> {
        for file in files.iter() {
            let rendered = file
                .render(ctx)
                .with_context(|| format!("rendering {:?}", file.path()))?;
            match rendered {
                Some(bytes) => self.write_generated(file.path(), &bytes, file.options())?,
                None => debug!(path = ?file.path(), "file produced no content"),
            }
        }
        Ok(())
    }

    /// Apply the conflict policy for one output and write it if needed.
    pub fn write_generated(
        &mut self,
        rel: &Path,
        bytes: &[u8],
        options: &FileOptions,
    ) -> Result<()> {
        let full = self.outdir.join(rel);
        self.seen.insert(rel.to_path_buf());
        let policy = options.conflict_policy();

        let existing = self.fs.read(&full)?;
        let outcome = match existing {
            Some(ref current) if current.as_slice() == bytes => Outcome::Unchanged,
            Some(_) if policy == ConflictPolicy::CreateOnly => Outcome::Unchanged,
            Some(ref current)
                if policy == ConflictPolicy::Protect
                    && self.modified_by_user(rel, current, options) =>
            {
                Outcome::Conflict
            }
            _ => {
                self.fs.write(&full, bytes)?;
                Outcome::Written
            }
        };

        match outcome {
            Outcome::Conflict => {
                warn!(
                    path = ?rel,
                    "file was modified by hand; leaving it alone (delete it to regenerate)"
                );
                self.report.conflicts.push(rel.to_path_buf());
                return Ok(());
            }
            Outcome::Written => {
                info!(path = ?rel, "wrote file");
                self.report.written.push(rel.to_path_buf());
            }
            Outcome::Unchanged => {
                debug!(path = ?rel, "file unchanged");
                self.report.unchanged.push(rel.to_path_buf());
            }
        }

        if policy == ConflictPolicy::CreateOnly {
            // Sample files belong to the user after the first write.
            self.store.forget(rel);
            return Ok(());
        }

        self.fs.set_readonly(&full, options.readonly)?;
        if options.executable {
            self.fs.set_executable(&full, true)?;
        }
        self.store.record(rel, hash_bytes(bytes));
        Ok(())
    }

    /// An existing file is the user's when it no longer matches the last
    /// checksum we recorded. Without a record, a missing marker (or any
    /// content at all, for marker-less files) means it was never ours.
    fn modified_by_user(&self, rel: &Path, current: &[u8], options: &FileOptions) -> bool {
        match self.previous.get(rel) {
            Some(recorded) => recorded != hash_bytes(current),
            None => !options.marker || !contains_marker(current),
        }
    }

    /// Remove stale outputs and persist the checksum store.
    pub fn finish(mut self) -> Result<SynthReport> {
        let stale: Vec<PathBuf> = self
            .previous
            .paths()
            .filter(|p| !self.seen.contains(*p))
            .map(Path::to_path_buf)
            .collect();

        for rel in stale {
            let full = self.outdir.join(&rel);
            self.store.forget(&rel);
            match self.fs.read(&full)? {
                None => {}
                Some(current) if self.previous.get(&rel) == Some(hash_bytes(&current).as_str()) => {
                    self.fs.remove_file(&full)?;
                    info!(path = ?rel, "removed stale file");
                    self.report.removed.push(rel);
                }
                Some(_) => {
                    warn!(path = ?rel, "stale file was modified by hand; keeping it");
                }
            }
        }

        self.store.save(self.fs.as_ref(), &self.outdir)?;
        Ok(self.report)
    }
}

/// Convenience wrapper: one full pass over `files`.
pub fn synthesize_all(
    fs: Arc<dyn FileSystem>,
    outdir: &Path,
    files: &FileRegistry,
    ctx: &RenderContext,
) -> Result<SynthReport> {
    let mut synth = Synthesizer::new(fs, outdir)?;
    synth.synthesize_files(files, ctx)?;
    synth.finish()
}

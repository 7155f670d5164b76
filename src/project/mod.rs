// src/project/mod.rs

//! Composition root: a project owns the task and file registries, an
//! ordered list of components, and drives a synthesis pass.

pub mod component;
pub mod release;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::errors::{Result, SynthkitError};
use crate::exec::{ShellBackend, ShellExecutor, ShellRequest};
use crate::fs::{FileSystem, RealFileSystem};
use crate::synth::{
    FileOptions, FileRegistry, IgnoreFile, RenderContext, SynthFile, SynthReport, Synthesizer,
};
use crate::tasks::{Task, TaskOptions, TaskRegistry, DEFAULT_MANIFEST_PATH};
use crate::types::{ConflictPolicy, DuplicatePathPolicy};

pub use component::{Component, ProjectScope};
pub use release::{ReleaseComponent, ReleaseOptions};

pub const GITIGNORE_PATH: &str = ".gitignore";

#[derive(Debug, Clone)]
pub struct ProjectOptions {
    pub name: String,
    pub outdir: PathBuf,
    /// Task manifest path, relative to `outdir`.
    pub manifest_path: PathBuf,
    pub duplicate_paths: DuplicatePathPolicy,
    /// Maintain a `.gitignore` listing uncommitted generated files.
    pub gitignore: bool,
    /// Shell commands run in `outdir` after a successful synthesis.
    pub post_synthesize: Vec<String>,
}

impl ProjectOptions {
    pub fn new(name: impl Into<String>, outdir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            outdir: outdir.into(),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            duplicate_paths: DuplicatePathPolicy::default(),
            gitignore: true,
            post_synthesize: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SynthOptions {
    /// Skip component post hooks and `post_synthesize` commands.
    pub skip_post: bool,
}

pub struct Project {
    options: ProjectOptions,
    tasks: TaskRegistry,
    files: FileRegistry,
    components: Vec<Box<dyn Component>>,
    fs: Arc<dyn FileSystem>,
    backend: Arc<dyn ShellBackend>,
}

impl Project {
    pub fn new(options: ProjectOptions) -> Result<Self> {
        let mut files = FileRegistry::new(options.duplicate_paths);
        if options.gitignore {
            let mut ignore = IgnoreFile::new(GITIGNORE_PATH, FileOptions::default());
            ignore.include(&format!("/{GITIGNORE_PATH}"));
            files.register(ignore)?;
        }
        Ok(Self {
            options,
            tasks: TaskRegistry::new(),
            files,
            components: Vec::new(),
            fs: Arc::new(RealFileSystem),
            backend: Arc::new(ShellExecutor::new()),
        })
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn ShellBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn outdir(&self) -> &Path {
        &self.options.outdir
    }

    pub fn options(&self) -> &ProjectOptions {
        &self.options
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.options.outdir.join(&self.options.manifest_path)
    }

    pub fn add_task(&mut self, name: &str, options: TaskOptions) -> Result<&mut Task> {
        self.tasks.add_task(name, options)
    }

    pub fn add_file<F: SynthFile>(&mut self, file: F) -> Result<()> {
        self.files.register(file)
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskRegistry {
        &mut self.tasks
    }

    pub fn files(&self) -> &FileRegistry {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut FileRegistry {
        &mut self.files
    }

    /// The project's ignore file, when it maintains one.
    pub fn gitignore_mut(&mut self) -> Option<&mut IgnoreFile> {
        self.files.get_mut::<IgnoreFile>(GITIGNORE_PATH)
    }

    pub fn add_component<C: Component + 'static>(&mut self, mut component: C) -> Result<()> {
        debug!(component = component.name(), "adding component");
        component.register(&mut ProjectScope {
            name: &self.options.name,
            outdir: &self.options.outdir,
            tasks: &mut self.tasks,
            files: &mut self.files,
        })?;
        self.components.push(Box::new(component));
        Ok(())
    }

    /// Run one synthesis pass.
    ///
    /// 1. components' `pre_synthesize`
    /// 2. uncommitted files are added to the ignore file
    /// 3. every registered file is rendered and written
    /// 4. tasks are locked and the task manifest is written
    /// 5. stale outputs are removed and checksums stored
    /// 6. post hooks, unless `options.skip_post`
    pub async fn synth(&mut self, options: SynthOptions) -> Result<SynthReport> {
        info!(project = %self.options.name, outdir = ?self.options.outdir, "synthesizing");

        let mut components = std::mem::take(&mut self.components);
        let pre = components.iter_mut().try_for_each(|c| {
            c.pre_synthesize(&mut ProjectScope {
                name: &self.options.name,
                outdir: &self.options.outdir,
                tasks: &mut self.tasks,
                files: &mut self.files,
            })
        });
        self.components = components;
        pre?;

        if self.files.contains(&self.options.manifest_path) {
            return Err(SynthkitError::DuplicatePath(self.options.manifest_path.clone()));
        }
        self.ignore_uncommitted();

        let ctx = RenderContext::new(&self.options.name);
        let mut synth = Synthesizer::new(self.fs.clone(), &self.options.outdir)?;
        synth.synthesize_files(&self.files, &ctx)?;

        let manifest = self.tasks.render_manifest(Some(ctx.marker.clone()));
        let json = manifest.to_json()?;
        synth.write_generated(
            &self.options.manifest_path,
            json.as_bytes(),
            &FileOptions {
                conflict: Some(ConflictPolicy::Overwrite),
                ..FileOptions::default()
            },
        )?;

        let report = synth.finish()?;
        info!(
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            conflicts = report.conflicts.len(),
            removed = report.removed.len(),
            "synthesis complete"
        );

        if options.skip_post {
            debug!("skipping post-synthesize hooks");
        } else {
            self.post_synthesize(&report).await?;
        }
        Ok(report)
    }

    fn ignore_uncommitted(&mut self) {
        let uncommitted: Vec<String> = self
            .files
            .iter()
            .filter(|f| !f.options().committed)
            .map(|f| format!("/{}", f.path().to_string_lossy().replace('\\', "/")))
            .collect();
        if uncommitted.is_empty() {
            return;
        }
        if let Some(ignore) = self.gitignore_mut() {
            for pattern in &uncommitted {
                ignore.exclude(pattern);
            }
        }
    }

    async fn post_synthesize(&self, report: &SynthReport) -> Result<()> {
        for component in &self.components {
            component
                .post_synthesize(&self.options.outdir, report)
                .with_context(|| format!("post-synthesize hook of '{}'", component.name()))?;
        }

        for command in &self.options.post_synthesize {
            info!(%command, "running post-synthesize command");
            let request = ShellRequest::new(
                command.clone(),
                self.options.outdir.clone(),
                std::env::vars().collect(),
            );
            let code = self.backend.run(&request).await?;
            if code != 0 {
                return Err(SynthkitError::PostSynthFailed {
                    command: command.clone(),
                    code,
                });
            }
        }
        Ok(())
    }
}

// src/project/release.rs

use tracing::debug;

use crate::errors::Result;
use crate::project::component::{Component, ProjectScope};
use crate::runtime::builtins::{
    BUMP_VERSION, CHANGELOG_VAR, TAG_VERSION, UPDATE_CHANGELOG, VERSION_FILE_VAR,
};
use crate::synth::StaticFile;
use crate::tasks::TaskOptions;

pub const BUMP_TASK: &str = "bump";
pub const RELEASE_TASK: &str = "release";

#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    pub version_file: String,
    pub changelog: String,
    pub initial_version: String,
    /// Create an annotated git tag as the last release step.
    pub tag: bool,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self {
            version_file: "VERSION".to_string(),
            changelog: "CHANGELOG.md".to_string(),
            initial_version: "0.1.0".to_string(),
            tag: true,
        }
    }
}

/// Version bookkeeping: a `bump` task and a `release` task that spawns it,
/// then updates the changelog and (optionally) tags the release.
#[derive(Debug, Default)]
pub struct ReleaseComponent {
    options: ReleaseOptions,
}

impl ReleaseComponent {
    pub fn new(options: ReleaseOptions) -> Self {
        Self { options }
    }
}

impl Component for ReleaseComponent {
    fn name(&self) -> &str {
        "release"
    }

    fn register(&mut self, scope: &mut ProjectScope<'_>) -> Result<()> {
        let bump = scope.tasks.add_task(
            BUMP_TASK,
            TaskOptions {
                description: Some("Bumps the version (RELEASE_BUMP=major|minor|patch)".into()),
                ..TaskOptions::default()
            },
        )?;
        bump.env(VERSION_FILE_VAR, &self.options.version_file)?;
        bump.builtin(BUMP_VERSION)?;

        let release = scope.tasks.add_task(
            RELEASE_TASK,
            TaskOptions {
                description: Some("Bumps the version, updates the changelog and tags".into()),
                ..TaskOptions::default()
            },
        )?;
        release
            .env(VERSION_FILE_VAR, &self.options.version_file)?
            .env(CHANGELOG_VAR, &self.options.changelog)?
            .spawn(BUMP_TASK)?
            .builtin(UPDATE_CHANGELOG)?;
        if self.options.tag {
            release.builtin(TAG_VERSION)?;
        }
        Ok(())
    }

    fn pre_synthesize(&mut self, scope: &mut ProjectScope<'_>) -> Result<()> {
        if scope.files.contains(&self.options.version_file) {
            debug!(path = %self.options.version_file, "version file provided elsewhere");
            return Ok(());
        }
        scope.files.register(StaticFile::sample(
            self.options.version_file.as_str(),
            format!("{}\n", self.options.initial_version),
        ))
    }
}

// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::tasks::{Step, DEFAULT_MANIFEST_PATH};
use crate::types::DuplicatePathPolicy;

/// Top-level configuration as read from `Synthkit.toml`.
///
/// ```toml
/// [project]
/// name = "demo"
/// post_synthesize = ["echo synthesized"]
/// watch = ["templates/**"]
///
/// [files."scripts/hello.sh"]
/// lines = ["echo hello"]
/// executable = true
///
/// [files."config.json"]
/// kind = "json"
/// json = { debug = false }
/// overrides = { "server.port" = 8080 }
///
/// [ignore]
/// patterns = ["/target/"]
///
/// [tasks.build]
/// description = "Build everything"
/// steps = [{ exec = "cargo build" }, { spawn = "test" }]
/// ```
///
/// This is the raw, unvalidated form. Convert it with
/// `ConfigFile::try_from(raw)` before use.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub project: ProjectSection,

    /// Keyed by project-relative output path.
    #[serde(default)]
    pub files: BTreeMap<String, FileConfig>,

    #[serde(default)]
    pub ignore: IgnoreSection,

    #[serde(default)]
    pub tasks: BTreeMap<String, TaskConfig>,

    /// Presence of `[release]` adds the `bump` and `release` tasks.
    #[serde(default)]
    pub release: Option<ReleaseSection>,
}

/// Validated configuration. Only constructed through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub files: BTreeMap<String, FileConfig>,
    pub ignore: IgnoreSection,
    pub tasks: BTreeMap<String, TaskConfig>,
    pub release: Option<ReleaseSection>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            project: raw.project,
            files: raw.files,
            ignore: raw.ignore,
            tasks: raw.tasks,
            release: raw.release,
        }
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    #[serde(default = "default_project_name")]
    pub name: String,

    /// Output directory, relative to the config file.
    #[serde(default = "default_outdir")]
    pub outdir: String,

    /// Task manifest path, relative to `outdir`.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// `"error"` (default) or `"warn"`.
    #[serde(default)]
    pub duplicate_paths: DuplicatePathPolicy,

    #[serde(default = "default_true")]
    pub gitignore: bool,

    /// Shell commands run in `outdir` after synthesis.
    #[serde(default)]
    pub post_synthesize: Vec<String>,

    /// Extra globs (relative to the config file) that trigger a
    /// re-synthesis in watch mode. The config file itself is always watched.
    #[serde(default)]
    pub watch: Vec<String>,
}

fn default_project_name() -> String {
    "project".to_string()
}

fn default_outdir() -> String {
    ".".to_string()
}

fn default_manifest() -> String {
    DEFAULT_MANIFEST_PATH.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            outdir: default_outdir(),
            manifest: default_manifest(),
            duplicate_paths: DuplicatePathPolicy::default(),
            gitignore: true,
            post_synthesize: Vec::new(),
            watch: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    #[default]
    Text,
    Json,
    Sample,
}

/// `[files."<path>"]` section.
///
/// - `text`: either `lines` (marker stamped as a comment) or verbatim
///   `contents` / `source`
/// - `json`: a `json` table plus optional dotted-path `overrides` and
///   `delete` lists
/// - `sample`: `contents` or `source`, written once and never touched again
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub kind: FileKind,

    #[serde(default)]
    pub lines: Option<Vec<String>>,

    #[serde(default)]
    pub contents: Option<String>,

    /// File to copy, relative to the config file.
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub json: Option<serde_json::Value>,

    #[serde(default)]
    pub overrides: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub delete: Vec<String>,

    /// Comment prefix for the marker line of `lines` files (default `#`).
    #[serde(default)]
    pub comment: Option<String>,

    #[serde(default)]
    pub marker: Option<bool>,

    #[serde(default)]
    pub readonly: Option<bool>,

    #[serde(default)]
    pub committed: Option<bool>,

    #[serde(default)]
    pub executable: bool,
}

/// `[ignore]` section: extra patterns for the project's `.gitignore`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct IgnoreSection {
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// `[tasks.<name>]` section.
///
/// `exec` is shorthand for a single leading exec step.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub required_env: Vec<String>,

    /// Skip condition: the task is skipped when this exits 0.
    #[serde(default)]
    pub condition: Option<String>,

    #[serde(default)]
    pub cwd: Option<String>,

    #[serde(default)]
    pub exec: Option<String>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl TaskConfig {
    /// Names of tasks spawned by this task's steps.
    pub fn spawned(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|s| match &s.kind {
            crate::tasks::StepKind::Spawn(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// `[release]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseSection {
    #[serde(default = "default_version_file")]
    pub version_file: String,

    #[serde(default = "default_changelog")]
    pub changelog: String,

    #[serde(default = "default_initial_version")]
    pub initial_version: String,

    #[serde(default = "default_true")]
    pub tag: bool,
}

fn default_version_file() -> String {
    "VERSION".to_string()
}

fn default_changelog() -> String {
    "CHANGELOG.md".to_string()
}

fn default_initial_version() -> String {
    "0.1.0".to_string()
}

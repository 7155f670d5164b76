// src/runtime/builtins.rs

//! Runtime-internal operations invoked by `{ "builtin": "<name>" }` steps.
//!
//! The table is fixed at compile time; an unknown name is a configuration
//! error reported by the runtime.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use semver::Version;
use tracing::info;

use crate::errors::{Result, SynthkitError};
use crate::exec::{BoxFuture, ShellBackend, ShellRequest};

/// Everything a built-in may look at.
pub struct BuiltinContext<'a> {
    pub task: &'a str,
    pub step: usize,
    pub cwd: &'a Path,
    pub env: &'a BTreeMap<String, String>,
    pub backend: &'a dyn ShellBackend,
}

impl BuiltinContext<'_> {
    fn var_or(&self, name: &str, default: &str) -> String {
        self.env
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn path_from_env(&self, name: &str, default: &str) -> PathBuf {
        self.cwd.join(self.var_or(name, default))
    }
}

pub type BuiltinFn = for<'a> fn(BuiltinContext<'a>) -> BoxFuture<'a, Result<()>>;

pub const BUMP_VERSION: &str = "release/bump-version";
pub const UPDATE_CHANGELOG: &str = "release/update-changelog";
pub const TAG_VERSION: &str = "release/tag-version";

const BUILTINS: &[(&str, BuiltinFn)] = &[
    (BUMP_VERSION, bump_version),
    (UPDATE_CHANGELOG, update_changelog),
    (TAG_VERSION, tag_version),
];

/// Find a built-in by name.
pub fn lookup(name: &str) -> Option<BuiltinFn> {
    BUILTINS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(n, _)| *n)
}

/// Env var naming the version file (default `VERSION`).
pub const VERSION_FILE_VAR: &str = "VERSION_FILE";
/// Env var selecting the bump kind: `major`, `minor` or `patch` (default).
pub const BUMP_KIND_VAR: &str = "RELEASE_BUMP";
/// Env var naming the changelog (default `CHANGELOG.md`).
pub const CHANGELOG_VAR: &str = "CHANGELOG";

fn read_version(path: &Path) -> anyhow::Result<Option<Version>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading version file {:?}", path))?;
    let version = Version::parse(raw.trim())
        .with_context(|| format!("parsing version in {:?}", path))?;
    Ok(Some(version))
}

fn require_version(path: &Path) -> anyhow::Result<Version> {
    read_version(path)?.ok_or_else(|| anyhow!("version file {:?} does not exist", path))
}

fn bump(current: &Version, kind: &str) -> anyhow::Result<Version> {
    let mut next = current.clone();
    next.pre = semver::Prerelease::EMPTY;
    next.build = semver::BuildMetadata::EMPTY;
    match kind {
        "major" => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
        }
        "minor" => {
            next.minor += 1;
            next.patch = 0;
        }
        "patch" => next.patch += 1,
        other => {
            return Err(anyhow!(
                "invalid {BUMP_KIND_VAR}: {other} (expected \"major\", \"minor\" or \"patch\")"
            ));
        }
    }
    Ok(next)
}

fn bump_version(ctx: BuiltinContext<'_>) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let path = ctx.path_from_env(VERSION_FILE_VAR, "VERSION");
        let kind = ctx.var_or(BUMP_KIND_VAR, "patch");

        let current = read_version(&path)?.unwrap_or_else(|| Version::new(0, 0, 0));
        let next = bump(&current, kind.trim())?;

        fs::write(&path, format!("{next}\n"))
            .with_context(|| format!("writing version file {:?}", path))?;

        info!(task = %ctx.task, from = %current, to = %next, "bumped version");
        Ok(())
    })
}

/// Insert `## <version>` below the title (if any) of `existing`.
fn changelog_with_heading(existing: &str, version: &Version) -> Option<String> {
    let heading = format!("## {version}");
    if existing.lines().any(|l| l.trim() == heading) {
        return None;
    }

    let mut out = String::new();
    let mut rest = existing;
    if let Some(first) = existing.lines().next().filter(|l| l.starts_with("# ")) {
        out.push_str(first);
        out.push_str("\n\n");
        rest = existing[first.len()..].trim_start_matches(['\r', '\n']);
    }
    out.push_str(&heading);
    out.push_str("\n\n");
    out.push_str(rest);
    Some(out)
}

fn update_changelog(ctx: BuiltinContext<'_>) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let version = require_version(&ctx.path_from_env(VERSION_FILE_VAR, "VERSION"))?;
        let path = ctx.path_from_env(CHANGELOG_VAR, "CHANGELOG.md");

        let existing = if path.exists() {
            fs::read_to_string(&path).with_context(|| format!("reading changelog {:?}", path))?
        } else {
            String::new()
        };

        match changelog_with_heading(&existing, &version) {
            Some(updated) => {
                fs::write(&path, updated)
                    .with_context(|| format!("writing changelog {:?}", path))?;
                info!(task = %ctx.task, version = %version, "changelog updated");
            }
            None => info!(task = %ctx.task, version = %version, "changelog already has entry"),
        }
        Ok(())
    })
}

fn tag_version(ctx: BuiltinContext<'_>) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let version = require_version(&ctx.path_from_env(VERSION_FILE_VAR, "VERSION"))?;
        let tag = format!("v{version}");
        let request = ShellRequest::new(
            format!("git tag -a {tag} -m {tag}"),
            ctx.cwd,
            ctx.env.clone(),
        );

        let code = ctx.backend.run(&request).await?;
        if code != 0 {
            return Err(SynthkitError::StepFailed {
                task: ctx.task.to_string(),
                step: ctx.step,
                code,
            });
        }
        info!(task = %ctx.task, tag = %tag, "tagged release");
        Ok(())
    })
}

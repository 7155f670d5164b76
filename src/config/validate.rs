// src/config/validate.rs

use std::path::Path;

use globset::Glob;
use semver::Version;

use crate::config::model::{ConfigFile, FileConfig, FileKind, RawConfigFile};
use crate::errors::{Result, SynthkitError};
use crate::project::release::{BUMP_TASK, RELEASE_TASK};
use crate::runtime::builtins;
use crate::synth::file::normalize_relative;
use crate::tasks::{SpawnGraph, StepKind};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SynthkitError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_project(cfg)?;
    validate_files(cfg)?;
    validate_release(cfg)?;
    validate_steps(cfg)?;
    validate_spawn_targets(cfg)?;
    validate_spawn_graph(cfg)?;
    Ok(())
}

fn validate_project(cfg: &RawConfigFile) -> Result<()> {
    if cfg.project.name.trim().is_empty() {
        return Err(SynthkitError::ConfigError(
            "[project].name must not be empty".to_string(),
        ));
    }
    normalize_relative(Path::new(&cfg.project.manifest))?;
    for pattern in &cfg.project.watch {
        Glob::new(pattern).map_err(|e| {
            SynthkitError::ConfigError(format!("invalid [project].watch glob '{pattern}': {e}"))
        })?;
    }
    Ok(())
}

fn validate_files(cfg: &RawConfigFile) -> Result<()> {
    let manifest = normalize_relative(Path::new(&cfg.project.manifest))?;
    for (path, file) in &cfg.files {
        let normalized = normalize_relative(Path::new(path))?;
        if normalized != Path::new(path) {
            return Err(SynthkitError::ConfigError(format!(
                "file path '{path}' must be written as '{}'",
                normalized.display()
            )));
        }
        if normalized == manifest {
            return Err(SynthkitError::ConfigError(format!(
                "file path '{path}' is reserved for the task manifest"
            )));
        }
        validate_file(path, file)?;
    }
    Ok(())
}

fn validate_file(path: &str, file: &FileConfig) -> Result<()> {
    let err = |msg: &str| -> Result<()> {
        Err(SynthkitError::ConfigError(format!("[files.\"{path}\"]: {msg}")))
    };

    let sources = [file.lines.is_some(), file.contents.is_some(), file.source.is_some()]
        .iter()
        .filter(|set| **set)
        .count();

    match file.kind {
        FileKind::Text => {
            if file.json.is_some() || !file.overrides.is_empty() || !file.delete.is_empty() {
                return err("`json`, `overrides` and `delete` require kind = \"json\"");
            }
            if sources > 1 {
                return err("only one of `lines`, `contents` and `source` may be set");
            }
            if file.lines.is_none() && file.marker == Some(true) && sources == 1 {
                return err("`marker` is only supported with `lines`");
            }
        }
        FileKind::Json => {
            if sources > 0 {
                return err("json files take `json`, not `lines`, `contents` or `source`");
            }
            if let Some(value) = &file.json {
                if !value.is_object() {
                    return err("`json` must be a table");
                }
            }
        }
        FileKind::Sample => {
            if file.json.is_some() || file.lines.is_some() {
                return err("sample files take `contents` or `source`");
            }
            if sources != 1 {
                return err("sample files need exactly one of `contents` and `source`");
            }
        }
    }
    Ok(())
}

fn validate_release(cfg: &RawConfigFile) -> Result<()> {
    let Some(release) = &cfg.release else {
        return Ok(());
    };
    Version::parse(&release.initial_version).map_err(|e| {
        SynthkitError::ConfigError(format!(
            "[release].initial_version '{}' is not a semantic version: {e}",
            release.initial_version
        ))
    })?;
    for reserved in [BUMP_TASK, RELEASE_TASK] {
        if cfg.tasks.contains_key(reserved) {
            return Err(SynthkitError::ConfigError(format!(
                "task '{reserved}' is defined by [release] and cannot be redefined"
            )));
        }
    }
    Ok(())
}

fn validate_steps(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in &cfg.tasks {
        for (idx, step) in task.steps.iter().enumerate() {
            if let StepKind::Builtin(builtin) = &step.kind {
                if builtins::lookup(builtin).is_none() {
                    return Err(SynthkitError::UnknownBuiltin {
                        task: name.clone(),
                        step: idx,
                        name: builtin.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn validate_spawn_targets(cfg: &RawConfigFile) -> Result<()> {
    let release_tasks: &[&str] = if cfg.release.is_some() {
        &[BUMP_TASK, RELEASE_TASK]
    } else {
        &[]
    };
    for (name, task) in &cfg.tasks {
        for sub in task.spawned() {
            if !cfg.tasks.contains_key(sub) && !release_tasks.contains(&sub) {
                return Err(SynthkitError::ConfigError(format!(
                    "task '{name}' spawns unknown task '{sub}'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_spawn_graph(cfg: &RawConfigFile) -> Result<()> {
    SpawnGraph::from_edges(
        cfg.tasks
            .iter()
            .map(|(name, task)| (name.as_str(), task.spawned())),
    )
    .ensure_acyclic()
}

// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::tasks::TaskName;

#[derive(Error, Debug)]
pub enum SynthkitError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Duplicate task: '{0}' is already defined")]
    DuplicateTask(TaskName),

    #[error("Task '{0}' is locked and cannot be modified")]
    TaskLocked(TaskName),

    #[error("Task not found: {0}")]
    UnknownTask(TaskName),

    #[error("Duplicate file path: {0:?} is already registered")]
    DuplicatePath(PathBuf),

    #[error("Task '{task}' requires environment variable '{var}' which is missing or empty")]
    MissingEnv { task: TaskName, var: String },

    #[error("Task '{task}' failed at step {step} with exit code {code}")]
    StepFailed {
        task: TaskName,
        step: usize,
        code: i32,
    },

    #[error("Task '{task}' step {step} refers to unknown builtin '{name}'")]
    UnknownBuiltin {
        task: TaskName,
        step: usize,
        name: String,
    },

    #[error("Task '{task}' step {step} spawned '{subtask}', which failed: {source}")]
    SubtaskFailed {
        task: TaskName,
        step: usize,
        subtask: TaskName,
        source: Box<SynthkitError>,
    },

    #[error("Post-synthesize command '{command}' failed with exit code {code}")]
    PostSynthFailed { command: String, code: i32 },

    #[error("Cycle detected in task spawn graph: {0}")]
    SpawnCycle(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SynthkitError {
    /// The innermost error of a chain of failed spawns.
    pub fn root_cause(&self) -> &SynthkitError {
        let mut err = self;
        while let SynthkitError::SubtaskFailed { source, .. } = err {
            err = source;
        }
        err
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SynthkitError>;

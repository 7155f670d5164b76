// src/types.rs

use std::fmt;

use serde::Deserialize;

/// What happens when a second file claims an already registered path.
///
/// - `Error`: registration fails with `DuplicatePath` (default).
/// - `Warn`: the duplicate is logged and dropped; the first registration wins.
///
/// Files that set `override_existing` always replace the earlier entry,
/// regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePathPolicy {
    #[default]
    Error,
    Warn,
}

/// How the synthesis engine treats a file that already exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Write whenever the rendered bytes differ from disk.
    Overwrite,
    /// Keep the on-disk file if the user edited it since the last synthesis.
    Protect,
    /// Only write when the file does not exist yet.
    CreateOnly,
}

/// Terminal (and transient) states of a single task invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// The skip condition exited 0; no steps ran.
    Skipped,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

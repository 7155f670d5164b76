// src/runtime/inspect.rs

//! Read-only views over a manifest (`--inspect`, `list`).
//!
//! Nothing in here executes anything: conditions, subshell env values and
//! built-ins are printed verbatim.

use std::fmt::Write as _;

use crate::errors::{Result, SynthkitError};
use crate::tasks::{StepKind, TaskManifest, TaskName, TaskSpec};

/// Render the spawn tree rooted at `name`, depth-first in step order.
///
/// ```text
/// build: Build the project
///   exec: echo step1
///   spawn: sub
///     sub
///       exec: echo step2
/// ```
///
/// A spawn that would re-enter a task already on the current path is printed
/// with a `(cycle)` suffix and not followed; a spawn of an unknown task gets
/// `(unknown task)`.
pub fn render_tree(manifest: &TaskManifest, name: &str) -> Result<String> {
    let spec = manifest
        .get(name)
        .ok_or_else(|| SynthkitError::UnknownTask(name.to_string()))?;

    let mut out = String::new();
    let mut path = Vec::new();
    render_task(manifest, spec, 0, &mut path, &mut out);
    Ok(out)
}

fn render_task(
    manifest: &TaskManifest,
    spec: &TaskSpec,
    depth: usize,
    path: &mut Vec<TaskName>,
    out: &mut String,
) {
    let pad = "  ".repeat(depth);
    match &spec.description {
        Some(desc) => {
            let _ = writeln!(out, "{pad}{}: {desc}", spec.name);
        }
        None => {
            let _ = writeln!(out, "{pad}{}", spec.name);
        }
    }

    let inner = "  ".repeat(depth + 1);
    if let Some(cwd) = &spec.cwd {
        let _ = writeln!(out, "{inner}cwd: {cwd}");
    }
    if let Some(condition) = &spec.condition {
        let _ = writeln!(out, "{inner}condition: {condition}");
    }
    for (k, v) in &spec.env {
        let _ = writeln!(out, "{inner}env: {k}={v}");
    }
    if !spec.required_env.is_empty() {
        let _ = writeln!(out, "{inner}requires: {}", spec.required_env.join(", "));
    }

    path.push(spec.name.clone());
    for step in &spec.steps {
        let _ = write!(out, "{inner}{}: {}", step.kind.tag(), step.kind.value());
        if let Some(condition) = &step.condition {
            let _ = write!(out, " [if not: {condition}]");
        }

        match &step.kind {
            StepKind::Spawn(sub) if path.contains(sub) => {
                let _ = writeln!(out, " (cycle)");
            }
            StepKind::Spawn(sub) => match manifest.get(sub) {
                Some(sub_spec) => {
                    let _ = writeln!(out);
                    render_task(manifest, sub_spec, depth + 2, path, out);
                }
                None => {
                    let _ = writeln!(out, " (unknown task)");
                }
            },
            _ => {
                let _ = writeln!(out);
            }
        }
    }
    path.pop();
}

/// One line per task: name padded to a column, then description.
pub fn render_task_list(manifest: &TaskManifest) -> String {
    let width = manifest.task_names().map(str::len).max().unwrap_or(0);
    let mut out = String::new();
    for spec in manifest.tasks.values() {
        let desc = spec.description.as_deref().unwrap_or("");
        let _ = writeln!(out, "{:width$}  {desc}", spec.name, width = width);
    }
    out
}

// src/tasks/manifest.rs

//! Serialized form of the task graph.
//!
//! The manifest is the only thing the runtime ever sees: a plain JSON
//! document keyed by task name, with no references back to the registry that
//! produced it.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::tasks::graph::SpawnGraph;
use crate::tasks::model::Step;
use crate::tasks::TaskName;

/// Default location of the manifest, relative to the project outdir.
pub const DEFAULT_MANIFEST_PATH: &str = ".synthkit/tasks.json";

/// Rendered entry for a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub name: TaskName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_env: Vec<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

/// The full manifest document.
///
/// ```json
/// {
///   "//": "~~ Generated by synthkit. ...",
///   "tasks": {
///     "build": { "name": "build", "env": {}, "steps": [{ "exec": "cargo build" }] }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskManifest {
    #[serde(rename = "//", default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(default)]
    pub tasks: BTreeMap<TaskName, TaskSpec>,
}

impl TaskManifest {
    pub fn get(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    /// Pretty JSON with a trailing newline. Keys are ordered, so identical
    /// task graphs always produce identical bytes.
    pub fn to_json(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Read a manifest from disk and check that its spawn graph is acyclic.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading task manifest at {:?}", path))?;
        let manifest = Self::from_json(&contents)?;
        SpawnGraph::from_manifest(&manifest).ensure_acyclic()?;
        Ok(manifest)
    }
}

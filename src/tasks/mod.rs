// src/tasks/mod.rs

//! Task model, registry and manifest.
//!
//! - [`model`] holds `Task` / `Step` and their option structs.
//! - [`registry`] is the per-project task registry (the graph builder).
//! - [`manifest`] is the serialized form handed to the runtime.
//! - [`graph`] builds the spawn graph for cycle checks and inspection.

/// Canonical task name type.
pub type TaskName = String;

pub mod graph;
pub mod manifest;
pub mod model;
pub mod registry;

pub use graph::SpawnGraph;
pub use manifest::{TaskManifest, TaskSpec, DEFAULT_MANIFEST_PATH};
pub use model::{Step, StepKind, StepOptions, Task, TaskOptions};
pub use registry::TaskRegistry;

// src/runtime/mod.rs

//! Standalone task runtime.
//!
//! The runtime consumes a [`TaskManifest`](crate::tasks::TaskManifest) and
//! nothing else:
//! - [`runner`] walks steps, spawns subtasks, evaluates conditions and
//!   enforces `requiredEnv`.
//! - [`env`] implements env layering and `$(...)` evaluation.
//! - [`builtins`] is the fixed table of runtime-internal operations.
//! - [`inspect`] renders read-only views of the manifest.

pub mod builtins;
pub mod env;
pub mod inspect;
pub mod runner;

pub use crate::types::TaskState;
pub use inspect::{render_task_list, render_tree};
pub use runner::{RuntimeOptions, TaskRuntime};

// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ShellBackend` trait used by the runtime,
//!   built-ins and post-synthesis hooks.
//! - [`command`] is the production backend built on
//!   `tokio::process::Command`.

pub mod backend;
pub mod command;

pub use backend::{BoxFuture, CapturedOutput, ShellBackend, ShellRequest};
pub use command::ShellExecutor;

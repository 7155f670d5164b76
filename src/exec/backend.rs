// src/exec/backend.rs

//! Pluggable shell backend abstraction.
//!
//! The task runtime, the synthesis hooks and the built-ins talk to a
//! `ShellBackend` instead of spawning processes directly. Production code
//! uses [`ShellExecutor`](super::command::ShellExecutor); tests can provide a
//! backend that records commands and returns canned exit codes.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::errors::Result;

/// Boxed future returned by backend and built-in calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A fully resolved shell invocation.
///
/// `env` is the complete environment of the child process (the runtime has
/// already merged the ambient environment into it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellRequest {
    pub command: String,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl ShellRequest {
    pub fn new(
        command: impl Into<String>,
        cwd: impl Into<PathBuf>,
        env: BTreeMap<String, String>,
    ) -> Self {
        Self {
            command: command.into(),
            cwd: cwd.into(),
            env,
        }
    }
}

/// Result of a captured invocation (conditions, `$(...)` env values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub code: i32,
    pub stdout: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Trait abstracting how shell commands are executed.
pub trait ShellBackend: Send + Sync {
    /// Run a command to completion with stdout/stderr streamed to the
    /// console. Returns the exit code (`-1` if killed by a signal).
    fn run<'a>(&'a self, request: &'a ShellRequest) -> BoxFuture<'a, Result<i32>>;

    /// Run a command to completion, capturing stdout. Stderr is passed
    /// through to the console.
    fn capture<'a>(&'a self, request: &'a ShellRequest) -> BoxFuture<'a, Result<CapturedOutput>>;
}

// src/runtime/runner.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::errors::{Result, SynthkitError};
use crate::exec::{BoxFuture, ShellBackend, ShellRequest};
use crate::runtime::builtins::{self, BuiltinContext};
use crate::runtime::env::{first_missing, overlay_env};
use crate::tasks::{Step, StepKind, TaskManifest, TaskName, TaskSpec};
use crate::types::TaskState;

/// Options that influence how the runtime behaves.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Directory that relative task `cwd`s are resolved against.
    pub workdir: PathBuf,
    /// Lowest-precedence environment layer, normally the process env.
    pub ambient_env: BTreeMap<String, String>,
}

impl RuntimeOptions {
    /// Use the current process environment.
    pub fn from_process(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            ambient_env: std::env::vars().collect(),
        }
    }
}

/// Working directory and environment a task inherits from its parent.
#[derive(Debug, Clone)]
struct Scope {
    cwd: PathBuf,
    env: BTreeMap<String, String>,
}

/// Standalone task executor.
///
/// The runtime only knows the [`TaskManifest`]; it never sees the registry
/// or the project that produced it. Execution is strictly sequential: every
/// subprocess and every spawned subtask is awaited before the next step.
pub struct TaskRuntime {
    manifest: TaskManifest,
    backend: Arc<dyn ShellBackend>,
    options: RuntimeOptions,
    states: BTreeMap<TaskName, TaskState>,
}

impl TaskRuntime {
    pub fn new(
        manifest: TaskManifest,
        backend: Arc<dyn ShellBackend>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            manifest,
            backend,
            options,
            states: BTreeMap::new(),
        }
    }

    pub fn manifest(&self) -> &TaskManifest {
        &self.manifest
    }

    pub fn try_find_task(&self, name: &str) -> Option<&TaskSpec> {
        self.manifest.get(name)
    }

    /// Last recorded state of `name` in this runtime, if it was invoked.
    pub fn state_of(&self, name: &str) -> Option<TaskState> {
        self.states.get(name).copied()
    }

    /// Run a task (and, recursively, everything it spawns).
    ///
    /// Returns `Succeeded` or `Skipped` on success. Any failure aborts the
    /// whole invocation chain and is returned as an error carrying the task
    /// name and step index; the failing tasks are recorded as `Failed`.
    pub async fn run_task(&mut self, name: &str) -> Result<TaskState> {
        let scope = Scope {
            cwd: self.options.workdir.clone(),
            env: self.options.ambient_env.clone(),
        };
        let mut stack = Vec::new();
        let result = self.run_nested(name.to_string(), scope, &mut stack).await;

        if let Err(err) = &result {
            error!(task = %name, error = %err, "task failed");
        }
        result
    }

    fn set_state(&mut self, name: &str, state: TaskState) {
        debug!(task = %name, %state, "task state");
        self.states.insert(name.to_string(), state);
    }

    fn run_nested<'a>(
        &'a mut self,
        name: TaskName,
        parent: Scope,
        stack: &'a mut Vec<TaskName>,
    ) -> BoxFuture<'a, Result<TaskState>> {
        Box::pin(async move {
            if stack.contains(&name) {
                let mut chain = stack.clone();
                chain.push(name);
                return Err(SynthkitError::SpawnCycle(chain.join(" -> ")));
            }

            let spec = self
                .manifest
                .get(&name)
                .cloned()
                .ok_or_else(|| SynthkitError::UnknownTask(name.clone()))?;

            self.set_state(&name, TaskState::Pending);

            let cwd = resolve_cwd(&parent.cwd, spec.cwd.as_deref());
            let env = match overlay_env(&*self.backend, &name, &parent.env, &spec.env, &cwd).await {
                Ok(env) => env,
                Err(err) => {
                    self.set_state(&name, TaskState::Failed);
                    return Err(err);
                }
            };

            if let Some(condition) = &spec.condition {
                match self.condition_skips(&name, condition, &cwd, &env).await {
                    Ok(true) => {
                        info!(task = %name, %condition, "condition exited 0; skipping task");
                        self.set_state(&name, TaskState::Skipped);
                        return Ok(TaskState::Skipped);
                    }
                    Ok(false) => {}
                    Err(err) => {
                        self.set_state(&name, TaskState::Failed);
                        return Err(err);
                    }
                }
            }

            if let Some(var) = first_missing(&spec.required_env, &env) {
                self.set_state(&name, TaskState::Failed);
                return Err(SynthkitError::MissingEnv {
                    task: name.clone(),
                    var: var.to_string(),
                });
            }

            self.set_state(&name, TaskState::Running);
            info!(task = %name, steps = spec.steps.len(), "running task");

            stack.push(name.clone());
            let result = self.run_steps(&spec, &cwd, &env, stack).await;
            stack.pop();

            match result {
                Ok(()) => {
                    self.set_state(&name, TaskState::Succeeded);
                    Ok(TaskState::Succeeded)
                }
                Err(err) => {
                    self.set_state(&name, TaskState::Failed);
                    Err(err)
                }
            }
        })
    }

    async fn run_steps(
        &mut self,
        spec: &TaskSpec,
        cwd: &Path,
        env: &BTreeMap<String, String>,
        stack: &mut Vec<TaskName>,
    ) -> Result<()> {
        for (idx, step) in spec.steps.iter().enumerate() {
            let step_cwd = resolve_cwd(cwd, step.cwd.as_deref());
            let step_env = if step.env.is_empty() {
                env.clone()
            } else {
                overlay_env(&*self.backend, &spec.name, env, &step.env, &step_cwd).await?
            };

            if let Some(condition) = &step.condition {
                if self
                    .condition_skips(&spec.name, condition, &step_cwd, &step_env)
                    .await?
                {
                    debug!(task = %spec.name, step = idx, "step condition exited 0; skipping step");
                    continue;
                }
            }

            debug!(
                task = %spec.name,
                step = idx,
                kind = step.kind.tag(),
                name = step.name.as_deref().unwrap_or(""),
                "running step"
            );

            self.run_step(spec, idx, step, step_cwd, step_env, stack)
                .await?;
        }
        Ok(())
    }

    async fn run_step(
        &mut self,
        spec: &TaskSpec,
        idx: usize,
        step: &Step,
        cwd: PathBuf,
        env: BTreeMap<String, String>,
        stack: &mut Vec<TaskName>,
    ) -> Result<()> {
        match &step.kind {
            StepKind::Exec(command) => {
                let request = ShellRequest::new(command.clone(), cwd, env);
                let code = self.backend.run(&request).await.map_err(|err| {
                    SynthkitError::Other(anyhow::anyhow!(
                        "task '{}' step {}: {}",
                        spec.name,
                        idx,
                        err
                    ))
                })?;
                if code != 0 {
                    warn!(task = %spec.name, step = idx, exit_code = code, %command, "step failed");
                    return Err(SynthkitError::StepFailed {
                        task: spec.name.clone(),
                        step: idx,
                        code,
                    });
                }
                Ok(())
            }
            StepKind::Spawn(subtask) => self
                .run_nested(subtask.clone(), Scope { cwd, env }, stack)
                .await
                .map(|_| ())
                .map_err(|err| match err {
                    // The chain already names every task involved.
                    SynthkitError::SpawnCycle(_) => err,
                    err => SynthkitError::SubtaskFailed {
                        task: spec.name.clone(),
                        step: idx,
                        subtask: subtask.clone(),
                        source: Box::new(err),
                    },
                }),
            StepKind::Say(message) => {
                info!(task = %spec.name, step = idx, "say");
                println!("{message}");
                Ok(())
            }
            StepKind::Builtin(builtin) => {
                let run = builtins::lookup(builtin).ok_or_else(|| SynthkitError::UnknownBuiltin {
                    task: spec.name.clone(),
                    step: idx,
                    name: builtin.clone(),
                })?;
                let ctx = BuiltinContext {
                    task: &spec.name,
                    step: idx,
                    cwd: &cwd,
                    env: &env,
                    backend: &*self.backend,
                };
                run(ctx).await
            }
        }
    }

    /// A skip condition skips when it exits 0.
    async fn condition_skips(
        &self,
        task: &str,
        condition: &str,
        cwd: &Path,
        env: &BTreeMap<String, String>,
    ) -> Result<bool> {
        let request = ShellRequest::new(condition, cwd, env.clone());
        let out = self.backend.capture(&request).await.map_err(|err| {
            SynthkitError::Other(anyhow::anyhow!(
                "task '{}': evaluating condition `{}`: {}",
                task,
                condition,
                err
            ))
        })?;
        debug!(task = %task, %condition, exit_code = out.code, "condition evaluated");
        Ok(out.success())
    }
}

fn resolve_cwd(base: &Path, cwd: Option<&str>) -> PathBuf {
    match cwd {
        Some(dir) if !dir.is_empty() => base.join(dir),
        _ => base.to_path_buf(),
    }
}

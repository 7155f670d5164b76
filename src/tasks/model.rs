// src/tasks/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SynthkitError};
use crate::tasks::manifest::TaskSpec;
use crate::tasks::TaskName;

/// What a single step does when the runtime reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// Run a shell command.
    Exec(String),
    /// Run another task (by name) to completion.
    Spawn(TaskName),
    /// Print a message.
    Say(String),
    /// Invoke a runtime-internal operation.
    Builtin(String),
}

impl StepKind {
    /// Short tag used in logs and inspection output.
    pub fn tag(&self) -> &'static str {
        match self {
            StepKind::Exec(_) => "exec",
            StepKind::Spawn(_) => "spawn",
            StepKind::Say(_) => "say",
            StepKind::Builtin(_) => "builtin",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            StepKind::Exec(s) | StepKind::Spawn(s) | StepKind::Say(s) | StepKind::Builtin(s) => s,
        }
    }
}

/// One unit of task execution.
///
/// Serialized as a flat object with exactly one of `exec`, `spawn`, `say` or
/// `builtin` set, e.g. `{ "exec": "cargo build", "name": "compile" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStep", into = "RawStep")]
pub struct Step {
    pub kind: StepKind,
    pub name: Option<String>,
    /// Step-level env overrides; win over task env.
    pub env: BTreeMap<String, String>,
    /// Per-step skip condition (exit 0 skips this step only).
    pub condition: Option<String>,
    /// Working directory, relative to the task's cwd.
    pub cwd: Option<String>,
}

impl Step {
    pub fn new(kind: StepKind, options: StepOptions) -> Self {
        Self {
            kind,
            name: options.name,
            env: options.env,
            condition: options.condition,
            cwd: options.cwd,
        }
    }

    pub fn exec(command: impl Into<String>) -> Self {
        Self::new(StepKind::Exec(command.into()), StepOptions::default())
    }

    pub fn spawn(task: impl Into<TaskName>) -> Self {
        Self::new(StepKind::Spawn(task.into()), StepOptions::default())
    }

    pub fn say(message: impl Into<String>) -> Self {
        Self::new(StepKind::Say(message.into()), StepOptions::default())
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new(StepKind::Builtin(name.into()), StepOptions::default())
    }
}

/// Wire shape of a [`Step`]: the four kinds as optional sibling fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub say: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

impl TryFrom<RawStep> for Step {
    type Error = String;

    fn try_from(raw: RawStep) -> std::result::Result<Self, Self::Error> {
        let mut kinds = Vec::with_capacity(1);
        if let Some(c) = raw.exec {
            kinds.push(StepKind::Exec(c));
        }
        if let Some(t) = raw.spawn {
            kinds.push(StepKind::Spawn(t));
        }
        if let Some(m) = raw.say {
            kinds.push(StepKind::Say(m));
        }
        if let Some(b) = raw.builtin {
            kinds.push(StepKind::Builtin(b));
        }

        if kinds.len() != 1 {
            return Err(format!(
                "a step must set exactly one of `exec`, `spawn`, `say`, `builtin` (found {})",
                kinds.len()
            ));
        }

        Ok(Step {
            kind: kinds.remove(0),
            name: raw.name,
            env: raw.env,
            condition: raw.condition,
            cwd: raw.cwd,
        })
    }
}

impl From<Step> for RawStep {
    fn from(step: Step) -> Self {
        let mut raw = RawStep {
            name: step.name,
            env: step.env,
            condition: step.condition,
            cwd: step.cwd,
            ..RawStep::default()
        };
        match step.kind {
            StepKind::Exec(c) => raw.exec = Some(c),
            StepKind::Spawn(t) => raw.spawn = Some(t),
            StepKind::Say(m) => raw.say = Some(m),
            StepKind::Builtin(b) => raw.builtin = Some(b),
        }
        raw
    }
}

/// Options accepted when appending or prepending a step.
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
    pub name: Option<String>,
    pub env: BTreeMap<String, String>,
    pub condition: Option<String>,
    pub cwd: Option<String>,
}

/// Options accepted by `TaskRegistry::add_task`.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    pub description: Option<String>,
    pub env: BTreeMap<String, String>,
    /// Skip condition: if it exits 0 the task is skipped.
    pub condition: Option<String>,
    pub cwd: Option<String>,
    /// Names that must be present and non-empty when the task runs.
    pub required_env: Vec<String>,
    /// Seed the task with a single exec step.
    pub exec: Option<String>,
    /// Seed the task with these steps (after `exec`, if both are set).
    pub steps: Vec<Step>,
    /// Replace an existing task of the same name instead of failing.
    pub replace_existing: bool,
}

/// A named, ordered sequence of steps plus env/condition metadata.
///
/// Every mutation goes through [`Task::ensure_unlocked`]; once the task is
/// locked (which happens when it is rendered into a manifest) mutations fail
/// with [`SynthkitError::TaskLocked`] and leave the task untouched.
#[derive(Debug, Clone)]
pub struct Task {
    name: TaskName,
    description: Option<String>,
    steps: Vec<Step>,
    env: BTreeMap<String, String>,
    condition: Option<String>,
    cwd: Option<String>,
    required_env: Vec<String>,
    locked: bool,
}

impl Task {
    pub fn new(name: impl Into<TaskName>, options: TaskOptions) -> Self {
        let mut steps = Vec::new();
        if let Some(cmd) = options.exec {
            steps.push(Step::exec(cmd));
        }
        steps.extend(options.steps);

        Self {
            name: name.into(),
            description: options.description,
            steps,
            env: options.env,
            condition: options.condition,
            cwd: options.cwd,
            required_env: options.required_env,
            locked: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    pub fn cwd(&self) -> Option<&str> {
        self.cwd.as_deref()
    }

    pub fn required_env(&self) -> &[String] {
        &self.required_env
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Forbid any further structural mutation.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(SynthkitError::TaskLocked(self.name.clone()));
        }
        Ok(())
    }

    /// Append an arbitrary step.
    pub fn add_step(&mut self, step: Step) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.steps.push(step);
        Ok(self)
    }

    /// Insert a step before all existing steps.
    pub fn prepend_step(&mut self, step: Step) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.steps.insert(0, step);
        Ok(self)
    }

    pub fn exec(&mut self, command: impl Into<String>) -> Result<&mut Self> {
        self.exec_with(command, StepOptions::default())
    }

    pub fn exec_with(
        &mut self,
        command: impl Into<String>,
        options: StepOptions,
    ) -> Result<&mut Self> {
        self.add_step(Step::new(StepKind::Exec(command.into()), options))
    }

    pub fn spawn(&mut self, subtask: impl Into<TaskName>) -> Result<&mut Self> {
        self.spawn_with(subtask, StepOptions::default())
    }

    pub fn spawn_with(
        &mut self,
        subtask: impl Into<TaskName>,
        options: StepOptions,
    ) -> Result<&mut Self> {
        self.add_step(Step::new(StepKind::Spawn(subtask.into()), options))
    }

    pub fn say(&mut self, message: impl Into<String>) -> Result<&mut Self> {
        self.say_with(message, StepOptions::default())
    }

    pub fn say_with(
        &mut self,
        message: impl Into<String>,
        options: StepOptions,
    ) -> Result<&mut Self> {
        self.add_step(Step::new(StepKind::Say(message.into()), options))
    }

    pub fn builtin(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.builtin_with(name, StepOptions::default())
    }

    pub fn builtin_with(
        &mut self,
        name: impl Into<String>,
        options: StepOptions,
    ) -> Result<&mut Self> {
        self.add_step(Step::new(StepKind::Builtin(name.into()), options))
    }

    pub fn prepend_exec(&mut self, command: impl Into<String>) -> Result<&mut Self> {
        self.prepend_step(Step::exec(command))
    }

    pub fn prepend_spawn(&mut self, subtask: impl Into<TaskName>) -> Result<&mut Self> {
        self.prepend_step(Step::spawn(subtask))
    }

    pub fn prepend_say(&mut self, message: impl Into<String>) -> Result<&mut Self> {
        self.prepend_step(Step::say(message))
    }

    /// Remove all steps.
    pub fn reset(&mut self) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.steps.clear();
        Ok(self)
    }

    /// Remove all steps and re-seed the task with a single exec step.
    pub fn reset_with(
        &mut self,
        command: impl Into<String>,
        options: StepOptions,
    ) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.steps.clear();
        self.steps
            .push(Step::new(StepKind::Exec(command.into()), options));
        Ok(self)
    }

    /// Upsert an environment variable. Values of the form `$(cmd)` are
    /// evaluated by the runtime.
    pub fn env(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.env.insert(name.into(), value.into());
        Ok(self)
    }

    pub fn require_env(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        let name = name.into();
        if !self.required_env.contains(&name) {
            self.required_env.push(name);
        }
        Ok(self)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.description = Some(description.into());
        Ok(self)
    }

    pub fn set_condition(&mut self, condition: Option<String>) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.condition = condition;
        Ok(self)
    }

    pub fn set_cwd(&mut self, cwd: Option<String>) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.cwd = cwd;
        Ok(self)
    }

    /// Produce the manifest entry for this task.
    ///
    /// The result is an owned snapshot; later mutations (which are rejected
    /// anyway once the registry locks the task) cannot leak into it.
    pub fn render_spec(&self) -> TaskSpec {
        TaskSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            env: self.env.clone(),
            required_env: self.required_env.clone(),
            steps: self.steps.clone(),
            condition: self.condition.clone(),
            cwd: self.cwd.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_and_prepends_preserve_order() {
        let mut task = Task::new("build", TaskOptions::default());
        task.exec("a").unwrap().exec("b").unwrap();
        assert_eq!(task.steps(), &[Step::exec("a"), Step::exec("b")]);

        task.prepend_exec("c").unwrap();
        assert_eq!(
            task.steps(),
            &[Step::exec("c"), Step::exec("a"), Step::exec("b")]
        );
    }

    #[test]
    fn locked_task_rejects_every_mutation() {
        let mut task = Task::new("t", TaskOptions::default());
        task.exec("a").unwrap();
        task.lock();

        assert!(matches!(task.exec("b"), Err(SynthkitError::TaskLocked(ref n)) if n == "t"));
        assert!(task.spawn("x").is_err());
        assert!(task.say("hi").is_err());
        assert!(task.builtin("release/tag-version").is_err());
        assert!(task.reset().is_err());
        assert!(task.env("A", "1").is_err());
        assert!(task.prepend_exec("c").is_err());
        assert!(task.prepend_spawn("c").is_err());
        assert!(task.prepend_say("c").is_err());

        assert_eq!(task.steps(), &[Step::exec("a")]);
        assert!(task.env_vars().is_empty());
    }

    #[test]
    fn reset_with_reseeds_single_exec() {
        let mut task = Task::new(
            "t",
            TaskOptions {
                exec: Some("old".into()),
                ..TaskOptions::default()
            },
        );
        task.say("hello").unwrap();
        task.reset_with("new", StepOptions::default()).unwrap();
        assert_eq!(task.steps(), &[Step::exec("new")]);

        task.reset().unwrap();
        assert!(task.steps().is_empty());
    }

    #[test]
    fn env_is_last_write_wins() {
        let mut task = Task::new("t", TaskOptions::default());
        task.env("A", "1").unwrap().env("A", "2").unwrap();
        assert_eq!(task.env_vars().get("A").map(String::as_str), Some("2"));
    }

    #[test]
    fn step_serializes_with_single_kind_field() {
        let step = Step::new(
            StepKind::Spawn("sub".into()),
            StepOptions {
                name: Some("run sub".into()),
                ..StepOptions::default()
            },
        );
        let json = serde_json::to_string(&step).unwrap();
        assert_eq!(json, r#"{"name":"run sub","spawn":"sub"}"#);
    }

    #[test]
    fn step_with_two_kinds_is_rejected() {
        let res: std::result::Result<Step, _> =
            serde_json::from_str(r#"{"exec":"a","say":"b"}"#);
        assert!(res.is_err());

        let res: std::result::Result<Step, _> = serde_json::from_str(r#"{"name":"x"}"#);
        assert!(res.is_err());
    }
}

// src/tasks/registry.rs

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::{debug, info};

use crate::errors::{Result, SynthkitError};
use crate::tasks::manifest::TaskManifest;
use crate::tasks::model::{Task, TaskOptions};
use crate::tasks::TaskName;

/// Per-project registry of task definitions.
///
/// Owned by a `Project`; there is no process-wide registry, so several
/// projects can coexist in one process.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Task>,
    /// Set once the manifest was rendered; no new tasks after that.
    frozen: bool,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a new task.
    ///
    /// Fails with [`SynthkitError::DuplicateTask`] if the name is taken, unless
    /// `options.replace_existing` is set. A locked task can never be replaced,
    /// and once the manifest was rendered no task can be added at all
    /// ([`SynthkitError::TaskLocked`]).
    pub fn add_task(
        &mut self,
        name: impl Into<TaskName>,
        options: TaskOptions,
    ) -> Result<&mut Task> {
        let name = name.into();
        if self.frozen {
            return Err(SynthkitError::TaskLocked(name));
        }

        match self.tasks.entry(name) {
            Entry::Occupied(mut slot) => {
                let name = slot.key().clone();
                if !options.replace_existing {
                    return Err(SynthkitError::DuplicateTask(name));
                }
                if slot.get().is_locked() {
                    return Err(SynthkitError::TaskLocked(name));
                }
                info!(task = %name, "replacing existing task definition");
                slot.insert(Task::new(name, options));
                Ok(slot.into_mut())
            }
            Entry::Vacant(slot) => {
                debug!(task = %slot.key(), "defining task");
                let task = Task::new(slot.key().clone(), options);
                Ok(slot.insert(task))
            }
        }
    }

    /// Look up a task by name.
    pub fn try_find(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn try_find_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.get_mut(name)
    }

    /// Like [`Self::try_find_mut`], but a missing task is an error.
    pub fn task_mut(&mut self, name: &str) -> Result<&mut Task> {
        self.tasks
            .get_mut(name)
            .ok_or_else(|| SynthkitError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Lock every task and refuse further definitions.
    pub fn lock_all(&mut self) {
        self.frozen = true;
        for task in self.tasks.values_mut() {
            task.lock();
        }
    }

    /// Lock every task and render the manifest.
    ///
    /// After this call the registry is frozen: existing tasks reject
    /// mutations and `add_task` rejects new names, so the manifest is an
    /// immutable snapshot of exactly what was defined.
    pub fn render_manifest(&mut self, marker: Option<String>) -> TaskManifest {
        self.lock_all();
        let tasks = self
            .tasks
            .iter()
            .map(|(name, task)| (name.clone(), task.render_spec()))
            .collect();
        TaskManifest { marker, tasks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::model::Step;

    #[test]
    fn no_new_tasks_after_render() {
        let mut reg = TaskRegistry::new();
        reg.add_task("build", TaskOptions::default()).unwrap();
        let manifest = reg.render_manifest(None);

        let err = reg.add_task("late", TaskOptions::default()).unwrap_err();
        assert!(matches!(err, SynthkitError::TaskLocked(ref n) if n == "late"));
        assert!(!reg.contains("late"));
        assert_eq!(reg.render_manifest(None), manifest);
    }

    #[test]
    fn duplicate_name_keeps_first_definition() {
        let mut reg = TaskRegistry::new();
        reg.add_task(
            "build",
            TaskOptions {
                exec: Some("first".into()),
                ..TaskOptions::default()
            },
        )
        .unwrap();

        let err = reg
            .add_task(
                "build",
                TaskOptions {
                    exec: Some("second".into()),
                    ..TaskOptions::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SynthkitError::DuplicateTask(ref n) if n == "build"));

        assert_eq!(reg.len(), 1);
        assert_eq!(
            reg.try_find("build").unwrap().steps(),
            &[Step::exec("first")]
        );
    }

    #[test]
    fn replace_existing_overrides_definition() {
        let mut reg = TaskRegistry::new();
        reg.add_task("test", TaskOptions::default()).unwrap();
        reg.add_task(
            "test",
            TaskOptions {
                exec: Some("cargo test".into()),
                replace_existing: true,
                ..TaskOptions::default()
            },
        )
        .unwrap();
        assert_eq!(
            reg.try_find("test").unwrap().steps(),
            &[Step::exec("cargo test")]
        );
    }

    #[test]
    fn render_manifest_locks_tasks() {
        let mut reg = TaskRegistry::new();
        reg.add_task("a", TaskOptions::default())
            .unwrap()
            .exec("echo a")
            .unwrap();

        let manifest = reg.render_manifest(None);
        assert_eq!(manifest.tasks["a"].steps, vec![Step::exec("echo a")]);

        let task = reg.task_mut("a").unwrap();
        assert!(task.is_locked());
        assert!(task.exec("echo b").is_err());
        assert_eq!(manifest.tasks["a"].steps.len(), 1);
    }

    #[test]
    fn missing_task_lookup() {
        let mut reg = TaskRegistry::new();
        assert!(reg.try_find("nope").is_none());
        assert!(matches!(reg.task_mut("nope"), Err(SynthkitError::UnknownTask(_))));
    }
}

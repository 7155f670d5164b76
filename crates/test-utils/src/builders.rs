#![allow(dead_code)]

use std::collections::BTreeMap;

use synthkit::config::{ConfigFile, RawConfigFile, TaskConfig};
use synthkit::tasks::{Step, TaskManifest, TaskRegistry, TaskOptions};

/// Builder for an in-memory `TaskManifest`, going through the registry so
/// the result is exactly what a project would write.
pub struct ManifestBuilder {
    registry: TaskRegistry,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            registry: TaskRegistry::new(),
        }
    }

    pub fn task(mut self, name: &str, steps: Vec<Step>) -> Self {
        self.registry
            .add_task(
                name,
                TaskOptions {
                    steps,
                    ..TaskOptions::default()
                },
            )
            .expect("task names in a builder must be unique");
        self
    }

    pub fn task_with(mut self, name: &str, options: TaskOptions) -> Self {
        self.registry
            .add_task(name, options)
            .expect("task names in a builder must be unique");
        self
    }

    pub fn build(mut self) -> TaskManifest {
        self.registry.render_manifest(None)
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(name: &str) -> Self {
        let mut config = RawConfigFile::default();
        config.project.name = name.to_string();
        Self { config }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.tasks.insert(name.to_string(), task);
        self
    }

    pub fn with_post_synthesize(mut self, command: &str) -> Self {
        self.config.project.post_synthesize.push(command.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn exec(mut self, cmd: &str) -> Self {
        self.task.steps.push(Step::exec(cmd));
        self
    }

    pub fn spawn(mut self, task: &str) -> Self {
        self.task.steps.push(Step::spawn(task));
        self
    }

    pub fn builtin(mut self, name: &str) -> Self {
        self.task.steps.push(Step::builtin(name));
        self
    }

    pub fn env(mut self, name: &str, value: &str) -> Self {
        self.task.env.insert(name.to_string(), value.to_string());
        self
    }

    pub fn condition(mut self, condition: &str) -> Self {
        self.task.condition = Some(condition.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Ambient env for runtime tests: just enough for `sh` to work.
pub fn minimal_env() -> BTreeMap<String, String> {
    std::env::var("PATH")
        .map(|path| BTreeMap::from([("PATH".to_string(), path)]))
        .unwrap_or_default()
}

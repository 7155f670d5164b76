// src/project/component.rs

use std::path::Path;

use crate::errors::Result;
use crate::synth::{FileRegistry, SynthReport};
use crate::tasks::TaskRegistry;

/// Mutable view of a project handed to components.
pub struct ProjectScope<'a> {
    pub name: &'a str,
    pub outdir: &'a Path,
    pub tasks: &'a mut TaskRegistry,
    pub files: &'a mut FileRegistry,
}

/// A unit of project structure that contributes tasks and files.
///
/// Hooks run in the order components were added:
///
/// 1. `register` when the component is added to the project
/// 2. `pre_synthesize` at the start of every `Project::synth`, after every
///    component is known (cross-component adjustments go here)
/// 3. `post_synthesize` after files and the task manifest were written
pub trait Component: Send + Sync {
    fn name(&self) -> &str;

    fn register(&mut self, _scope: &mut ProjectScope<'_>) -> Result<()> {
        Ok(())
    }

    fn pre_synthesize(&mut self, _scope: &mut ProjectScope<'_>) -> Result<()> {
        Ok(())
    }

    fn post_synthesize(&self, _outdir: &Path, _report: &SynthReport) -> Result<()> {
        Ok(())
    }
}

// src/tasks/graph.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, SynthkitError};
use crate::tasks::manifest::TaskManifest;
use crate::tasks::model::StepKind;

/// Directed graph of `spawn` edges between tasks.
///
/// Edge direction: parent -> subtask. For
///
/// ```json
/// "build": { "steps": [{ "spawn": "compile" }] }
/// ```
///
/// we add edge `build -> compile`.
#[derive(Debug, Clone)]
pub struct SpawnGraph<'a> {
    graph: DiGraphMap<&'a str, ()>,
}

impl<'a> SpawnGraph<'a> {
    pub fn from_manifest(manifest: &'a TaskManifest) -> Self {
        Self::from_edges(
            manifest.tasks.values().map(|spec| {
                let subtasks = spec.steps.iter().filter_map(|step| match &step.kind {
                    StepKind::Spawn(sub) => Some(sub.as_str()),
                    _ => None,
                });
                (spec.name.as_str(), subtasks)
            }),
        )
    }

    /// Build from `(task, subtasks)` pairs.
    pub fn from_edges<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, S)>,
        S: IntoIterator<Item = &'a str>,
    {
        let mut graph: DiGraphMap<&'a str, ()> = DiGraphMap::new();
        for (name, subtasks) in tasks {
            graph.add_node(name);
            for sub in subtasks {
                graph.add_edge(name, sub, ());
            }
        }
        Self { graph }
    }

    /// Fail with [`SynthkitError::SpawnCycle`] if any task (transitively)
    /// spawns itself.
    pub fn ensure_acyclic(&self) -> Result<()> {
        if let Some((a, _, _)) = self.graph.all_edges().find(|(a, b, _)| a == b) {
            return Err(SynthkitError::SpawnCycle(format!(
                "task '{}' spawns itself",
                a
            )));
        }

        match toposort(&self.graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(SynthkitError::SpawnCycle(format!(
                "cycle detected involving task '{}'",
                cycle.node_id()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_is_acyclic() {
        let g = SpawnGraph::from_edges([("a", vec!["b"]), ("b", vec!["c"]), ("c", vec![])]);
        assert!(g.ensure_acyclic().is_ok());
    }

    #[test]
    fn two_node_cycle_is_reported() {
        let g = SpawnGraph::from_edges([("a", vec!["b"]), ("b", vec!["a"])]);
        assert!(matches!(g.ensure_acyclic(), Err(SynthkitError::SpawnCycle(_))));
    }

    #[test]
    fn self_spawn_is_reported() {
        let g = SpawnGraph::from_edges([("a", vec!["a"])]);
        match g.ensure_acyclic() {
            Err(SynthkitError::SpawnCycle(msg)) => assert!(msg.contains("spawns itself")),
            other => panic!("expected SpawnCycle, got {other:?}"),
        }
    }
}

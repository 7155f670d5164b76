// tests/task_properties.rs

use proptest::prelude::*;
use synthkit::errors::SynthkitError;
use synthkit::tasks::{StepKind, TaskOptions, TaskRegistry};

#[derive(Debug, Clone)]
enum Op {
    Exec(String),
    Say(String),
    PrependExec(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(Op::Exec),
        "[a-z]{1,8}".prop_map(Op::Say),
        "[a-z]{1,8}".prop_map(Op::PrependExec),
    ]
}

/// What the step list should look like after applying `ops` in order.
fn expected_steps(ops: &[Op]) -> Vec<StepKind> {
    let mut steps = Vec::new();
    for op in ops {
        match op {
            Op::Exec(c) => steps.push(StepKind::Exec(c.clone())),
            Op::Say(m) => steps.push(StepKind::Say(m.clone())),
            Op::PrependExec(c) => steps.insert(0, StepKind::Exec(c.clone())),
        }
    }
    steps
}

proptest! {
    #[test]
    fn steps_keep_insertion_order(ops in proptest::collection::vec(op_strategy(), 0..20)) {
        let mut registry = TaskRegistry::new();
        let task = registry.add_task("t", TaskOptions::default()).unwrap();
        for op in &ops {
            match op {
                Op::Exec(c) => { task.exec(c.as_str()).unwrap(); }
                Op::Say(m) => { task.say(m.as_str()).unwrap(); }
                Op::PrependExec(c) => { task.prepend_exec(c.as_str()).unwrap(); }
            }
        }

        let manifest = registry.render_manifest(None);
        let kinds: Vec<StepKind> = manifest.get("t").unwrap().steps.iter().map(|s| s.kind.clone()).collect();
        prop_assert_eq!(kinds, expected_steps(&ops));
    }

    #[test]
    fn locked_tasks_reject_every_mutation(
        before in proptest::collection::vec(op_strategy(), 0..10),
        after in proptest::collection::vec(op_strategy(), 1..10),
    ) {
        let mut registry = TaskRegistry::new();
        {
            let task = registry.add_task("t", TaskOptions::default()).unwrap();
            for op in &before {
                let (Op::Exec(c) | Op::PrependExec(c) | Op::Say(c)) = op;
                task.exec(c.as_str()).unwrap();
            }
        }
        let snapshot = registry.render_manifest(None);

        let task = registry.task_mut("t").unwrap();
        for op in &after {
            let result = match op {
                Op::Exec(c) => task.exec(c.as_str()).map(|_| ()),
                Op::Say(m) => task.say(m.as_str()).map(|_| ()),
                Op::PrependExec(c) => task.prepend_exec(c.as_str()).map(|_| ()),
            };
            prop_assert!(matches!(result, Err(SynthkitError::TaskLocked(_))));
        }
        prop_assert!(matches!(task.env("X", "1"), Err(SynthkitError::TaskLocked(_))));
        prop_assert!(matches!(task.reset(), Err(SynthkitError::TaskLocked(_))));

        prop_assert_eq!(registry.render_manifest(None), snapshot);
    }

    #[test]
    fn duplicate_names_keep_the_first_definition(first in "[a-z]{1,8}", second in "[a-z]{1,8}") {
        let mut registry = TaskRegistry::new();
        registry
            .add_task("t", TaskOptions { exec: Some(first.clone()), ..TaskOptions::default() })
            .unwrap();
        let err = registry
            .add_task("t", TaskOptions { exec: Some(second), ..TaskOptions::default() })
            .unwrap_err();

        prop_assert!(matches!(err, SynthkitError::DuplicateTask(ref n) if n == "t"));
        let steps = registry.try_find("t").unwrap().steps();
        prop_assert_eq!(steps.len(), 1);
        prop_assert_eq!(&steps[0].kind, &StepKind::Exec(first));
    }
}

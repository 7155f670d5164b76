// tests/runtime_scenarios.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use synthkit::errors::SynthkitError;
use synthkit::runtime::{RuntimeOptions, TaskRuntime};
use synthkit::tasks::{Step, StepOptions, TaskOptions};
use synthkit::types::TaskState;
use synthkit_test_utils::builders::{minimal_env, ManifestBuilder};
use synthkit_test_utils::fake_shell::FakeShell;
use synthkit_test_utils::init_tracing;

fn fake_runtime(manifest: synthkit::tasks::TaskManifest, shell: &FakeShell) -> TaskRuntime {
    TaskRuntime::new(
        manifest,
        Arc::new(shell.clone()),
        RuntimeOptions {
            workdir: "/project".into(),
            ambient_env: BTreeMap::from([("AMBIENT".to_string(), "1".to_string())]),
        },
    )
}

#[tokio::test]
async fn spawned_subtask_runs_in_place() {
    init_tracing();
    let manifest = ManifestBuilder::new()
        .task(
            "build",
            vec![Step::exec("echo step1"), Step::spawn("sub"), Step::exec("echo step3")],
        )
        .task("sub", vec![Step::exec("echo step2")])
        .build();
    let shell = FakeShell::new();
    let mut rt = fake_runtime(manifest, &shell);

    let state = rt.run_task("build").await.unwrap();

    assert_eq!(state, TaskState::Succeeded);
    assert_eq!(shell.commands(), vec!["echo step1", "echo step2", "echo step3"]);
    assert_eq!(rt.state_of("sub"), Some(TaskState::Succeeded));
}

#[tokio::test]
async fn failing_step_aborts_the_task() {
    init_tracing();
    let manifest = ManifestBuilder::new()
        .task("t", vec![Step::exec("false"), Step::exec("echo never")])
        .build();
    let shell = FakeShell::new().exit_with("false", 1);
    let mut rt = fake_runtime(manifest, &shell);

    let err = rt.run_task("t").await.unwrap_err();

    match err {
        SynthkitError::StepFailed { task, step, code } => {
            assert_eq!(task, "t");
            assert_eq!(step, 0);
            assert_eq!(code, 1);
        }
        other => panic!("expected StepFailed, got {other:?}"),
    }
    assert_eq!(shell.commands(), vec!["false"]);
    assert_eq!(rt.state_of("t"), Some(TaskState::Failed));
}

#[tokio::test]
async fn subtask_failure_propagates_to_parent() {
    let manifest = ManifestBuilder::new()
        .task("parent", vec![Step::spawn("child"), Step::exec("echo after")])
        .task("child", vec![Step::exec("exit 3")])
        .build();
    let shell = FakeShell::new().exit_with("exit 3", 3);
    let mut rt = fake_runtime(manifest, &shell);

    let err = rt.run_task("parent").await.unwrap_err();

    match &err {
        SynthkitError::SubtaskFailed { task, step, subtask, .. } => {
            assert_eq!(task, "parent");
            assert_eq!(*step, 0);
            assert_eq!(subtask, "child");
        }
        other => panic!("expected SubtaskFailed, got {other:?}"),
    }
    assert!(matches!(err.root_cause(), SynthkitError::StepFailed { task, code: 3, .. } if task == "child"));
    assert_eq!(rt.state_of("parent"), Some(TaskState::Failed));
    assert!(!shell.commands().contains(&"echo after".to_string()));
}

#[tokio::test]
async fn condition_exiting_zero_skips_the_task() {
    let manifest = ManifestBuilder::new()
        .task_with(
            "t",
            TaskOptions {
                condition: Some("test -f done".into()),
                exec: Some("echo work".into()),
                ..TaskOptions::default()
            },
        )
        .build();

    let shell = FakeShell::new().exit_with("test -f done", 0);
    let mut rt = fake_runtime(manifest.clone(), &shell);
    assert_eq!(rt.run_task("t").await.unwrap(), TaskState::Skipped);
    assert_eq!(shell.commands(), vec!["test -f done"]);

    let shell = FakeShell::new().exit_with("test -f done", 1);
    let mut rt = fake_runtime(manifest, &shell);
    assert_eq!(rt.run_task("t").await.unwrap(), TaskState::Succeeded);
    assert_eq!(shell.commands(), vec!["test -f done", "echo work"]);
}

#[tokio::test]
async fn step_condition_skips_only_that_step() {
    let manifest = ManifestBuilder::new()
        .task(
            "t",
            vec![
                Step::new(
                    synthkit::tasks::StepKind::Exec("echo skipped".into()),
                    StepOptions {
                        condition: Some("true".into()),
                        ..StepOptions::default()
                    },
                ),
                Step::exec("echo runs"),
            ],
        )
        .build();
    let shell = FakeShell::new();
    let mut rt = fake_runtime(manifest, &shell);

    assert_eq!(rt.run_task("t").await.unwrap(), TaskState::Succeeded);
    assert_eq!(shell.commands(), vec!["true", "echo runs"]);
}

#[tokio::test]
async fn missing_required_env_fails_before_any_step() {
    let manifest = ManifestBuilder::new()
        .task_with(
            "deploy",
            TaskOptions {
                required_env: vec!["TOKEN".into()],
                env: BTreeMap::from([("EMPTY".to_string(), String::new())]),
                exec: Some("echo deploying".into()),
                ..TaskOptions::default()
            },
        )
        .build();
    let shell = FakeShell::new();
    let mut rt = fake_runtime(manifest, &shell);

    let err = rt.run_task("deploy").await.unwrap_err();

    assert!(matches!(err, SynthkitError::MissingEnv { ref var, .. } if var == "TOKEN"));
    assert!(shell.commands().is_empty());
}

#[tokio::test]
async fn env_layers_and_subshells_resolve_in_order() {
    let manifest = ManifestBuilder::new()
        .task_with(
            "t",
            TaskOptions {
                env: BTreeMap::from([
                    ("LAYER".to_string(), "task".to_string()),
                    ("REV".to_string(), "$(git rev-parse HEAD)".to_string()),
                ]),
                steps: vec![
                    Step::new(
                        synthkit::tasks::StepKind::Exec("echo $LAYER".into()),
                        StepOptions {
                            env: BTreeMap::from([("LAYER".to_string(), "step".to_string())]),
                            ..StepOptions::default()
                        },
                    ),
                    Step::exec("echo $REV"),
                ],
                ..TaskOptions::default()
            },
        )
        .build();
    let shell = FakeShell::new().stdout_for("git rev-parse HEAD", "abc123\n");
    let mut rt = fake_runtime(manifest, &shell);

    rt.run_task("t").await.unwrap();

    let requests = shell.requests();
    let step0 = requests.iter().find(|r| r.command == "echo $LAYER").unwrap();
    assert_eq!(step0.env["LAYER"], "step");
    assert_eq!(step0.env["AMBIENT"], "1");
    let step1 = requests.iter().find(|r| r.command == "echo $REV").unwrap();
    assert_eq!(step1.env["LAYER"], "task");
    assert_eq!(step1.env["REV"], "abc123");
}

#[tokio::test]
async fn unknown_task_and_builtin_are_errors() {
    let manifest = ManifestBuilder::new()
        .task("t", vec![Step::builtin("no/such-builtin")])
        .build();
    let shell = FakeShell::new();
    let mut rt = fake_runtime(manifest, &shell);

    assert!(matches!(
        rt.run_task("missing").await.unwrap_err(),
        SynthkitError::UnknownTask(ref n) if n == "missing"
    ));
    assert!(matches!(
        rt.run_task("t").await.unwrap_err(),
        SynthkitError::UnknownBuiltin { step: 0, .. }
    ));
}

#[tokio::test]
async fn spawn_cycle_is_detected_at_runtime() {
    // Hand-written manifests can bypass config validation.
    let json = r#"{
      "tasks": {
        "a": { "name": "a", "steps": [{ "spawn": "b" }] },
        "b": { "name": "b", "steps": [{ "spawn": "a" }] }
      }
    }"#;
    let manifest = synthkit::tasks::TaskManifest::from_json(json).unwrap();
    let shell = FakeShell::new();
    let mut rt = fake_runtime(manifest, &shell);

    let err = rt.run_task("a").await.unwrap_err();
    assert!(matches!(err, SynthkitError::SpawnCycle(ref chain) if chain == "a -> b -> a"));
}

#[cfg(unix)]
mod real_shell {
    use super::*;
    use synthkit::exec::ShellExecutor;

    fn real_runtime(manifest: synthkit::tasks::TaskManifest, dir: &std::path::Path) -> TaskRuntime {
        TaskRuntime::new(
            manifest,
            Arc::new(ShellExecutor::new()),
            RuntimeOptions {
                workdir: dir.to_path_buf(),
                ambient_env: minimal_env(),
            },
        )
    }

    #[tokio::test]
    async fn steps_and_subtasks_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ManifestBuilder::new()
            .task(
                "build",
                vec![
                    Step::exec("echo step1 >> out.txt"),
                    Step::spawn("sub"),
                    Step::exec("echo step3 >> out.txt"),
                ],
            )
            .task("sub", vec![Step::exec("echo step2 >> out.txt")])
            .build();

        real_runtime(manifest, dir.path()).run_task("build").await.unwrap();

        let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(out, "step1\nstep2\nstep3\n");
    }

    #[tokio::test]
    async fn failure_stops_later_steps() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ManifestBuilder::new()
            .task("t", vec![Step::exec("false"), Step::exec("echo x >> out.txt")])
            .build();

        let err = real_runtime(manifest, dir.path()).run_task("t").await.unwrap_err();

        assert!(matches!(err, SynthkitError::StepFailed { step: 0, code: 1, .. }));
        assert!(!dir.path().join("out.txt").exists());
    }

    #[tokio::test]
    async fn task_cwd_is_relative_to_workdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let manifest = ManifestBuilder::new()
            .task_with(
                "t",
                TaskOptions {
                    cwd: Some("sub".into()),
                    exec: Some("pwd > where.txt".into()),
                    ..TaskOptions::default()
                },
            )
            .build();

        real_runtime(manifest, dir.path()).run_task("t").await.unwrap();

        assert!(dir.path().join("sub/where.txt").exists());
    }
}

// tests/config_project.rs

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use synthkit::config::build_project;
use synthkit::fs::mock::MockFileSystem;
use synthkit::project::SynthOptions;
use synthkit::runtime::{RuntimeOptions, TaskRuntime};
use synthkit::tasks::TaskManifest;
use synthkit::types::TaskState;
use synthkit_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use synthkit_test_utils::fake_shell::FakeShell;
use synthkit_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn configured_project_synthesizes_and_runs() {
    init_tracing();
    let cfg = ConfigFileBuilder::new("demo")
        .with_task(
            "build",
            TaskConfigBuilder::new().exec("echo build").spawn("test").build(),
        )
        .with_task(
            "test",
            TaskConfigBuilder::new()
                .condition("test -f skip")
                .env("MODE", "ci")
                .exec("echo test")
                .build(),
        )
        .with_post_synthesize("echo done")
        .build();

    let fs = MockFileSystem::new();
    let shell = FakeShell::new().exit_sequence("test -f skip", &[1, 0]);
    let mut project = build_project(&cfg, Path::new("/work"))
        .unwrap()
        .with_fs(Arc::new(fs.clone()))
        .with_backend(Arc::new(shell.clone()));

    with_timeout(project.synth(SynthOptions::default())).await.unwrap();
    assert_eq!(shell.commands(), vec!["echo done"]);

    let manifest =
        TaskManifest::from_json(&fs.contents_str(project.manifest_file()).unwrap()).unwrap();
    let runtime = |shell: &FakeShell| {
        TaskRuntime::new(
            manifest.clone(),
            Arc::new(shell.clone()),
            RuntimeOptions {
                workdir: "/work".into(),
                ambient_env: BTreeMap::new(),
            },
        )
    };

    let mut first = runtime(&shell);
    assert_eq!(first.run_task("build").await.unwrap(), TaskState::Succeeded);
    assert_eq!(first.state_of("test"), Some(TaskState::Succeeded));

    let mut second = runtime(&shell);
    assert_eq!(second.run_task("build").await.unwrap(), TaskState::Succeeded);
    assert_eq!(second.state_of("test"), Some(TaskState::Skipped));

    assert_eq!(
        shell.commands(),
        vec![
            "echo done",
            "echo build",
            "test -f skip",
            "echo test",
            "echo build",
            "test -f skip",
        ]
    );
    let test_step = shell
        .requests()
        .into_iter()
        .find(|r| r.command == "echo test")
        .unwrap();
    assert_eq!(test_step.env["MODE"], "ci");
}

#[test]
fn builder_configs_are_validated() {
    let raw = ConfigFileBuilder::new("demo")
        .with_task("a", TaskConfigBuilder::new().spawn("missing").build())
        .raw();
    assert!(synthkit::config::ConfigFile::try_from(raw).is_err());

    let raw = ConfigFileBuilder::new("demo")
        .with_task("a", TaskConfigBuilder::new().builtin("release/bump-version").build())
        .raw();
    assert!(synthkit::config::ConfigFile::try_from(raw).is_ok());
}

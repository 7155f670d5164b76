// src/config/build.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, FileConfig, FileKind, ReleaseSection, TaskConfig};
use crate::errors::Result;
use crate::project::{Project, ProjectOptions, ReleaseComponent, ReleaseOptions};
use crate::synth::{FileOptions, JsonFile, StaticFile, TextFile};
use crate::tasks::TaskOptions;

/// Turn a validated config into a ready-to-synthesize project.
///
/// Relative paths in the config (`outdir`, file `source`s) are resolved
/// against `base_dir`, normally the directory holding the config file.
pub fn build_project(cfg: &ConfigFile, base_dir: &Path) -> Result<Project> {
    let mut project = Project::new(ProjectOptions {
        name: cfg.project.name.clone(),
        outdir: base_dir.join(&cfg.project.outdir),
        manifest_path: PathBuf::from(&cfg.project.manifest),
        duplicate_paths: cfg.project.duplicate_paths,
        gitignore: cfg.project.gitignore,
        post_synthesize: cfg.project.post_synthesize.clone(),
    })?;

    if let Some(ignore) = project.gitignore_mut() {
        ignore.add_patterns(&cfg.ignore.patterns);
    }

    for (name, task) in &cfg.tasks {
        project.add_task(name, task_options(task))?;
    }

    for (path, file) in &cfg.files {
        debug!(%path, kind = ?file.kind, "adding file from config");
        add_file(&mut project, path, file, base_dir)?;
    }

    if let Some(release) = &cfg.release {
        project.add_component(ReleaseComponent::new(release_options(release)))?;
    }

    Ok(project)
}

fn task_options(task: &TaskConfig) -> TaskOptions {
    TaskOptions {
        description: task.description.clone(),
        env: task.env.clone(),
        condition: task.condition.clone(),
        cwd: task.cwd.clone(),
        required_env: task.required_env.clone(),
        exec: task.exec.clone(),
        steps: task.steps.clone(),
        replace_existing: false,
    }
}

fn file_options(file: &FileConfig, marker_default: bool) -> FileOptions {
    let defaults = FileOptions::default();
    FileOptions {
        marker: file.marker.unwrap_or(marker_default),
        readonly: file.readonly.unwrap_or(defaults.readonly),
        committed: file.committed.unwrap_or(defaults.committed),
        executable: file.executable,
        ..defaults
    }
}

fn add_file(project: &mut Project, path: &str, file: &FileConfig, base_dir: &Path) -> Result<()> {
    match file.kind {
        FileKind::Text => match (&file.lines, &file.contents, &file.source) {
            (_, Some(contents), _) => project.add_file(StaticFile::new(
                path,
                contents.as_bytes(),
                file_options(file, false),
            )),
            (_, _, Some(source)) => project.add_file(StaticFile::from_source(
                path,
                base_dir.join(source),
                file_options(file, false),
            )),
            (lines, None, None) => {
                let mut text = TextFile::new(path, file_options(file, true))
                    .with_lines(lines.iter().flatten());
                if let Some(prefix) = &file.comment {
                    text.set_comment_prefix(prefix);
                }
                project.add_file(text)
            }
        },
        FileKind::Json => {
            let obj = file
                .json
                .clone()
                .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
            let mut json = JsonFile::new(path, obj, file_options(file, true))?;
            for (key, value) in &file.overrides {
                json.add_override(key, value.clone())?;
            }
            for key in &file.delete {
                json.add_deletion_override(key)?;
            }
            project.add_file(json)
        }
        FileKind::Sample => {
            let mut sample = match &file.source {
                Some(source) => StaticFile::from_source(
                    path,
                    base_dir.join(source),
                    FileOptions {
                        readonly: false,
                        conflict: Some(crate::types::ConflictPolicy::CreateOnly),
                        ..FileOptions::default()
                    },
                ),
                None => StaticFile::sample(path, ""),
            };
            if let Some(contents) = &file.contents {
                sample.set_contents(contents.as_bytes());
            }
            project.add_file(sample)
        }
    }
}

fn release_options(release: &ReleaseSection) -> ReleaseOptions {
    ReleaseOptions {
        version_file: release.version_file.clone(),
        changelog: release.changelog.clone(),
        initial_version: release.initial_version.clone(),
        tag: release.tag,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::loader::parse_str;
    use crate::fs::mock::MockFileSystem;
    use crate::project::SynthOptions;

    const CONFIG: &str = r##"
[project]
name = "demo"

[files."scripts/hello.sh"]
lines = ["echo hello"]
executable = true

[files."a.txt"]
contents = "hello"

[files."config.json"]
kind = "json"
json = { debug = false }
overrides = { "server.port" = 8080 }

[files."README.md"]
kind = "sample"
contents = "# demo\n"

[ignore]
patterns = ["/target/"]

[tasks.build]
description = "Build"
exec = "echo build"
steps = [{ spawn = "test" }]

[tasks.test]
steps = [{ say = "testing" }]

[release]
"##;

    #[tokio::test]
    async fn config_builds_a_complete_project() {
        let cfg = ConfigFile::try_from(parse_str(CONFIG).unwrap()).unwrap();
        let fs = MockFileSystem::new();
        let mut project = build_project(&cfg, Path::new("/work"))
            .unwrap()
            .with_fs(Arc::new(fs.clone()));

        project.synth(SynthOptions::default()).await.unwrap();

        assert_eq!(fs.contents_str("/work/a.txt").unwrap(), "hello");
        assert!(fs.is_executable("/work/scripts/hello.sh"));
        assert!(fs.contents_str("/work/scripts/hello.sh").unwrap().starts_with("# ~~ Generated"));
        let json: serde_json::Value =
            serde_json::from_str(&fs.contents_str("/work/config.json").unwrap()).unwrap();
        assert_eq!(json["server"]["port"], 8080);
        assert_eq!(json["debug"], false);
        assert_eq!(fs.contents_str("/work/README.md").unwrap(), "# demo\n");
        assert!(!fs.is_readonly("/work/README.md"));
        assert!(fs.contents_str("/work/.gitignore").unwrap().contains("/target/\n"));

        let build = project.tasks().try_find("build").unwrap();
        assert_eq!(build.steps().len(), 2);
        assert!(project.tasks().contains("release"));
    }
}

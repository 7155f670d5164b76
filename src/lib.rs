// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod project;
pub mod runtime;
pub mod synth;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{build_project, config_base_dir, load_and_validate, ConfigFile};
use crate::exec::ShellExecutor;
use crate::project::{Project, SynthOptions};
use crate::runtime::{render_task_list, render_tree, RuntimeOptions, TaskRuntime};
use crate::synth::CHECKSUM_FILE_PATH;
use crate::tasks::{TaskManifest, DEFAULT_MANIFEST_PATH};
use crate::watch::{next_batch, spawn_watcher, WatchSet};

const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    check_flags(&args)?;
    let config_path = PathBuf::from(&args.config);
    let synth_options = SynthOptions {
        skip_post: args.no_post,
    };

    match args.command.clone().unwrap_or(Command::Synth) {
        Command::Synth if args.watch => synth_watch(&config_path, synth_options).await,
        Command::Synth => {
            synth_once(&config_path, synth_options).await?;
            Ok(())
        }
        Command::List => {
            let (manifest, _) = load_manifest(&config_path)?;
            print!("{}", render_task_list(&manifest));
            Ok(())
        }
        Command::Task(words) => {
            let Some((name, extra)) = words.split_first() else {
                bail!("no task name given");
            };
            if !extra.is_empty() {
                warn!(task = %name, ?extra, "ignoring extra arguments");
            }
            let (manifest, workdir) = load_manifest(&config_path)?;
            if args.inspect {
                print!("{}", render_tree(&manifest, name)?);
                return Ok(());
            }
            let mut runtime = TaskRuntime::new(
                manifest,
                Arc::new(ShellExecutor::new()),
                RuntimeOptions::from_process(workdir),
            );
            let state = runtime.run_task(name).await?;
            info!(task = %name, %state, "task finished");
            Ok(())
        }
    }
}

/// Reject flag combinations that would otherwise be silently ignored.
fn check_flags(args: &CliArgs) -> Result<()> {
    if args.inspect && !matches!(args.command, Some(Command::Task(_))) {
        bail!("--inspect needs a task name, e.g. `synthkit --inspect build`");
    }
    Ok(())
}

/// Load, validate and build the project described by `config_path`.
pub fn load_project(config_path: &Path) -> Result<(ConfigFile, Project)> {
    let cfg = load_and_validate(config_path)?;
    let project = build_project(&cfg, &config_base_dir(config_path))?;
    Ok((cfg, project))
}

async fn synth_once(config_path: &Path, options: SynthOptions) -> Result<(ConfigFile, Project)> {
    let (cfg, mut project) = load_project(config_path)?;
    project.synth(options).await?;
    Ok((cfg, project))
}

/// Task manifest for the project plus the directory tasks run in.
///
/// Without a config file the default manifest in the current directory is
/// used, so tasks stay runnable in checkouts that only carry the manifest.
fn load_manifest(config_path: &Path) -> Result<(TaskManifest, PathBuf)> {
    let (outdir, manifest_path) = if config_path.exists() {
        let cfg = load_and_validate(config_path)?;
        let outdir = config_base_dir(config_path).join(&cfg.project.outdir);
        let manifest = outdir.join(&cfg.project.manifest);
        (outdir, manifest)
    } else {
        (PathBuf::from("."), PathBuf::from(DEFAULT_MANIFEST_PATH))
    };
    let manifest = TaskManifest::load(&manifest_path)?;
    Ok((manifest, outdir))
}

async fn synth_watch(config_path: &Path, options: SynthOptions) -> Result<()> {
    let (cfg, project) = synth_once(config_path, options).await?;

    let root = config_base_dir(config_path);
    let config_name = config_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config::DEFAULT_CONFIG_FILE.to_string());
    let mut watch = vec![globset::escape(&config_name)];
    watch.extend(cfg.project.watch.iter().cloned());

    // Our own outputs must not retrigger a pass.
    let outdir = Path::new(&cfg.project.outdir);
    let mut exclude: Vec<String> = project
        .files()
        .paths()
        .into_iter()
        .chain([PathBuf::from(&cfg.project.manifest), PathBuf::from(CHECKSUM_FILE_PATH)])
        .map(|p| globset::escape(&watch_rel(&outdir.join(p))))
        .collect();
    exclude.push("**/.git/**".to_string());

    let set = WatchSet::new(&watch, &exclude)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _watcher = spawn_watcher(&root, set, tx)?;
    info!(patterns = ?watch, "watching for changes (Ctrl+C to stop)");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("failed to listen for Ctrl+C: {e}");
                }
                info!("shutting down watch mode");
                return Ok(());
            }
            batch = next_batch(&mut rx, WATCH_DEBOUNCE) => {
                let Some(batch) = batch else {
                    return Ok(());
                };
                info!(changed = ?batch, "inputs changed; re-synthesizing");
                if let Err(err) = synth_once(config_path, options).await {
                    error!("synthesis failed: {err:?}");
                }
            }
        }
    }
}

/// `./out/a.txt` -> `out/a.txt`, matching what the watcher reports.
fn watch_rel(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspect_without_a_task_is_rejected() {
        use clap::Parser;

        for argv in [&["synthkit", "--inspect"][..], &["synthkit", "list", "--inspect"][..]] {
            let args = CliArgs::try_parse_from(argv).unwrap();
            let err = check_flags(&args).unwrap_err();
            assert!(err.to_string().contains("--inspect needs a task name"));
        }

        let args = CliArgs::try_parse_from(["synthkit", "--inspect", "build"]).unwrap();
        assert!(check_flags(&args).is_ok());
    }

    #[test]
    fn watch_paths_drop_current_dir() {
        assert_eq!(watch_rel(Path::new("./a/./b.txt")), "a/b.txt");
        assert_eq!(watch_rel(Path::new("out/.synthkit/tasks.json")), "out/.synthkit/tasks.json");
    }
}

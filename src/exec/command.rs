// src/exec/command.rs

use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::backend::{BoxFuture, CapturedOutput, ShellBackend, ShellRequest};

/// Real shell backend: `sh -c` (or `cmd /C` on Windows) via
/// `tokio::process::Command`.
///
/// Each call is awaited to completion by the caller; nothing here runs
/// concurrently with the next step.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(request: &ShellRequest) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&request.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&request.command);
        c
    };

    cmd.current_dir(&request.cwd)
        .env_clear()
        .envs(&request.env)
        .kill_on_drop(true);
    cmd
}

impl ShellBackend for ShellExecutor {
    fn run<'a>(&'a self, request: &'a ShellRequest) -> BoxFuture<'a, Result<i32>> {
        Box::pin(async move {
            info!(cmd = %request.command, cwd = ?request.cwd, "starting process");

            let mut child = shell_command(request)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .spawn()
                .with_context(|| format!("spawning process for `{}`", request.command))?;

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for process of `{}`", request.command))?;

            let code = status.code().unwrap_or(-1);
            debug!(
                cmd = %request.command,
                exit_code = code,
                success = status.success(),
                "process exited"
            );
            Ok(code)
        })
    }

    fn capture<'a>(&'a self, request: &'a ShellRequest) -> BoxFuture<'a, Result<CapturedOutput>> {
        Box::pin(async move {
            debug!(cmd = %request.command, cwd = ?request.cwd, "capturing process output");

            let output = shell_command(request)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .output()
                .await
                .with_context(|| format!("running `{}`", request.command))?;

            let code = output.status.code().unwrap_or(-1);
            Ok(CapturedOutput {
                code,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            })
        })
    }
}

// src/runtime/env.rs

//! Environment scoping for task execution.
//!
//! Effective environment, lowest to highest precedence:
//! ambient process env, inherited parent scope, task `env`, step `env`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::anyhow;
use regex::Regex;
use tracing::debug;

use crate::errors::Result;
use crate::exec::{ShellBackend, ShellRequest};

static SUBSHELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\$\((.*)\)$").expect("valid subshell regex"));

/// If `value` is a `$(command)` expression, return the inner command.
pub fn subshell_command(value: &str) -> Option<&str> {
    SUBSHELL_RE
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|cmd| !cmd.is_empty())
}

/// Overlay `overrides` on top of `base`, evaluating `$(...)` values.
///
/// Subshells run in `cwd` with the environment accumulated so far (base plus
/// the overrides already applied, in key order). A subshell that exits
/// non-zero is an error; its stdout has trailing newlines trimmed.
pub async fn overlay_env(
    backend: &dyn ShellBackend,
    task: &str,
    base: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
    cwd: &Path,
) -> Result<BTreeMap<String, String>> {
    let mut env = base.clone();

    for (name, value) in overrides {
        let resolved = match subshell_command(value) {
            Some(cmd) => {
                debug!(task = %task, var = %name, cmd = %cmd, "evaluating env subshell");
                let request = ShellRequest::new(cmd, cwd, env.clone());
                let out = backend.capture(&request).await?;
                if !out.success() {
                    return Err(anyhow!(
                        "task '{}': evaluating env '{}' via `{}` exited with code {}",
                        task,
                        name,
                        cmd,
                        out.code
                    )
                    .into());
                }
                out.stdout.trim_end_matches(['\r', '\n']).to_string()
            }
            None => value.clone(),
        };
        env.insert(name.clone(), resolved);
    }

    Ok(env)
}

/// First name in `required` that is missing or empty in `env`.
pub fn first_missing<'a>(
    required: &'a [String],
    env: &BTreeMap<String, String>,
) -> Option<&'a str> {
    required
        .iter()
        .find(|name| env.get(name.as_str()).is_none_or(|v| v.is_empty()))
        .map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_subshell_values() {
        assert_eq!(subshell_command("$(git rev-parse HEAD)"), Some("git rev-parse HEAD"));
        assert_eq!(subshell_command("  $( date )  "), Some("date"));
        assert_eq!(subshell_command("plain"), None);
        assert_eq!(subshell_command("prefix $(x)"), None);
        assert_eq!(subshell_command("$()"), None);
    }

    #[test]
    fn missing_and_empty_vars_are_reported() {
        let mut env = BTreeMap::new();
        env.insert("SET".to_string(), "1".to_string());
        env.insert("EMPTY".to_string(), String::new());

        let required = vec!["SET".to_string(), "EMPTY".to_string()];
        assert_eq!(first_missing(&required, &env), Some("EMPTY"));

        let required = vec!["SET".to_string()];
        assert_eq!(first_missing(&required, &env), None);

        let required = vec!["NOPE".to_string()];
        assert_eq!(first_missing(&required, &env), Some("NOPE"));
    }
}

// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `synthkit`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "synthkit",
    version,
    about = "Synthesize project files and run project tasks.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Synthkit.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SYNTHKIT_LOG` or `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Skip post-synthesize hooks and commands.
    #[arg(long, global = true)]
    pub no_post: bool,

    /// Keep running and re-synthesize when watched inputs change.
    #[arg(long, global = true)]
    pub watch: bool,

    /// Print the spawn tree of a task instead of running it.
    #[arg(long, global = true)]
    pub inspect: bool,

    /// Defaults to `synth`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write generated files and the task manifest.
    Synth,
    /// List the tasks in the task manifest.
    List,
    /// Run (or with `--inspect`, show) a task from the task manifest.
    #[command(external_subcommand)]
    Task(Vec<String>),
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_words_are_task_names() {
        let args = CliArgs::try_parse_from(["synthkit", "--inspect", "build"]).unwrap();
        assert!(args.inspect);
        match args.command {
            Some(Command::Task(words)) => assert_eq!(words, vec!["build".to_string()]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn synth_is_optional() {
        let args = CliArgs::try_parse_from(["synthkit", "--no-post"]).unwrap();
        assert!(args.no_post);
        assert!(args.command.is_none());
        assert_eq!(args.config, "Synthkit.toml");

        let args = CliArgs::try_parse_from(["synthkit", "synth", "--watch"]).unwrap();
        assert!(matches!(args.command, Some(Command::Synth)));
        assert!(args.watch);
    }
}

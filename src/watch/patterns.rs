// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled globs deciding which changed paths trigger a re-synthesis.
///
/// Paths are relative to the watch root with forward slashes
/// (e.g. `"templates/readme.md"`). Excludes win over watches.
#[derive(Clone)]
pub struct WatchSet {
    watch: GlobSet,
    exclude: GlobSet,
    patterns: Vec<String>,
}

impl WatchSet {
    pub fn new(watch: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            watch: build_globset(watch)?,
            exclude: build_globset(exclude)?,
            patterns: watch.to_vec(),
        })
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.watch.is_match(rel_path) && !self.exclude.is_match(rel_path)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl fmt::Debug for WatchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSet")
            .field("patterns", &self.patterns)
            .finish()
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_take_precedence() {
        let set = WatchSet::new(
            &["Synthkit.toml".into(), "templates/**".into()],
            &["templates/**/*.tmp".into()],
        )
        .unwrap();

        assert!(set.matches("Synthkit.toml"));
        assert!(set.matches("templates/a/readme.md"));
        assert!(!set.matches("templates/a/readme.tmp"));
        assert!(!set.matches("src/main.rs"));
    }

    #[test]
    fn invalid_glob_is_an_error() {
        assert!(WatchSet::new(&["a/[".into()], &[]).is_err());
    }
}

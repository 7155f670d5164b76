// src/synth/ignore.rs

use std::any::Any;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::synth::file::{FileOptions, RenderContext, SynthFile};
use crate::synth::marker::comment_line;

/// Ignore-pattern file (`.gitignore` style).
///
/// Patterns keep their insertion order. Excluding a pattern that was
/// previously included (or the other way round) replaces the earlier entry.
#[derive(Debug, Clone)]
pub struct IgnoreFile {
    path: PathBuf,
    options: FileOptions,
    patterns: Vec<String>,
}

impl IgnoreFile {
    pub fn new(path: impl Into<PathBuf>, options: FileOptions) -> Self {
        Self {
            path: path.into(),
            options,
            patterns: Vec::new(),
        }
    }

    /// Add raw patterns. A leading `!` means "include".
    pub fn add_patterns<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            match pattern.strip_prefix('!') {
                Some(included) => self.include(included),
                None => self.exclude(pattern),
            }
        }
    }

    pub fn exclude(&mut self, pattern: &str) {
        self.upsert(pattern.to_string(), format!("!{pattern}"));
    }

    pub fn include(&mut self, pattern: &str) {
        self.upsert(format!("!{pattern}"), pattern.to_string());
    }

    fn upsert(&mut self, wanted: String, opposite: String) {
        self.patterns.retain(|p| *p != opposite);
        if !self.patterns.contains(&wanted) {
            self.patterns.push(wanted);
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl SynthFile for IgnoreFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn options(&self) -> &FileOptions {
        &self.options
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<Vec<u8>>> {
        let mut out = String::new();
        if self.options.marker {
            out.push_str(&comment_line("#", &ctx.marker));
            out.push('\n');
        }
        for pattern in &self.patterns {
            out.push_str(pattern);
            out.push('\n');
        }
        Ok(Some(out.into_bytes()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_are_deduplicated_and_flipped() {
        let mut file = IgnoreFile::new(".gitignore", FileOptions::default());
        file.add_patterns(["target/", "*.log", "target/", "", "!keep.log"]);
        file.exclude("keep.log");
        file.include("target/");

        assert_eq!(file.patterns(), &["*.log", "keep.log", "!target/"]);
    }

    #[test]
    fn renders_marker_comment() {
        let mut file = IgnoreFile::new(".gitignore", FileOptions::default());
        file.exclude("/node_modules");
        let ctx = RenderContext::new("demo");
        let out = String::from_utf8(file.render(&ctx).unwrap().unwrap()).unwrap();
        assert_eq!(out, format!("# {}\n/node_modules\n", ctx.marker));
    }
}

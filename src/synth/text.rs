// src/synth/text.rs

use std::any::Any;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::synth::file::{FileOptions, RenderContext, SynthFile};
use crate::synth::marker::comment_line;

/// Plain line-oriented text file.
///
/// When the marker is enabled it is written as the first line, prefixed with
/// `comment_prefix` (default `#`). Files with no comment syntax should set
/// `marker = false`.
#[derive(Debug, Clone)]
pub struct TextFile {
    path: PathBuf,
    options: FileOptions,
    lines: Vec<String>,
    comment_prefix: String,
}

impl TextFile {
    pub fn new(path: impl Into<PathBuf>, options: FileOptions) -> Self {
        Self {
            path: path.into(),
            options,
            lines: Vec::new(),
            comment_prefix: "#".to_string(),
        }
    }

    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Build a file from raw contents, split into lines.
    pub fn from_contents(path: impl Into<PathBuf>, contents: &str, options: FileOptions) -> Self {
        Self::new(path, options).with_lines(contents.lines())
    }

    pub fn add_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn set_comment_prefix(&mut self, prefix: impl Into<String>) {
        self.comment_prefix = prefix.into();
    }
}

impl SynthFile for TextFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn options(&self) -> &FileOptions {
        &self.options
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<Vec<u8>>> {
        let mut out = String::new();
        let mut lines = self.lines.iter().peekable();
        // A shebang must stay on the first line.
        if let Some(shebang) = lines.next_if(|l| l.starts_with("#!")) {
            out.push_str(shebang);
            out.push('\n');
        }
        if self.options.marker {
            out.push_str(&comment_line(&self.comment_prefix, &ctx.marker));
            out.push('\n');
        }
        for line in lines {
            out.push_str(line);
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

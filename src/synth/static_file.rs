// src/synth/static_file.rs

use std::any::Any;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::errors::Result;
use crate::synth::file::{FileOptions, RenderContext, SynthFile};
use crate::types::ConflictPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticContent {
    Bytes(Vec<u8>),
    /// Copied from this path (read at render time, not at registration).
    Source(PathBuf),
}

/// File with fixed contents, written byte for byte.
///
/// No marker is embedded: the bytes are exactly what was given.
#[derive(Debug, Clone)]
pub struct StaticFile {
    path: PathBuf,
    options: FileOptions,
    content: StaticContent,
}

impl StaticFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>, options: FileOptions) -> Self {
        Self {
            path: path.into(),
            options: FileOptions {
                marker: false,
                ..options
            },
            content: StaticContent::Bytes(contents.into()),
        }
    }

    pub fn from_source(
        path: impl Into<PathBuf>,
        source: impl Into<PathBuf>,
        options: FileOptions,
    ) -> Self {
        Self {
            path: path.into(),
            options: FileOptions {
                marker: false,
                ..options
            },
            content: StaticContent::Source(source.into()),
        }
    }

    /// A starting-point file: written once if missing, then owned by the user.
    pub fn sample(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self::new(
            path,
            contents,
            FileOptions {
                marker: false,
                readonly: false,
                conflict: Some(ConflictPolicy::CreateOnly),
                ..FileOptions::default()
            },
        )
    }

    pub fn content(&self) -> &StaticContent {
        &self.content
    }

    pub fn set_contents(&mut self, contents: impl Into<Vec<u8>>) {
        self.content = StaticContent::Bytes(contents.into());
    }
}

impl SynthFile for StaticFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn options(&self) -> &FileOptions {
        &self.options
    }

    fn render(&self, _ctx: &RenderContext) -> Result<Option<Vec<u8>>> {
        match &self.content {
            StaticContent::Bytes(bytes) => Ok(Some(bytes.clone())),
            StaticContent::Source(src) => {
                let bytes = std::fs::read(src)
                    .with_context(|| format!("reading source {:?} for {:?}", src, self.path))?;
                Ok(Some(bytes))
            }
        }
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
    fn bytes_are_rendered_verbatim_without_marker() {
        let file = StaticFile::new("a.txt", "hello", FileOptions::default());
        assert!(!file.options().marker);
        let out = file.render(&RenderContext::new("demo")).unwrap().unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn sample_is_create_only() {
        let file = StaticFile::sample("src/main.rs", "fn main() {}\n");
        assert_eq!(file.options().conflict_policy(), ConflictPolicy::CreateOnly);
        assert!(!file.options().readonly);
    }

    #[test]
    fn missing_source_is_an_error() {
        let file = StaticFile::from_source(
            "copy.txt",
            "/definitely/not/here.txt",
            FileOptions::default(),
        );
        assert!(file.render(&RenderContext::new("demo")).is_err());
    }
}

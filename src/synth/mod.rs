// src/synth/mod.rs

//! File synthesis: declarative file objects rendered into an output
//! directory.
//!
//! - `file`: the `SynthFile` trait and per-file options
//! - `registry`: path namespace with duplicate handling
//! - `engine`: the write-on-diff pass with conflict protection
//! - `checksum`: hashes of what the engine last wrote
//! - `text`, `json`, `ignore`, `static_file`: the built-in file kinds

pub mod checksum;
pub mod engine;
pub mod file;
pub mod ignore;
pub mod json;
pub mod marker;
pub mod registry;
pub mod static_file;
pub mod text;

pub use checksum::{ChecksumStore, CHECKSUM_FILE_PATH};
pub use engine::{synthesize_all, SynthReport, Synthesizer};
pub use file::{FileOptions, RenderContext, SynthFile};
pub use ignore::IgnoreFile;
pub use json::JsonFile;
pub use marker::{DEFAULT_MARKER, MARKER_TAG};
pub use registry::FileRegistry;
pub use static_file::{StaticContent, StaticFile};
pub use text::TextFile;

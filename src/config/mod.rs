// src/config/mod.rs

//! `Synthkit.toml` loading, validation and project construction.

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::build_project;
pub use loader::{
    config_base_dir, load_and_validate, load_from_path, parse_str,
    DEFAULT_CONFIG_FILE,
};
pub use model::{
    ConfigFile, FileConfig, FileKind, IgnoreSection, ProjectSection, RawConfigFile,
    ReleaseSection, TaskConfig,
};

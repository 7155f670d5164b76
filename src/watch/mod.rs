// src/watch/mod.rs

//! Watch mode: re-synthesize when the config or other watched inputs change.

pub mod patterns;
pub mod watcher;

pub use patterns::WatchSet;
pub use watcher::{next_batch, relative_str, spawn_watcher, WatcherHandle};

// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::watch::patterns::WatchSet;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping it stops watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    root: PathBuf,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish()
    }
}

/// Watch `root` recursively and forward every changed path (relative,
/// forward slashes) that `set` matches.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    set: WatchSet,
    tx: mpsc::UnboundedSender<String>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    let callback_root = root.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                for path in &event.paths {
                    let Some(rel) = relative_str(&callback_root, path) else {
                        continue;
                    };
                    if set.matches(&rel) && tx.send(rel).is_err() {
                        return;
                    }
                }
            }
            Err(err) => eprintln!("synthkit: file watch error: {err}"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    Ok(WatcherHandle {
        _inner: watcher,
        root,
    })
}

/// Wait for the next change, then keep collecting until the channel has been
/// quiet for `debounce`. Returns `None` once the sender side is gone.
pub async fn next_batch(
    rx: &mut mpsc::UnboundedReceiver<String>,
    debounce: Duration,
) -> Option<Vec<String>> {
    let first = rx.recv().await?;
    let mut batch = vec![first];
    loop {
        match tokio::time::timeout(debounce, rx.recv()).await {
            Ok(Some(path)) => {
                if !batch.contains(&path) {
                    batch.push(path);
                }
            }
            Ok(None) | Err(_) => break,
        }
    }
    debug!(?batch, "collected change batch");
    Some(batch)
}

/// `path` relative to `root` with forward slashes, if it lives under it.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }
    // macOS reports /private/var/... for /var/...
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    None
}

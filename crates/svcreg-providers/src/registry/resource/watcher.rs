//! Directory watcher for resource registries
//!
//! notify delivers events on its own thread; they are forwarded over a tokio
//! channel to a task that re-reads changed files. A removed file only evicts
//! its id when no other file for that id remains, so the rename performed by
//! `save` never drops a live record. Each refresh holds the registry write
//! mutex.

use super::ResourceState;
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use svcreg_domain::error::{Error, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Keeps the watcher alive; dropping it stops watching
pub struct WatcherHandle {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(super) fn spawn(state: Arc<ResourceState>) -> Result<WatcherHandle> {
    let (tx, mut rx) = mpsc::unbounded_channel::<PathBuf>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove() {
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
            }
            Err(e) => warn!(error = %e, "Service directory watch error"),
        },
        NotifyConfig::default(),
    )
    .map_err(|e| Error::configuration(format!("Failed to create watcher: {e}")))?;

    watcher
        .watch(&state.directory, RecursiveMode::NonRecursive)
        .map_err(|e| {
            Error::configuration(format!(
                "Failed to watch {}: {e}",
                state.directory.display()
            ))
        })?;
    info!(directory = %state.directory.display(), "Watching service directory");

    let task = tokio::spawn(async move {
        while let Some(path) = rx.recv().await {
            if !state.is_definition(&path) {
                continue;
            }
            let _guard = state.write_lock.lock().await;
            let shared = Arc::clone(&state);
            let outcome = tokio::task::spawn_blocking(move || refresh(&shared, path)).await;
            if let Err(e) = outcome {
                warn!(error = %e, "Service directory refresh task failed");
            }
        }
    });

    Ok(WatcherHandle {
        _watcher: watcher,
        task,
    })
}

/// Bring the cache in line with the current content of `path`
fn refresh(state: &ResourceState, path: PathBuf) {
    if path.exists() {
        match state.read_service(&path) {
            Ok(service) => {
                debug!(id = service.id, path = %path.display(), "Reloaded changed service definition");
                state.services.insert(service.id, service);
            }
            // Partially written files show up here; the final write triggers another event.
            Err(e) => debug!(path = %path.display(), error = %e, "Changed definition not readable yet"),
        }
        return;
    }

    let Some(id) = ResourceState::id_from_path(&path) else {
        return;
    };
    match state.files_for_id(id) {
        Ok(remaining) if remaining.is_empty() => {
            if state.services.remove(&id).is_some() {
                info!(id, path = %path.display(), "Service definition removed");
            }
        }
        Ok(_) => {}
        Err(e) => warn!(id, error = %e, "Failed to inspect service directory"),
    }
}

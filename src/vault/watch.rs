use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::util::is_markdown_name;

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches a vault directory and reports debounced document-set changes.
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
    rx: Receiver<notify::Result<Event>>,
    pending: Vec<PathBuf>,
    last_event: Instant,
    debounce: Duration,
}

impl VaultWatcher {
    pub fn new(root: &Path) -> Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(move |result| {
            let _ = tx.send(result);
        })
        .context("failed to create filesystem watcher")?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;

        Ok(Self {
            _watcher: watcher,
            root: root.to_path_buf(),
            rx,
            pending: Vec::new(),
            last_event: Instant::now(),
            debounce: DEBOUNCE,
        })
    }

    /// Drains watcher events; returns true once a batch of changes has been
    /// quiet for the debounce window.
    pub fn poll(&mut self) -> bool {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(event) => self.record(event),
                Err(error) => warn!(%error, "vault watcher error"),
            }
        }

        if !self.pending.is_empty() && self.last_event.elapsed() >= self.debounce {
            debug!(changed = self.pending.len(), "vault documents changed");
            self.pending.clear();
            return true;
        }
        false
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn record(&mut self, event: Event) {
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return;
        }

        for path in event.paths {
            if is_relevant_path(&self.root, &path) {
                self.pending.push(path);
                self.last_event = Instant::now();
            }
        }
    }
}

fn is_relevant_path(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let hidden = relative
        .components()
        .any(|part| part.as_os_str().to_string_lossy().starts_with('.'));
    if hidden {
        return false;
    }
    // Directory events carry no extension but can add or remove documents.
    path.extension().is_none()
        || path
            .file_name()
            .is_some_and(|name| is_markdown_name(&name.to_string_lossy()))
}

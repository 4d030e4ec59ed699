//! Directory listeners.
//!
//! A [`WatchBackend`] turns a directory into a [`Subscription`] that pushes
//! raw notify events into a channel. Each subscription gets a listener task
//! which converts events and forwards them to the router until shutdown.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::error::WatchError;
use crate::event::FsEvent;

pub type RawEvent = notify::Result<Event>;

/// A live, non-recursive watch on one directory.
pub trait Subscription: Send {
    fn directory(&self) -> &Path;

    /// Stop delivering events.
    fn close(self: Box<Self>);
}

pub trait WatchBackend: Send + Sync {
    fn subscribe(
        &self,
        dir: &Path,
        sink: mpsc::UnboundedSender<RawEvent>,
    ) -> Result<Box<dyn Subscription>, WatchError>;
}

/// The platform's native watcher (inotify, FSEvents, ...), one per directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyBackend;

struct NotifySubscription {
    dir: PathBuf,
    watcher: RecommendedWatcher,
}

impl WatchBackend for NotifyBackend {
    fn subscribe(
        &self,
        dir: &Path,
        sink: mpsc::UnboundedSender<RawEvent>,
    ) -> Result<Box<dyn Subscription>, WatchError> {
        let subscribe_err = |source| WatchError::Subscribe {
            path: dir.to_path_buf(),
            source,
        };
        let mut watcher = recommended_watcher(move |event| {
            let _ = sink.send(event);
        })
        .map_err(subscribe_err)?;
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(subscribe_err)?;
        Ok(Box::new(NotifySubscription {
            dir: dir.to_path_buf(),
            watcher,
        }))
    }
}

impl Subscription for NotifySubscription {
    fn directory(&self) -> &Path {
        &self.dir
    }

    fn close(mut self: Box<Self>) {
        if let Err(err) = self.watcher.unwatch(&self.dir) {
            tracing::debug!(dir = %self.dir.display(), error = %err, "unwatch failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Listener tasks
// ---------------------------------------------------------------------------

/// Owns every listener of a session. Directories are watched at most once.
pub struct ListenerPool {
    backend: Arc<dyn WatchBackend>,
    events_tx: mpsc::Sender<FsEvent>,
    shutdown_tx: broadcast::Sender<()>,
    watched: HashSet<PathBuf>,
    tasks: Vec<(PathBuf, JoinHandle<()>)>,
}

impl ListenerPool {
    pub fn new(
        backend: Arc<dyn WatchBackend>,
        events_tx: mpsc::Sender<FsEvent>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            backend,
            events_tx,
            shutdown_tx,
            watched: HashSet::new(),
            tasks: Vec::new(),
        }
    }

    /// Start a listener for `dir`. Returns `false` if it is already watched.
    pub fn watch(&mut self, dir: &Path) -> Result<bool, WatchError> {
        if self.watched.contains(dir) {
            return Ok(false);
        }
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let subscription = self.backend.subscribe(dir, raw_tx)?;
        let task = tokio::spawn(listen(
            subscription,
            raw_rx,
            self.events_tx.clone(),
            self.shutdown_tx.subscribe(),
        ));
        self.watched.insert(dir.to_path_buf());
        self.tasks.push((dir.to_path_buf(), task));
        tracing::debug!(dir = %dir.display(), "listener started");
        Ok(true)
    }

    /// Watch every directory, logging the ones that fail. Returns how many
    /// listeners are running afterwards.
    pub fn watch_all<'a>(&mut self, dirs: impl IntoIterator<Item = &'a Path>) -> usize {
        for dir in dirs {
            if let Err(err) = self.watch(dir) {
                tracing::warn!(error = %err, "directory not watched");
            }
        }
        self.len()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every listener to finish. Call after broadcasting shutdown.
    /// Returns the number of listeners that were joined.
    pub async fn join(self) -> usize {
        let count = self.tasks.len();
        for (dir, task) in self.tasks {
            if let Err(err) = task.await {
                tracing::warn!(dir = %dir.display(), error = %err, "listener task join failure");
            }
        }
        count
    }
}

async fn listen(
    subscription: Box<dyn Subscription>,
    mut raw_rx: mpsc::UnboundedReceiver<RawEvent>,
    events_tx: mpsc::Sender<FsEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let dir = subscription.directory().to_path_buf();
    'listen: loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            raw = raw_rx.recv() => {
                let Some(raw) = raw else { break };
                let event = match raw {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(dir = %dir.display(), error = %err, "watch error");
                        continue;
                    }
                };
                for fs_event in FsEvent::from_notify(event) {
                    if events_tx.send(fs_event).await.is_err() {
                        break 'listen;
                    }
                }
            }
        }
    }
    subscription.close();
    tracing::debug!(dir = %dir.display(), "listener stopped");
}

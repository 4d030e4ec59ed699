//! Change routing: the single owner of the watch set.
//!
//! Every listener funnels events into one router task, so the watch set is
//! only ever read and replaced from one place. A change to the root
//! recomputes the set (marp already re-renders it); a change to any other
//! watched document touches the root.
//!
//! Touches are debounced per document on both edges: the first event of a
//! burst touches at once, and if more events for the same document arrive
//! inside the window, one more touch follows when the window closes. The
//! last write of a save therefore always reaches marp.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use marped_core::{include, Canonical, WatchSet};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use crate::event::FsEvent;
use crate::refresh::Refresh;

/// Editor swap and backup files never count as document changes.
pub const EDITOR_TEMP_SUFFIXES: &[&str] = &[".swp", ".swx", ".swo", "~"];

/// Settled debounce entries older than this are forgotten.
const DEBOUNCE_RETENTION: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Access or unclassified event.
    EventKind,
    Directory,
    EditorTemp,
    NotWatched,
    /// Same document changed again inside the debounce window; a trailing
    /// touch is scheduled instead.
    Debounced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Ignore(IgnoreReason),
    /// The root changed and the watch set was recomputed. Lists directories
    /// that were not needed before.
    RootChanged { new_directories: Vec<PathBuf> },
    /// An included document changed; the root must be refreshed.
    WatchedFileChanged(PathBuf),
}

/// Counters reported when the router stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub events: usize,
    pub touches: usize,
    pub touch_failures: usize,
    pub root_refreshes: usize,
}

#[derive(Debug, Clone, Copy)]
struct Debounce {
    /// When the last touch for this document fired.
    fired_at: Instant,
    /// Events arrived after `fired_at` inside the window.
    pending: bool,
}

pub struct ChangeRouter {
    watch_set: WatchSet,
    /// Every directory any version of the watch set has needed.
    known_dirs: BTreeSet<PathBuf>,
    debounce: HashMap<PathBuf, Debounce>,
    window: Duration,
}

impl ChangeRouter {
    /// Resolve the includes of `root` and start routing against them.
    pub fn new(root: impl AsRef<Path>, window: Duration) -> Self {
        let watch_set = include::resolve(root);
        let known_dirs = watch_set.directories().clone();
        Self {
            watch_set,
            known_dirs,
            debounce: HashMap::new(),
            window,
        }
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }

    /// The root as the user named it (absolute).
    pub fn root(&self) -> &Path {
        self.watch_set.root().original()
    }

    pub fn route(&mut self, event: &FsEvent) -> Route {
        self.route_at(event, Instant::now())
    }

    pub fn route_at(&mut self, event: &FsEvent, now: Instant) -> Route {
        if !event.is_change() {
            return Route::Ignore(IgnoreReason::EventKind);
        }
        if event.is_dir || event.path.is_dir() {
            return Route::Ignore(IgnoreReason::Directory);
        }
        if is_editor_temp(&event.path) {
            return Route::Ignore(IgnoreReason::EditorTemp);
        }

        let canonical = Canonical::resolve(&event.path);
        let root = self.watch_set.root();
        if root.matches(&event.path) || root.matches(canonical.path()) {
            return self.root_changed();
        }
        if !self.watch_set.contains(&event.path) && !self.watch_set.contains(canonical.path()) {
            return Route::Ignore(IgnoreReason::NotWatched);
        }

        let key = canonical.path().to_path_buf();
        if !self.accept(&key, now) {
            return Route::Ignore(IgnoreReason::Debounced);
        }
        Route::WatchedFileChanged(key)
    }

    /// Earliest moment a trailing touch is due, if any is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce
            .values()
            .filter(|entry| entry.pending)
            .map(|entry| entry.fired_at + self.window)
            .min()
    }

    /// Documents whose trailing touch is due at `now`. Each is reported
    /// once and its window restarts.
    pub fn take_due(&mut self, now: Instant) -> Vec<PathBuf> {
        let window = self.window;
        let mut due: Vec<PathBuf> = self
            .debounce
            .iter_mut()
            .filter(|(_, entry)| entry.pending && entry.fired_at + window <= now)
            .map(|(path, entry)| {
                entry.pending = false;
                entry.fired_at = now;
                path.clone()
            })
            .collect();
        due.sort();
        due
    }

    /// Leading edge: accept when the document has no touch inside the
    /// window. Otherwise remember that a trailing touch is owed.
    fn accept(&mut self, path: &Path, now: Instant) -> bool {
        let window = self.window;
        self.debounce.retain(|_, entry| {
            entry.pending || now.duration_since(entry.fired_at) <= DEBOUNCE_RETENTION
        });
        if let Some(entry) = self.debounce.get_mut(path) {
            if now.duration_since(entry.fired_at) < window {
                entry.pending = true;
                return false;
            }
        }
        self.debounce.insert(
            path.to_path_buf(),
            Debounce {
                fired_at: now,
                pending: false,
            },
        );
        true
    }

    fn root_changed(&mut self) -> Route {
        let root = self.root().to_path_buf();
        self.watch_set = include::resolve(&root);
        let new_directories: Vec<PathBuf> = self
            .watch_set
            .directories()
            .iter()
            .filter(|dir| self.known_dirs.insert((*dir).clone()))
            .cloned()
            .collect();
        tracing::debug!(
            root = %root.display(),
            documents = self.watch_set.len(),
            new_directories = new_directories.len(),
            "root changed, includes recomputed"
        );
        Route::RootChanged { new_directories }
    }
}

pub fn is_editor_temp(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| EDITOR_TEMP_SUFFIXES.iter().any(|s| name.ends_with(s)))
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

fn touch_root(router: &ChangeRouter, refresh: &dyn Refresh, stats: &mut RouterStats) {
    match refresh.refresh(router.root()) {
        Ok(()) => stats.touches += 1,
        Err(err) => {
            stats.touch_failures += 1;
            tracing::warn!(error = %err, "root refresh failed");
        }
    }
}

/// Router task. Consumes events until shutdown or until every listener is
/// gone. Directories that a root change newly requires are sent on
/// `subscribe_tx` for the supervisor to watch.
pub async fn run(
    mut router: ChangeRouter,
    mut events: mpsc::Receiver<FsEvent>,
    refresh: Arc<dyn Refresh>,
    subscribe_tx: mpsc::UnboundedSender<PathBuf>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> RouterStats {
    let mut stats = RouterStats::default();

    loop {
        let deadline = router.next_deadline();
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = sleep_until(deadline) => {
                for path in router.take_due(Instant::now()) {
                    tracing::info!(changed = %path.display(), "include settled, refreshing root");
                    touch_root(&router, refresh.as_ref(), &mut stats);
                }
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                stats.events += 1;
                match router.route(&event) {
                    Route::Ignore(reason) => {
                        tracing::trace!(path = %event.path.display(), ?reason, "event ignored");
                    }
                    Route::RootChanged { new_directories } => {
                        stats.root_refreshes += 1;
                        for dir in new_directories {
                            if let Err(err) = subscribe_tx.send(dir) {
                                tracing::debug!(
                                    dir = %err.0.display(),
                                    "supervisor gone, new directory not watched"
                                );
                            }
                        }
                    }
                    Route::WatchedFileChanged(path) => {
                        tracing::info!(changed = %path.display(), "include changed, refreshing root");
                        touch_root(&router, refresh.as_ref(), &mut stats);
                    }
                }
            }
        }
    }

    tracing::debug!(?stats, "router stopped");
    stats
}

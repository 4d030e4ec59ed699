//! Watch session supervisor.
//!
//! Lifecycle: `Idle -> Starting -> Running -> Stopping -> Stopped`. A
//! session that fails while starting goes straight to `Stopping`. Whatever
//! the reason the session ends (renderer exit, interrupt, startup error)
//! every listener and the router are shut down before `run_until` returns.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use marped_core::CommandSpec;
use tokio::process::Child;
use tokio::sync::{broadcast, mpsc};

use crate::error::{io_err, WatchError};
use crate::event::FsEvent;
use crate::listener::{ListenerPool, NotifyBackend, WatchBackend};
use crate::process;
use crate::refresh::{Refresh, Touch};
use crate::router::{self, ChangeRouter, RouterStats};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_secs(5);

const EVENT_QUEUE: usize = 256;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Root document; marp renders this one.
    pub root: PathBuf,
    /// The renderer to supervise.
    pub renderer: CommandSpec,
    pub debounce: Duration,
    /// How long the renderer gets between SIGTERM and SIGKILL.
    pub terminate_grace: Duration,
}

impl SessionConfig {
    pub fn new(root: impl Into<PathBuf>, renderer: CommandSpec) -> Self {
        Self {
            root: root.into(),
            renderer,
            debounce: DEFAULT_DEBOUNCE,
            terminate_grace: DEFAULT_TERMINATE_GRACE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_terminate_grace(mut self, grace: Duration) -> Self {
        self.terminate_grace = grace;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl SessionState {
    fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Starting, Running)
                | (Starting, Stopping)
                | (Running, Stopping)
                | (Stopping, Stopped)
        )
    }
}

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The renderer exited on its own with `code`.
    Exited { code: i32 },
    /// The renderer was killed by `signal` without the session asking.
    Signaled { signal: i32 },
    /// The session was interrupted and the renderer stopped.
    Interrupted,
}

impl SessionExit {
    fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return SessionExit::Signaled { signal };
            }
        }
        SessionExit::Exited {
            code: status.code().unwrap_or(1),
        }
    }

    /// Interrupted sessions, and renderers stopped by SIGINT or SIGTERM
    /// (Ctrl-C reaching the whole process group).
    pub fn is_interrupt(&self) -> bool {
        match self {
            SessionExit::Interrupted => true,
            #[cfg(unix)]
            SessionExit::Signaled { signal } => {
                *signal == libc::SIGINT || *signal == libc::SIGTERM
            }
            _ => false,
        }
    }

    /// Interrupts and clean renderer exits are both successful sessions.
    pub fn success(&self) -> bool {
        self.is_interrupt() || *self == SessionExit::Exited { code: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub exit: SessionExit,
    /// Listeners that were running when the session stopped.
    pub listeners: usize,
    pub stats: RouterStats,
}

pub struct Supervisor {
    config: SessionConfig,
    backend: Arc<dyn WatchBackend>,
    refresh: Arc<dyn Refresh>,
    state: SessionState,
}

impl Supervisor {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            backend: Arc::new(NotifyBackend),
            refresh: Arc::new(Touch),
            state: SessionState::Idle,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn WatchBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_refresh(mut self, refresh: Arc<dyn Refresh>) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid session transition {:?} -> {:?}",
            self.state,
            next
        );
        if self.state.can_advance_to(next) {
            tracing::debug!(from = ?self.state, to = ?next, "session state");
            self.state = next;
        } else {
            tracing::error!(from = ?self.state, to = ?next, "invalid session transition rejected");
        }
    }

    /// Run until the renderer exits or Ctrl-C arrives.
    pub async fn run(&mut self) -> Result<SessionOutcome, WatchError> {
        self.run_until(ctrl_c()).await
    }

    /// Run until the renderer exits or `interrupt` resolves.
    pub async fn run_until<F>(&mut self, interrupt: F) -> Result<SessionOutcome, WatchError>
    where
        F: Future<Output = ()>,
    {
        if self.state != SessionState::Idle {
            return Err(WatchError::SessionReused(self.state));
        }
        self.advance(SessionState::Starting);

        let root = self.config.root.clone();
        if !root.is_file() {
            self.advance(SessionState::Stopping);
            self.advance(SessionState::Stopped);
            return Err(WatchError::RootMissing { path: root });
        }

        let router = ChangeRouter::new(&root, self.config.debounce);
        let directories: Vec<PathBuf> = router.watch_set().directories().iter().cloned().collect();
        tracing::info!(
            root = %root.display(),
            documents = router.watch_set().len(),
            directories = directories.len(),
            "watch session starting"
        );

        let (events_tx, events_rx) = mpsc::channel::<FsEvent>(EVENT_QUEUE);
        let (subscribe_tx, mut subscribe_rx) = mpsc::unbounded_channel::<PathBuf>();
        let (shutdown_tx, _) = broadcast::channel::<()>(16);

        let router_handle = tokio::spawn(router::run(
            router,
            events_rx,
            self.refresh.clone(),
            subscribe_tx,
            shutdown_tx.subscribe(),
        ));

        let mut pool = ListenerPool::new(self.backend.clone(), events_tx, shutdown_tx.clone());
        let active = pool.watch_all(directories.iter().map(PathBuf::as_path));

        let started = if active == 0 {
            Err(WatchError::NoWatchableDirectories { root: root.clone() })
        } else {
            self.spawn_renderer()
        };

        let exit = match started {
            Ok(mut child) => {
                self.advance(SessionState::Running);
                self.supervise(&mut child, &mut pool, &mut subscribe_rx, interrupt)
                    .await
            }
            Err(err) => Err(err),
        };

        self.advance(SessionState::Stopping);
        let _ = shutdown_tx.send(());
        let listeners = pool.join().await;
        let stats = match router_handle.await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!(error = %err, "router task join failure");
                RouterStats::default()
            }
        };
        self.advance(SessionState::Stopped);

        let exit = exit?;
        tracing::info!(?exit, listeners, touches = stats.touches, "watch session stopped");
        Ok(SessionOutcome {
            exit,
            listeners,
            stats,
        })
    }

    fn spawn_renderer(&self) -> Result<Child, WatchError> {
        let spec = &self.config.renderer;
        tracing::info!(command = %spec, "starting renderer");
        let mut command = tokio::process::Command::from(spec.to_command());
        command.kill_on_drop(true);
        command.spawn().map_err(|source| WatchError::Spawn {
            program: spec.program.clone(),
            source,
        })
    }

    async fn supervise<F>(
        &self,
        child: &mut Child,
        pool: &mut ListenerPool,
        subscribe_rx: &mut mpsc::UnboundedReceiver<PathBuf>,
        interrupt: F,
    ) -> Result<SessionExit, WatchError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        loop {
            tokio::select! {
                status = child.wait() => {
                    let status = status.map_err(|e| io_err(&self.config.renderer.program, e))?;
                    let exit = SessionExit::from_status(status);
                    tracing::info!(?exit, "renderer exited");
                    return Ok(exit);
                }
                _ = &mut interrupt => {
                    tracing::info!("interrupted, stopping renderer");
                    match process::stop_gracefully(child, self.config.terminate_grace).await {
                        Ok(status) => tracing::debug!(%status, "renderer stopped"),
                        Err(err) => tracing::warn!(error = %err, "failed to stop renderer"),
                    }
                    return Ok(SessionExit::Interrupted);
                }
                Some(dir) = subscribe_rx.recv() => {
                    match pool.watch(&dir) {
                        Ok(true) => tracing::info!(dir = %dir.display(), "watching new directory"),
                        Ok(false) => {}
                        Err(err) => tracing::warn!(error = %err, "new directory not watched"),
                    }
                }
            }
        }
    }
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Run one session on a fresh multi-threaded runtime.
pub fn run_blocking(config: SessionConfig) -> Result<SessionOutcome, WatchError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(async move { Supervisor::new(config).run().await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionState::*;

    #[test]
    fn only_forward_transitions_are_allowed() {
        assert!(Idle.can_advance_to(Starting));
        assert!(Starting.can_advance_to(Running));
        assert!(Starting.can_advance_to(Stopping));
        assert!(Running.can_advance_to(Stopping));
        assert!(Stopping.can_advance_to(Stopped));

        assert!(!Idle.can_advance_to(Running));
        assert!(!Running.can_advance_to(Starting));
        assert!(!Stopped.can_advance_to(Starting));
        assert!(!Stopped.can_advance_to(Idle));
    }

    #[test]
    fn success_covers_interrupt_and_clean_exit() {
        assert!(SessionExit::Interrupted.success());
        assert!(SessionExit::Exited { code: 0 }.success());
        assert!(!SessionExit::Exited { code: 3 }.success());
    }

    #[cfg(unix)]
    #[test]
    fn only_sigint_and_sigterm_count_as_interrupts() {
        assert!(SessionExit::Signaled { signal: libc::SIGINT }.is_interrupt());
        assert!(SessionExit::Signaled { signal: libc::SIGTERM }.success());
        assert!(!SessionExit::Signaled { signal: libc::SIGKILL }.is_interrupt());
        assert!(!SessionExit::Signaled { signal: libc::SIGSEGV }.success());
    }
}

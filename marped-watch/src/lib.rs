//! Watch session runtime: listeners + change router + supervised renderer.
//!
//! One listener per watched directory feeds raw filesystem events to a
//! single [`ChangeRouter`] actor. When a document included by the root
//! changes, the router touches the root so marp, already running in watch
//! mode, re-renders. The [`Supervisor`] owns the renderer process and every
//! listener and tears them down together.

mod error;
pub mod event;
pub mod listener;
pub mod logging;
pub mod process;
pub mod refresh;
pub mod router;
pub mod supervisor;

pub use error::WatchError;
pub use event::{FsEvent, FsEventKind};
pub use listener::{ListenerPool, NotifyBackend, Subscription, WatchBackend};
pub use refresh::{Refresh, Touch};
pub use router::{ChangeRouter, IgnoreReason, Route, RouterStats};
pub use supervisor::{
    run_blocking, SessionConfig, SessionExit, SessionOutcome, SessionState, Supervisor,
};

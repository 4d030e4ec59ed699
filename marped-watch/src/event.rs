//! Backend-neutral filesystem events.

use std::path::PathBuf;

use notify::event::{CreateKind, RemoveKind};
use notify::{Event, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Modify,
    Remove,
    Access,
    Other,
}

/// One path from one OS notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
    /// The backend reported a directory.
    pub is_dir: bool,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            is_dir: false,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FsEventKind::Modify)
    }

    /// Content or existence changed. Access events are not changes: marp
    /// reading the includes must not count as an edit.
    pub fn is_change(&self) -> bool {
        matches!(
            self.kind,
            FsEventKind::Create | FsEventKind::Modify | FsEventKind::Remove
        )
    }

    /// Split a notify event into one event per path.
    pub fn from_notify(event: Event) -> Vec<FsEvent> {
        let kind = match event.kind {
            EventKind::Create(_) => FsEventKind::Create,
            EventKind::Modify(_) => FsEventKind::Modify,
            EventKind::Remove(_) => FsEventKind::Remove,
            EventKind::Access(_) => FsEventKind::Access,
            EventKind::Any | EventKind::Other => FsEventKind::Other,
        };
        let is_dir = matches!(
            event.kind,
            EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder)
        );
        event
            .paths
            .into_iter()
            .map(|path| FsEvent { path, kind, is_dir })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, ModifyKind, RenameMode};

    #[test]
    fn rename_with_both_paths_yields_two_events() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/d/.a.md.tmp"))
            .add_path(PathBuf::from("/d/a.md"));
        let events = FsEvent::from_notify(event);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(FsEvent::is_change));
        assert_eq!(events[1].path, PathBuf::from("/d/a.md"));
    }

    #[test]
    fn folder_creation_is_flagged_as_directory() {
        let event = Event::new(EventKind::Create(CreateKind::Folder)).add_path(PathBuf::from("/d/x"));
        assert!(FsEvent::from_notify(event)[0].is_dir);
    }

    #[test]
    fn access_is_not_a_change() {
        let event = Event::new(EventKind::Access(AccessKind::Any)).add_path(PathBuf::from("/d/a.md"));
        assert!(!FsEvent::from_notify(event)[0].is_change());
    }
}

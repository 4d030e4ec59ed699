//! Domain types for include resolution.
//!
//! All path fields use `PathBuf`. Paths stored here are always absolute:
//! the "original" form is made absolute lexically (symlinks untouched), the
//! canonical form comes from the filesystem when it can.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

// ---------------------------------------------------------------------------
// Canonical
// ---------------------------------------------------------------------------

/// Filesystem-resolved form of a path, or the best fallback available.
///
/// Resolution never fails: a path that cannot be canonicalized (deleted file,
/// broken symlink, race with an editor's rename) becomes `Unresolved` and is
/// still usable for matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", content = "path", rename_all = "lowercase")]
pub enum Canonical {
    Resolved(PathBuf),
    Unresolved(PathBuf),
}

impl Canonical {
    /// Canonicalize `path`, falling back to an absolute path whose parent
    /// directory is resolved when possible.
    pub fn resolve(path: &Path) -> Self {
        match fs::canonicalize(path) {
            Ok(resolved) => Canonical::Resolved(resolved),
            Err(_) => Canonical::Unresolved(fallback_path(path)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Canonical::Resolved(path) | Canonical::Unresolved(path) => path,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Canonical::Resolved(_))
    }
}

fn fallback_path(path: &Path) -> PathBuf {
    let absolute = absolute(path);
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => match fs::canonicalize(parent) {
            Ok(parent) => parent.join(name),
            Err(_) => absolute,
        },
        _ => absolute,
    }
}

/// Lexically absolute form of `path` against the process working directory.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

// ---------------------------------------------------------------------------
// DocumentRef
// ---------------------------------------------------------------------------

/// A document as it was spelled plus its canonical identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DocumentRef {
    original: PathBuf,
    canonical: Canonical,
}

impl DocumentRef {
    pub fn new(original: impl AsRef<Path>) -> Self {
        let original = absolute(original.as_ref());
        let canonical = Canonical::resolve(&original);
        Self {
            original,
            canonical,
        }
    }

    pub fn original(&self) -> &Path {
        &self.original
    }

    pub fn canonical(&self) -> &Path {
        self.canonical.path()
    }

    pub fn is_resolved(&self) -> bool {
        self.canonical.is_resolved()
    }

    /// Directory that must be watched to observe this document.
    pub fn watch_dir(&self) -> Option<&Path> {
        self.canonical().parent()
    }

    /// True if `path` equals the original or canonical form.
    pub fn matches(&self, path: &Path) -> bool {
        self.original == path || self.canonical() == path
    }
}

// ---------------------------------------------------------------------------
// WatchSet
// ---------------------------------------------------------------------------

/// A document that could not be read during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Snapshot of everything reachable from a root document.
#[derive(Debug, Clone, Serialize)]
pub struct WatchSet {
    root: DocumentRef,
    /// Root first, then includes in discovery order.
    documents: Vec<DocumentRef>,
    #[serde(skip)]
    originals: HashSet<PathBuf>,
    #[serde(skip)]
    canonicals: HashSet<PathBuf>,
    directories: BTreeSet<PathBuf>,
    failures: Vec<ReadFailure>,
}

impl WatchSet {
    pub(crate) fn new(root: DocumentRef) -> Self {
        Self {
            root,
            documents: Vec::new(),
            originals: HashSet::new(),
            canonicals: HashSet::new(),
            directories: BTreeSet::new(),
            failures: Vec::new(),
        }
    }

    /// Returns `false` without inserting when the canonical form is known.
    pub(crate) fn insert(&mut self, document: DocumentRef) -> bool {
        if !self.canonicals.insert(document.canonical().to_path_buf()) {
            return false;
        }
        self.originals.insert(document.original().to_path_buf());
        if let Some(dir) = document.watch_dir() {
            self.directories.insert(dir.to_path_buf());
        }
        self.documents.push(document);
        true
    }

    pub(crate) fn record_failure(&mut self, path: &Path, reason: String) {
        self.failures.push(ReadFailure {
            path: path.to_path_buf(),
            reason,
        });
    }

    pub(crate) fn is_known(&self, canonical: &Path) -> bool {
        self.canonicals.contains(canonical)
    }

    pub fn root(&self) -> &DocumentRef {
        &self.root
    }

    pub fn documents(&self) -> &[DocumentRef] {
        &self.documents
    }

    pub fn directories(&self) -> &BTreeSet<PathBuf> {
        &self.directories
    }

    pub fn failures(&self) -> &[ReadFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// True if `path` is the original or canonical form of any document,
    /// the root included.
    pub fn contains(&self, path: &Path) -> bool {
        self.originals.contains(path) || self.canonicals.contains(path)
    }

    /// Canonical paths of every document.
    pub fn canonical_paths(&self) -> impl Iterator<Item = &Path> {
        self.documents.iter().map(DocumentRef::canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_falls_back_to_resolved_parent() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("gone.md");

        let canonical = Canonical::resolve(&missing);
        assert!(!canonical.is_resolved());
        let parent = fs::canonicalize(dir.path()).expect("canonical dir");
        assert_eq!(canonical.path(), parent.join("gone.md"));
    }

    #[test]
    fn existing_file_resolves() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("deck.md");
        fs::write(&file, "# deck").expect("write");

        let doc = DocumentRef::new(&file);
        assert!(doc.is_resolved());
        assert!(doc.matches(&file));
        assert!(doc.matches(&fs::canonicalize(&file).expect("canonicalize")));
    }

    #[test]
    fn insert_collapses_duplicate_canonical_forms() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("a.md");
        fs::write(&file, "").expect("write");
        fs::create_dir(dir.path().join("sub")).expect("mkdir");

        let root = DocumentRef::new(&file);
        let mut set = WatchSet::new(root.clone());
        assert!(set.insert(root));
        assert!(!set.insert(DocumentRef::new(dir.path().join("sub/../a.md"))));
        assert_eq!(set.len(), 1);
        assert_eq!(set.directories().len(), 1);
    }
}

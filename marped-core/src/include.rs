//! Include resolution.
//!
//! A document pulls another one in with `!!!include(path)!!!`. The path is
//! relative to the directory of the document that contains the directive.
//! [`resolve`] walks the include graph from a root and returns the
//! [`WatchSet`] describing every reachable document.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::types::{DocumentRef, WatchSet};

fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"!!!include\((.*?)\)!!!").expect("include pattern is valid"))
}

/// Every include target in `content`, in order of appearance.
///
/// Arguments are trimmed; empty arguments are skipped.
pub fn directives(content: &str) -> Vec<&str> {
    directive_pattern()
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|target| !target.is_empty())
        .collect()
}

/// Walk the include graph starting at `root`.
///
/// Traversal uses an explicit worklist and skips any document whose canonical
/// form was already visited, so cycles terminate and a file reached through
/// two different spellings is processed once. Unreadable documents are kept in
/// the set (their directory is still watched, so a later re-creation is seen)
/// and recorded in [`WatchSet::failures`].
pub fn resolve(root: impl AsRef<Path>) -> WatchSet {
    let root = DocumentRef::new(root);
    let mut set = WatchSet::new(root.clone());
    let mut worklist = vec![root];

    while let Some(document) = worklist.pop() {
        if !set.insert(document.clone()) {
            continue;
        }

        let content = match fs::read(document.original()) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                tracing::warn!(
                    path = %document.original().display(),
                    error = %err,
                    "cannot read document, skipping its includes",
                );
                set.record_failure(document.original(), err.to_string());
                continue;
            }
        };

        let base = document.original().parent().unwrap_or_else(|| Path::new(""));
        for target in directives(&content) {
            let include = DocumentRef::new(base.join(target));
            if !set.is_known(include.canonical()) {
                worklist.push(include);
            }
        }
    }

    tracing::debug!(
        root = %set.root().original().display(),
        documents = set.len(),
        directories = set.directories().len(),
        failures = set.failures().len(),
        "resolved include graph",
    );
    set
}

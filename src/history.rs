//! Newest-first walk over the commit log of the current head.

use std::iter::Peekable;

use tracing::debug;

use crate::error::{ReleaseNotesError, Result};
use crate::git::{CommitIter, CommitRecord, Repository};

/// Lazy commit sequence returned by [walk].
///
/// Finite and single-pass: walking again means calling [walk] again.
pub struct CommitLog<'r> {
    inner: Peekable<CommitIter<'r>>,
}

impl<'r> Iterator for CommitLog<'r> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Walk history from the current head, newest first.
///
/// # Returns
/// * `Ok(CommitLog)` - At least one commit is reachable from the head
/// * `Err(HistoryUnavailable)` - The head is unborn or has no commits
pub fn walk<R: Repository + ?Sized>(repo: &R) -> Result<CommitLog<'_>> {
    let mut inner = repo.commits()?.peekable();
    if inner.peek().is_none() {
        return Err(ReleaseNotesError::HistoryUnavailable(
            "no commits reachable from the current head".to_string(),
        ));
    }
    debug!("Walking commit log");
    Ok(CommitLog { inner })
}

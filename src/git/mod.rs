//! Git operations abstraction layer
//!
//! The release window logic never talks to libgit2 directly. It goes through
//! the [Repository] trait, which exposes exactly the read-path primitives (log
//! walk, tag listing, checkout, status) and write-path primitives (stage,
//! commit, push) the workflow needs.
//!
//! - [repository::Git2Repository]: the on-disk handle backed by `git2`
//! - [mock::MockRepository]: an in-memory history for unit tests
//!
//! A handle owns the single mutable "current checkout" of its working tree.
//! Operations that move it take `&mut self`, so the borrow checker enforces
//! that nothing else touches the handle while a checkout is outstanding.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::{Credentials, Committer, Git2Repository, RepositorySettings};

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Lazy, newest-first sequence of commits produced by [Repository::commits].
pub type CommitIter<'r> = Box<dyn Iterator<Item = Result<CommitRecord>> + 'r>;

/// A commit as read from history. Immutable snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Full hex commit id
    pub id: String,
    /// Full commit message
    pub message: String,
    /// Committer time, seconds since the epoch
    pub time: i64,
}

/// A tag with its effective (peeled) commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// Short tag name, e.g. `1.3`
    pub name: String,
    /// Full reference name, e.g. `refs/tags/1.3`
    pub reference: String,
    /// Id of the commit the tag ultimately points at
    pub target: String,
    /// Whether the tag is an annotated tag object
    pub annotated: bool,
    /// Tagger time for annotated tags, committer time of the target otherwise
    pub timestamp: i64,
}

impl TagRecord {
    /// Whether the full reference name ends with `suffix`.
    pub fn matches_suffix(&self, suffix: &str) -> bool {
        !suffix.is_empty() && self.reference.ends_with(suffix)
    }
}

/// What the working tree currently has checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutTarget {
    /// A local branch, as a full reference name (`refs/heads/master`)
    Branch(String),
    /// A detached commit id
    Detached(String),
}

impl fmt::Display for CheckoutTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutTarget::Branch(name) => write!(f, "{}", name),
            CheckoutTarget::Detached(id) => write!(f, "{}", id),
        }
    }
}

/// Categorized changes between the working tree, the index and the last commit.
///
/// - `added`: new in the index, absent from HEAD
/// - `changed`: staged modification of a file tracked in HEAD
/// - `modified`: unstaged modification of a tracked file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeChangeSet {
    pub added: BTreeSet<String>,
    pub modified: BTreeSet<String>,
    pub changed: BTreeSet<String>,
}

impl WorkingTreeChangeSet {
    /// Distinct paths across all three categories.
    pub fn paths(&self) -> BTreeSet<&str> {
        self.added
            .iter()
            .chain(&self.modified)
            .chain(&self.changed)
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.changed.is_empty()
    }
}

/// VCS primitives used by the range resolver and the publication guard.
///
/// ## Error Handling
///
/// Implementations map their underlying failures to
/// [crate::error::ReleaseNotesError]; an empty or unborn history must surface
/// as `HistoryUnavailable` from [Repository::commits].
pub trait Repository {
    /// Walk history from the current head, newest first.
    fn commits(&self) -> Result<CommitIter<'_>>;

    /// All tags in listing order, peeled to their commits.
    fn tags(&self) -> Result<Vec<TagRecord>>;

    /// The reference or commit the working tree has checked out.
    fn current_checkout(&self) -> Result<CheckoutTarget>;

    /// Move the working tree and HEAD to `target`.
    fn checkout(&mut self, target: &CheckoutTarget) -> Result<()>;

    /// Contents of a file directly under the working tree root, matched by exact name.
    fn read_root_file(&self, name: &str) -> Result<Option<String>>;

    /// Root of the working tree.
    fn workdir(&self) -> Result<PathBuf>;

    /// Stage a path relative to the working tree root (file or directory).
    fn stage(&mut self, path: &Path) -> Result<()>;

    /// Compare the working tree and index with the last commit.
    fn change_set(&self) -> Result<WorkingTreeChangeSet>;

    /// Commit the index on top of HEAD and return the new commit id.
    fn commit(&mut self, message: &str) -> Result<String>;

    /// Push the checked-out branch to the remote.
    fn push(&mut self) -> Result<()>;
}

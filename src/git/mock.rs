use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseNotesError, Result};
use crate::git::{
    CheckoutTarget, CommitIter, CommitRecord, Repository, TagRecord, WorkingTreeChangeSet,
};

const BRANCH: &str = "refs/heads/master";

#[derive(Debug, Clone)]
struct MockCommit {
    record: CommitRecord,
    files: HashMap<String, String>,
}

/// In-memory repository for testing without actual git operations.
///
/// History is linear; commits are added oldest first and walked newest
/// first. Root files are tracked per commit so checkouts change what
/// [Repository::read_root_file] sees. Publication primitives work against a
/// real directory so copied artifacts can be compared with what was
/// "committed".
pub struct MockRepository {
    commits: Vec<MockCommit>,
    tags: Vec<TagRecord>,
    head: CheckoutTarget,
    workdir: PathBuf,
    committed: HashMap<PathBuf, Vec<u8>>,
    staged: BTreeSet<PathBuf>,
    dirty: BTreeSet<String>,
    failing_checkout: Option<CheckoutTarget>,
    fail_push: bool,
    checkouts: Vec<CheckoutTarget>,
    commit_messages: Vec<String>,
    pushes: usize,
}

impl MockRepository {
    /// Create an empty repository whose working tree lives at `workdir`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        MockRepository {
            commits: Vec::new(),
            tags: Vec::new(),
            head: CheckoutTarget::Branch(BRANCH.to_string()),
            workdir: workdir.into(),
            committed: HashMap::new(),
            staged: BTreeSet::new(),
            dirty: BTreeSet::new(),
            failing_checkout: None,
            fail_push: false,
            checkouts: Vec::new(),
            commit_messages: Vec::new(),
            pushes: 0,
        }
    }

    /// Append a commit on top of history. Root files carry over from the parent.
    pub fn add_commit(&mut self, id: &str, message: &str, time: i64) {
        let files = self
            .commits
            .last()
            .map(|c| c.files.clone())
            .unwrap_or_default();
        self.commits.push(MockCommit {
            record: CommitRecord {
                id: id.to_string(),
                message: message.to_string(),
                time,
            },
            files,
        });
    }

    /// Set a root file in the latest commit
    pub fn set_root_file(&mut self, name: &str, contents: &str) {
        if let Some(commit) = self.commits.last_mut() {
            commit.files.insert(name.to_string(), contents.to_string());
        }
    }

    /// Remove a root file from the latest commit
    pub fn remove_root_file(&mut self, name: &str) {
        if let Some(commit) = self.commits.last_mut() {
            commit.files.remove(name);
        }
    }

    pub fn add_lightweight_tag(&mut self, name: &str, commit_id: &str) {
        let timestamp = self
            .commits
            .iter()
            .find(|c| c.record.id == commit_id)
            .map(|c| c.record.time)
            .unwrap_or_default();
        self.push_tag(name, commit_id, false, timestamp);
    }

    pub fn add_annotated_tag(&mut self, name: &str, commit_id: &str, tagged_at: i64) {
        self.push_tag(name, commit_id, true, tagged_at);
    }

    fn push_tag(&mut self, name: &str, commit_id: &str, annotated: bool, timestamp: i64) {
        self.tags.push(TagRecord {
            name: name.to_string(),
            reference: format!("refs/tags/{}", name),
            target: commit_id.to_string(),
            annotated,
            timestamp,
        });
    }

    /// Make every checkout of `target` fail
    pub fn fail_checkout_of(&mut self, target: CheckoutTarget) {
        self.failing_checkout = Some(target);
    }

    pub fn fail_push(&mut self, fail: bool) {
        self.fail_push = fail;
    }

    /// Mark a tracked file as modified in the working tree
    pub fn mark_dirty(&mut self, path: &str) {
        self.dirty.insert(path.to_string());
    }

    /// Record a file as already committed with the given contents
    pub fn mark_committed(&mut self, path: impl Into<PathBuf>, contents: &[u8]) {
        self.committed.insert(path.into(), contents.to_vec());
    }

    pub fn head(&self) -> &CheckoutTarget {
        &self.head
    }

    /// Every successful checkout, in order
    pub fn checkouts(&self) -> &[CheckoutTarget] {
        &self.checkouts
    }

    pub fn commit_messages(&self) -> &[String] {
        &self.commit_messages
    }

    pub fn pushes(&self) -> usize {
        self.pushes
    }

    fn checked_out_commit(&self) -> Option<&MockCommit> {
        match &self.head {
            CheckoutTarget::Branch(_) => self.commits.last(),
            CheckoutTarget::Detached(id) => self.commits.iter().find(|c| &c.record.id == id),
        }
    }
}

impl Repository for MockRepository {
    fn commits(&self) -> Result<CommitIter<'_>> {
        if self.commits.is_empty() {
            return Err(ReleaseNotesError::HistoryUnavailable(
                "reference 'refs/heads/master' not found".to_string(),
            ));
        }
        Ok(Box::new(
            self.commits
                .iter()
                .rev()
                .map(|c| -> Result<CommitRecord> { Ok(c.record.clone()) }),
        ))
    }

    fn tags(&self) -> Result<Vec<TagRecord>> {
        Ok(self.tags.clone())
    }

    fn current_checkout(&self) -> Result<CheckoutTarget> {
        Ok(self.head.clone())
    }

    fn checkout(&mut self, target: &CheckoutTarget) -> Result<()> {
        if self.failing_checkout.as_ref() == Some(target) {
            return Err(git2::Error::from_str(&format!("cannot checkout {}", target)).into());
        }
        if let CheckoutTarget::Detached(id) = target {
            if !self.commits.iter().any(|c| &c.record.id == id) {
                return Err(git2::Error::from_str(&format!("commit {} not found", id)).into());
            }
        }
        self.head = target.clone();
        self.checkouts.push(target.clone());
        Ok(())
    }

    fn read_root_file(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .checked_out_commit()
            .and_then(|c| c.files.get(name).cloned()))
    }

    fn workdir(&self) -> Result<PathBuf> {
        Ok(self.workdir.clone())
    }

    fn stage(&mut self, path: &Path) -> Result<()> {
        let absolute = self.workdir.join(path);
        if absolute.is_dir() {
            for entry in fs::read_dir(&absolute)? {
                self.staged.insert(path.join(entry?.file_name()));
            }
        } else {
            self.staged.insert(path.to_path_buf());
        }
        Ok(())
    }

    fn change_set(&self) -> Result<WorkingTreeChangeSet> {
        let mut changes = WorkingTreeChangeSet::default();
        for path in &self.staged {
            let contents = fs::read(self.workdir.join(path))?;
            let key = path.to_string_lossy().replace('\\', "/");
            match self.committed.get(path) {
                None => {
                    changes.added.insert(key);
                }
                Some(previous) if previous != &contents => {
                    changes.changed.insert(key);
                }
                Some(_) => {}
            }
        }
        changes.modified.extend(self.dirty.iter().cloned());
        Ok(changes)
    }

    fn commit(&mut self, message: &str) -> Result<String> {
        for path in std::mem::take(&mut self.staged) {
            let contents = fs::read(self.workdir.join(&path))?;
            self.committed.insert(path, contents);
        }
        self.commit_messages.push(message.to_string());
        Ok(format!("mock-{}", self.commit_messages.len()))
    }

    fn push(&mut self) -> Result<()> {
        if self.fail_push {
            return Err(ReleaseNotesError::remote("connection refused"));
        }
        self.pushes += 1;
        Ok(())
    }
}

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    AutotagOption, BranchType, Cred, CredentialType, ErrorClass, FetchOptions, IndexAddOption, Oid, PushOptions,
    RemoteCallbacks, Repository as Git2Repo, Signature, Sort, Status, StatusOptions,
};
use tracing::{debug, info, warn};

use crate::boundary::BoundaryWarning;
use crate::error::{ReleaseNotesError, Result};
use crate::git::{CheckoutTarget, CommitIter, CommitRecord, TagRecord, WorkingTreeChangeSet};

/// Remote every fetch and push goes through
pub const REMOTE: &str = "origin";

/// Username/password pair used for every remote operation
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"******")
            .finish()
    }
}

/// Identity recorded on release notes commits
#[derive(Debug, Clone)]
pub struct Committer {
    pub name: String,
    pub mail: String,
}

/// Everything needed to locate or create the local working copy
#[derive(Debug, Clone)]
pub struct RepositorySettings {
    pub directory: PathBuf,
    pub branch: String,
    pub url: Option<String>,
    pub credentials: Credentials,
    pub committer: Committer,
}

/// Handle on a local working copy bound to a remote, a branch and credentials
pub struct Git2Repository {
    repo: Git2Repo,
    settings: RepositorySettings,
}

impl Git2Repository {
    /// Open the working copy under `settings.directory`, or clone it there.
    ///
    /// An existing repository is brought up to date with pull, checkout of the
    /// configured branch, pull. Pull failures are tolerated and logged; the
    /// run continues on whatever local state exists. Otherwise the directory
    /// is created if needed and the configured URL is cloned, restricted to
    /// the configured branch.
    pub fn open_or_clone(settings: RepositorySettings) -> Result<Self> {
        info!(
            "Reading git repository under {}",
            settings.directory.display()
        );

        if settings.directory.exists() {
            match Git2Repo::open(&settings.directory) {
                Ok(repo) => {
                    info!(
                        "Found git repository under {}",
                        settings.directory.display()
                    );
                    let mut handle = Git2Repository { repo, settings };
                    handle.pull_tolerant();
                    handle.checkout_branch()?;
                    handle.pull_tolerant();
                    return Ok(handle);
                }
                Err(e) => {
                    info!(
                        "No git repository under {}: {}",
                        settings.directory.display(),
                        e.message()
                    );
                }
            }
        } else {
            info!(
                "Directory {} doesn't exist, creating it",
                settings.directory.display()
            );
            fs::create_dir_all(&settings.directory)?;
        }

        Self::clone_into(settings)
    }

    /// Wrap an already opened repository without touching the remote
    pub fn from_git2(repo: Git2Repo, settings: RepositorySettings) -> Self {
        Git2Repository { repo, settings }
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    fn clone_into(settings: RepositorySettings) -> Result<Self> {
        let url = settings.url.clone().ok_or_else(|| {
            ReleaseNotesError::config(format!(
                "No git repository under {} and no git url configured to clone from",
                settings.directory.display()
            ))
        })?;

        info!(
            "Cloning git repository url: {}, branch: {}, user: {}",
            url, settings.branch, settings.credentials.username
        );
        let started = Instant::now();

        let mut fetch_options = FetchOptions::new();
        fetch_options
            .remote_callbacks(remote_callbacks(&settings.credentials))
            .download_tags(AutotagOption::All);

        let branch = settings.branch.clone();
        let repo = RepoBuilder::new()
            .branch(&settings.branch)
            .fetch_options(fetch_options)
            .remote_create(move |repo, name, url| {
                let refspec = format!("+refs/heads/{0}:refs/remotes/{1}/{0}", branch, name);
                repo.remote_with_fetch(name, url, &refspec)
            })
            .clone(&url, &settings.directory)
            .map_err(|e| ReleaseNotesError::remote(format!("Failed to clone {}: {}", url, e)))?;

        info!(
            "Clone is done. It took {} millis.",
            started.elapsed().as_millis()
        );
        Ok(Git2Repository { repo, settings })
    }

    /// Fetch the configured branch and tags from the remote, then fast-forward.
    pub fn pull(&self) -> Result<()> {
        info!("Performing pull...");
        let mut remote = self.repo.find_remote(REMOTE).map_err(|e| {
            ReleaseNotesError::remote(format!("Remote '{}' not found: {}", REMOTE, e))
        })?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(&self.settings.credentials));

        let refspec = format!(
            "+refs/heads/{0}:refs/remotes/{1}/{0}",
            self.settings.branch, REMOTE
        );
        remote
            .fetch(
                &[refspec.as_str(), "+refs/tags/*:refs/tags/*"],
                Some(&mut fetch_options),
                None,
            )
            .map_err(|e| {
                ReleaseNotesError::remote(format!("Failed to fetch from '{}': {}", REMOTE, e))
            })?;

        self.fast_forward()?;
        info!("Pull successful");
        Ok(())
    }

    fn pull_tolerant(&self) {
        if let Err(e) = self.pull() {
            let warning = BoundaryWarning::PullFailed {
                remote: REMOTE.to_string(),
                reason: e.to_string(),
            };
            warn!("{}", warning);
        }
    }

    /// Fast-forward the local branch (and the working tree, if checked out)
    /// to its remote-tracking branch. Creates the local branch if missing.
    fn fast_forward(&self) -> Result<()> {
        let branch = &self.settings.branch;
        let tracking = format!("refs/remotes/{}/{}", REMOTE, branch);

        let remote_oid = match self.repo.find_reference(&tracking) {
            Ok(reference) => reference.target().ok_or_else(|| {
                ReleaseNotesError::remote(format!("Reference {} is invalid", tracking))
            })?,
            Err(_) => return Ok(()),
        };

        let local_branch = match self.repo.find_branch(branch, BranchType::Local) {
            Ok(b) => b,
            Err(_) => {
                let remote_commit = self.repo.find_commit(remote_oid)?;
                self.repo.branch(branch, &remote_commit, false)?;
                debug!("Created local branch {} from {}", branch, tracking);
                return Ok(());
            }
        };

        let local_oid = match local_branch.get().target() {
            Some(oid) => oid,
            None => return Ok(()),
        };

        if local_oid == remote_oid {
            return Ok(());
        }

        if !self.repo.graph_descendant_of(remote_oid, local_oid)? {
            if self.repo.graph_descendant_of(local_oid, remote_oid)? {
                debug!("Local branch {} is ahead of {}", branch, tracking);
                return Ok(());
            }
            return Err(ReleaseNotesError::remote(format!(
                "Branch '{}' has diverged from {}, cannot fast-forward",
                branch, tracking
            )));
        }

        let branch_ref = format!("refs/heads/{}", branch);
        let head_on_branch = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.name().map(|name| name == branch_ref))
            .unwrap_or(false);

        if head_on_branch {
            let commit = self.repo.find_commit(remote_oid)?;
            let mut checkout = CheckoutBuilder::new();
            checkout.safe();
            self.repo
                .checkout_tree(commit.as_object(), Some(&mut checkout))?;
        }

        self.repo.find_reference(&branch_ref)?.set_target(
            remote_oid,
            &format!("pull: fast-forward from {}", tracking),
        )?;
        Ok(())
    }

    fn checkout_branch(&mut self) -> Result<()> {
        info!("Git checkout to branch {}", self.settings.branch);
        if self
            .repo
            .find_branch(&self.settings.branch, BranchType::Local)
            .is_err()
        {
            self.fast_forward()?;
        }
        let target = CheckoutTarget::Branch(format!("refs/heads/{}", self.settings.branch));
        super::Repository::checkout(self, &target)
    }

    fn tag_record(&self, oid: Oid, reference: &str) -> Result<TagRecord> {
        let (target, tagged_at, annotated) = match self.repo.find_tag(oid) {
            Ok(tag) => {
                let target = tag
                    .peel()
                    .map(|object| object.id())
                    .unwrap_or_else(|_| tag.target_id());
                let tagged_at = tag.tagger().map(|tagger| tagger.when().seconds());
                (target, tagged_at, true)
            }
            // Not a tag object: lightweight tag pointing straight at the commit
            Err(_) => (oid, None, false),
        };

        let commit = self.repo.find_commit(target)?;
        let timestamp = tagged_at.unwrap_or_else(|| commit.committer().when().seconds());

        Ok(TagRecord {
            name: reference
                .strip_prefix("refs/tags/")
                .unwrap_or(reference)
                .to_string(),
            reference: reference.to_string(),
            target: target.to_string(),
            annotated,
            timestamp,
        })
    }

    /// Release the underlying libgit2 handle
    pub fn close(self) {
        info!("Closing repository {}", self.settings.directory.display());
    }
}

/// Credential callbacks for fetch, clone and push.
///
/// libgit2 keeps asking while the remote rejects credentials, so a second
/// request is answered with an error.
fn remote_callbacks(credentials: &Credentials) -> RemoteCallbacks<'static> {
    let username = credentials.username.clone();
    let password = credentials.password.clone();
    let mut attempts = 0;

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, allowed_types| {
        attempts += 1;
        if attempts > 1 {
            return Err(git2::Error::from_str("credentials rejected by remote"));
        }
        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            let user = if username.is_empty() {
                username_from_url.unwrap_or("")
            } else {
                username.as_str()
            };
            Cred::userpass_plaintext(user, &password)
        } else {
            Cred::default()
        }
    });
    callbacks
}

impl super::Repository for Git2Repository {
    fn commits(&self) -> Result<CommitIter<'_>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk
            .push_head()
            .map_err(|e| ReleaseNotesError::HistoryUnavailable(e.message().to_string()))?;
        // children before parents even when committer clocks are skewed
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let repo = &self.repo;
        Ok(Box::new(revwalk.map(move |oid| -> Result<CommitRecord> {
            let commit = repo.find_commit(oid?)?;
            Ok(CommitRecord {
                id: commit.id().to_string(),
                message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
                time: commit.time().seconds(),
            })
        })))
    }

    fn tags(&self) -> Result<Vec<TagRecord>> {
        let mut listed = Vec::new();
        self.repo.tag_foreach(|oid, name| {
            listed.push((oid, String::from_utf8_lossy(name).into_owned()));
            true
        })?;
        // libgit2 lists loose and packed refs in storage order
        listed.sort_by(|a, b| a.1.cmp(&b.1));

        let mut tags = Vec::with_capacity(listed.len());
        for (oid, reference) in listed {
            match self.tag_record(oid, &reference) {
                Ok(tag) => tags.push(tag),
                Err(e) => warn!("Skipping tag {} that does not resolve to a commit: {}", reference, e),
            }
        }
        Ok(tags)
    }

    fn current_checkout(&self) -> Result<CheckoutTarget> {
        let head = self.repo.head()?;
        if head.is_branch() {
            let name = head
                .name()
                .ok_or_else(|| git2::Error::from_str("HEAD branch name is not valid UTF-8"))?;
            Ok(CheckoutTarget::Branch(name.to_string()))
        } else {
            let oid = head
                .target()
                .ok_or_else(|| git2::Error::from_str("HEAD is detached or invalid"))?;
            Ok(CheckoutTarget::Detached(oid.to_string()))
        }
    }

    fn checkout(&mut self, target: &CheckoutTarget) -> Result<()> {
        let mut options = CheckoutBuilder::new();
        options.safe();

        match target {
            CheckoutTarget::Branch(refname) => {
                let commit = self.repo.find_reference(refname)?.peel_to_commit()?;
                self.repo
                    .checkout_tree(commit.as_object(), Some(&mut options))?;
                self.repo.set_head(refname)?;
            }
            CheckoutTarget::Detached(id) => {
                let oid = Oid::from_str(id)?;
                let commit = self.repo.find_commit(oid)?;
                self.repo
                    .checkout_tree(commit.as_object(), Some(&mut options))?;
                self.repo.set_head_detached(oid)?;
            }
        }

        debug!("Checked out {}", target);
        Ok(())
    }

    fn read_root_file(&self, name: &str) -> Result<Option<String>> {
        let workdir = self.workdir()?;
        for entry in fs::read_dir(&workdir)? {
            let entry = entry?;
            if entry.file_name().to_str() == Some(name) && entry.file_type()?.is_file() {
                return Ok(Some(fs::read_to_string(entry.path())?));
            }
        }
        Ok(None)
    }

    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ReleaseNotesError::config("Repository has no working tree"))
    }

    fn stage(&mut self, path: &Path) -> Result<()> {
        let mut index = self.repo.index()?;
        if self.workdir()?.join(path).is_dir() {
            let pathspec = path.to_string_lossy().replace('\\', "/");
            index.add_all([pathspec.as_str()], IndexAddOption::DEFAULT, None)?;
        } else {
            index.add_path(path)?;
        }
        index.write()?;
        Ok(())
    }

    fn change_set(&self) -> Result<WorkingTreeChangeSet> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        let mut changes = WorkingTreeChangeSet::default();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                continue;
            };
            let status = entry.status();
            if status.contains(Status::INDEX_NEW) {
                changes.added.insert(path.to_string());
            }
            if status.contains(Status::INDEX_MODIFIED) {
                changes.changed.insert(path.to_string());
            }
            if status.contains(Status::WT_MODIFIED) {
                changes.modified.insert(path.to_string());
            }
        }
        Ok(changes)
    }

    fn commit(&mut self, message: &str) -> Result<String> {
        let committer = &self.settings.committer;
        let signature = Signature::now(&committer.name, &committer.mail)?;

        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Ok(oid.to_string())
    }

    fn push(&mut self) -> Result<()> {
        let refname = {
            let head = self.repo.head()?;
            if !head.is_branch() {
                return Err(ReleaseNotesError::remote("HEAD is detached, nothing to push"));
            }
            head.name()
                .ok_or_else(|| ReleaseNotesError::remote("HEAD branch name is not valid UTF-8"))?
                .to_string()
        };

        let mut remote = self.repo.find_remote(REMOTE).map_err(|e| {
            ReleaseNotesError::remote(format!("Remote '{}' not found: {}", REMOTE, e))
        })?;

        let mut callbacks = remote_callbacks(&self.settings.credentials);
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("{0}:{0}", refname);
        remote
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(|e| {
                if e.class() == ErrorClass::Net {
                    ReleaseNotesError::remote(format!("Network error during push: {}", e))
                } else {
                    ReleaseNotesError::remote(format!("Failed to push {}: {}", refname, e))
                }
            })?;

        info!("Pushed {} to {}", refname, REMOTE);
        Ok(())
    }
}

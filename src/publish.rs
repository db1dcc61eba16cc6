//! Guarded commit and push of a generated report.
//!
//! The report is copied under [RELEASES_DIR] and staged. Publication only
//! goes ahead when the report is the only path that differs from the last
//! commit: no change means the same notes were already published, any other
//! changed path means the working tree carries unrelated drift.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::{ReleaseNotesError, Result};
use crate::git::Repository;

/// Directory under the repository root that holds published reports
pub const RELEASES_DIR: &str = "releases";

const COMMIT_MESSAGE_PREFIX: &str = "[release-notes-generator] Release notes for version";

/// Build the publication commit message.
///
/// A non-empty `suffix` is appended after a space, e.g. a marker that lets the
/// commit through server-side message validation.
pub fn commit_message(version: &str, suffix: Option<&str>) -> String {
    let mut message = format!("{} {}.", COMMIT_MESSAGE_PREFIX, version);
    if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
        message.push(' ');
        message.push_str(suffix);
    }
    message
}

/// What a publication attempt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationOutcome {
    /// Committed and pushed
    Published { commit_id: String },
    /// The report is identical to the one already committed
    NothingChanged,
    /// Other paths besides the report differ from the last commit
    TooManyChanges {
        added: usize,
        modified: usize,
        changed: usize,
    },
    /// Copy, stage, commit or push failed
    Failed { reason: String },
}

impl PublicationOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, PublicationOutcome::Published { .. })
    }
}

impl fmt::Display for PublicationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicationOutcome::Published { commit_id } => {
                write!(f, "Release notes published in commit {}", commit_id)
            }
            PublicationOutcome::NothingChanged => write!(
                f,
                "There are no changes to be committed, identical release notes were probably already published"
            ),
            PublicationOutcome::TooManyChanges {
                added,
                modified,
                changed,
            } => write!(
                f,
                "There is more than one change [added({}), modified({}), changed({})] to be committed, release notes were not published",
                added, modified, changed
            ),
            PublicationOutcome::Failed { reason } => {
                write!(f, "Publishing release notes failed: {}", reason)
            }
        }
    }
}

/// Copy `artifact` into the repository, then commit and push it.
///
/// Never returns an error: every failure becomes [PublicationOutcome::Failed]
/// and is logged.
pub fn attempt_publish<R: Repository + ?Sized>(
    repo: &mut R,
    artifact: &Path,
    version: &str,
    suffix: Option<&str>,
) -> PublicationOutcome {
    match try_publish(repo, artifact, version, suffix) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Error during pushing release notes: {}", e);
            PublicationOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Same as [attempt_publish], reduced to whether a commit was pushed.
pub fn publish<R: Repository + ?Sized>(
    repo: &mut R,
    artifact: &Path,
    version: &str,
    suffix: Option<&str>,
) -> bool {
    attempt_publish(repo, artifact, version, suffix).succeeded()
}

fn try_publish<R: Repository + ?Sized>(
    repo: &mut R,
    artifact: &Path,
    version: &str,
    suffix: Option<&str>,
) -> Result<PublicationOutcome> {
    let file_name = artifact.file_name().ok_or_else(|| {
        ReleaseNotesError::config(format!("'{}' is not a file", artifact.display()))
    })?;

    let notes_dir = repo.workdir()?.join(RELEASES_DIR);
    let created = if notes_dir.exists() {
        false
    } else {
        info!(
            "Directory with release notes doesn't exist, creating it in {}",
            notes_dir.display()
        );
        fs::create_dir_all(&notes_dir)?;
        true
    };

    info!(
        "Copying release notes to {} (overwriting any existing file)",
        notes_dir.display()
    );
    fs::copy(artifact, notes_dir.join(file_name))?;

    let staged: PathBuf = if created {
        PathBuf::from(RELEASES_DIR)
    } else {
        Path::new(RELEASES_DIR).join(file_name)
    };
    repo.stage(&staged)?;

    let changes = repo.change_set()?;
    let paths = changes.paths();
    let report_path = format!("{}/{}", RELEASES_DIR, file_name.to_string_lossy());
    let report_staged =
        changes.added.contains(&report_path) || changes.changed.contains(&report_path);

    if paths.len() > 1 || (!report_staged && !paths.is_empty()) {
        let outcome = PublicationOutcome::TooManyChanges {
            added: changes.added.len(),
            modified: changes.modified.len(),
            changed: changes.changed.len(),
        };
        error!("{}", outcome);
        return Ok(outcome);
    }
    if !report_staged {
        error!("{}", PublicationOutcome::NothingChanged);
        return Ok(PublicationOutcome::NothingChanged);
    }

    let message = commit_message(version, suffix);
    info!("Committing file '{}' with message '{}'", report_path, message);
    let commit_id = repo.commit(&message)?;

    info!("Pushing changes to remote...");
    repo.push()?;
    info!("Push call has ended.");

    Ok(PublicationOutcome::Published { commit_id })
}

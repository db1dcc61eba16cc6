//! Release window resolution.
//!
//! A window is delimited by two commit ids. Tag boundaries are resolved to
//! commit ids first, and "latest released version" picks the two most recent
//! tags. The walk goes newest first from the current head:
//!
//! - with both boundaries set, collection starts at whichever boundary is met
//!   first and stops after the other one (or right away if they are equal)
//! - with a boundary missing, collection starts at the head and stops after
//!   the boundary that is set, or runs to the end of history without one
//!
//! Messages are kept as a set, so distinct commits sharing the same message
//! text collapse into one entry.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::boundary::BoundaryWarning;
use crate::error::{ReleaseNotesError, Result};
use crate::git::Repository;
use crate::history;
use crate::tags;
use crate::version::version_at;

/// The requested release window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    /// Two commit ids, either may be absent
    Commits(Option<String>, Option<String>),
    /// Two tag names matched by suffix, either may be absent
    Tags(Option<String>, Option<String>),
    /// The two most recent tags
    Latest,
}

impl RangeSpec {
    /// Pick the window from optional command-line boundaries.
    ///
    /// Tags win over commits; blank values count as absent; nothing at all
    /// means [RangeSpec::Latest].
    pub fn from_boundaries(
        commit_start: Option<&str>,
        commit_end: Option<&str>,
        tag_start: Option<&str>,
        tag_end: Option<&str>,
    ) -> Self {
        let present = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let (tag_start, tag_end) = (present(tag_start), present(tag_end));
        if tag_start.is_some() || tag_end.is_some() {
            return RangeSpec::Tags(tag_start, tag_end);
        }

        let (commit_start, commit_end) = (present(commit_start), present(commit_end));
        if commit_start.is_some() || commit_end.is_some() {
            return RangeSpec::Commits(commit_start, commit_end);
        }

        RangeSpec::Latest
    }
}

/// Messages of a resolved window and the version released by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResult {
    /// Unique full commit messages, unordered
    pub messages: HashSet<String>,
    /// Version read at the newest commit of the window
    pub version: String,
    /// Id of the newest commit of the window
    pub newest_commit: String,
}

/// Resolve any [RangeSpec] to its messages and version.
pub fn resolve<R: Repository + ?Sized>(repo: &mut R, spec: &RangeSpec) -> Result<RangeResult> {
    match spec {
        RangeSpec::Commits(first, second) => {
            read_by_commit(repo, first.as_deref(), second.as_deref())
        }
        RangeSpec::Tags(first, second) => read_by_tag(repo, first.as_deref(), second.as_deref()),
        RangeSpec::Latest => read_latest_released_version(repo),
    }
}

/// Collect the window between two commit ids and read its version.
///
/// # Returns
/// * `Err(AmbiguousOrMissingRange)` - No commit fell inside the window
/// * `Err(CheckoutRestore)` - Version extraction left the working tree in an unknown state
pub fn read_by_commit<R: Repository + ?Sized>(
    repo: &mut R,
    first: Option<&str>,
    second: Option<&str>,
) -> Result<RangeResult> {
    let (messages, newest_commit) = collect_window(&*repo, first, second)?;

    info!("Found {} commit messages.", messages.len());
    let newest_commit = match newest_commit {
        Some(id) if !messages.is_empty() => id,
        _ => return Err(ReleaseNotesError::missing_range(first, second)),
    };

    let version = version_at(repo, &newest_commit)?;
    Ok(RangeResult {
        messages,
        version: version.value,
        newest_commit,
    })
}

fn collect_window<R: Repository + ?Sized>(
    repo: &R,
    first: Option<&str>,
    second: Option<&str>,
) -> Result<(HashSet<String>, Option<String>)> {
    let unbounded = first.is_none() || second.is_none();
    let single = !unbounded && first == second;

    let mut messages = HashSet::new();
    let mut newest: Option<String> = None;
    let mut inside = unbounded;
    let mut entered_at: Option<String> = None;
    let mut closed = false;

    for commit in history::walk(repo)? {
        let commit = commit?;
        let id = commit.id.as_str();
        let on_boundary = Some(id) == first || Some(id) == second;

        if inside {
            if newest.is_none() {
                newest = Some(commit.id.clone());
            }
            messages.insert(commit.message);
            if on_boundary {
                closed = true;
                break;
            }
        } else if on_boundary {
            inside = true;
            entered_at = Some(commit.id.clone());
            newest = Some(commit.id);
            messages.insert(commit.message);
            if single {
                closed = true;
                break;
            }
        }
    }

    if inside && !closed {
        let pending = match entered_at.as_deref() {
            Some(entry) if Some(entry) == first => second,
            Some(_) => first,
            None => first.or(second),
        };
        if let Some(boundary) = pending {
            warn!(
                "{}",
                BoundaryWarning::BoundaryNotReached {
                    boundary: boundary.to_string(),
                }
            );
        }
    }

    Ok((messages, newest))
}

/// Resolve both tag names to commit ids, then read the window between them.
///
/// A blank or absent name leaves that end of the window unbounded. A name
/// that matches no tag fails the resolution.
pub fn read_by_tag<R: Repository + ?Sized>(
    repo: &mut R,
    first: Option<&str>,
    second: Option<&str>,
) -> Result<RangeResult> {
    let listed = tags::list_tags(&*repo)?;

    let mut commits = [None, None];
    for (slot, name) in commits.iter_mut().zip([first, second]) {
        let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
            continue;
        };
        match tags::resolve_boundary(&listed, name) {
            Some(commit) => *slot = Some(commit),
            None => return Err(ReleaseNotesError::missing_range(first, second)),
        }
    }

    let [first_commit, second_commit] = commits;
    read_by_commit(repo, first_commit.as_deref(), second_commit.as_deref())
}

/// Read the window between the two most recently created tags.
///
/// With a single tag the window runs from the head to that tag; without tags
/// it covers the whole history.
pub fn read_latest_released_version<R: Repository + ?Sized>(repo: &mut R) -> Result<RangeResult> {
    let listed = tags::list_tags(&*repo)?;
    let (newest, previous) = {
        let (newest, previous) = tags::latest_two(&listed);
        (
            newest.map(|t| t.reference.clone()),
            previous.map(|t| t.reference.clone()),
        )
    };

    info!(
        "Latest released tags: {}, {}",
        newest.as_deref().unwrap_or("<none>"),
        previous.as_deref().unwrap_or("<none>")
    );
    read_by_tag(repo, newest.as_deref(), previous.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{CheckoutTarget, MockRepository};
    use crate::version::MANIFEST_FILE;

    fn pom(version: &str) -> String {
        format!("<project><version>{}</version></project>", version)
    }

    /// c0..c5 newest last, tags 1.2 at c1 and 1.3 at c4
    fn sample_repo() -> MockRepository {
        let mut repo = MockRepository::new("/nonexistent");
        repo.add_commit("c0", "SYM-1 initial", 100);
        repo.add_commit("c1", "SYM-31 release of version 1.2", 200);
        repo.set_root_file(MANIFEST_FILE, &pom("1.2"));
        repo.add_commit("c2", "SYM-32 first part", 300);
        repo.add_commit("c3", "SYM-32 second part", 400);
        repo.add_commit("c4", "SYM-33 release of version 1.3", 500);
        repo.set_root_file(MANIFEST_FILE, &pom("1.3"));
        repo.add_commit("c5", "SYM-41 prepare 1.4", 600);
        repo.set_root_file(MANIFEST_FILE, &pom("1.4-SNAPSHOT"));
        repo.add_lightweight_tag("1.2", "c1");
        repo.add_annotated_tag("1.3", "c4", 550);
        repo
    }

    fn sorted(result: &RangeResult) -> Vec<&str> {
        let mut messages: Vec<&str> = result.messages.iter().map(String::as_str).collect();
        messages.sort();
        messages
    }

    #[test]
    fn test_commit_window_is_inclusive() {
        let mut repo = sample_repo();
        let result = read_by_commit(&mut repo, Some("c1"), Some("c4")).unwrap();
        assert_eq!(result.messages.len(), 4);
        assert_eq!(result.version, "1.3");
        assert_eq!(result.newest_commit, "c4");
    }

    #[test]
    fn test_commit_window_is_symmetric() {
        let mut repo = sample_repo();
        let forward = read_by_commit(&mut repo, Some("c1"), Some("c4")).unwrap();
        let backward = read_by_commit(&mut repo, Some("c4"), Some("c1")).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_identical_boundaries_give_single_commit() {
        let mut repo = sample_repo();
        let result = read_by_commit(&mut repo, Some("c2"), Some("c2")).unwrap();
        assert_eq!(sorted(&result), vec!["SYM-32 first part"]);
        assert_eq!(result.version, "1.2");
    }

    #[test]
    fn test_missing_boundary_reads_from_head() {
        let mut repo = sample_repo();
        let result = read_by_commit(&mut repo, None, Some("c3")).unwrap();
        assert_eq!(
            sorted(&result),
            vec![
                "SYM-32 second part",
                "SYM-33 release of version 1.3",
                "SYM-41 prepare 1.4",
            ]
        );
        assert_eq!(result.version, "1.4-SNAPSHOT");
    }

    #[test]
    fn test_no_boundaries_read_whole_history() {
        let mut repo = sample_repo();
        let result = read_by_commit(&mut repo, None, None).unwrap();
        assert_eq!(result.messages.len(), 6);
    }

    #[test]
    fn test_unknown_commits_fail() {
        let mut repo = sample_repo();
        let err = read_by_commit(&mut repo, Some("x1"), Some("x2")).unwrap_err();
        assert!(matches!(err, ReleaseNotesError::AmbiguousOrMissingRange { .. }));
        assert!(err.to_string().contains("x1"));
        assert!(err.to_string().contains("x2"));
    }

    #[test]
    fn test_unreached_second_boundary_still_collects() {
        let mut repo = sample_repo();
        let result = read_by_commit(&mut repo, Some("c2"), Some("gone")).unwrap();
        assert_eq!(result.messages.len(), 3);
    }

    #[test]
    fn test_duplicate_messages_collapse() {
        let mut repo = MockRepository::new("/nonexistent");
        repo.add_commit("a", "same", 1);
        repo.add_commit("b", "same", 2);
        repo.add_commit("c", "other", 3);
        let result = read_by_commit(&mut repo, Some("a"), Some("c")).unwrap();
        assert_eq!(result.messages.len(), 2);
    }

    #[test]
    fn test_tag_window_matches_commit_window() {
        let mut repo = sample_repo();
        let by_tag = read_by_tag(&mut repo, Some("1.2"), Some("1.3")).unwrap();
        let by_commit = read_by_commit(&mut repo, Some("c1"), Some("c4")).unwrap();
        assert_eq!(by_tag, by_commit);
        assert!(sorted(&by_tag).contains(&"SYM-31 release of version 1.2"));
    }

    #[test]
    fn test_unknown_tag_fails() {
        let mut repo = sample_repo();
        assert!(matches!(
            read_by_tag(&mut repo, Some("1.2"), Some("9.9")),
            Err(ReleaseNotesError::AmbiguousOrMissingRange { .. })
        ));
    }

    #[test]
    fn test_latest_released_version() {
        let mut repo = sample_repo();
        let result = read_latest_released_version(&mut repo).unwrap();
        assert_eq!(result.version, "1.3");
        assert_eq!(result.messages.len(), 4);
    }

    #[test]
    fn test_latest_with_single_tag_reads_from_head() {
        let mut repo = MockRepository::new("/nonexistent");
        repo.add_commit("a", "one", 1);
        repo.add_commit("b", "two", 2);
        repo.add_commit("c", "three", 3);
        repo.add_lightweight_tag("1.0", "b");
        let result = read_latest_released_version(&mut repo).unwrap();
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.newest_commit, "c");
    }

    #[test]
    fn test_resolution_restores_branch() {
        let mut repo = sample_repo();
        read_by_tag(&mut repo, Some("1.2"), Some("1.3")).unwrap();
        assert_eq!(
            repo.head(),
            &CheckoutTarget::Branch("refs/heads/master".to_string())
        );
        assert_eq!(
            repo.checkouts().first(),
            Some(&CheckoutTarget::Detached("c4".to_string()))
        );
    }

    #[test]
    fn test_resolve_dispatches_on_spec() {
        let mut repo = sample_repo();
        let spec = RangeSpec::Tags(Some("1.2".to_string()), Some("1.3".to_string()));
        assert_eq!(resolve(&mut repo, &spec).unwrap().version, "1.3");
        assert_eq!(resolve(&mut repo, &RangeSpec::Latest).unwrap().version, "1.3");
    }

    #[test]
    fn test_spec_from_boundaries() {
        assert_eq!(
            RangeSpec::from_boundaries(Some("a"), Some("b"), Some("1.2"), None),
            RangeSpec::Tags(Some("1.2".to_string()), None)
        );
        assert_eq!(
            RangeSpec::from_boundaries(Some("a"), Some(" "), None, Some("")),
            RangeSpec::Commits(Some("a".to_string()), None)
        );
        assert_eq!(
            RangeSpec::from_boundaries(None, None, None, None),
            RangeSpec::Latest
        );
    }
}

//! Tag listing and resolution of tag names to commit boundaries.
//!
//! Peeling and timestamps are done by the [Repository] implementation when it
//! materializes a [TagRecord]; this module only matches and ranks records.

use tracing::{debug, info, warn};

use crate::boundary::BoundaryWarning;
use crate::error::Result;
use crate::git::{Repository, TagRecord};

/// List every tag of the repository, peeled to its commit.
pub fn list_tags<R: Repository + ?Sized>(repo: &R) -> Result<Vec<TagRecord>> {
    let tags = repo.tags()?;
    debug!("Found {} tags", tags.len());
    Ok(tags)
}

/// First tag whose full reference name ends with `suffix`.
///
/// Matching is by suffix, so `1.3` also matches `refs/tags/v1.3` and
/// `refs/tags/11.3`; callers needing precision pass the full reference name.
pub fn find_by_suffix<'t>(tags: &'t [TagRecord], suffix: &str) -> Option<&'t TagRecord> {
    tags.iter().find(|tag| tag.matches_suffix(suffix))
}

/// Resolve a tag name to the commit id it effectively points at.
///
/// # Returns
/// * `Some(commit_id)` - A matching tag was found
/// * `None` - No tag matches; a [BoundaryWarning::TagNotFound] is logged
pub fn resolve_boundary(tags: &[TagRecord], name: &str) -> Option<String> {
    match find_by_suffix(tags, name) {
        Some(tag) => {
            info!(
                "Found tag '{}' using commit id '{}'.",
                tag.reference, tag.target
            );
            Some(tag.target.clone())
        }
        None => {
            warn!("{}", BoundaryWarning::TagNotFound { tag: name.to_string() });
            None
        }
    }
}

/// The two most recent tags by timestamp, newest first.
///
/// Ties keep the tag seen first in listing order. With fewer than two tags the
/// missing positions are `None`.
pub fn latest_two(tags: &[TagRecord]) -> (Option<&TagRecord>, Option<&TagRecord>) {
    let mut newest: Option<&TagRecord> = None;
    let mut previous: Option<&TagRecord> = None;

    for tag in tags {
        match newest {
            Some(current) if tag.timestamp <= current.timestamp => {
                if previous.map_or(true, |p| tag.timestamp > p.timestamp) {
                    previous = Some(tag);
                }
            }
            _ => {
                previous = newest;
                newest = Some(tag);
            }
        }
    }

    if previous.is_none() {
        warn!("{}", BoundaryWarning::NotEnoughTags { found: tags.len() });
    }
    (newest, previous)
}

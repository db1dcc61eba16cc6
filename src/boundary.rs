use std::fmt;

/// Non-fatal conditions raised while resolving a release window or talking to
/// the remote. They are logged and the run continues.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No tag reference ends with the requested name
    TagNotFound { tag: String },
    /// Fewer than two tags exist, so one end of the window is unbounded
    NotEnoughTags { found: usize },
    /// History ended before the second boundary of a bounded window was seen
    BoundaryNotReached { boundary: String },
    /// Fetch or fast-forward failed; local state is used as is
    PullFailed { remote: String, reason: String },
    /// No manifest at the commit the version is read from
    ManifestMissing { commit: String },
    /// The manifest exists but declares no version
    ManifestWithoutVersion { commit: String },
}

fn short(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::TagNotFound { tag } => {
                write!(f, "No tag found matching '{}'", tag)
            }
            BoundaryWarning::NotEnoughTags { found } => {
                write!(
                    f,
                    "Only {} tag(s) found, release window is unbounded toward history start",
                    found
                )
            }
            BoundaryWarning::BoundaryNotReached { boundary } => {
                write!(
                    f,
                    "History ended before boundary '{}' was reached",
                    short(boundary)
                )
            }
            BoundaryWarning::PullFailed { remote, reason } => {
                write!(
                    f,
                    "Pull from remote '{}' failed, continuing with local state: {}",
                    remote, reason
                )
            }
            BoundaryWarning::ManifestMissing { commit } => {
                write!(f, "No manifest found at commit {}", short(commit))
            }
            BoundaryWarning::ManifestWithoutVersion { commit } => {
                write!(
                    f,
                    "Manifest at commit {} declares no version",
                    short(commit)
                )
            }
        }
    }
}

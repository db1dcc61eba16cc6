use thiserror::Error;

/// Unified error type for release notes generation
#[derive(Error, Debug)]
pub enum ReleaseNotesError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Commit history unavailable: {0}")]
    HistoryUnavailable(String),

    #[error(
        "No commits were found for boundaries '{first}', '{second}'. Maybe the branch is badly chosen."
    )]
    AmbiguousOrMissingRange { first: String, second: String },

    #[error("Failed to restore checkout of '{target}', repository state is unknown: {reason}")]
    CheckoutRestore { target: String, reason: String },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid issue pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Issue tracker error: {0}")]
    Tracker(String),

    #[error("Report rendering error: {0}")]
    Render(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-notes-generator
pub type Result<T> = std::result::Result<T, ReleaseNotesError>;

impl ReleaseNotesError {
    /// Create a range error, rendering absent boundaries as `<none>`
    pub fn missing_range(first: Option<&str>, second: Option<&str>) -> Self {
        ReleaseNotesError::AmbiguousOrMissingRange {
            first: first.unwrap_or("<none>").to_string(),
            second: second.unwrap_or("<none>").to_string(),
        }
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseNotesError::Config(msg.into())
    }

    /// Create a manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        ReleaseNotesError::Manifest(msg.into())
    }

    /// Create an issue tracker error with context
    pub fn tracker(msg: impl Into<String>) -> Self {
        ReleaseNotesError::Tracker(msg.into())
    }

    /// Create a rendering error with context
    pub fn render(msg: impl Into<String>) -> Self {
        ReleaseNotesError::Render(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseNotesError::Remote(msg.into())
    }
}

//! Pure formatting functions for UI output.
//!
//! Formatting is split from printing so the text can be tested without a
//! terminal.

use console::style;

use crate::publish::PublicationOutcome;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Format and print a warning with a yellow marker.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), message);
}

/// Format the report line of the run summary.
///
/// # Arguments
/// * `version` - Version the report was generated for
/// * `commit_count` - Distinct commit messages in the release window
/// * `issue_count` - Issues in the report
pub fn format_report_line(version: &str, commit_count: usize, issue_count: usize) -> String {
    format!(
        "Release notes for version {} generated from {} commit message{} with {} issue{}",
        version,
        commit_count,
        if commit_count == 1 { "" } else { "s" },
        issue_count,
        if issue_count == 1 { "" } else { "s" }
    )
}

/// Format a publication outcome as a one-line, human readable status.
pub fn format_publication(outcome: &PublicationOutcome) -> String {
    match outcome {
        PublicationOutcome::Published { commit_id } => {
            let short = commit_id.get(..7).unwrap_or(commit_id);
            format!("Published release notes in commit {}", short)
        }
        PublicationOutcome::NothingChanged => {
            "Not published: identical release notes are already in the repository".to_string()
        }
        PublicationOutcome::TooManyChanges { .. } => {
            format!("Not published: {}", outcome)
        }
        PublicationOutcome::Failed { reason } => format!("Not published: {}", reason),
    }
}

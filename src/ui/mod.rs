//! User interface module: the run summary printed by the binary.
//!
//! - `formatter` - Pure formatting functions
//! - This module - Composition of a whole summary from a workflow result

pub mod formatter;

pub use formatter::{
    display_error, display_status, display_success, display_warning, format_publication,
    format_report_line,
};

use crate::cli::orchestration::WorkflowResult;

/// Print the outcome of a workflow run.
///
/// Shows the report line and path, then the publication status when
/// publishing was requested. A skipped or failed publication is a warning: the
/// report itself was generated.
pub fn display_summary(result: &WorkflowResult) {
    display_success(&format_report_line(
        &result.version,
        result.commit_count,
        result.issue_count,
    ));
    display_status(&format!("Report: {}", result.report.display()));

    match &result.publication {
        Some(outcome) if outcome.succeeded() => display_success(&format_publication(outcome)),
        Some(outcome) => display_warning(&format_publication(outcome)),
        None => {}
    }
}

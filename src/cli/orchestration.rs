//! Main workflow orchestration logic
//!
//! Decoupled from clap so the workflow can be driven programmatically, and
//! generic over the repository and tracker so tests can run it against
//! in-memory implementations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::git::{Git2Repository, Repository};
use crate::publish::{self, PublicationOutcome};
use crate::range::{self, RangeSpec};
use crate::report::{self, HtmlRenderer, PredefinedOrder, ReportInput};
use crate::scanner::IssueIdScanner;
use crate::tracker::{self, IssueFilters, IssueTracker};

/// Arguments for the release notes workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowArgs {
    /// Release window to report on
    pub range: RangeSpec,

    /// Commit and push the report after generating it
    pub push: bool,
}

/// Result of a successful workflow run
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    /// The generated report
    pub report: PathBuf,

    /// Version the report was generated for
    pub version: String,

    /// Distinct commit messages in the release window
    pub commit_count: usize,

    /// Issues in the report after filtering
    pub issue_count: usize,

    /// Publication outcome, when publishing was requested
    pub publication: Option<PublicationOutcome>,
}

impl WorkflowResult {
    /// Whether the report was committed and pushed
    pub fn published(&self) -> bool {
        self.publication
            .as_ref()
            .map_or(false, PublicationOutcome::succeeded)
    }
}

/// Main release notes workflow
///
/// Opens (or clones) the configured repository, generates the report and
/// closes the repository again, whatever the outcome.
///
/// # Arguments
///
/// * `args` - Release window and whether to publish
/// * `config` - Effective configuration
/// * `tracker` - Issue tracker to fetch issues from
pub fn run<T: IssueTracker + ?Sized>(
    args: &WorkflowArgs,
    config: &Config,
    tracker: &T,
) -> Result<WorkflowResult> {
    debug!("Effective configuration:\n{}", config);

    let mut repo = Git2Repository::open_or_clone(config.repository_settings())
        .context("Failed to open git repository")?;
    let result = generate(&mut repo, args, config, tracker);
    repo.close();
    result
}

/// Generate the report from an already opened repository
///
/// 1. Resolve the release window and its version
/// 2. Scan commit messages for issue ids
/// 3. Fetch and filter issues
/// 4. Group, order and render them
/// 5. Publish the report if requested; a failed publication is reported, not raised
pub fn generate<R, T>(
    repo: &mut R,
    args: &WorkflowArgs,
    config: &Config,
    tracker: &T,
) -> Result<WorkflowResult>
where
    R: Repository + ?Sized,
    T: IssueTracker + ?Sized,
{
    let window = range::resolve(repo, &args.range).context("Failed to resolve release range")?;
    info!(
        "Release {} spans {} commit messages",
        window.version,
        window.messages.len()
    );

    let scanner = IssueIdScanner::new(&config.tracker.issue_pattern)
        .context("Failed to compile issue pattern")?;
    let ids = scanner.find_issue_ids(&window.messages);

    let filters = IssueFilters::new(
        &config.issues.filter_by_type,
        &config.issues.filter_by_component,
        &config.issues.filter_by_label,
        &config.issues.filter_by_status,
    );
    let issues =
        tracker::find_issues(tracker, &ids, &filters).context("Failed to fetch issues")?;
    let issue_count = issues.len();

    let groups = report::group_issues(
        issues,
        &PredefinedOrder::issue_types(&config.issues.sort_type),
        &PredefinedOrder::priorities(&config.issues.sort_priority),
    );
    let input = ReportInput {
        groups: &groups,
        tracker_url: &config.tracker.url,
        version: &window.version,
    };
    let report_path = report::write_report(
        &config.report.resolved_directory(),
        &input,
        &HtmlRenderer,
    )
    .context("Failed to generate report")?;

    let publication = if args.push {
        Some(publish::attempt_publish(
            repo,
            &report_path,
            &window.version,
            config.git.commit_message_suffix.as_deref(),
        ))
    } else {
        None
    };

    Ok(WorkflowResult {
        report: report_path,
        version: window.version,
        commit_count: window.messages.len(),
        issue_count,
        publication,
    })
}

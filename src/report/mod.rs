//! Report assembly: grouping and ordering of issues, and rendering to a file.

pub mod html;

pub use html::HtmlRenderer;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::tracker::Issue;

/// Issue type order used when none is configured
pub const DEFAULT_TYPE_ORDER: [&str; 3] = ["New Feature", "Epic", "Bug"];

/// Priority order used when none is configured
pub const DEFAULT_PRIORITY_ORDER: [&str; 5] = ["Highest", "High", "Medium", "Low", "Lowest"];

/// Ordering driven by a fixed list of values.
///
/// Listed values come first in list order. Unlisted values follow, ordered
/// lexically among themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredefinedOrder {
    order: Vec<String>,
}

impl PredefinedOrder {
    /// Use `order`, or `default` when `order` has no non-blank value
    pub fn new(order: &[String], default: &[&str]) -> Self {
        let order: Vec<String> = order
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if order.is_empty() {
            PredefinedOrder {
                order: default.iter().map(|v| v.to_string()).collect(),
            }
        } else {
            PredefinedOrder { order }
        }
    }

    pub fn issue_types(order: &[String]) -> Self {
        Self::new(order, &DEFAULT_TYPE_ORDER)
    }

    pub fn priorities(order: &[String]) -> Self {
        Self::new(order, &DEFAULT_PRIORITY_ORDER)
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let position = |value: &str| self.order.iter().position(|v| v == value);
        match (position(a), position(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

/// Issues sharing one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueGroup {
    pub issue_type: String,
    pub issues: Vec<Issue>,
}

/// Group issues by type, ordering groups by `type_order` and issues within a
/// group by `priority_order`. Issues without a priority go last.
pub fn group_issues(
    issues: Vec<Issue>,
    type_order: &PredefinedOrder,
    priority_order: &PredefinedOrder,
) -> Vec<IssueGroup> {
    let mut by_type: BTreeMap<String, Vec<Issue>> = BTreeMap::new();
    for issue in issues {
        by_type
            .entry(issue.issue_type.clone())
            .or_default()
            .push(issue);
    }

    let mut groups: Vec<IssueGroup> = by_type
        .into_iter()
        .map(|(issue_type, mut issues)| {
            issues.sort_by(|a, b| match (&a.priority, &b.priority) {
                (Some(x), Some(y)) => priority_order.compare(x, y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
            IssueGroup { issue_type, issues }
        })
        .collect();
    groups.sort_by(|a, b| type_order.compare(&a.issue_type, &b.issue_type));
    groups
}

/// File name of the report for `version`, e.g. `1_3.html` for `1.3`
///
/// Dots and path separators become `_`, so the name never leaves its directory.
pub fn artifact_file_name(version: &str) -> String {
    let name: String = version
        .chars()
        .map(|c| match c {
            '.' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    format!("{}.html", name)
}

/// Data handed to a renderer
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub groups: &'a [IssueGroup],
    pub tracker_url: &'a str,
    pub version: &'a str,
}

impl ReportInput<'_> {
    pub fn issue_count(&self) -> usize {
        self.groups.iter().map(|g| g.issues.len()).sum()
    }
}

/// Turns report input into the document text
pub trait ReportRenderer {
    fn render(&self, input: &ReportInput<'_>) -> Result<String>;
}

/// Render `input` into `directory`, creating it if needed.
///
/// # Returns
/// * `Ok(PathBuf)` - Path of the written report
pub fn write_report<Rn: ReportRenderer + ?Sized>(
    directory: &Path,
    input: &ReportInput<'_>,
    renderer: &Rn,
) -> Result<PathBuf> {
    if !directory.exists() {
        info!(
            "Report directory {} doesn't exist, creating it.",
            directory.display()
        );
        fs::create_dir_all(directory)?;
    }

    let report = directory.join(artifact_file_name(input.version));
    info!(
        "Generating report to file {} with {} issues",
        report.display(),
        input.issue_count()
    );

    let contents = renderer.render(input)?;
    fs::write(&report, contents)?;
    info!("Generation of report is finished.");
    Ok(report)
}

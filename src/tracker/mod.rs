//! Issue tracker collaborator.
//!
//! Issues are fetched one key at a time through the [IssueTracker] trait and
//! kept or dropped by the configured [IssueFilters].
//!
//! - [jira::JiraClient]: Jira REST API v2 over HTTP basic authentication
//! - [mock::MockTracker]: fixed set of issues for tests

pub mod jira;
pub mod mock;

pub use jira::JiraClient;
pub use mock::MockTracker;

use std::collections::BTreeSet;
use std::fmt;

use tracing::{info, warn};

use crate::error::Result;

/// An issue as returned by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub issue_type: String,
    pub components: Vec<String>,
    pub labels: Vec<String>,
    pub status: String,
    pub priority: Option<String>,
}

/// Fetch-by-key access to an issue tracker.
pub trait IssueTracker {
    /// # Returns
    /// * `Ok(Some(issue))` - The issue exists
    /// * `Ok(None)` - No issue with that key
    /// * `Err(Tracker)` - The tracker could not be queried
    fn fetch(&self, key: &str) -> Result<Option<Issue>>;
}

/// Issue attribute a filter looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Type,
    Component,
    Label,
    Status,
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterField::Type => "type",
            FilterField::Component => "component",
            FilterField::Label => "label",
            FilterField::Status => "status",
        };
        write!(f, "{}", name)
    }
}

/// Allow-list filters on issue attributes.
///
/// An empty list accepts everything. A non-empty list keeps an issue only if
/// one of its values matches: type and status by case-insensitive equality,
/// component and label by case-insensitive containment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilters {
    pub by_type: Vec<String>,
    pub by_component: Vec<String>,
    pub by_label: Vec<String>,
    pub by_status: Vec<String>,
}

fn normalize(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

impl IssueFilters {
    pub fn new(
        by_type: &[String],
        by_component: &[String],
        by_label: &[String],
        by_status: &[String],
    ) -> Self {
        IssueFilters {
            by_type: normalize(by_type),
            by_component: normalize(by_component),
            by_label: normalize(by_label),
            by_status: normalize(by_status),
        }
    }

    /// The first filter that rejects `issue`, if any
    pub fn rejected_by(&self, issue: &Issue) -> Option<FilterField> {
        let equals = |value: &String, wanted: &str| value.to_lowercase() == wanted;
        let contains = |value: &String, wanted: &str| value.to_lowercase().contains(wanted);

        if !self.by_type.is_empty()
            && !self.by_type.iter().any(|t| equals(&issue.issue_type, t.as_str()))
        {
            return Some(FilterField::Type);
        }
        if !self.by_component.is_empty()
            && !self
                .by_component
                .iter()
                .any(|c| issue.components.iter().any(|name| contains(name, c.as_str())))
        {
            return Some(FilterField::Component);
        }
        if !self.by_label.is_empty()
            && !self
                .by_label
                .iter()
                .any(|l| issue.labels.iter().any(|label| contains(label, l.as_str())))
        {
            return Some(FilterField::Label);
        }
        if !self.by_status.is_empty()
            && !self
                .by_status
                .iter()
                .any(|s| equals(&issue.status, s.as_str()))
        {
            return Some(FilterField::Status);
        }
        None
    }

    fn values(&self, field: FilterField) -> &[String] {
        match field {
            FilterField::Type => &self.by_type,
            FilterField::Component => &self.by_component,
            FilterField::Label => &self.by_label,
            FilterField::Status => &self.by_status,
        }
    }
}

/// Fetch every id from the tracker and keep those passing `filters`.
///
/// Ids are queried in sorted order. Unknown ids are logged and skipped; any
/// other tracker failure aborts.
pub fn find_issues<T: IssueTracker + ?Sized>(
    tracker: &T,
    ids: &BTreeSet<String>,
    filters: &IssueFilters,
) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    for id in ids {
        info!("Querying issue tracker for issue {}", id);
        let Some(issue) = tracker.fetch(id)? else {
            warn!("{}", "=".repeat(60));
            warn!("--- Issue {} not found.", id);
            warn!("--- Bad pattern definition or issue has been deleted.");
            warn!("{}", "=".repeat(60));
            continue;
        };

        match filters.rejected_by(&issue) {
            Some(field) => info!(
                "Filtered issue '{} {}' with filter by {} with values {:?}",
                issue.key,
                issue.summary,
                field,
                filters.values(field)
            ),
            None => issues.push(issue),
        }
    }

    info!("Kept {} of {} issues", issues.len(), ids.len());
    Ok(issues)
}

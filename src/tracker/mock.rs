use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{ReleaseNotesError, Result};
use crate::tracker::{Issue, IssueTracker};

/// In-memory tracker for testing without network access.
#[derive(Debug, Default)]
pub struct MockTracker {
    issues: HashMap<String, Issue>,
    failing: Option<String>,
    queried: RefCell<Vec<String>>,
}

impl MockTracker {
    pub fn new(issues: Vec<Issue>) -> Self {
        MockTracker {
            issues: issues
                .into_iter()
                .map(|issue| (issue.key.clone(), issue))
                .collect(),
            failing: None,
            queried: RefCell::new(Vec::new()),
        }
    }

    /// Make fetching `key` fail with a tracker error
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing = Some(key.to_string());
        self
    }

    /// Keys fetched so far, in order
    pub fn queried(&self) -> Vec<String> {
        self.queried.borrow().clone()
    }
}

impl IssueTracker for MockTracker {
    fn fetch(&self, key: &str) -> Result<Option<Issue>> {
        self.queried.borrow_mut().push(key.to_string());
        if self.failing.as_deref() == Some(key) {
            return Err(ReleaseNotesError::tracker(format!(
                "GET issue {} returned 500",
                key
            )));
        }
        Ok(self.issues.get(key).cloned())
    }
}

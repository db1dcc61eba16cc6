use std::collections::BTreeSet;

use regex::Regex;
use tracing::info;

use crate::error::Result;

/// Default issue key pattern, e.g. `SYM-31`
pub const DEFAULT_ISSUE_PATTERN: &str = r"[A-Z][A-Z0-9]+-\d+";

/// Extracts issue identifiers from free text with a configured pattern.
#[derive(Debug, Clone)]
pub struct IssueIdScanner {
    pattern: Regex,
}

impl IssueIdScanner {
    /// Compile the scanner.
    ///
    /// # Returns
    /// * `Err(Pattern)` - `pattern` is not a valid regular expression
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(IssueIdScanner {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Every distinct, non-overlapping match across all texts, sorted.
    pub fn find_issue_ids<I, S>(&self, texts: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        info!("Searching for issue ids with pattern '{}'", self.pattern);

        let ids: BTreeSet<String> = texts
            .into_iter()
            .flat_map(|text| {
                self.pattern
                    .find_iter(text.as_ref())
                    .map(|m| m.as_str().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();

        info!("Found {} issue ids", ids.len());
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseNotesError;

    #[test]
    fn test_finds_all_ids_in_all_texts() {
        let scanner = IssueIdScanner::new(r"SYM-\d+").unwrap();
        let ids = scanner.find_issue_ids([
            "SYM-31 release of version 1.2",
            "SYM-32 and SYM-33 together",
            "no reference here",
        ]);
        let expected: BTreeSet<String> = ["SYM-31", "SYM-32", "SYM-33"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_duplicates_collapse() {
        let scanner = IssueIdScanner::new(r"SYM-\d+").unwrap();
        let ids = scanner.find_issue_ids(vec![
            "SYM-32 part 1".to_string(),
            "SYM-32 part 2".to_string(),
        ]);
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let scanner = IssueIdScanner::new(DEFAULT_ISSUE_PATTERN).unwrap();
        assert!(scanner.find_issue_ids(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_default_pattern() {
        let scanner = IssueIdScanner::new(DEFAULT_ISSUE_PATTERN).unwrap();
        let ids = scanner.find_issue_ids(["Fix ABC-12, see X-1 and JIRA2-7"]);
        assert!(ids.contains("ABC-12"));
        assert!(ids.contains("JIRA2-7"));
        assert!(!ids.contains("X-1"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            IssueIdScanner::new("SYM-("),
            Err(ReleaseNotesError::Pattern(_))
        ));
    }
}

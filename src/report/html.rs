use std::fmt::Write;

use crate::error::{ReleaseNotesError, Result};
use crate::report::{ReportInput, ReportRenderer};

/// Built-in renderer producing a self-contained HTML page.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl HtmlRenderer {
    fn write_page(&self, input: &ReportInput<'_>, out: &mut String) -> std::fmt::Result {
        let version = escape(input.version);
        let tracker_url = input.tracker_url.trim_end_matches('/');

        writeln!(out, "<!DOCTYPE html>")?;
        writeln!(out, "<html>")?;
        writeln!(out, "<head>")?;
        writeln!(out, "<meta charset=\"utf-8\">")?;
        writeln!(out, "<title>Release notes for version {}</title>", version)?;
        writeln!(out, "</head>")?;
        writeln!(out, "<body>")?;
        writeln!(out, "<h1>Release notes for version {}</h1>", version)?;

        if input.groups.is_empty() {
            writeln!(out, "<p>No issues in this release.</p>")?;
        }

        for group in input.groups {
            writeln!(out, "<h2>{}</h2>", escape(&group.issue_type))?;
            writeln!(out, "<ul>")?;
            for issue in &group.issues {
                write!(
                    out,
                    "<li><a href=\"{}/browse/{}\">{}</a>",
                    escape(tracker_url),
                    escape(&issue.key),
                    escape(&issue.key)
                )?;
                if let Some(priority) = &issue.priority {
                    write!(out, " [{}]", escape(priority))?;
                }
                writeln!(out, " {}</li>", escape(&issue.summary))?;
            }
            writeln!(out, "</ul>")?;
        }

        writeln!(out, "</body>")?;
        writeln!(out, "</html>")
    }
}

impl ReportRenderer for HtmlRenderer {
    fn render(&self, input: &ReportInput<'_>) -> Result<String> {
        let mut out = String::new();
        self.write_page(input, &mut out)
            .map_err(|e| ReleaseNotesError::render(e.to_string()))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::IssueGroup;
    use crate::tracker::Issue;

    #[test]
    fn test_renders_groups_with_links() {
        let groups = vec![IssueGroup {
            issue_type: "Bug".to_string(),
            issues: vec![Issue {
                key: "SYM-31".to_string(),
                summary: "Fix <script> & friends".to_string(),
                issue_type: "Bug".to_string(),
                priority: Some("High".to_string()),
                ..Issue::default()
            }],
        }];
        let input = ReportInput {
            groups: &groups,
            tracker_url: "https://jira.example.com/",
            version: "1.3",
        };

        let html = HtmlRenderer.render(&input).unwrap();
        assert!(html.contains("<title>Release notes for version 1.3</title>"));
        assert!(html.contains("<h2>Bug</h2>"));
        assert!(html.contains("href=\"https://jira.example.com/browse/SYM-31\""));
        assert!(html.contains("[High] Fix &lt;script&gt; &amp; friends"));
    }

    #[test]
    fn test_renders_empty_release() {
        let input = ReportInput {
            groups: &[],
            tracker_url: "",
            version: "1.0",
        };
        let html = HtmlRenderer.render(&input).unwrap();
        assert!(html.contains("No issues in this release."));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a\"b'c"), "a&quot;b&#39;c");
    }
}

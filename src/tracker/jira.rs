use std::time::Duration;

use base64::Engine;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ReleaseNotesError, Result};
use crate::tracker::{Issue, IssueTracker};

const TIMEOUT: Duration = Duration::from_secs(30);

/// Jira REST API v2 client authenticating with username and password.
pub struct JiraClient {
    base_url: String,
    authorization: String,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct IssueResponse {
    key: String,
    fields: IssueFields,
}

#[derive(Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: String,
    issuetype: Option<Named>,
    #[serde(default)]
    components: Vec<Named>,
    #[serde(default)]
    labels: Vec<String>,
    status: Option<Named>,
    priority: Option<Named>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

impl From<IssueResponse> for Issue {
    fn from(response: IssueResponse) -> Self {
        let fields = response.fields;
        Issue {
            key: response.key,
            summary: fields.summary,
            issue_type: fields.issuetype.map(|t| t.name).unwrap_or_default(),
            components: fields.components.into_iter().map(|c| c.name).collect(),
            labels: fields.labels,
            status: fields.status.map(|s| s.name).unwrap_or_default(),
            priority: fields.priority.map(|p| p.name),
        }
    }
}

/// Decode the JSON body of `GET /rest/api/2/issue/{key}`.
pub fn parse_issue(body: &str) -> Result<Issue> {
    let response: IssueResponse = serde_json::from_str(body)
        .map_err(|e| ReleaseNotesError::tracker(format!("Malformed issue response: {}", e)))?;
    Ok(response.into())
}

impl JiraClient {
    pub fn new(url: &str, username: &str, password: &str) -> Result<Self> {
        let base_url = url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ReleaseNotesError::config("Issue tracker url is not configured"));
        }
        info!(
            "Creating issue tracker client with url {} and user {}",
            base_url, username
        );

        let credentials = format!("{}:{}", username, password);
        let authorization = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        );
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .build()
            .new_agent();

        Ok(JiraClient {
            base_url,
            authorization,
            agent,
        })
    }

    pub fn issue_url(&self, key: &str) -> String {
        format!("{}/rest/api/2/issue/{}", self.base_url, key)
    }
}

impl IssueTracker for JiraClient {
    fn fetch(&self, key: &str) -> Result<Option<Issue>> {
        let url = self.issue_url(key);
        debug!("GET {}", url);

        let response = self
            .agent
            .get(&url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .call();

        let mut response = match response {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => return Ok(None),
            Err(e) => {
                return Err(ReleaseNotesError::tracker(format!(
                    "GET {} failed: {}",
                    url, e
                )))
            }
        };

        let body = response.body_mut().read_to_string().map_err(|e| {
            ReleaseNotesError::tracker(format!("Failed to read response of {}: {}", url, e))
        })?;
        parse_issue(&body).map(Some)
    }
}

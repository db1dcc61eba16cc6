use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseNotesError, Result};
use crate::git::{Committer, Credentials, RepositorySettings};
use crate::report::{DEFAULT_PRIORITY_ORDER, DEFAULT_TYPE_ORDER};
use crate::scanner::DEFAULT_ISSUE_PATTERN;

/// Configuration file name looked up in the current and user config directories
pub const CONFIG_FILE: &str = "release-notes.toml";

/// Represents the complete configuration for release notes generation.
///
/// Contains the repository to read and publish to, the issue tracker to query,
/// issue filtering and ordering, and where reports are written.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub issues: IssuesConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

fn default_git_directory() -> PathBuf {
    PathBuf::from("./repository")
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_committer_name() -> String {
    "release-notes-generator".to_string()
}

fn default_committer_mail() -> String {
    "release-notes-generator@localhost".to_string()
}

/// Local working copy, its remote and the identity used to publish.
#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default = "default_git_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_committer_name")]
    pub committer_name: String,

    #[serde(default = "default_committer_mail")]
    pub committer_mail: String,

    /// Appended to publication commit messages, e.g. to pass commit hooks
    #[serde(default)]
    pub commit_message_suffix: Option<String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            directory: default_git_directory(),
            branch: default_branch(),
            url: None,
            username: String::new(),
            password: String::new(),
            committer_name: default_committer_name(),
            committer_mail: default_committer_mail(),
            commit_message_suffix: None,
        }
    }
}

impl fmt::Debug for GitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitConfig")
            .field("directory", &self.directory)
            .field("branch", &self.branch)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("committer_name", &self.committer_name)
            .field("committer_mail", &self.committer_mail)
            .field("commit_message_suffix", &self.commit_message_suffix)
            .finish()
    }
}

fn default_issue_pattern() -> String {
    DEFAULT_ISSUE_PATTERN.to_string()
}

/// Issue tracker endpoint and the pattern issue keys are found with.
#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct TrackerConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_issue_pattern")]
    pub issue_pattern: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            issue_pattern: default_issue_pattern(),
        }
    }
}

impl fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("issue_pattern", &self.issue_pattern)
            .finish()
    }
}

fn default_sort_type() -> Vec<String> {
    DEFAULT_TYPE_ORDER.iter().map(|s| s.to_string()).collect()
}

fn default_sort_priority() -> Vec<String> {
    DEFAULT_PRIORITY_ORDER.iter().map(|s| s.to_string()).collect()
}

/// Which issues make it into the report and in what order.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IssuesConfig {
    #[serde(default)]
    pub filter_by_type: Vec<String>,

    #[serde(default)]
    pub filter_by_component: Vec<String>,

    #[serde(default)]
    pub filter_by_label: Vec<String>,

    #[serde(default)]
    pub filter_by_status: Vec<String>,

    #[serde(default = "default_sort_type")]
    pub sort_type: Vec<String>,

    #[serde(default = "default_sort_priority")]
    pub sort_priority: Vec<String>,
}

impl Default for IssuesConfig {
    fn default() -> Self {
        IssuesConfig {
            filter_by_type: Vec::new(),
            filter_by_component: Vec::new(),
            filter_by_label: Vec::new(),
            filter_by_status: Vec::new(),
            sort_type: default_sort_type(),
            sort_priority: default_sort_priority(),
        }
    }
}

/// Where generated reports are written
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ReportConfig {
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl ReportConfig {
    /// Configured directory, or `release-notes` under the system temp directory
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| env::temp_dir().join("release-notes"))
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "******"
    }
}

/// Values given on the command line, applied over the loaded file.
///
/// `None` and blank values leave the loaded value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub git_directory: Option<PathBuf>,
    pub git_branch: Option<String>,
    pub git_url: Option<String>,
    pub git_username: Option<String>,
    pub git_password: Option<String>,
    pub git_committer_name: Option<String>,
    pub git_committer_mail: Option<String>,
    pub git_commit_message_suffix: Option<String>,
    pub tracker_url: Option<String>,
    pub tracker_username: Option<String>,
    pub tracker_password: Option<String>,
    pub issue_pattern: Option<String>,
    pub filter_by_type: Option<String>,
    pub filter_by_component: Option<String>,
    pub filter_by_label: Option<String>,
    pub filter_by_status: Option<String>,
    pub sort_type: Option<String>,
    pub sort_priority: Option<String>,
    pub report_directory: Option<PathBuf>,
}

/// Split a comma-separated value into trimmed, non-empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn set_text(target: &mut String, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
        *target = value.to_string();
    }
}

fn set_optional_text(target: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
        *target = Some(value.to_string());
    }
}

fn set_list(target: &mut Vec<String>, value: &Option<String>) {
    if let Some(value) = value.as_deref() {
        let items = split_list(value);
        if !items.is_empty() {
            *target = items;
        }
    }
}

fn set_path(target: &mut PathBuf, value: &Option<PathBuf>) {
    if let Some(value) = value.as_ref().filter(|p| !p.as_os_str().is_empty()) {
        *target = value.clone();
    }
}

impl Config {
    /// Apply command-line values over this configuration.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        set_path(&mut self.git.directory, &overrides.git_directory);
        set_text(&mut self.git.branch, &overrides.git_branch);
        set_optional_text(&mut self.git.url, &overrides.git_url);
        set_text(&mut self.git.username, &overrides.git_username);
        set_text(&mut self.git.password, &overrides.git_password);
        set_text(&mut self.git.committer_name, &overrides.git_committer_name);
        set_text(&mut self.git.committer_mail, &overrides.git_committer_mail);
        set_optional_text(
            &mut self.git.commit_message_suffix,
            &overrides.git_commit_message_suffix,
        );

        set_text(&mut self.tracker.url, &overrides.tracker_url);
        set_text(&mut self.tracker.username, &overrides.tracker_username);
        set_text(&mut self.tracker.password, &overrides.tracker_password);
        set_text(&mut self.tracker.issue_pattern, &overrides.issue_pattern);

        set_list(&mut self.issues.filter_by_type, &overrides.filter_by_type);
        set_list(
            &mut self.issues.filter_by_component,
            &overrides.filter_by_component,
        );
        set_list(&mut self.issues.filter_by_label, &overrides.filter_by_label);
        set_list(&mut self.issues.filter_by_status, &overrides.filter_by_status);
        set_list(&mut self.issues.sort_type, &overrides.sort_type);
        set_list(&mut self.issues.sort_priority, &overrides.sort_priority);

        if let Some(directory) = overrides
            .report_directory
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
        {
            self.report.directory = Some(directory.clone());
        }
    }

    /// Settings for opening or cloning the working copy
    pub fn repository_settings(&self) -> RepositorySettings {
        RepositorySettings {
            directory: self.git.directory.clone(),
            branch: self.git.branch.clone(),
            url: self.git.url.clone().filter(|u| !u.trim().is_empty()),
            credentials: Credentials {
                username: self.git.username.clone(),
                password: self.git.password.clone(),
            },
            committer: Committer {
                name: self.git.committer_name.clone(),
                mail: self.git.committer_mail.clone(),
            },
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "git.directory = {}", self.git.directory.display())?;
        writeln!(f, "git.branch = {}", self.git.branch)?;
        writeln!(f, "git.url = {}", self.git.url.as_deref().unwrap_or(""))?;
        writeln!(f, "git.username = {}", self.git.username)?;
        writeln!(f, "git.password = {}", redact(&self.git.password))?;
        writeln!(f, "git.committer_name = {}", self.git.committer_name)?;
        writeln!(f, "git.committer_mail = {}", self.git.committer_mail)?;
        writeln!(
            f,
            "git.commit_message_suffix = {}",
            self.git.commit_message_suffix.as_deref().unwrap_or("")
        )?;
        writeln!(f, "tracker.url = {}", self.tracker.url)?;
        writeln!(f, "tracker.username = {}", self.tracker.username)?;
        writeln!(f, "tracker.password = {}", redact(&self.tracker.password))?;
        writeln!(f, "tracker.issue_pattern = {}", self.tracker.issue_pattern)?;
        writeln!(f, "issues.filter_by_type = {:?}", self.issues.filter_by_type)?;
        writeln!(
            f,
            "issues.filter_by_component = {:?}",
            self.issues.filter_by_component
        )?;
        writeln!(f, "issues.filter_by_label = {:?}", self.issues.filter_by_label)?;
        writeln!(f, "issues.filter_by_status = {:?}", self.issues.filter_by_status)?;
        writeln!(f, "issues.sort_type = {:?}", self.issues.sort_type)?;
        writeln!(f, "issues.sort_priority = {:?}", self.issues.sort_priority)?;
        write!(
            f,
            "report.directory = {}",
            self.report.resolved_directory().display()
        )
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-notes.toml` in current directory
/// 3. `release-notes.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err(Config)` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let local = Path::new(".").join(CONFIG_FILE);

    let path = if let Some(path) = config_path {
        path.to_path_buf()
    } else if local.exists() {
        local
    } else if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join(CONFIG_FILE);
        if user.exists() {
            user
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path).map_err(|e| {
        ReleaseNotesError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    parse_config(&config_str)
        .map_err(|e| ReleaseNotesError::config(format!("{}: {}", path.display(), e)))
}

/// Parse configuration from TOML text
pub fn parse_config(text: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(text)
}

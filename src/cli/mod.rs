//! Command-line arguments and the end-to-end workflow.

pub mod orchestration;

use std::path::PathBuf;

use crate::config::ConfigOverrides;
use crate::range::RangeSpec;
use orchestration::WorkflowArgs;

#[derive(clap::Parser, Debug)]
#[command(
    name = "release-notes-generator",
    version,
    about = "Generate release notes from git history and issue tracker data"
)]
pub struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        conflicts_with_all = ["tag_start", "tag_end"],
        help = "Commit id delimiting one end of the release"
    )]
    pub commit_start: Option<String>,

    #[arg(
        long,
        conflicts_with_all = ["tag_start", "tag_end"],
        help = "Commit id delimiting the other end of the release"
    )]
    pub commit_end: Option<String>,

    #[arg(long, help = "Tag delimiting one end of the release")]
    pub tag_start: Option<String>,

    #[arg(long, help = "Tag delimiting the other end of the release")]
    pub tag_end: Option<String>,

    #[arg(long, help = "Commit and push the generated report to the repository")]
    pub push: bool,

    #[arg(short, long, help = "Log debug output")]
    pub verbose: bool,

    #[arg(long, help = "Local working copy of the repository")]
    pub git_directory: Option<PathBuf>,

    #[arg(long, help = "Branch to read history from and publish to")]
    pub git_branch: Option<String>,

    #[arg(long, help = "Repository url to clone when no working copy exists")]
    pub git_url: Option<String>,

    #[arg(long, help = "Username for the git remote")]
    pub git_username: Option<String>,

    #[arg(long, help = "Password for the git remote")]
    pub git_password: Option<String>,

    #[arg(long, help = "Committer name of published reports")]
    pub git_committer_name: Option<String>,

    #[arg(long, help = "Committer mail of published reports")]
    pub git_committer_mail: Option<String>,

    #[arg(long, help = "Text appended to the publication commit message")]
    pub git_commit_message_suffix: Option<String>,

    #[arg(long, help = "Issue tracker base url")]
    pub tracker_url: Option<String>,

    #[arg(long, help = "Issue tracker username")]
    pub tracker_username: Option<String>,

    #[arg(long, help = "Issue tracker password")]
    pub tracker_password: Option<String>,

    #[arg(long, help = "Regular expression matching issue keys in commit messages")]
    pub issue_pattern: Option<String>,

    #[arg(long, help = "Comma-separated issue types to keep")]
    pub filter_by_type: Option<String>,

    #[arg(long, help = "Comma-separated components to keep")]
    pub filter_by_component: Option<String>,

    #[arg(long, help = "Comma-separated labels to keep")]
    pub filter_by_label: Option<String>,

    #[arg(long, help = "Comma-separated statuses to keep")]
    pub filter_by_status: Option<String>,

    #[arg(long, help = "Comma-separated issue type order")]
    pub sort_type: Option<String>,

    #[arg(long, help = "Comma-separated priority order")]
    pub sort_priority: Option<String>,

    #[arg(long, help = "Directory the report is written to")]
    pub report_directory: Option<PathBuf>,
}

impl Args {
    /// Configuration values given on the command line
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            git_directory: self.git_directory.clone(),
            git_branch: self.git_branch.clone(),
            git_url: self.git_url.clone(),
            git_username: self.git_username.clone(),
            git_password: self.git_password.clone(),
            git_committer_name: self.git_committer_name.clone(),
            git_committer_mail: self.git_committer_mail.clone(),
            git_commit_message_suffix: self.git_commit_message_suffix.clone(),
            tracker_url: self.tracker_url.clone(),
            tracker_username: self.tracker_username.clone(),
            tracker_password: self.tracker_password.clone(),
            issue_pattern: self.issue_pattern.clone(),
            filter_by_type: self.filter_by_type.clone(),
            filter_by_component: self.filter_by_component.clone(),
            filter_by_label: self.filter_by_label.clone(),
            filter_by_status: self.filter_by_status.clone(),
            sort_type: self.sort_type.clone(),
            sort_priority: self.sort_priority.clone(),
            report_directory: self.report_directory.clone(),
        }
    }

    pub fn workflow_args(&self) -> WorkflowArgs {
        WorkflowArgs {
            range: RangeSpec::from_boundaries(
                self.commit_start.as_deref(),
                self.commit_end.as_deref(),
                self.tag_start.as_deref(),
                self.tag_end.as_deref(),
            ),
            push: self.push,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_tag_range() {
        let args = Args::parse_from([
            "release-notes-generator",
            "--tag-start",
            "1.2",
            "--tag-end",
            "1.3",
            "--push",
        ]);
        let workflow = args.workflow_args();
        assert_eq!(
            workflow.range,
            RangeSpec::Tags(Some("1.2".to_string()), Some("1.3".to_string()))
        );
        assert!(workflow.push);
    }

    #[test]
    fn test_no_boundaries_means_latest() {
        let args = Args::parse_from(["release-notes-generator"]);
        assert_eq!(args.workflow_args().range, RangeSpec::Latest);
        assert!(!args.workflow_args().push);
    }

    #[test]
    fn test_commits_conflict_with_tags() {
        let result = Args::try_parse_from([
            "release-notes-generator",
            "--commit-start",
            "abc",
            "--tag-end",
            "1.3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_override_flags() {
        let args = Args::parse_from([
            "release-notes-generator",
            "--git-branch",
            "develop",
            "--filter-by-type",
            "Bug,Epic",
        ]);
        let overrides = args.overrides();
        assert_eq!(overrides.git_branch.as_deref(), Some("develop"));
        assert_eq!(overrides.filter_by_type.as_deref(), Some("Bug,Epic"));
        assert!(overrides.tracker_url.is_none());
    }
}

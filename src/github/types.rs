//! Typed views of the GitHub REST resources the CLI consumes.
//!
//! Only the fields the commands print or act on are decoded; everything else
//! in a response is ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitHub account.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Login name.
    pub login: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Public email.
    #[serde(default)]
    pub email: Option<String>,
    /// Profile URL.
    #[serde(default)]
    pub html_url: String,
    /// Public repository count.
    #[serde(default)]
    pub public_repos: u64,
    /// Private repository count (authenticated user only).
    #[serde(default)]
    pub total_private_repos: Option<u64>,
}

/// A repository.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// `owner/name`.
    pub full_name: String,
    /// Short name.
    pub name: String,
    /// Description text.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the repository is private.
    #[serde(default)]
    pub private: bool,
    /// Web URL.
    pub html_url: String,
    /// HTTPS clone URL.
    #[serde(default)]
    pub clone_url: String,
    /// SSH clone URL.
    #[serde(default)]
    pub ssh_url: String,
    /// Default branch.
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// A label attached to an issue.
#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    /// Label name.
    pub name: String,
}

/// Marker present on issues that are really pull requests.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestLink {
    /// API URL of the pull request.
    #[serde(default)]
    pub url: Option<String>,
}

/// An issue.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    /// Global id, used for project cards.
    pub id: u64,
    /// Repository-local number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// `open` or `closed`.
    pub state: String,
    /// Body text.
    #[serde(default)]
    pub body: Option<String>,
    /// Author.
    pub user: User,
    /// Assigned users.
    #[serde(default)]
    pub assignees: Vec<User>,
    /// Labels.
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Number of comments.
    #[serde(default)]
    pub comments: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Close time.
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Web URL.
    pub html_url: String,
    /// Set when the issue is a pull request.
    #[serde(default)]
    pub pull_request: Option<PullRequestLink>,
}

impl Issue {
    /// Whether this issue is a pull request in disguise.
    pub(crate) fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// A comment on an issue or pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    /// Comment id.
    pub id: u64,
    /// Author.
    pub user: User,
    /// Body text.
    #[serde(default)]
    pub body: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// An inline review comment on a pull request diff.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewComment {
    /// Comment id.
    pub id: u64,
    /// Author.
    pub user: User,
    /// Body text.
    #[serde(default)]
    pub body: String,
    /// File the comment is attached to.
    pub path: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// One side of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRef {
    /// Branch name.
    #[serde(rename = "ref")]
    pub branch: String,
    /// `owner:branch` label.
    #[serde(default)]
    pub label: String,
    /// Commit SHA.
    pub sha: String,
}

/// A pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    /// Global id, used for project cards.
    pub id: u64,
    /// Repository-local number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// `open` or `closed`.
    pub state: String,
    /// Body text.
    #[serde(default)]
    pub body: Option<String>,
    /// Author.
    pub user: User,
    /// Source branch.
    pub head: PullRef,
    /// Target branch.
    pub base: PullRef,
    /// Whether the pull request was merged.
    #[serde(default)]
    pub merged: bool,
    /// Whether GitHub can merge it cleanly.
    #[serde(default)]
    pub mergeable: Option<bool>,
    /// Draft flag.
    #[serde(default)]
    pub draft: bool,
    /// Commit count.
    #[serde(default)]
    pub commits: u64,
    /// Added lines.
    #[serde(default)]
    pub additions: u64,
    /// Removed lines.
    #[serde(default)]
    pub deletions: u64,
    /// Changed files.
    #[serde(default)]
    pub changed_files: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Merge time.
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    /// Web URL.
    pub html_url: String,
}

/// Author details of a commit.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    /// Author name.
    pub name: String,
    /// Author date.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Git-level commit data.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    /// Commit message.
    pub message: String,
    /// Author.
    pub author: CommitAuthor,
}

/// A commit on a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    /// Full SHA.
    pub sha: String,
    /// Git-level data.
    pub commit: CommitDetail,
}

/// A file inside a gist.
#[derive(Debug, Clone, Deserialize)]
pub struct GistFile {
    /// File name.
    pub filename: String,
    /// Detected language.
    #[serde(default)]
    pub language: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Raw content URL.
    #[serde(default)]
    pub raw_url: Option<String>,
    /// Content, present on single-gist responses unless truncated.
    #[serde(default)]
    pub content: Option<String>,
    /// Whether `content` was truncated.
    #[serde(default)]
    pub truncated: bool,
}

/// A gist.
#[derive(Debug, Clone, Deserialize)]
pub struct Gist {
    /// Gist id.
    pub id: String,
    /// Description text.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the gist is public.
    pub public: bool,
    /// Files keyed by name.
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
    /// Owner.
    #[serde(default)]
    pub owner: Option<User>,
    /// Number of comments.
    #[serde(default)]
    pub comments: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Web URL.
    pub html_url: String,
}

/// A comment on a gist.
#[derive(Debug, Clone, Deserialize)]
pub struct GistComment {
    /// Comment id.
    pub id: u64,
    /// Author.
    pub user: User,
    /// Body text.
    pub body: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// An uploaded release asset.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Asset id.
    pub id: u64,
    /// File name.
    pub name: String,
    /// Optional label.
    #[serde(default)]
    pub label: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Download URL.
    pub browser_download_url: String,
}

/// A release.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Release id.
    pub id: u64,
    /// Tag the release points at.
    pub tag_name: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Body text.
    #[serde(default)]
    pub body: Option<String>,
    /// Draft flag.
    #[serde(default)]
    pub draft: bool,
    /// Prerelease flag.
    #[serde(default)]
    pub prerelease: bool,
    /// Web URL.
    pub html_url: String,
    /// Upload URL template for assets.
    pub upload_url: String,
    /// Attached assets.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// An Actions workflow definition.
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    /// Workflow id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Path of the workflow file.
    pub path: String,
    /// `active` or a disabled state.
    pub state: String,
    /// Web URL.
    #[serde(default)]
    pub html_url: String,
}

/// A single execution of a workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    /// Run id.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Workflow this run belongs to.
    pub workflow_id: u64,
    /// `queued`, `in_progress`, `completed`, ...
    pub status: String,
    /// Outcome once completed.
    #[serde(default)]
    pub conclusion: Option<String>,
    /// Branch the run was triggered on.
    #[serde(default)]
    pub head_branch: Option<String>,
    /// Commit the run was triggered on.
    pub head_sha: String,
    /// Triggering event.
    #[serde(default)]
    pub event: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Web URL.
    pub html_url: String,
}

/// Status value GitHub reports for finished runs.
pub const RUN_COMPLETED: &str = "completed";

impl WorkflowRun {
    /// Whether the run has reached its terminal status.
    pub(crate) fn is_completed(&self) -> bool {
        self.status == RUN_COMPLETED
    }
}

/// A step within a job.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Step name.
    pub name: String,
    /// Status.
    pub status: String,
    /// Outcome.
    #[serde(default)]
    pub conclusion: Option<String>,
    /// Position within the job.
    pub number: u64,
}

/// A job within a workflow run.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    /// Job id.
    pub id: u64,
    /// Job name.
    pub name: String,
    /// Status.
    pub status: String,
    /// Outcome.
    #[serde(default)]
    pub conclusion: Option<String>,
    /// Start time.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Completion time.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Steps.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A repository Actions secret (value never returned).
#[derive(Debug, Clone, Deserialize)]
pub struct Secret {
    /// Secret name.
    pub name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Repository public key used to seal secrets.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicKey {
    /// Key id echoed back on upload.
    pub key_id: String,
    /// Base64-encoded Curve25519 key.
    pub key: String,
}

/// An Actions cache entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionsCache {
    /// Cache id.
    pub id: u64,
    /// Cache key.
    pub key: String,
    /// Git ref the cache was created for.
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    /// Size in bytes.
    #[serde(default)]
    pub size_in_bytes: u64,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last access time.
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

/// A classic project board.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// Project id.
    pub id: u64,
    /// Board number within the repository.
    #[serde(default)]
    pub number: u64,
    /// Name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub body: Option<String>,
    /// `open` or `closed`.
    pub state: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Web URL.
    pub html_url: String,
}

/// A column on a project board.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectColumn {
    /// Column id.
    pub id: u64,
    /// Column name.
    pub name: String,
}

/// A card in a project column.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectCard {
    /// Card id.
    pub id: u64,
    /// Free-text note, for note cards.
    #[serde(default)]
    pub note: Option<String>,
    /// API URL of the linked issue or pull request.
    #[serde(default)]
    pub content_url: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// What a notification is about.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSubject {
    /// Subject title.
    pub title: String,
    /// `Issue`, `PullRequest`, `Release`, ...
    #[serde(rename = "type")]
    pub kind: String,
    /// API URL of the subject.
    #[serde(default)]
    pub url: Option<String>,
}

/// Repository a notification belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRepository {
    /// `owner/name`.
    pub full_name: String,
    /// Web URL.
    #[serde(default)]
    pub html_url: String,
}

/// A notification thread.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    /// Thread id.
    pub id: String,
    /// Whether the thread is unread.
    pub unread: bool,
    /// Why the user was notified.
    pub reason: String,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Subject.
    pub subject: NotificationSubject,
    /// Repository.
    pub repository: NotificationRepository,
}

/// Paged envelope for workflow listings.
#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowList {
    /// Workflows on this page.
    pub workflows: Vec<Workflow>,
}

/// Paged envelope for run listings.
#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRunList {
    /// Runs on this page.
    pub workflow_runs: Vec<WorkflowRun>,
}

/// Paged envelope for job listings.
#[derive(Debug, Deserialize)]
pub(crate) struct JobList {
    /// Jobs on this page.
    pub jobs: Vec<Job>,
}

/// Paged envelope for secret listings.
#[derive(Debug, Deserialize)]
pub(crate) struct SecretList {
    /// Secrets on this page.
    pub secrets: Vec<Secret>,
}

/// Paged envelope for cache listings.
#[derive(Debug, Deserialize)]
pub(crate) struct CacheList {
    /// Caches on this page.
    pub actions_caches: Vec<ActionsCache>,
}

/// File payload for gist create/update requests.
#[derive(Debug, Clone, Serialize)]
pub struct GistFileContent {
    /// New file content.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::{Issue, WorkflowRun};

    #[test]
    fn decodes_issue_pull_request_marker() {
        let json = r#"{
            "id": 1, "number": 7, "title": "t", "state": "open",
            "user": {"login": "octo"},
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "html_url": "https://github.com/o/r/pull/7",
            "pull_request": {"url": "https://api.github.com/repos/o/r/pulls/7"}
        }"#;
        let issue: Issue = serde_json::from_str(json).expect("decode");
        assert!(issue.is_pull_request());
        assert!(issue.labels.is_empty());
    }

    #[test]
    fn decodes_run_without_conclusion() {
        let json = r#"{
            "id": 5, "workflow_id": 9, "status": "in_progress", "conclusion": null,
            "head_sha": "abc", "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z", "html_url": "u"
        }"#;
        let run: WorkflowRun = serde_json::from_str(json).expect("decode");
        assert!(!run.is_completed());
        assert!(run.conclusion.is_none());
    }
}

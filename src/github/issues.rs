use serde::Serialize;

use crate::{
    error::Result,
    github::{
        GitHubClient, RepoName,
        types::{Issue, IssueComment},
    },
};

/// Filters for listing issues.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    /// `open`, `closed`, or `all`.
    pub state: String,
    /// Label names that must all be present.
    pub labels: Vec<String>,
    /// Assignee login.
    pub assignee: Option<String>,
    /// Maximum number of issues to return.
    pub limit: Option<usize>,
}

/// Body for creating an issue.
#[derive(Debug, Serialize)]
pub struct NewIssue<'a> {
    /// Title.
    pub title: &'a str,
    /// Body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a str>,
    /// Label names.
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub labels: &'a [String],
    /// Assignee logins.
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub assignees: &'a [String],
}

impl GitHubClient {
    /// List issues, excluding pull requests.
    pub(crate) async fn list_issues(
        &self,
        repo: &RepoName,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>> {
        let mut query = vec![("state", filter.state.clone())];
        if !filter.labels.is_empty() {
            query.push(("labels", filter.labels.join(",")));
        }
        if let Some(assignee) = &filter.assignee {
            query.push(("assignee", assignee.clone()));
        }
        let path = format!("{}/issues", repo.path());
        // The limit applies after pull requests are dropped, so page unbounded.
        let issues: Vec<Issue> = self.get_pages(&path, &query, None).await?;
        let mut issues: Vec<Issue> = issues
            .into_iter()
            .filter(|issue| !issue.is_pull_request())
            .collect();
        if let Some(limit) = filter.limit {
            issues.truncate(limit);
        }
        Ok(issues)
    }

    /// Fetch one issue (which may turn out to be a pull request).
    pub(crate) async fn issue(&self, repo: &RepoName, number: u64) -> Result<Issue> {
        self.get(&format!("{}/issues/{number}", repo.path())).await
    }

    /// Create an issue.
    pub(crate) async fn create_issue(&self, repo: &RepoName, issue: &NewIssue<'_>) -> Result<Issue> {
        self.post(&format!("{}/issues", repo.path()), issue).await
    }

    /// All comments on an issue or pull request conversation.
    pub(crate) async fn issue_comments(
        &self,
        repo: &RepoName,
        number: u64,
    ) -> Result<Vec<IssueComment>> {
        let path = format!("{}/issues/{number}/comments", repo.path());
        self.get_pages(&path, &[], None).await
    }
}

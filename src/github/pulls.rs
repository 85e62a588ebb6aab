use serde::Serialize;

use crate::{
    error::Result,
    github::{
        GitHubClient, RepoName,
        types::{Commit, PullRequest, ReviewComment},
    },
};

/// Filters for listing pull requests.
#[derive(Debug, Clone, Default)]
pub struct PullFilter {
    /// `open`, `closed`, or `all`.
    pub state: String,
    /// Base branch name.
    pub base: Option<String>,
    /// Head branch, as `user:branch` or a bare branch name.
    pub head: Option<String>,
    /// Maximum number of pull requests to return.
    pub limit: Option<usize>,
}

/// Body for opening a pull request.
#[derive(Debug, Serialize)]
pub struct NewPullRequest<'a> {
    /// Title.
    pub title: &'a str,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a str>,
    /// Source branch.
    pub head: &'a str,
    /// Target branch.
    pub base: &'a str,
}

impl GitHubClient {
    /// List pull requests.
    pub(crate) async fn list_pulls(
        &self,
        repo: &RepoName,
        filter: &PullFilter,
    ) -> Result<Vec<PullRequest>> {
        let mut query = vec![("state", filter.state.clone())];
        if let Some(base) = &filter.base {
            query.push(("base", base.clone()));
        }
        if let Some(head) = &filter.head {
            let head = if head.contains(':') {
                head.clone()
            } else {
                format!("{}:{head}", repo.owner)
            };
            query.push(("head", head));
        }
        let path = format!("{}/pulls", repo.path());
        self.get_pages(&path, &query, filter.limit).await
    }

    /// Fetch one pull request.
    pub(crate) async fn pull(&self, repo: &RepoName, number: u64) -> Result<PullRequest> {
        self.get(&format!("{}/pulls/{number}", repo.path())).await
    }

    /// Open a pull request.
    pub(crate) async fn create_pull(
        &self,
        repo: &RepoName,
        pull: &NewPullRequest<'_>,
    ) -> Result<PullRequest> {
        self.post(&format!("{}/pulls", repo.path()), pull).await
    }

    /// Commits on a pull request.
    pub(crate) async fn pull_commits(&self, repo: &RepoName, number: u64) -> Result<Vec<Commit>> {
        let path = format!("{}/pulls/{number}/commits", repo.path());
        self.get_pages(&path, &[], None).await
    }

    /// Inline review comments on a pull request.
    pub(crate) async fn pull_review_comments(
        &self,
        repo: &RepoName,
        number: u64,
    ) -> Result<Vec<ReviewComment>> {
        let path = format!("{}/pulls/{number}/comments", repo.path());
        self.get_pages(&path, &[], None).await
    }
}

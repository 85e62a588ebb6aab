use reqwest::Method;
use serde::Serialize;
use serde_json::json;

use crate::{
    error::Result,
    github::{GitHubClient, RepoName, types::Repository},
};

/// Body for `POST /user/repos`.
#[derive(Debug, Serialize)]
struct CreateRepository<'a> {
    /// Repository name.
    name: &'a str,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    /// Visibility.
    private: bool,
    /// Create an initial commit so the repository can be cloned at once.
    auto_init: bool,
}

impl GitHubClient {
    /// Create a repository under the authenticated account.
    pub(crate) async fn create_repository(
        &self,
        name: &str,
        description: Option<&str>,
        private: bool,
    ) -> Result<Repository> {
        let body = CreateRepository {
            name,
            description,
            private,
            auto_init: true,
        };
        self.post("/user/repos", &body).await
    }

    /// Fork a repository into the authenticated account.
    pub(crate) async fn fork_repository(&self, repo: &RepoName) -> Result<Repository> {
        let path = format!("{}/forks", repo.path());
        self.post(&path, &json!({})).await
    }

    /// Invite a collaborator with the given permission.
    pub(crate) async fn add_collaborator(
        &self,
        repo: &RepoName,
        username: &str,
        permission: &str,
    ) -> Result<()> {
        let path = format!("{}/collaborators/{username}", repo.path());
        self.send_json(Method::PUT, &path, &json!({ "permission": permission }))
            .await
    }

    /// Remove a collaborator.
    pub(crate) async fn remove_collaborator(&self, repo: &RepoName, username: &str) -> Result<()> {
        let path = format!("{}/collaborators/{username}", repo.path());
        self.delete(&path).await
    }

    /// Download the repository zipball at `git_ref` (default branch when unset).
    pub(crate) async fn zipball(
        &self,
        repo: &RepoName,
        git_ref: Option<&str>,
        max: u64,
    ) -> Result<Vec<u8>> {
        let path = match git_ref {
            Some(reference) => format!("{}/zipball/{reference}", repo.path()),
            None => format!("{}/zipball", repo.path()),
        };
        self.download(&path, max).await
    }
}

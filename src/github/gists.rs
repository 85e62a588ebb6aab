use std::collections::BTreeMap;

use reqwest::Method;
use serde::Serialize;
use serde_json::json;

use crate::{
    error::Result,
    github::{
        GitHubClient,
        types::{Gist, GistComment, GistFileContent},
    },
};

/// Upper bound for a single raw gist file fetched on download.
const MAX_RAW_FILE: u64 = 10 * 1024 * 1024;

/// Body for creating a gist.
#[derive(Debug, Serialize)]
struct CreateGist<'a> {
    /// Description text.
    description: &'a str,
    /// Visibility.
    public: bool,
    /// Files keyed by name.
    files: &'a BTreeMap<String, GistFileContent>,
}

/// Body for editing a gist. A `None` file entry deletes that file.
#[derive(Debug, Serialize)]
struct UpdateGist<'a> {
    /// New description, when changing it.
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    /// Files to add, replace, or delete.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    files: &'a BTreeMap<String, Option<GistFileContent>>,
}

impl GitHubClient {
    /// Gists owned by (or starred by) the authenticated user.
    pub(crate) async fn list_gists(&self, starred: bool, limit: Option<usize>) -> Result<Vec<Gist>> {
        let path = if starred { "/gists/starred" } else { "/gists" };
        self.get_pages(path, &[], limit).await
    }

    /// Fetch one gist with file contents.
    pub(crate) async fn gist(&self, id: &str) -> Result<Gist> {
        self.get(&format!("/gists/{id}")).await
    }

    /// Create a gist.
    pub(crate) async fn create_gist(
        &self,
        description: &str,
        public: bool,
        files: &BTreeMap<String, GistFileContent>,
    ) -> Result<Gist> {
        let body = CreateGist {
            description,
            public,
            files,
        };
        self.post("/gists", &body).await
    }

    /// Edit a gist's description and files.
    pub(crate) async fn update_gist(
        &self,
        id: &str,
        description: Option<&str>,
        files: &BTreeMap<String, Option<GistFileContent>>,
    ) -> Result<Gist> {
        let body = UpdateGist { description, files };
        self.patch(&format!("/gists/{id}"), &body).await
    }

    /// Delete a gist.
    pub(crate) async fn delete_gist(&self, id: &str) -> Result<()> {
        self.delete(&format!("/gists/{id}")).await
    }

    /// Star a gist.
    pub(crate) async fn star_gist(&self, id: &str) -> Result<()> {
        self.call(Method::PUT, &format!("/gists/{id}/star")).await
    }

    /// Remove a star.
    pub(crate) async fn unstar_gist(&self, id: &str) -> Result<()> {
        self.delete(&format!("/gists/{id}/star")).await
    }

    /// Whether the authenticated user starred a gist.
    pub(crate) async fn is_gist_starred(&self, id: &str) -> Result<bool> {
        self.check(&format!("/gists/{id}/star")).await
    }

    /// Comments on a gist.
    pub(crate) async fn gist_comments(&self, id: &str) -> Result<Vec<GistComment>> {
        self.get_pages(&format!("/gists/{id}/comments"), &[], None)
            .await
    }

    /// Comment on a gist.
    pub(crate) async fn add_gist_comment(&self, id: &str, body: &str) -> Result<GistComment> {
        self.post(&format!("/gists/{id}/comments"), &json!({ "body": body }))
            .await
    }

    /// Delete a gist comment.
    pub(crate) async fn delete_gist_comment(&self, id: &str, comment_id: u64) -> Result<()> {
        self.delete(&format!("/gists/{id}/comments/{comment_id}"))
            .await
    }

    /// Fork a gist into the authenticated account.
    pub(crate) async fn fork_gist(&self, id: &str) -> Result<Gist> {
        self.post(&format!("/gists/{id}/forks"), &json!({})).await
    }

    /// Fetch a file's raw content when the gist response truncated it.
    pub(crate) async fn gist_raw_file(&self, raw_url: &str) -> Result<Vec<u8>> {
        self.download(raw_url, MAX_RAW_FILE).await
    }
}

//! GitHub REST client.
//!
//! [`GitHubClient`] wraps a `reqwest::Client` with the bearer token and base
//! URL, maps non-success responses to [`Error::Api`], and decodes bodies into
//! the DTOs in [`types`]. Endpoint groups live in sibling modules as further
//! `impl GitHubClient` blocks.

use std::fmt;

use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Actions workflows, runs, secrets, and caches.
pub mod actions;
/// Gists, gist comments, and stars.
pub mod gists;
/// Issues and issue comments.
pub mod issues;
/// Notification threads.
pub mod notifications;
/// OAuth authorize URL and code exchange.
pub mod oauth;
/// Classic project boards, columns, and cards.
pub mod projects;
/// Pull requests.
pub mod pulls;
/// Releases and release assets.
pub mod releases;
/// Repositories, forks, and collaborators.
pub mod repos;
/// Response DTOs.
pub mod types;
/// Authenticated user.
pub mod users;

/// Media type GitHub recommends for REST calls.
const GITHUB_JSON: &str = "application/vnd.github+json";
/// Page size requested from list endpoints.
const PER_PAGE: usize = 100;

/// Authenticated client for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    /// Shared HTTP client.
    http: Client,
    /// API base URL without a trailing slash.
    base_url: String,
}

/// A parsed `owner/repo` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoName {
    /// Account or organization.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl RepoName {
    /// Parse `owner/repo`.
    pub(crate) fn parse(value: &str) -> Result<Self> {
        let mut parts = value.trim().split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(Error::InvalidRepo {
                value: value.to_string(),
            }),
        }
    }

    /// API path prefix for repository-scoped endpoints.
    pub(crate) fn path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl GitHubClient {
    /// Build a client for `base_url` authenticating with `token`.
    pub(crate) fn new(base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::InvalidToken)?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent())
            .build()
            .map_err(|source| Error::Http {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve an API path or pass through an absolute URL.
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Start a request against an API path.
    fn request(&self, method: Method, path: &str) -> (RequestBuilder, String) {
        let url = self.url(path);
        debug!(%method, %url, "github request");
        (self.http.request(method, &url), url)
    }

    /// Send a request and turn a non-success status into an error.
    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response> {
        let response = builder.send().await.map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(api_error(status, &body))
    }

    /// Decode a JSON response body.
    async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
        let bytes = response.bytes().await.map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|error| Error::Decode {
            url: url.to_string(),
            message: error.to_string(),
        })
    }

    /// GET a single resource.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_query(path, &[]).await
    }

    /// GET a single resource with query parameters.
    pub(crate) async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let (builder, url) = self.request(Method::GET, path);
        let response = self.send(builder.query(query), &url).await?;
        Self::decode(response, &url).await
    }

    /// GET every page of a list endpoint, stopping at `limit` items.
    pub(crate) async fn get_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        limit: Option<usize>,
    ) -> Result<Vec<T>> {
        self.get_pages_with(path, query, limit, |page: Vec<T>| page)
            .await
    }

    /// Paged GET where each page is an envelope that `unwrap` opens.
    pub(crate) async fn get_pages_with<P, T, F>(
        &self,
        path: &str,
        query: &[(&str, String)],
        limit: Option<usize>,
        unwrap: F,
    ) -> Result<Vec<T>>
    where
        P: DeserializeOwned,
        F: Fn(P) -> Vec<T>,
    {
        let mut items = Vec::new();
        let mut page = 1_usize;
        loop {
            let mut params = query.to_vec();
            params.push(("per_page", PER_PAGE.to_string()));
            params.push(("page", page.to_string()));
            let batch = unwrap(self.get_query::<P>(path, &params).await?);
            let fetched = batch.len();
            items.extend(batch);
            if let Some(max) = limit
                && items.len() >= max
            {
                items.truncate(max);
                break;
            }
            if fetched < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    /// POST a JSON body and decode the response.
    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let (builder, url) = self.request(Method::POST, path);
        let response = self.send(builder.json(body), &url).await?;
        Self::decode(response, &url).await
    }

    /// Send a JSON body and ignore the response content.
    pub(crate) async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<()> {
        let (builder, url) = self.request(method, path);
        self.send(builder.json(body), &url).await?;
        Ok(())
    }

    /// PATCH a JSON body and decode the response.
    pub(crate) async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let (builder, url) = self.request(Method::PATCH, path);
        let response = self.send(builder.json(body), &url).await?;
        Self::decode(response, &url).await
    }

    /// Issue a bodiless request whose response content is not needed.
    pub(crate) async fn call(&self, method: Method, path: &str) -> Result<()> {
        self.call_query(method, path, &[]).await
    }

    /// Bodiless request with query parameters.
    pub(crate) async fn call_query(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<()> {
        let (builder, url) = self.request(method, path);
        let builder = if query.is_empty() {
            builder
        } else {
            builder.query(query)
        };
        self.send(builder, &url).await?;
        Ok(())
    }

    /// DELETE a resource.
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        self.call(Method::DELETE, path).await
    }

    /// GET that reports a 404 as `false` and 204 as `true`.
    pub(crate) async fn check(&self, path: &str) -> Result<bool> {
        let (builder, url) = self.request(Method::GET, path);
        match self.send(builder, &url).await {
            Ok(_) => Ok(true),
            Err(Error::Api { status, .. }) if status == StatusCode::NOT_FOUND => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Upload raw bytes to an absolute URL and decode the response.
    pub(crate) async fn upload<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<T> {
        let (builder, url) = self.request(Method::POST, url);
        let builder = builder
            .query(query)
            .header("Content-Type", content_type)
            .body(data);
        let response = self.send(builder, &url).await?;
        Self::decode(response, &url).await
    }

    /// Download raw bytes (zipballs, redirects followed), capped at `max` bytes.
    pub(crate) async fn download(&self, path: &str, max: u64) -> Result<Vec<u8>> {
        let (builder, url) = self.request(Method::GET, path);
        let response = self.send(builder, &url).await?;
        read_capped(response, &url, max).await
    }
}

/// User agent sent with every request.
pub fn user_agent() -> String {
    format!("hubqueue/{}", env!("CARGO_PKG_VERSION"))
}

/// Read a response body, failing when it exceeds `max` bytes.
pub async fn read_capped(response: Response, url: &str, max: u64) -> Result<Vec<u8>> {
    if let Some(len) = response.content_length()
        && len > max
    {
        return Err(Error::FileTooLarge { size: len, max });
    }
    let bytes = response.bytes().await.map_err(|error| Error::Download {
        url: url.to_string(),
        message: error.to_string(),
    })?;
    if bytes.len() as u64 > max {
        return Err(Error::FileTooLarge {
            size: bytes.len() as u64,
            max,
        });
    }
    Ok(bytes.to_vec())
}

/// Build an error from a failed response body.
fn api_error(status: StatusCode, body: &str) -> Error {
    if status == StatusCode::UNAUTHORIZED {
        return Error::InvalidToken;
    }
    Error::Api {
        status,
        message: error_message(status, body),
    }
}

/// Extract GitHub's `message` (plus any validation details) from a body.
fn error_message(status: StatusCode, body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            trimmed.to_string()
        };
    };
    let mut message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("request failed")
        .to_string();
    let details: Vec<String> = value
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|entry| {
                    entry
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .or_else(|| entry.get("code").and_then(Value::as_str).map(str::to_string))
                })
                .collect()
        })
        .unwrap_or_default();
    if !details.is_empty() {
        message = format!("{message} ({})", details.join("; "));
    }
    message
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{RepoName, api_error, error_message};
    use crate::error::Error;

    #[test]
    fn parses_owner_repo() {
        let name = RepoName::parse("octo/hello").expect("parse");
        assert_eq!(name.owner, "octo");
        assert_eq!(name.path(), "/repos/octo/hello");
        assert_eq!(name.to_string(), "octo/hello");
    }

    #[test]
    fn rejects_malformed_repo() {
        for value in ["octo", "octo/", "/hello", "a/b/c"] {
            let error = RepoName::parse(value).expect_err("should fail");
            assert!(matches!(error, Error::InvalidRepo { .. }), "{value}");
        }
    }

    #[test]
    fn extracts_validation_details() {
        let body = r#"{"message":"Validation Failed","errors":[{"message":"name already exists on this account"}]}"#;
        let message = error_message(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(
            message,
            "Validation Failed (name already exists on this account)"
        );
    }

    #[test]
    fn unauthorized_is_invalid_token() {
        let error = api_error(StatusCode::UNAUTHORIZED, r#"{"message":"Bad credentials"}"#);
        assert!(matches!(error, Error::InvalidToken));
    }

    #[test]
    fn empty_body_uses_reason() {
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }
}

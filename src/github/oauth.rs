//! Web-application OAuth flow: authorize URL and code exchange.

use reqwest::{Client, header::ACCEPT};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::user_agent;
use crate::error::{Error, Result};

/// Page the user visits to grant access.
const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// Endpoint that trades a code for a token.
pub const ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Scopes requested by `auth oauth`.
pub const SCOPES: &str = "repo,user,gist";

/// Body of the code exchange.
#[derive(Debug, Serialize)]
struct CodeExchange<'a> {
    /// OAuth app client id.
    client_id: &'a str,
    /// OAuth app client secret.
    client_secret: &'a str,
    /// Code from the redirect.
    code: &'a str,
}

/// Reply to the code exchange; GitHub answers 200 even on failure.
#[derive(Debug, Deserialize)]
struct TokenReply {
    /// Granted token.
    #[serde(default)]
    access_token: Option<String>,
    /// Error code.
    #[serde(default)]
    error: Option<String>,
    /// Error detail.
    #[serde(default)]
    error_description: Option<String>,
}

/// URL the user opens to authorize the app.
pub fn authorize_url(client_id: &str) -> Result<String> {
    let url = Url::parse_with_params(AUTHORIZE_URL, &[("client_id", client_id), ("scope", SCOPES)])
        .map_err(|_| Error::InvalidUrl {
            url: AUTHORIZE_URL.to_string(),
        })?;
    Ok(url.to_string())
}

/// Exchange an authorization code for an access token.
pub async fn exchange_code(
    endpoint: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<String> {
    let http = |source| Error::Http {
        url: endpoint.to_string(),
        source,
    };
    let client = Client::builder().user_agent(user_agent()).build().map_err(http)?;
    let response = client
        .post(endpoint)
        .header(ACCEPT, "application/json")
        .json(&CodeExchange {
            client_id,
            client_secret,
            code: code.trim(),
        })
        .send()
        .await
        .map_err(http)?;
    if !response.status().is_success() {
        return Err(Error::OAuth {
            message: format!("server returned {}", response.status()),
        });
    }
    let reply: TokenReply = response.json().await.map_err(|error| Error::Decode {
        url: endpoint.to_string(),
        message: error.to_string(),
    })?;
    token_from_reply(reply).inspect(|_| info!("oauth code exchanged"))
}

/// Pull the token out of a reply, or describe why there is none.
fn token_from_reply(reply: TokenReply) -> Result<String> {
    match reply.access_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(Error::OAuth {
            message: reply
                .error_description
                .or(reply.error)
                .unwrap_or_else(|| "no access token in response".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{TokenReply, authorize_url, token_from_reply};
    use crate::error::Error;

    #[test]
    fn authorize_url_carries_client_and_scopes() {
        let url = authorize_url("abc123").expect("url");
        assert_eq!(
            url,
            "https://github.com/login/oauth/authorize?client_id=abc123&scope=repo%2Cuser%2Cgist"
        );
    }

    #[test]
    fn error_reply_becomes_oauth_error() {
        let reply: TokenReply = serde_json::from_str(
            r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#,
        )
        .expect("decode");
        let error = token_from_reply(reply).expect_err("no token");
        assert!(
            matches!(error, Error::OAuth { message } if message.starts_with("The code passed"))
        );

        let reply: TokenReply =
            serde_json::from_str(r#"{"access_token":"gho_x","token_type":"bearer"}"#)
                .expect("decode");
        assert_eq!(token_from_reply(reply).expect("token"), "gho_x");
    }
}

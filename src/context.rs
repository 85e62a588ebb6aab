//! Runtime settings shared by every command.

use crate::{
    commands::ColorChoice,
    config::Config,
    error::{Error, Result},
    github::{GitHubClient, RepoName},
};

/// Settings resolved once from the command line and handed to commands.
#[derive(Debug)]
pub struct Context {
    /// Color selection for stdout.
    color: ColorChoice,
    /// Token from `--token` or `GITHUB_TOKEN`.
    token: Option<String>,
    /// Loaded configuration record.
    config: Config,
}

impl Context {
    /// Build a context, loading the configuration from its default location.
    pub(crate) fn load(color: ColorChoice, token: Option<String>) -> Result<Self> {
        Ok(Self::with_config(color, token, Config::load()?))
    }

    /// Build a context around an already loaded configuration.
    pub(crate) fn with_config(color: ColorChoice, token: Option<String>, config: Config) -> Self {
        Self {
            color,
            token: token.filter(|token| !token.trim().is_empty()),
            config,
        }
    }

    /// Whether stdout output should be colorized.
    pub(crate) fn use_color(&self) -> bool {
        self.color.enabled()
    }

    /// Loaded configuration.
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Loaded configuration, for commands that change it.
    pub(crate) fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Token from the flag or environment, then from the config file.
    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref().or_else(|| self.config.token())
    }

    /// Authenticated API client.
    pub(crate) fn client(&self) -> Result<GitHubClient> {
        let token = self.token().ok_or(Error::MissingToken)?;
        GitHubClient::new(&self.config.api_url(), token)
    }

    /// Repository from `--repo`, falling back to the `default_repo` preference.
    pub(crate) fn repo(&self, explicit: Option<&str>) -> Result<RepoName> {
        match explicit.or_else(|| self.config.default_repo()) {
            Some(value) => RepoName::parse(value),
            None => Err(Error::RepoNotSpecified),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::Value;
    use tempfile::tempdir;

    use super::Context;
    use crate::{
        commands::ColorChoice,
        config::{Config, DEFAULT_REPO_PREF},
        error::Error,
    };

    fn context(dir: &Path, token: Option<&str>) -> Context {
        let config = Config::load_from(&dir.join("config.json")).expect("load");
        Context::with_config(ColorChoice::Never, token.map(str::to_string), config)
    }

    #[test]
    fn flag_token_wins_over_config() {
        let dir = tempdir().expect("tempdir");
        let mut ctx = context(dir.path(), Some("from-flag"));
        ctx.config_mut().set_token("from-config").expect("save");
        assert_eq!(ctx.token(), Some("from-flag"));

        let ctx = context(dir.path(), Some("  "));
        assert_eq!(ctx.token(), Some("from-config"));
    }

    #[test]
    fn missing_token_is_a_credential_error() {
        let dir = tempdir().expect("tempdir");
        let ctx = context(dir.path(), None);
        assert!(matches!(ctx.client(), Err(Error::MissingToken)));
    }

    #[test]
    fn repo_falls_back_to_default_preference() {
        let dir = tempdir().expect("tempdir");
        let mut ctx = context(dir.path(), None);
        assert!(matches!(ctx.repo(None), Err(Error::RepoNotSpecified)));

        ctx.config_mut()
            .set_preference(DEFAULT_REPO_PREF, Value::from("octo/cat"))
            .expect("save");
        assert_eq!(ctx.repo(None).expect("default").to_string(), "octo/cat");
        assert_eq!(ctx.repo(Some("a/b")).expect("explicit").owner, "a");
        assert!(matches!(
            ctx.repo(Some("nope")),
            Err(Error::InvalidRepo { .. })
        ));
    }
}

//! Configuration loading and persistence.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use crate::{
    error::{Error, Result},
    paths,
};

/// Top-level key holding the saved GitHub token.
const TOKEN_KEY: &str = "github_token";
/// Top-level key holding user preferences.
const PREFERENCES_KEY: &str = "preferences";
/// Preference naming the default `owner/repo`.
pub const DEFAULT_REPO_PREF: &str = "default_repo";
/// Preference naming the editor command.
pub const EDITOR_PREF: &str = "editor";
/// Preference overriding the templates root.
pub const TEMPLATES_DIR_PREF: &str = "templates_dir";
/// Preference overriding the API base URL.
pub const API_URL_PREF: &str = "api_url";
/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "HUBQUEUE_API_URL";
/// Public GitHub API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Editors probed on `PATH` when nothing is configured.
const FALLBACK_EDITORS: [&str; 4] = ["nano", "vim", "vi", "emacs"];

/// The persisted configuration record.
///
/// The record is kept as a JSON object so keys this tool does not know about
/// survive a load/save cycle.
#[derive(Debug, Clone)]
pub struct Config {
    /// File the record was loaded from and is saved to.
    path: PathBuf,
    /// Raw JSON object.
    root: Map<String, Value>,
}

impl Config {
    /// Load the default config from disk.
    pub(crate) fn load() -> Result<Self> {
        let path = paths::default_config_path()?;
        Self::load_from(&path)
    }

    /// Load a config file from an explicit path. A missing file reads as empty.
    pub(crate) fn load_from(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Ok(Self {
                    path: path.to_path_buf(),
                    root: Map::new(),
                });
            }
            Err(error) => {
                return Err(Error::ConfigRead {
                    path: path.to_path_buf(),
                    source: error,
                });
            }
        };

        let root = if contents.trim().is_empty() {
            Map::new()
        } else {
            serde_json::from_str(&contents).map_err(|error| Error::ConfigParse {
                path: path.to_path_buf(),
                source: error,
            })?
        };
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    /// Rewrite the whole file with the current record.
    pub(crate) fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| Error::ConfigWrite {
                path: self.path.clone(),
                source: error,
            })?;
        }
        let mut text = serde_json::to_string_pretty(&self.root).map_err(|error| {
            Error::ConfigParse {
                path: self.path.clone(),
                source: error,
            }
        })?;
        text.push('\n');
        fs::write(&self.path, text).map_err(|error| Error::ConfigWrite {
            path: self.path.clone(),
            source: error,
        })
    }

    /// Path of the backing file.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Saved GitHub token, if any.
    pub(crate) fn token(&self) -> Option<&str> {
        self.root
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
    }

    /// Store a token and persist the record.
    pub(crate) fn set_token(&mut self, token: &str) -> Result<()> {
        self.root
            .insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.save()
    }

    /// Remove the saved token. Returns false when there was nothing to remove.
    pub(crate) fn clear_token(&mut self) -> Result<bool> {
        if self.root.remove(TOKEN_KEY).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// All preferences as a JSON object.
    pub(crate) fn preferences(&self) -> Map<String, Value> {
        self.root
            .get(PREFERENCES_KEY)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// Look up a single preference.
    pub(crate) fn preference(&self, key: &str) -> Option<&Value> {
        self.root
            .get(PREFERENCES_KEY)
            .and_then(Value::as_object)
            .and_then(|prefs| prefs.get(key))
    }

    /// Look up a preference that holds a string.
    pub(crate) fn preference_str(&self, key: &str) -> Option<&str> {
        self.preference(key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Set a preference and persist the record.
    pub(crate) fn set_preference(&mut self, key: &str, value: Value) -> Result<()> {
        let prefs = self
            .root
            .entry(PREFERENCES_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !prefs.is_object() {
            *prefs = Value::Object(Map::new());
        }
        if let Value::Object(map) = prefs {
            map.insert(key.to_string(), value);
        }
        self.save()
    }

    /// Remove a preference. Returns false when it was not set.
    pub(crate) fn unset_preference(&mut self, key: &str) -> Result<bool> {
        let removed = self
            .root
            .get_mut(PREFERENCES_KEY)
            .and_then(Value::as_object_mut)
            .and_then(|prefs| prefs.remove(key))
            .is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Configured editor, falling back to the environment and `PATH`.
    pub(crate) fn editor(&self) -> String {
        self.preference_str(EDITOR_PREF)
            .map_or_else(default_editor, str::to_string)
    }

    /// Configured default repository, if any.
    pub(crate) fn default_repo(&self) -> Option<&str> {
        self.preference_str(DEFAULT_REPO_PREF)
    }

    /// Root directory holding user templates.
    pub(crate) fn templates_dir(&self) -> Result<PathBuf> {
        match self.preference_str(TEMPLATES_DIR_PREF) {
            Some(raw) => {
                let base = self.path.parent().unwrap_or(Path::new("."));
                paths::expand_path(raw, base)
            }
            None => paths::default_templates_dir(),
        }
    }

    /// Base URL for REST calls.
    pub(crate) fn api_url(&self) -> String {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            return url.trim_end_matches('/').to_string();
        }
        self.preference_str(API_URL_PREF)
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }
}

/// Editor from the environment, else the first common editor on `PATH`.
pub fn default_editor() -> String {
    for var in ["HUBQUEUE_EDITOR", "EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var)
            && !editor.trim().is_empty()
        {
            return editor;
        }
    }
    if cfg!(windows) {
        return "notepad.exe".to_string();
    }
    FALLBACK_EDITORS
        .iter()
        .find(|editor| paths::find_executable(editor).is_some())
        .map_or_else(|| "nano".to_string(), |editor| (*editor).to_string())
}

/// Coerce a command-line string into a JSON value.
///
/// `true`/`false` become booleans and all-digit strings become integers.
pub fn coerce_value(raw: &str) -> Value {
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if !raw.is_empty()
        && raw.bytes().all(|byte| byte.is_ascii_digit())
        && let Ok(number) = raw.parse::<u64>()
    {
        return Value::from(number);
    }
    Value::String(raw.to_string())
}

/// Render a preference value for display.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::Value;
    use tempfile::tempdir;

    use super::{Config, EDITOR_PREF, coerce_value};
    use crate::error::Error;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("config.json")).expect("load");
        assert!(config.token().is_none());
        assert!(config.preferences().is_empty());
    }

    #[test]
    fn preference_survives_reload() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let mut config = Config::load_from(&path).expect("load");
        config
            .set_preference(EDITOR_PREF, Value::String("vim".to_string()))
            .expect("set");

        let reloaded = Config::load_from(&path).expect("reload");
        assert_eq!(reloaded.editor(), "vim");
    }

    #[test]
    fn clearing_unset_token_reports_not_found() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let mut config = Config::load_from(&path).expect("load");
        assert!(!config.clear_token().expect("clear"));
        assert!(!path.exists());

        config.set_token("abc").expect("set token");
        assert!(config.clear_token().expect("clear"));
        let reloaded = Config::load_from(&path).expect("reload");
        assert!(reloaded.token().is_none());
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"extra": {"a": 1}}"#).expect("write");
        let mut config = Config::load_from(&path).expect("load");
        config.set_token("abc").expect("set token");

        let text = fs::read_to_string(&path).expect("read");
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["extra"]["a"], 1);
        assert_eq!(value["github_token"], "abc");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").expect("write");
        let error = Config::load_from(&path).expect_err("should fail");
        assert!(matches!(error, Error::ConfigParse { .. }));
    }

    #[test]
    fn coerces_booleans_and_integers() {
        assert_eq!(coerce_value("true"), Value::Bool(true));
        assert_eq!(coerce_value("FALSE"), Value::Bool(false));
        assert_eq!(coerce_value("42"), Value::from(42_u64));
        assert_eq!(coerce_value("4.2"), Value::String("4.2".to_string()));
    }
}

//! Error types for the hubqueue CLI.

use std::{
    error::Error as StdError,
    io,
    path::PathBuf,
    process::ExitCode,
    result::Result as StdResult,
};

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for hubqueue operations.
pub type Result<T> = StdResult<T, Error>;

/// Broad failure categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No bearer token could be resolved.
    MissingCredential,
    /// The GitHub API rejected a request or could not be reached.
    RemoteApi,
    /// A local condition blocked the operation before anything ran.
    LocalPrecondition,
    /// A local `git` invocation failed.
    Subprocess,
    /// User input was malformed.
    Validation,
    /// A local read or write failed.
    Io,
}

/// Errors that can occur while running the CLI.
#[derive(Debug, Error)]
pub enum Error {
    /// No token was supplied by flag, environment, or config.
    #[error(
        "GitHub token not provided. Use --token, set GITHUB_TOKEN, or run `hubqueue auth login`."
    )]
    MissingToken,
    /// The GitHub API returned a non-success status.
    #[error("GitHub API error ({status}): {message}")]
    Api {
        /// HTTP status returned by the API.
        status: StatusCode,
        /// Message extracted from the response body.
        message: String,
    },
    /// The HTTP request could not be completed.
    #[error("Request to {url} failed: {source}")]
    Http {
        /// URL that was requested.
        url: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// A response body could not be decoded.
    #[error("Unexpected response from {url}: {message}")]
    Decode {
        /// URL that was requested.
        url: String,
        /// Decoder error message.
        message: String,
    },
    /// Failed to download from URL.
    #[error("Failed to download from {url}: {message}")]
    Download {
        /// URL that failed.
        url: String,
        /// Error message.
        message: String,
    },
    /// The OAuth code exchange did not yield a token.
    #[error("Failed to complete OAuth flow: {message}")]
    OAuth {
        /// Error message returned by GitHub.
        message: String,
    },
    /// A token was rejected by GitHub.
    #[error("Invalid GitHub token")]
    InvalidToken,
    /// A git command exited with a non-zero status.
    #[error("`{command}` failed: {stderr}")]
    GitCommand {
        /// Command line that failed.
        command: String,
        /// Standard error captured from git.
        stderr: String,
    },
    /// A subprocess could not be spawned.
    #[error("Failed to run `{program}`: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying spawn error.
        source: io::Error,
    },
    /// Failed to launch the editor.
    #[error("Failed to run editor `{editor}`: {message}")]
    EditorFailed {
        /// Editor command that failed.
        editor: String,
        /// Error message.
        message: String,
    },
    /// The configuration file could not be read.
    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The configuration file could not be parsed.
    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
    /// The configuration file could not be written.
    #[error("Failed to write config at {path}: {source}")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Home directory resolution failed.
    #[error("Failed to resolve the home directory.")]
    HomeDirMissing,
    /// A configured path could not be expanded.
    #[error("Invalid path in config: {path}: {message}")]
    PathExpansion {
        /// Input path that failed to expand.
        path: String,
        /// Expansion error message.
        message: String,
    },
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    FileRead {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A file or directory could not be written.
    #[error("Failed to write {path}: {source}")]
    FileWrite {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A required path already exists.
    #[error("{path} already exists")]
    PathExists {
        /// Path that already exists.
        path: PathBuf,
    },
    /// A path required for operation does not exist.
    #[error("Path does not exist: {path}")]
    PathMissing {
        /// Path that does not exist.
        path: PathBuf,
    },
    /// The target directory already contains a git repository.
    #[error("Git repository already exists in '{path}'")]
    RepositoryExists {
        /// Directory holding the repository.
        path: PathBuf,
    },
    /// The directory is not a git repository.
    #[error("Directory {path} is not a git repository")]
    NotARepository {
        /// Directory that was checked.
        path: PathBuf,
    },
    /// The clone target is not empty.
    #[error("Directory '{path}' already exists and is not empty")]
    DirectoryNotEmpty {
        /// Directory that was checked.
        path: PathBuf,
    },
    /// No candidate version files exist.
    #[error("No version files found in {path}")]
    NoVersionFiles {
        /// Base directory that was searched.
        path: PathBuf,
    },
    /// No candidate file contains the version pattern.
    #[error("No version matching pattern {pattern} found in files")]
    VersionNotFound {
        /// Pattern that was searched for.
        pattern: String,
    },
    /// The current version is not plain `major.minor.patch`.
    #[error("Cannot auto-increment version {version}. Please specify new version.")]
    CannotIncrement {
        /// Version string that was found.
        version: String,
    },
    /// A user-supplied regex did not compile.
    #[error("Invalid pattern {pattern}: {source}")]
    InvalidPattern {
        /// Pattern text.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },
    /// A user-supplied file glob did not parse.
    #[error("Invalid glob {pattern}: {source}")]
    InvalidGlob {
        /// Glob text.
        pattern: String,
        /// Underlying glob error.
        source: glob::PatternError,
    },
    /// A template could not be found.
    #[error("Template not found: {name}")]
    TemplateNotFound {
        /// Missing template name.
        name: String,
    },
    /// A template with the same name already exists.
    #[error("Template {name} already exists")]
    TemplateExists {
        /// Colliding template name.
        name: String,
    },
    /// A template could not be rendered.
    #[error("Failed to render {path}: {message}")]
    TemplateRender {
        /// Template-relative path being rendered.
        path: String,
        /// Error message describing the render failure.
        message: String,
    },
    /// A template descriptor could not be parsed or written.
    #[error("Invalid template descriptor at {path}: {message}")]
    TemplateDescriptor {
        /// Path to the descriptor file.
        path: PathBuf,
        /// Error message.
        message: String,
    },
    /// Required template variables have no value.
    #[error("Missing required template variables: {names}")]
    MissingVariables {
        /// Comma-separated variable names.
        names: String,
    },
    /// Invalid ZIP structure.
    #[error("Invalid ZIP file: {message}")]
    InvalidZip {
        /// Error message describing the invalid structure.
        message: String,
    },
    /// Invalid URL.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL.
        url: String,
    },
    /// HTTP URL not allowed.
    #[error("HTTP URLs not allowed for security. Use HTTPS: {url}")]
    HttpNotAllowed {
        /// The HTTP URL.
        url: String,
    },
    /// File too large.
    #[error("File too large: {size} bytes (max {max} bytes)")]
    FileTooLarge {
        /// Actual size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },
    /// A repository argument was not `owner/repo`.
    #[error("Repository must be in format 'owner/repo', got '{value}'")]
    InvalidRepo {
        /// Value that was supplied.
        value: String,
    },
    /// No repository was given and no default is configured.
    #[error("Repository not specified. Use --repo or `hubqueue config set-repo owner/repo`.")]
    RepoNotSpecified,
    /// A secret could not be encrypted for upload.
    #[error("Failed to encrypt secret: {message}")]
    SecretEncryption {
        /// Error message.
        message: String,
    },
    /// An interactive prompt was interrupted or canceled.
    #[error("Prompt canceled.")]
    PromptCanceled,
    /// An interactive prompt failed.
    #[error("Prompt failed: {message}")]
    PromptFailed {
        /// Error message describing the prompt failure.
        message: String,
    },
    /// Validation failed.
    #[error("{message}")]
    Validation {
        /// Error message describing the validation failure.
        message: String,
    },
    /// A remote resource referenced by the command does not exist.
    #[error("{what} not found")]
    NotFound {
        /// Description of the missing resource.
        what: String,
    },
}

impl Error {
    /// Build a validation error from a message.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Return the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingToken => ErrorKind::MissingCredential,
            Self::Api { .. }
            | Self::Http { .. }
            | Self::Decode { .. }
            | Self::Download { .. }
            | Self::OAuth { .. }
            | Self::InvalidToken
            | Self::NotFound { .. } => ErrorKind::RemoteApi,
            Self::GitCommand { .. } | Self::Spawn { .. } | Self::EditorFailed { .. } => {
                ErrorKind::Subprocess
            }
            Self::PathExists { .. }
            | Self::PathMissing { .. }
            | Self::RepositoryExists { .. }
            | Self::NotARepository { .. }
            | Self::DirectoryNotEmpty { .. }
            | Self::NoVersionFiles { .. }
            | Self::TemplateNotFound { .. }
            | Self::TemplateExists { .. }
            | Self::HomeDirMissing => ErrorKind::LocalPrecondition,
            Self::VersionNotFound { .. }
            | Self::CannotIncrement { .. }
            | Self::InvalidPattern { .. }
            | Self::InvalidGlob { .. }
            | Self::MissingVariables { .. }
            | Self::InvalidZip { .. }
            | Self::InvalidUrl { .. }
            | Self::HttpNotAllowed { .. }
            | Self::FileTooLarge { .. }
            | Self::InvalidRepo { .. }
            | Self::RepoNotSpecified
            | Self::PathExpansion { .. }
            | Self::TemplateRender { .. }
            | Self::TemplateDescriptor { .. }
            | Self::SecretEncryption { .. }
            | Self::PromptCanceled
            | Self::PromptFailed { .. }
            | Self::Validation { .. } => ErrorKind::Validation,
            Self::ConfigRead { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigWrite { .. }
            | Self::FileRead { .. }
            | Self::FileWrite { .. } => ErrorKind::Io,
        }
    }

    /// Numeric process status for this error's category.
    pub fn status_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Io => 1,
            ErrorKind::Validation => 2,
            ErrorKind::MissingCredential => 3,
            ErrorKind::RemoteApi => 4,
            ErrorKind::LocalPrecondition => 5,
            ErrorKind::Subprocess => 6,
        }
    }

    /// Map errors to exit codes for CLI termination.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status_code())
    }
}

/// A failed run, with how much detail to print.
#[derive(Debug)]
pub struct Report {
    /// The error that ended the run.
    pub error: Error,
    /// Whether debug mode was on.
    pub debug: bool,
}

impl Report {
    /// Text printed to stderr: the message, plus the source chain in debug
    /// mode.
    pub fn render(&self) -> String {
        let mut text = format!("Error: {}", self.error);
        if self.debug {
            let mut source = StdError::source(&self.error);
            while let Some(cause) = source {
                text.push_str(&format!("\n  caused by: {cause}"));
                source = cause.source();
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use std::{io, path::PathBuf};

    use super::{Error, ErrorKind, Report};

    #[test]
    fn categories_are_distinguishable() {
        let api = Error::Api {
            status: StatusCode::NOT_FOUND,
            message: "Not Found".to_string(),
        };
        assert_eq!(api.kind(), ErrorKind::RemoteApi);
        assert_eq!(Error::MissingToken.kind(), ErrorKind::MissingCredential);
        assert_eq!(
            Error::InvalidRepo {
                value: "nope".to_string()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_ne!(api.status_code(), Error::MissingToken.status_code());
    }

    #[test]
    fn api_message_is_surfaced() {
        let error = Error::Api {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "name already exists on this account".to_string(),
        };
        assert!(error.to_string().contains("name already exists"));
    }

    #[test]
    fn debug_report_includes_source_chain() {
        let error = || Error::FileRead {
            path: PathBuf::from("notes.md"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let quiet = Report {
            error: error(),
            debug: false,
        };
        assert_eq!(quiet.render(), "Error: Failed to read notes.md: gone");
        let verbose = Report {
            error: error(),
            debug: true,
        };
        assert!(verbose.render().ends_with("\n  caused by: gone"));
    }
}

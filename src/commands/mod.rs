//! CLI command implementations.

use std::{
    io::{self, IsTerminal},
    result::Result as StdResult,
};

use chrono::{DateTime, Utc};
use inquire::{Confirm, Password, Text, error::InquireError};

use crate::error::{Error, Result};

/// Output color handling selection.
#[derive(Debug, Clone, Copy)]
pub enum ColorChoice {
    /// Colorize only when output is a TTY.
    Auto,
    /// Always colorize output.
    Always,
    /// Never colorize output.
    Never,
}

impl ColorChoice {
    /// Determine whether color output should be enabled.
    pub(crate) fn enabled(self) -> bool {
        match self {
            Self::Auto => io::stdout().is_terminal(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Width long bodies are wrapped to.
const WRAP_WIDTH: usize = 78;

/// Translate an inquire outcome into the crate's prompt errors.
fn prompt_result<T>(result: StdResult<T, InquireError>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            Err(Error::PromptCanceled)
        }
        Err(error) => Err(Error::PromptFailed {
            message: error.to_string(),
        }),
    }
}

/// Ask a yes/no question.
pub(crate) fn confirm(message: &str, default: bool) -> Result<bool> {
    prompt_result(Confirm::new(message).with_default(default).prompt())
}

/// Ask for a line of text.
pub(crate) fn text(message: &str) -> Result<String> {
    prompt_result(Text::new(message).prompt())
}

/// Ask for a secret without echoing it.
pub(crate) fn password(message: &str) -> Result<String> {
    prompt_result(
        Password::new(message)
            .without_confirmation()
            .prompt(),
    )
}

/// Timestamp as printed in listings.
pub(crate) fn timestamp(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Indent and wrap a free-text body for display.
pub(crate) fn wrap_body(body: &str) -> String {
    body.lines()
        .map(|line| textwrap::fill(line, WRAP_WIDTH))
        .map(|line| textwrap::indent(&line, "  "))
        .collect::<Vec<_>>()
        .join("\n")
}

// Command modules are ordered alphabetically - maintain this order.
/// Auth command implementation.
pub mod auth;
/// Config command implementation.
pub mod config;
/// Gist command implementation.
pub mod gist;
/// Issue and pull request commands.
pub mod issues;
/// Notifications command implementation.
pub mod notifications;
/// Project board command implementation.
pub mod project;
/// Release command implementation.
pub mod release;
/// Repo command implementation.
pub mod repo;
/// System command implementation.
pub mod system;
/// Template command implementation.
pub mod template;
/// Workflow command implementation.
pub mod workflow;

#[cfg(test)]
mod tests {
    use super::wrap_body;

    #[test]
    fn wraps_and_indents_each_paragraph() {
        let body = format!("{}\nshort", "word ".repeat(30));
        let wrapped = wrap_body(&body);
        assert!(wrapped.lines().all(|line| line.starts_with("  ")));
        assert!(wrapped.lines().all(|line| line.len() <= 80));
        assert!(wrapped.ends_with("  short"));
    }
}

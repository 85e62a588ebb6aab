//! Tracing subscriber setup.

use std::{
    env,
    fs::{self, OpenOptions},
    io,
    path::Path,
    sync::Mutex,
};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Error, Result};

/// Environment variable naming the default log level.
pub const LOG_LEVEL_ENV: &str = "HUBQUEUE_LOG_LEVEL";
/// Level used when nothing else is configured.
const DEFAULT_LEVEL: &str = "warn";

/// Pick the effective log level from flags and the environment.
pub fn resolve_level(flag: Option<&str>, debug: bool) -> String {
    if debug {
        return "debug".to_string();
    }
    if let Some(level) = flag {
        return level.to_ascii_lowercase();
    }
    match env::var(LOG_LEVEL_ENV) {
        Ok(level) if !level.trim().is_empty() => level.trim().to_ascii_lowercase(),
        _ => DEFAULT_LEVEL.to_string(),
    }
}

/// Install the global subscriber.
///
/// Console output goes to stderr. When `log_file` is set, a second plain-text
/// layer appends to that file.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(format!("hubqueue={level}"))
        .map_err(|_| Error::validation(format!("Invalid log level: {level}")))?;

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|source| Error::FileWrite {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| Error::FileWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(file_layer)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::resolve_level;

    #[test]
    fn debug_overrides_flag() {
        assert_eq!(resolve_level(Some("error"), true), "debug");
    }

    #[test]
    fn flag_is_normalized() {
        assert_eq!(resolve_level(Some("INFO"), false), "info");
    }
}

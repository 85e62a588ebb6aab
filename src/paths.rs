//! Path expansion and normalization utilities.

use std::{
    env,
    path::{MAIN_SEPARATOR, Path, PathBuf},
};

use path_clean::PathClean;

use crate::error::{Error, Result};

/// Environment variable that relocates the per-user data directory.
pub const HOME_ENV: &str = "HUBQUEUE_HOME";

/// File name of the configuration record inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Return the per-user data directory (`~/.hubqueue` unless overridden).
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = env::var(HOME_ENV)
        && !dir.trim().is_empty()
    {
        return expand_path(&dir, Path::new("."));
    }
    let home = dirs::home_dir().ok_or(Error::HomeDirMissing)?;
    Ok(home.join(".hubqueue"))
}

/// Return the default config path for the current user.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(CONFIG_FILE_NAME))
}

/// Return the default templates root for the current user.
pub fn default_templates_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("templates"))
}

/// Expand a user-provided path and resolve it relative to a base directory.
pub fn expand_path(raw: &str, base_dir: &Path) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).map_err(|error| Error::PathExpansion {
        path: raw.to_string(),
        message: error.to_string(),
    })?;
    let expanded_path = PathBuf::from(expanded.as_ref());
    let resolved = if expanded_path.is_relative() {
        base_dir.join(expanded_path)
    } else {
        expanded_path
    };
    Ok(normalize_path(&resolved))
}

/// Normalize a path for comparisons by cleaning and canonicalizing when possible.
pub fn normalize_path(path: &Path) -> PathBuf {
    match dunce::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(_) => path.clean(),
    }
}

/// Render a path for display, using a tilde prefix for the home directory.
pub fn display_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        if stripped.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~{}{}", MAIN_SEPARATOR, stripped.display());
    }
    path.display().to_string()
}

/// Search `PATH` for an executable with the given name.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    let candidates: Vec<String> = if cfg!(windows) {
        vec![format!("{name}.exe"), format!("{name}.cmd"), name.to_string()]
    } else {
        vec![name.to_string()]
    };
    env::split_paths(&path_var)
        .flat_map(|dir| candidates.iter().map(move |file| dir.join(file)))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::tempdir;

    use super::{expand_path, normalize_path};

    #[test]
    fn resolves_relative_paths_against_base() {
        let dir = tempdir().expect("tempdir");
        let resolved = expand_path("templates", dir.path()).expect("expand");
        assert_eq!(resolved, normalize_path(&dir.path().join("templates")));
    }

    #[test]
    fn keeps_absolute_paths() {
        let dir = tempdir().expect("tempdir");
        let absolute = dir.path().join("abs");
        let raw = absolute.to_string_lossy().to_string();
        let resolved = expand_path(&raw, Path::new("/elsewhere")).expect("expand");
        assert_eq!(resolved, normalize_path(&absolute));
    }
}

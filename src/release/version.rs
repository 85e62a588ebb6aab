//! Find the current version in project files and rewrite it.

use std::{
    fs,
    path::{Path, PathBuf},
};

use glob::{MatchOptions, Pattern};
use regex::{NoExpand, Regex};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Pattern matched when the caller gives none.
pub const DEFAULT_VERSION_PATTERN: &str = r"(\d+)\.(\d+)\.(\d+)";

/// Files checked when the caller gives none.
pub const DEFAULT_VERSION_FILES: [&str; 6] = [
    "__init__.py",
    "setup.py",
    "pyproject.toml",
    "package.json",
    "VERSION",
    "version.txt",
];

/// Outcome of a version update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionUpdate {
    /// First version found.
    pub old_version: String,
    /// Version written.
    pub new_version: String,
    /// Files whose content changed.
    pub updated_files: Vec<PathBuf>,
}

/// Replace the version in every candidate file under `base_dir`.
///
/// Without `version` the patch component of the current version is bumped.
/// Entries in `files` containing `*`, `?`, or `[` are globs relative to
/// `base_dir`.
/// Files are written one at a time; a failed write leaves earlier ones
/// updated.
pub fn update_version(
    base_dir: &Path,
    version: Option<&str>,
    pattern: Option<&str>,
    files: &[String],
) -> Result<VersionUpdate> {
    let pattern = pattern.unwrap_or(DEFAULT_VERSION_PATTERN);
    let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let candidates = candidate_files(base_dir, files)?;
    if candidates.is_empty() {
        return Err(Error::NoVersionFiles {
            path: base_dir.to_path_buf(),
        });
    }

    let mut contents = Vec::with_capacity(candidates.len());
    for path in candidates {
        let text = fs::read_to_string(&path).map_err(|source| Error::FileRead {
            path: path.clone(),
            source,
        })?;
        contents.push((path, text));
    }

    let old_version = contents
        .iter()
        .find_map(|(_, text)| regex.find(text))
        .map(|found| found.as_str().to_string())
        .ok_or_else(|| Error::VersionNotFound {
            pattern: pattern.to_string(),
        })?;
    let new_version = match version {
        Some(version) => version.to_string(),
        None => increment_patch(&old_version)?,
    };
    info!(%old_version, %new_version, "updating version");

    let mut updated_files = Vec::new();
    for (path, text) in contents {
        let replaced = regex.replace_all(&text, NoExpand(&new_version));
        if replaced == text {
            continue;
        }
        fs::write(&path, replaced.as_bytes()).map_err(|source| Error::FileWrite {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "updated version");
        updated_files.push(path);
    }

    Ok(VersionUpdate {
        old_version,
        new_version,
        updated_files,
    })
}

/// Bump the patch component of a plain `major.minor.patch` version.
pub fn increment_patch(version: &str) -> Result<String> {
    let cannot = || Error::CannotIncrement {
        version: version.to_string(),
    };
    let parts = version
        .split('.')
        .map(|part| part.parse::<u64>().map_err(|_| cannot()))
        .collect::<Result<Vec<_>>>()?;
    match parts.as_slice() {
        [major, minor, patch] => {
            let patch = patch.checked_add(1).ok_or_else(cannot)?;
            Ok(format!("{major}.{minor}.{patch}"))
        }
        _ => Err(cannot()),
    }
}

/// Existing candidate files, in the order the entries were given.
fn candidate_files(base_dir: &Path, files: &[String]) -> Result<Vec<PathBuf>> {
    let defaults;
    let entries: &[String] = if files.is_empty() {
        defaults = DEFAULT_VERSION_FILES.map(str::to_string);
        &defaults
    } else {
        files
    };

    let mut found = Vec::new();
    for entry in entries {
        if is_glob(entry) {
            for path in glob_files(base_dir, entry)? {
                if !found.contains(&path) {
                    found.push(path);
                }
            }
        } else {
            let path = base_dir.join(entry);
            if path.is_file() && !found.contains(&path) {
                found.push(path);
            }
        }
    }
    Ok(found)
}

/// Whether a file entry should be expanded as a glob.
fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// Files under `base_dir` whose relative path matches a glob.
fn glob_files(base_dir: &Path, glob: &str) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(glob).map_err(|source| Error::InvalidGlob {
        pattern: glob.to_string(),
        source,
    })?;
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::new()
    };
    let mut matches = Vec::new();
    for entry in WalkDir::new(base_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
    {
        let Ok(relative) = entry.path().strip_prefix(base_dir) else {
            continue;
        };
        if pattern.matches_path_with(relative, options) {
            matches.push(entry.into_path());
        }
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{increment_patch, update_version};
    use crate::error::Error;

    #[test]
    fn explicit_version_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("VERSION"), "1.0.0\n").expect("write");
        fs::write(
            dir.path().join("package.json"),
            "{\n  \"version\": \"1.0.0\"\n}\n",
        )
        .expect("write");

        let first = update_version(dir.path(), Some("2.0.0"), None, &[]).expect("first");
        assert_eq!(first.old_version, "1.0.0");
        assert_eq!(first.updated_files.len(), 2);

        let second = update_version(dir.path(), Some("2.0.0"), None, &[]).expect("second");
        assert_eq!(second.old_version, "2.0.0");
        assert!(second.updated_files.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("VERSION")).expect("read"),
            "2.0.0\n"
        );
    }

    #[test]
    fn auto_increments_patch() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("version.txt"), "version = 1.2.3").expect("write");
        let update = update_version(dir.path(), None, None, &[]).expect("update");
        assert_eq!(update.new_version, "1.2.4");
        assert_eq!(
            fs::read_to_string(dir.path().join("version.txt")).expect("read"),
            "version = 1.2.4"
        );
    }

    #[test]
    fn non_semver_version_cannot_increment() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("VERSION"), "release-7").expect("write");
        let error =
            update_version(dir.path(), None, Some(r"release-\d+"), &[]).expect_err("should fail");
        assert!(matches!(error, Error::CannotIncrement { .. }));
        assert!(increment_patch("1.2").is_err());
        assert_eq!(increment_patch("0.9.9").expect("bump"), "0.9.10");
    }

    #[test]
    fn replacement_is_literal() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("VERSION"), "1.0.0").expect("write");
        update_version(dir.path(), Some("$1.5.0"), None, &[]).expect("update");
        assert_eq!(
            fs::read_to_string(dir.path().join("VERSION")).expect("read"),
            "$1.5.0"
        );
    }

    #[test]
    fn reports_missing_files_and_versions() {
        let dir = tempdir().expect("tempdir");
        let error = update_version(dir.path(), None, None, &[]).expect_err("no files");
        assert!(matches!(error, Error::NoVersionFiles { .. }));

        fs::write(dir.path().join("VERSION"), "no version here").expect("write");
        let error = update_version(dir.path(), None, None, &[]).expect_err("no match");
        assert!(matches!(error, Error::VersionNotFound { .. }));
    }

    #[test]
    fn glob_entries_match_relative_paths() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("pkg/sub")).expect("mkdir");
        fs::write(dir.path().join("pkg/a.py"), "__version__ = '0.1.0'").expect("write");
        fs::write(dir.path().join("pkg/sub/b.py"), "__version__ = '0.1.0'").expect("write");

        let files = vec!["pkg/*.py".to_string()];
        let update = update_version(dir.path(), Some("0.2.0"), None, &files).expect("update");
        assert_eq!(update.updated_files, vec![dir.path().join("pkg/a.py")]);

        let files = vec!["**/*.py".to_string()];
        let update = update_version(dir.path(), Some("0.3.0"), None, &files).expect("update");
        assert_eq!(
            update.updated_files,
            vec![dir.path().join("pkg/a.py"), dir.path().join("pkg/sub/b.py")]
        );
    }

    #[test]
    fn glob_entries_support_character_classes() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("version1.txt"), "1.0.0").expect("write");
        fs::write(dir.path().join("versionx.txt"), "1.0.0").expect("write");

        let files = vec!["version[0-9]*.txt".to_string()];
        let update = update_version(dir.path(), Some("2.0.0"), None, &files).expect("update");
        assert_eq!(update.updated_files, vec![dir.path().join("version1.txt")]);
        assert_eq!(
            fs::read_to_string(dir.path().join("versionx.txt")).expect("read"),
            "1.0.0"
        );
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let files = vec!["***.txt".to_string()];
        let error = update_version(dir.path(), None, None, &files).expect_err("bad glob");
        assert!(matches!(error, Error::InvalidGlob { .. }));
    }

    #[test]
    fn patch_overflow_cannot_increment() {
        let error = increment_patch("1.2.18446744073709551615").expect_err("overflow");
        assert!(matches!(error, Error::CannotIncrement { .. }));
    }
}

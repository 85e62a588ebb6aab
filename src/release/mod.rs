//! Local release tooling: version bumps and release notes.

/// Release notes from the commit log.
pub mod notes;
/// Version string updates across project files.
pub mod version;

/// Message used for a release tag or release body when none is given.
pub fn default_release_message(tag: &str) -> String {
    format!("Release {tag}")
}

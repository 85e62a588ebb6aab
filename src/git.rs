//! Thin wrapper over the system `git` executable.

use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

use tracing::debug;

use crate::error::{Error, Result};

/// Runs git commands inside a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    /// Directory every command runs in.
    dir: PathBuf,
}

impl Git {
    /// Create a runner rooted at `dir`.
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the runner operates on.
    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build a `git` command in the working directory.
    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.dir).args(args);
        cmd
    }

    /// Spawn git and collect its output without checking the status.
    fn output(&self, args: &[&str]) -> Result<Output> {
        debug!(dir = %self.dir.display(), "git {}", args.join(" "));
        self.command(args).output().map_err(|source| Error::Spawn {
            program: "git".to_string(),
            source,
        })
    }

    /// Run git, returning trimmed stdout or the verbatim stderr on failure.
    pub(crate) fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(Error::GitCommand {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run git and return stdout only when it succeeds.
    pub(crate) fn try_run(&self, args: &[&str]) -> Result<Option<String>> {
        let output = self.output(args)?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
        } else {
            Ok(None)
        }
    }

    /// Whether the directory is the root of a repository.
    pub(crate) fn has_repository(&self) -> bool {
        self.dir.join(".git").exists()
    }

    /// Fail unless the directory is inside a work tree.
    pub(crate) fn ensure_repository(&self) -> Result<()> {
        match self.try_run(&["rev-parse", "--is-inside-work-tree"])? {
            Some(inside) if inside == "true" => Ok(()),
            _ => Err(Error::NotARepository {
                path: self.dir.clone(),
            }),
        }
    }

    /// `git init` followed by switching to `main`.
    pub(crate) fn init_main(&self) -> Result<()> {
        self.run(&["init"])?;
        self.run(&["checkout", "-b", "main"])?;
        Ok(())
    }

    /// Clone `url` into `target`.
    pub(crate) fn clone_into(&self, url: &str, target: &Path) -> Result<()> {
        let target = target.to_string_lossy();
        self.run(&["clone", url, target.as_ref()])?;
        Ok(())
    }

    /// Name of the checked-out branch.
    pub(crate) fn current_branch(&self) -> Result<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Full SHA of `HEAD`.
    pub(crate) fn head_commit(&self) -> Result<String> {
        self.run(&["rev-parse", "HEAD"])
    }

    /// URL of a remote.
    pub(crate) fn remote_url(&self, remote: &str) -> Result<String> {
        self.run(&["remote", "get-url", remote])
    }

    /// Check out the base, fast-forward it, and create a new branch.
    pub(crate) fn create_branch(&self, name: &str, base: &str) -> Result<()> {
        self.run(&["checkout", base])?;
        self.run(&["pull", "--ff-only"])?;
        self.run(&["checkout", "-b", name])?;
        Ok(())
    }

    /// Stage the given files, or everything when none are listed.
    pub(crate) fn stage(&self, files: &[String]) -> Result<()> {
        if files.is_empty() {
            self.run(&["add", "."])?;
            return Ok(());
        }
        for file in files {
            self.run(&["add", file])?;
        }
        Ok(())
    }

    /// Commit staged changes and return the new `HEAD`.
    pub(crate) fn commit(&self, message: &str) -> Result<String> {
        self.run(&["commit", "-m", message])?;
        self.head_commit()
    }

    /// Push a branch and set its upstream.
    pub(crate) fn push_upstream(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(&["push", "-u", remote, branch])?;
        Ok(())
    }

    /// Push a single ref without tracking.
    pub(crate) fn push_ref(&self, remote: &str, reference: &str) -> Result<()> {
        self.run(&["push", remote, reference])?;
        Ok(())
    }

    /// Create an annotated tag, optionally signed.
    pub(crate) fn tag(&self, name: &str, message: &str, sign: bool) -> Result<()> {
        let flag = if sign { "-s" } else { "-a" };
        self.run(&["tag", flag, name, "-m", message])?;
        Ok(())
    }

    /// Fetch a pull request head into `pr-<n>` and check it out.
    pub(crate) fn checkout_pull_request(&self, number: u64) -> Result<String> {
        let branch = format!("pr-{number}");
        let refspec = format!("pull/{number}/head:{branch}");
        self.run(&["fetch", "origin", &refspec])?;
        self.run(&["checkout", &branch])?;
        Ok(branch)
    }

    /// Read a git config value, returning `None` when unset.
    pub(crate) fn config_get(&self, key: &str, global: bool) -> Result<Option<String>> {
        let mut args = vec!["config"];
        if global {
            args.push("--global");
        }
        args.extend(["--get", key]);
        Ok(self.try_run(&args)?.filter(|value| !value.is_empty()))
    }

    /// Write a git config value.
    pub(crate) fn config_set(&self, key: &str, value: &str, global: bool) -> Result<()> {
        let mut args = vec!["config"];
        if global {
            args.push("--global");
        }
        args.extend([key, value]);
        self.run(&args)?;
        Ok(())
    }

    /// The installed git version string.
    pub(crate) fn version(&self) -> Result<String> {
        self.run(&["--version"])
    }
}

/// Split an `origin` URL into `owner/repo` when it points at GitHub.
pub fn repo_from_remote_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let path = if let Some(rest) = trimmed.strip_prefix("git@github.com:") {
        rest
    } else {
        let index = trimmed.find("github.com/")?;
        &trimmed[index + "github.com/".len()..]
    };
    let mut parts = path.split('/');
    let owner = parts.next().filter(|part| !part.is_empty())?;
    let repo = parts.next().filter(|part| !part.is_empty())?;
    Some(format!("{owner}/{repo}"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{Git, repo_from_remote_url};
    use crate::error::Error;

    #[test]
    fn parses_remote_urls() {
        assert_eq!(
            repo_from_remote_url("https://github.com/octo/hello.git").as_deref(),
            Some("octo/hello")
        );
        assert_eq!(
            repo_from_remote_url("git@github.com:octo/hello.git").as_deref(),
            Some("octo/hello")
        );
        assert_eq!(repo_from_remote_url("https://example.com/x/y"), None);
    }

    #[test]
    fn failing_command_surfaces_stderr() {
        let dir = tempdir().expect("tempdir");
        let git = Git::new(dir.path());
        let error = git.run(&["rev-parse", "HEAD"]).expect_err("not a repo");
        assert!(matches!(error, Error::GitCommand { .. }));
        assert!(matches!(
            git.ensure_repository(),
            Err(Error::NotARepository { .. })
        ));
    }

    #[test]
    fn commit_returns_head() {
        let dir = tempdir().expect("tempdir");
        let git = Git::new(dir.path());
        git.init_main().expect("init");
        git.ensure_repository().expect("repository");
        git.config_set("user.name", "Test", false).expect("name");
        git.config_set("user.email", "test@example.com", false)
            .expect("email");
        git.config_set("commit.gpgsign", "false", false)
            .expect("gpgsign");
        fs::write(dir.path().join("a.txt"), "a").expect("write");
        git.stage(&[]).expect("stage");
        let head = git.commit("initial").expect("commit");
        assert_eq!(head, git.head_commit().expect("head"));
        assert_eq!(git.current_branch().expect("branch"), "main");
    }
}

//! Implementation of the `hubqueue repo` commands.

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{Subcommand, ValueEnum};
use tracing::info;

use crate::{
    context::Context,
    diagnostics::Diagnostics,
    error::{Error, Result},
    git::{Git, repo_from_remote_url},
    github::{RepoName, pulls::NewPullRequest},
    palette,
    paths::display_path,
    scaffold,
};

/// Remote used when none is named.
const DEFAULT_REMOTE: &str = "origin";

/// Repository subcommands.
#[derive(Debug, Subcommand)]
pub enum RepoCommand {
    /// Create a repository on GitHub.
    Create {
        /// Repository name.
        name: String,
        /// Repository description.
        #[arg(long, short = 'd')]
        description: Option<String>,
        /// Make the repository private.
        #[arg(long)]
        private: bool,
    },
    /// Clone a repository into a new or empty directory.
    Clone {
        /// `owner/repo` or a clone URL.
        repo: String,
        /// Target directory (defaults to the repository name).
        directory: Option<PathBuf>,
    },
    /// Initialize a git repository on branch `main`.
    Init {
        /// Directory to initialize.
        #[arg(default_value = ".")]
        directory: PathBuf,
    },
    /// Create standard project directories.
    CreateDirs {
        /// Directory names (defaults to src, tests, docs).
        dirs: Vec<String>,
        /// Project root.
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Write README.md, .gitignore, and LICENSE.
    Scaffold {
        /// Project root.
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Project name for the README (defaults to the directory name).
        #[arg(long)]
        name: Option<String>,
        /// Project description for the README.
        #[arg(long, short = 'd')]
        description: Option<String>,
        /// `.gitignore` template from github/gitignore.
        #[arg(long, default_value = "Python")]
        gitignore: String,
        /// License type.
        #[arg(long, default_value = "mit")]
        license: String,
        /// License holder (defaults to git `user.name`).
        #[arg(long)]
        author: Option<String>,
        /// Skip README.md.
        #[arg(long)]
        no_readme: bool,
        /// Skip .gitignore.
        #[arg(long)]
        no_gitignore: bool,
        /// Skip LICENSE.
        #[arg(long)]
        no_license: bool,
    },
    /// Create a branch from an up-to-date base.
    Branch {
        /// New branch name.
        name: String,
        /// Branch to start from.
        #[arg(long, default_value = "main")]
        base: String,
        /// Repository directory.
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Stage files and commit.
    Commit {
        /// Commit message.
        #[arg(long, short = 'm')]
        message: String,
        /// Files to stage (defaults to everything).
        files: Vec<String>,
        /// Repository directory.
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Push a branch and set its upstream.
    Push {
        /// Remote name.
        #[arg(long, default_value = DEFAULT_REMOTE)]
        remote: String,
        /// Branch to push (defaults to the current branch).
        #[arg(long)]
        branch: Option<String>,
        /// Repository directory.
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Open a pull request.
    Pr {
        /// Title.
        #[arg(long, short = 't')]
        title: String,
        /// Description.
        #[arg(long, short = 'b')]
        body: Option<String>,
        /// Source branch (defaults to the current branch).
        #[arg(long)]
        head: Option<String>,
        /// Target branch.
        #[arg(long, default_value = "main")]
        base: String,
        /// Repository as `owner/repo` (defaults to the `origin` remote).
        #[arg(long)]
        repo: Option<String>,
        /// Repository directory.
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Fork a repository into your account.
    Fork {
        /// Repository as `owner/repo`.
        repo: String,
    },
    /// Add or remove a collaborator.
    Collaborator {
        /// Login of the collaborator.
        username: String,
        /// Permission to grant.
        #[arg(long, value_enum, default_value = "push")]
        permission: Permission,
        /// Remove instead of adding.
        #[arg(long)]
        remove: bool,
        /// Repository as `owner/repo`.
        #[arg(long)]
        repo: Option<String>,
    },
}

/// Collaborator permission levels.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Permission {
    /// Read access.
    Pull,
    /// Write access.
    Push,
    /// Full control.
    Admin,
}

impl Permission {
    /// Value sent to the API.
    fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
            Self::Admin => "admin",
        }
    }
}

/// Execute a repo subcommand.
pub async fn run(ctx: &Context, command: RepoCommand) -> Result<()> {
    match command {
        RepoCommand::Create {
            name,
            description,
            private,
        } => create(ctx, &name, description.as_deref(), private).await,
        RepoCommand::Clone { repo, directory } => clone(ctx, &repo, directory),
        RepoCommand::Init { directory } => init(ctx, &directory),
        RepoCommand::CreateDirs { dirs, path } => create_dirs(ctx, &path, &dirs),
        RepoCommand::Scaffold {
            path,
            name,
            description,
            gitignore,
            license,
            author,
            no_readme,
            no_gitignore,
            no_license,
        } => {
            let files = ScaffoldFiles {
                readme: !no_readme,
                gitignore: (!no_gitignore).then_some(gitignore),
                license: (!no_license).then_some(license),
            };
            let details = ProjectDetails {
                name: name.as_deref(),
                description: description.as_deref(),
                author: author.as_deref(),
            };
            scaffold_project(ctx, &path, &details, &files).await
        }
        RepoCommand::Branch { name, base, path } => {
            open_repository(&path)?.create_branch(&name, &base)?;
            println!(
                "Created branch {} from {base}",
                palette::fmt_name(&name, ctx.use_color())
            );
            Ok(())
        }
        RepoCommand::Commit {
            message,
            files,
            path,
        } => {
            let git = open_repository(&path)?;
            git.stage(&files)?;
            let head = git.commit(&message)?;
            println!("Committed {}", palette::fmt_name(&head, ctx.use_color()));
            Ok(())
        }
        RepoCommand::Push {
            remote,
            branch,
            path,
        } => push(ctx, &path, &remote, branch),
        RepoCommand::Pr {
            title,
            body,
            head,
            base,
            repo,
            path,
        } => {
            let git = open_repository(&path)?;
            let head = match head {
                Some(head) => head,
                None => git.current_branch()?,
            };
            let repo = match repo {
                Some(repo) => RepoName::parse(&repo)?,
                None => origin_repo(ctx, &git)?,
            };
            let pull = NewPullRequest {
                title: &title,
                body: body.as_deref(),
                head: &head,
                base: &base,
            };
            open_pull_request(ctx, &repo, &pull).await
        }
        RepoCommand::Fork { repo } => fork(ctx, &repo).await,
        RepoCommand::Collaborator {
            username,
            permission,
            remove,
            repo,
        } => collaborator(ctx, repo.as_deref(), &username, permission, remove).await,
    }
}

/// `repo create`.
async fn create(
    ctx: &Context,
    name: &str,
    description: Option<&str>,
    private: bool,
) -> Result<()> {
    let color = ctx.use_color();
    let repo = ctx
        .client()?
        .create_repository(name, description, private)
        .await?;
    println!(
        "Created repository {}",
        palette::fmt_name(&repo.full_name, color)
    );
    println!("  {}", palette::fmt_path(&repo.html_url, color));
    println!("  Clone: {}", repo.clone_url);
    Ok(())
}

/// `repo create-dirs`.
fn create_dirs(ctx: &Context, path: &Path, dirs: &[String]) -> Result<()> {
    let created = scaffold::create_dirs(path, dirs)?;
    if created.is_empty() {
        println!("All directories already exist.");
    }
    for dir in created {
        println!(
            "Created {}",
            palette::fmt_path(&display_path(&dir), ctx.use_color())
        );
    }
    Ok(())
}

/// `repo push`.
fn push(ctx: &Context, path: &Path, remote: &str, branch: Option<String>) -> Result<()> {
    let git = open_repository(path)?;
    let branch = match branch {
        Some(branch) => branch,
        None => git.current_branch()?,
    };
    git.push_upstream(remote, &branch)?;
    println!(
        "Pushed {} to {remote}",
        palette::fmt_name(&branch, ctx.use_color())
    );
    Ok(())
}

/// `repo pr`.
async fn open_pull_request(
    ctx: &Context,
    repo: &RepoName,
    pull: &NewPullRequest<'_>,
) -> Result<()> {
    let pull = ctx.client()?.create_pull(repo, pull).await?;
    println!("Created pull request #{} in {repo}", pull.number);
    println!("  {}", palette::fmt_path(&pull.html_url, ctx.use_color()));
    Ok(())
}

/// `repo fork`.
async fn fork(ctx: &Context, repo: &str) -> Result<()> {
    let color = ctx.use_color();
    let repo = RepoName::parse(repo)?;
    let fork = ctx.client()?.fork_repository(&repo).await?;
    println!(
        "Forked {repo} to {}",
        palette::fmt_name(&fork.full_name, color)
    );
    println!("  {}", palette::fmt_path(&fork.html_url, color));
    Ok(())
}

/// `repo collaborator`.
async fn collaborator(
    ctx: &Context,
    repo: Option<&str>,
    username: &str,
    permission: Permission,
    remove: bool,
) -> Result<()> {
    let repo = ctx.repo(repo)?;
    let client = ctx.client()?;
    if remove {
        client.remove_collaborator(&repo, username).await?;
        println!("Removed {username} from {repo}");
    } else {
        client
            .add_collaborator(&repo, username, permission.as_str())
            .await?;
        println!(
            "Invited {username} to {repo} with {} permission",
            permission.as_str()
        );
    }
    Ok(())
}

/// Git runner for a directory that must hold a work tree.
fn open_repository(path: &Path) -> Result<Git> {
    let git = Git::new(path);
    git.ensure_repository()?;
    Ok(git)
}

/// Repository named by the `origin` remote, else the configured default.
fn origin_repo(ctx: &Context, git: &Git) -> Result<RepoName> {
    if let Ok(url) = git.remote_url(DEFAULT_REMOTE)
        && let Some(repo) = repo_from_remote_url(&url)
    {
        return RepoName::parse(&repo);
    }
    ctx.repo(None)
}

/// Clone URL and default directory name for a `repo clone` argument.
fn clone_source(repo: &str) -> Result<(String, String)> {
    if repo.contains("://") || repo.starts_with("git@") {
        let name = repo
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .map(|name| name.trim_end_matches(".git"))
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::InvalidUrl {
                url: repo.to_string(),
            })?;
        return Ok((repo.to_string(), name.to_string()));
    }
    let parsed = RepoName::parse(repo)?;
    Ok((
        format!("https://github.com/{parsed}.git"),
        parsed.repo,
    ))
}

/// `repo clone`.
fn clone(ctx: &Context, repo: &str, directory: Option<PathBuf>) -> Result<()> {
    let (url, name) = clone_source(repo)?;
    let target = directory.unwrap_or_else(|| PathBuf::from(name));
    if target.exists() {
        let mut entries = fs::read_dir(&target).map_err(|source| Error::FileRead {
            path: target.clone(),
            source,
        })?;
        if entries.next().is_some() {
            return Err(Error::DirectoryNotEmpty { path: target });
        }
    }
    Git::new(".").clone_into(&url, &target)?;
    info!(%url, target = %target.display(), "cloned repository");
    println!(
        "Cloned {} into {}",
        palette::fmt_name(repo, ctx.use_color()),
        palette::fmt_path(&display_path(&target), ctx.use_color())
    );
    Ok(())
}

/// `repo init`.
fn init(ctx: &Context, directory: &Path) -> Result<()> {
    let git = Git::new(directory);
    if git.has_repository() {
        return Err(Error::RepositoryExists {
            path: directory.to_path_buf(),
        });
    }
    fs::create_dir_all(directory).map_err(|source| Error::FileWrite {
        path: directory.to_path_buf(),
        source,
    })?;
    git.init_main()?;
    println!(
        "Initialized git repository in {}",
        palette::fmt_path(&display_path(git.dir()), ctx.use_color())
    );
    Ok(())
}

/// Which files `repo scaffold` writes.
#[derive(Debug)]
struct ScaffoldFiles {
    /// Write README.md.
    readme: bool,
    /// `.gitignore` template to fetch.
    gitignore: Option<String>,
    /// License type to write.
    license: Option<String>,
}

/// README and LICENSE details for `repo scaffold`.
#[derive(Debug)]
struct ProjectDetails<'a> {
    /// Project name.
    name: Option<&'a str>,
    /// Project description.
    description: Option<&'a str>,
    /// License holder.
    author: Option<&'a str>,
}

/// `repo scaffold`: each file is attempted even when an earlier one fails.
async fn scaffold_project(
    ctx: &Context,
    path: &Path,
    details: &ProjectDetails<'_>,
    files: &ScaffoldFiles,
) -> Result<()> {
    let color = ctx.use_color();
    let mut diagnostics = Diagnostics::new(color);
    let mut outcomes = Vec::new();
    if files.readme {
        outcomes.push(scaffold::write_readme(
            path,
            details.name,
            details.description,
        ));
    }
    if let Some(template) = &files.gitignore {
        outcomes.push(scaffold::write_gitignore(path, template).await);
    }
    if let Some(license) = &files.license {
        outcomes.push(scaffold::write_license(path, license, details.author));
    }

    for outcome in outcomes {
        match outcome {
            Ok(written) => println!(
                "Created {}",
                palette::fmt_path(&display_path(&written), color)
            ),
            Err(error) => diagnostics.warn(error.to_string()),
        }
    }
    diagnostics.print_warning_summary();
    match diagnostics.warning_count() {
        0 => Ok(()),
        failed => Err(Error::validation(format!(
            "{failed} scaffold file(s) could not be written"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::clone_source;

    #[test]
    fn clone_source_accepts_names_and_urls() {
        assert_eq!(
            clone_source("octo/hello").expect("name"),
            (
                "https://github.com/octo/hello.git".to_string(),
                "hello".to_string()
            )
        );
        assert_eq!(
            clone_source("git@github.com:octo/hello.git").expect("ssh").1,
            "hello"
        );
        assert!(clone_source("not-a-repo").is_err());
    }
}

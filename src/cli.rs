//! CLI parsing and command dispatch.

use std::{path::PathBuf, result::Result as StdResult};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::{
    commands::{
        self,
        auth::AuthCommand,
        config::ConfigCommand,
        gist::GistCommand,
        issues::{CheckoutPrArgs, CreateIssueArgs, ListIssuesArgs, ListPrsArgs, ViewArgs},
        notifications::NotificationsCommand,
        project::ProjectCommand,
        release::ReleaseCommand,
        repo::RepoCommand,
        system::SystemCommand,
        template::TemplateCommand,
        workflow::WorkflowCommand,
    },
    context::Context,
    error::{Report, Result},
    logging,
};

/// Parsed command line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "hubqueue",
    version,
    about = "Work with GitHub repositories, issues, releases, and workflows"
)]
struct Cli {
    /// Control colored output.
    #[arg(long, value_enum, default_value = "auto", global = true)]
    color: ColorMode,
    /// Enable debug logging and detailed errors.
    #[arg(long, env = "HUBQUEUE_DEBUG", global = true)]
    debug: bool,
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Also write logs to this file.
    #[arg(long, env = "HUBQUEUE_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,
    /// GitHub token (overrides the saved token).
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,
    /// Command to execute.
    #[command(subcommand)]
    command: Command,
}

/// Supported color output modes.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorMode {
    /// Only colorize when stdout is a TTY.
    Auto,
    /// Always colorize output.
    Always,
    /// Never colorize output.
    Never,
}

// Commands are ordered alphabetically - maintain this order.
/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Authenticate with GitHub.
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Check out a pull request locally.
    CheckoutPr(CheckoutPrArgs),
    /// Manage preferences.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Open an issue.
    CreateIssueCmd(CreateIssueArgs),
    /// Manage gists.
    #[command(subcommand)]
    Gist(GistCommand),
    /// List issues of a repository.
    ListIssues(ListIssuesArgs),
    /// List pull requests of a repository.
    ListPrs(ListPrsArgs),
    /// Read and watch notifications.
    #[command(subcommand)]
    Notifications(NotificationsCommand),
    /// Manage classic project boards.
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Prepare and publish releases.
    #[command(subcommand)]
    Release(ReleaseCommand),
    /// Create, clone, and work with repositories.
    #[command(subcommand)]
    Repo(RepoCommand),
    /// Inspect and prepare the local environment.
    #[command(subcommand)]
    System(SystemCommand),
    /// Manage project templates.
    #[command(subcommand)]
    Template(TemplateCommand),
    /// Show an issue with its comments.
    ViewIssue(ViewArgs),
    /// Show a pull request with commits and comments.
    ViewPr(ViewArgs),
    /// Work with Actions workflows, runs, secrets, and caches.
    Workflow {
        /// Repository as `owner/repo`.
        #[arg(long, global = true)]
        repo: Option<String>,
        /// Workflow subcommand.
        #[command(subcommand)]
        command: WorkflowCommand,
    },
}

/// Run the requested command, pairing any failure with the debug setting.
pub async fn run() -> StdResult<(), Report> {
    let cli = Cli::parse();
    let debug = cli.debug;
    execute(cli)
        .await
        .map_err(|error| Report { error, debug })
}

/// Set up logging and the context, then dispatch.
async fn execute(cli: Cli) -> Result<()> {
    let level = logging::resolve_level(cli.log_level.as_deref(), cli.debug);
    logging::init(&level, cli.log_file.as_deref())?;
    let mut ctx = Context::load(cli.color.into_choice(), cli.token)?;
    debug!(command = ?cli.command, "dispatching");

    // Match arms are ordered alphabetically - maintain this order.
    match cli.command {
        Command::Auth(command) => commands::auth::run(&mut ctx, command).await,
        Command::CheckoutPr(args) => commands::issues::checkout_pr(&ctx, args).await,
        Command::Config(command) => commands::config::run(&mut ctx, command).await,
        Command::CreateIssueCmd(args) => commands::issues::create_issue(&ctx, args).await,
        Command::Gist(command) => commands::gist::run(&ctx, command).await,
        Command::ListIssues(args) => commands::issues::list_issues(&ctx, args).await,
        Command::ListPrs(args) => commands::issues::list_prs(&ctx, args).await,
        Command::Notifications(command) => commands::notifications::run(&ctx, command).await,
        Command::Project(command) => commands::project::run(&ctx, command).await,
        Command::Release(command) => commands::release::run(&ctx, command).await,
        Command::Repo(command) => commands::repo::run(&ctx, command).await,
        Command::System(command) => commands::system::run(&ctx, command).await,
        Command::Template(command) => commands::template::run(&ctx, command).await,
        Command::ViewIssue(args) => commands::issues::view_issue(&ctx, args).await,
        Command::ViewPr(args) => commands::issues::view_pr(&ctx, args).await,
        Command::Workflow { repo, command } => {
            commands::workflow::run(&ctx, repo.as_deref(), command).await
        }
    }
}

impl ColorMode {
    /// Convert a CLI color mode into a color choice.
    fn into_choice(self) -> commands::ColorChoice {
        match self {
            Self::Auto => commands::ColorChoice::Auto,
            Self::Always => commands::ColorChoice::Always,
            Self::Never => commands::ColorChoice::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Command};
    use crate::commands::template::TemplateCommand;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn issue_commands_are_top_level() {
        let cli = Cli::try_parse_from([
            "hubqueue",
            "create-issue-cmd",
            "Broken build",
            "--repo",
            "octo/hello",
            "--label",
            "bug",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Command::CreateIssueCmd(_)));
    }

    #[test]
    fn workflow_repo_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "hubqueue", "workflow", "runs", "--repo", "octo/hello", "--limit", "5",
        ])
        .expect("parse");
        let Command::Workflow { repo, .. } = cli.command else {
            panic!("expected workflow command");
        };
        assert_eq!(repo.as_deref(), Some("octo/hello"));
    }

    #[test]
    fn template_create_accepts_version_and_variables() {
        let cli = Cli::try_parse_from([
            "hubqueue", "template", "create", "rust-cli", "./skeleton", "--version", "2.0.0",
            "--var", "license=MIT", "--required", "author",
        ])
        .expect("parse");
        let Command::Template(TemplateCommand::Create {
            version,
            vars,
            required,
            ..
        }) = cli.command
        else {
            panic!("expected template create");
        };
        assert_eq!(version, "2.0.0");
        assert_eq!(vars, ["license=MIT"]);
        assert_eq!(required, ["author"]);
    }
}

//! Issue and pull request commands: listing, creating, viewing, checkout.

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::{
    commands::{timestamp, wrap_body},
    context::Context,
    error::{Error, Result},
    git::Git,
    github::{
        issues::{IssueFilter, NewIssue},
        pulls::PullFilter,
        types::{IssueComment, User},
    },
    palette,
    table::{OutputFormat, Table},
};

/// State filter for issue and pull request listings.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum StateFilter {
    /// Open only.
    #[default]
    Open,
    /// Closed only.
    Closed,
    /// Both.
    All,
}

impl StateFilter {
    /// Value sent to the API.
    fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }

    /// Capitalized form for headings.
    fn title(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::All => "All",
        }
    }
}

/// Arguments for `list-issues`.
#[derive(Debug, Args)]
pub struct ListIssuesArgs {
    /// Repository as `owner/repo`.
    #[arg(long)]
    repo: Option<String>,
    /// Issue state.
    #[arg(long, value_enum, default_value = "open")]
    state: StateFilter,
    /// Require a label (repeatable).
    #[arg(long = "label")]
    labels: Vec<String>,
    /// Filter by assignee login.
    #[arg(long)]
    assignee: Option<String>,
    /// Maximum number of issues.
    #[arg(long)]
    limit: Option<usize>,
    /// Output format.
    #[arg(long, value_enum, default_value = "simple")]
    format: OutputFormat,
}

/// Arguments for `list-prs`.
#[derive(Debug, Args)]
pub struct ListPrsArgs {
    /// Repository as `owner/repo`.
    #[arg(long)]
    repo: Option<String>,
    /// Pull request state.
    #[arg(long, value_enum, default_value = "open")]
    state: StateFilter,
    /// Filter by base branch.
    #[arg(long)]
    base: Option<String>,
    /// Filter by head branch (`user:branch`).
    #[arg(long)]
    head: Option<String>,
    /// Maximum number of pull requests.
    #[arg(long)]
    limit: Option<usize>,
    /// Output format.
    #[arg(long, value_enum, default_value = "simple")]
    format: OutputFormat,
}

/// Arguments for `create-issue-cmd`.
#[derive(Debug, Args)]
pub struct CreateIssueArgs {
    /// Issue title.
    title: String,
    /// Repository as `owner/repo`.
    #[arg(long)]
    repo: Option<String>,
    /// Issue body.
    #[arg(long, short = 'b')]
    body: Option<String>,
    /// Label to apply (repeatable).
    #[arg(long = "label")]
    labels: Vec<String>,
    /// Login to assign (repeatable).
    #[arg(long = "assignee")]
    assignees: Vec<String>,
}

/// Arguments for `checkout-pr`.
#[derive(Debug, Args)]
pub struct CheckoutPrArgs {
    /// Pull request number.
    number: u64,
    /// Repository as `owner/repo`.
    #[arg(long)]
    repo: Option<String>,
    /// Local clone to check out into.
    #[arg(long, default_value = ".")]
    directory: PathBuf,
}

/// Arguments for `view-issue` and `view-pr`.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Issue or pull request number.
    number: u64,
    /// Repository as `owner/repo`.
    #[arg(long)]
    repo: Option<String>,
}

/// Comma-joined logins, or `None`.
fn logins(users: &[User]) -> String {
    if users.is_empty() {
        return "None".to_string();
    }
    users
        .iter()
        .map(|user| user.login.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `list-issues`. Pull requests returned by the issues endpoint are skipped.
pub async fn list_issues(ctx: &Context, args: ListIssuesArgs) -> Result<()> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let filter = IssueFilter {
        state: args.state.as_str().to_string(),
        labels: args.labels,
        assignee: args.assignee,
        limit: args.limit,
    };
    let issues = ctx.client()?.list_issues(&repo, &filter).await?;
    if issues.is_empty() {
        println!("No {} issues found for {repo}", args.state.as_str());
        return Ok(());
    }

    let color = ctx.use_color();
    println!("{} issues for {repo}:", args.state.title());
    match args.format {
        OutputFormat::Simple => {
            for issue in &issues {
                println!("#{} - {}", issue.number, issue.title);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["Number", "Title", "State", "Assignees", "Labels"]);
            for issue in &issues {
                let labels = if issue.labels.is_empty() {
                    "None".to_string()
                } else {
                    issue
                        .labels
                        .iter()
                        .map(|label| label.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                table.row([
                    format!("#{}", issue.number),
                    issue.title.clone(),
                    palette::fmt_state(&issue.state, color),
                    logins(&issue.assignees),
                    labels,
                ]);
            }
            println!("{}", table.render());
        }
    }
    Ok(())
}

/// `list-prs`.
pub async fn list_prs(ctx: &Context, args: ListPrsArgs) -> Result<()> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let filter = PullFilter {
        state: args.state.as_str().to_string(),
        base: args.base,
        head: args.head,
        limit: args.limit,
    };
    let pulls = ctx.client()?.list_pulls(&repo, &filter).await?;
    if pulls.is_empty() {
        println!("No {} pull requests found for {repo}", args.state.as_str());
        return Ok(());
    }

    let color = ctx.use_color();
    println!("{} pull requests for {repo}:", args.state.title());
    match args.format {
        OutputFormat::Simple => {
            for pull in &pulls {
                println!("#{} - {}", pull.number, pull.title);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["Number", "Title", "State", "Base <- Head", "User"]);
            for pull in &pulls {
                let state = if pull.merged_at.is_some() {
                    "merged"
                } else {
                    pull.state.as_str()
                };
                table.row([
                    format!("#{}", pull.number),
                    pull.title.clone(),
                    palette::fmt_state(state, color),
                    format!("{} <- {}", pull.base.branch, pull.head.branch),
                    pull.user.login.clone(),
                ]);
            }
            println!("{}", table.render());
        }
    }
    Ok(())
}

/// `create-issue-cmd`.
pub async fn create_issue(ctx: &Context, args: CreateIssueArgs) -> Result<()> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let issue = NewIssue {
        title: &args.title,
        body: args.body.as_deref(),
        labels: &args.labels,
        assignees: &args.assignees,
    };
    let issue = ctx.client()?.create_issue(&repo, &issue).await?;
    println!("Created issue #{}: {}", issue.number, issue.title);
    println!("URL: {}", palette::fmt_path(&issue.html_url, ctx.use_color()));
    Ok(())
}

/// `checkout-pr`.
pub async fn checkout_pr(ctx: &Context, args: CheckoutPrArgs) -> Result<()> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let pull = ctx.client()?.pull(&repo, args.number).await?;
    let git = Git::new(&args.directory);
    git.ensure_repository()?;
    let branch = git.checkout_pull_request(args.number)?;
    let color = ctx.use_color();
    println!("Checked out pull request #{}: {}", pull.number, pull.title);
    println!("Branch: {}", palette::fmt_name(&branch, color));
    println!("Base: {}", pull.base.branch);
    println!("Head: {}", pull.head.label);
    println!("URL: {}", palette::fmt_path(&pull.html_url, color));
    Ok(())
}

/// Print the description block shared by issue and pull request views.
fn print_description(body: Option<&str>, color: bool) {
    println!("\n{}", palette::fmt_heading("Description:", color));
    match body.filter(|body| !body.trim().is_empty()) {
        Some(body) => println!("{}", wrap_body(body)),
        None => println!("  (No description)"),
    }
}

/// Print a numbered list of conversation comments.
fn print_comments(comments: &[IssueComment], color: bool) {
    if comments.is_empty() {
        return;
    }
    println!(
        "\n{}\n",
        palette::fmt_heading(&format!("Comments ({}):", comments.len()), color)
    );
    for (index, comment) in comments.iter().enumerate() {
        println!(
            "Comment #{} by {} on {}:",
            index + 1,
            palette::fmt_name(&comment.user.login, color),
            timestamp(&comment.created_at)
        );
        println!("{}\n", wrap_body(&comment.body));
    }
}

/// `view-issue`.
pub async fn view_issue(ctx: &Context, args: ViewArgs) -> Result<()> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let client = ctx.client()?;
    let issue = client.issue(&repo, args.number).await?;
    if issue.is_pull_request() {
        return Err(Error::validation(format!(
            "#{} is a pull request. Use `hubqueue view-pr {}` instead.",
            issue.number, issue.number
        )));
    }
    let comments = client.issue_comments(&repo, args.number).await?;

    let color = ctx.use_color();
    let labels = issue
        .labels
        .iter()
        .map(|label| label.name.as_str())
        .collect::<Vec<_>>();
    println!(
        "{}",
        palette::fmt_heading(&format!("Issue #{}: {}", issue.number, issue.title), color)
    );
    println!("State: {}", palette::fmt_state(&issue.state, color));
    println!("Created by: {}", issue.user.login);
    println!("Created at: {}", timestamp(&issue.created_at));
    println!("Updated at: {}", timestamp(&issue.updated_at));
    println!("URL: {}", palette::fmt_path(&issue.html_url, color));
    println!("Assignees: {}", logins(&issue.assignees));
    if labels.is_empty() {
        println!("Labels: None");
    } else {
        println!("Labels: {}", labels.join(", "));
    }
    print_description(issue.body.as_deref(), color);
    print_comments(&comments, color);
    Ok(())
}

/// Merge status line for a pull request.
fn merge_status(merged: bool, mergeable: Option<bool>) -> &'static str {
    match (merged, mergeable) {
        (true, _) => "Merged",
        (false, Some(true)) => "Ready to merge",
        (false, Some(false)) => "Conflicts need to be resolved",
        (false, None) => "Unknown",
    }
}

/// `view-pr`.
pub async fn view_pr(ctx: &Context, args: ViewArgs) -> Result<()> {
    let repo = ctx.repo(args.repo.as_deref())?;
    let client = ctx.client()?;
    let pull = client.pull(&repo, args.number).await?;
    let commits = client.pull_commits(&repo, args.number).await?;
    let comments = client.issue_comments(&repo, args.number).await?;
    let review_comments = client.pull_review_comments(&repo, args.number).await?;

    let color = ctx.use_color();
    println!(
        "{}",
        palette::fmt_heading(
            &format!("Pull Request #{}: {}", pull.number, pull.title),
            color
        )
    );
    let state = if pull.merged {
        "merged"
    } else {
        pull.state.as_str()
    };
    println!("State: {}", palette::fmt_state(state, color));
    println!("Created by: {}", pull.user.login);
    println!("Created at: {}", timestamp(&pull.created_at));
    println!("Updated at: {}", timestamp(&pull.updated_at));
    println!("URL: {}", palette::fmt_path(&pull.html_url, color));
    println!("Branch: {} -> {}", pull.head.branch, pull.base.branch);
    println!("Status: {}", merge_status(pull.merged, pull.mergeable));
    println!(
        "Changes: +{} -{} in {} files",
        pull.additions, pull.deletions, pull.changed_files
    );
    print_description(pull.body.as_deref(), color);

    if !commits.is_empty() {
        println!(
            "\n{}\n",
            palette::fmt_heading(&format!("Commits ({}):", commits.len()), color)
        );
        for (index, commit) in commits.iter().enumerate() {
            let short = commit.sha.get(..7).unwrap_or(&commit.sha);
            let date = commit
                .commit
                .author
                .date
                .as_ref()
                .map(timestamp)
                .unwrap_or_default();
            println!(
                "Commit {}: {} by {} on {date}",
                index + 1,
                palette::fmt_name(short, color),
                commit.commit.author.name
            );
            println!(
                "  {}",
                commit.commit.message.lines().next().unwrap_or_default()
            );
        }
    }
    print_comments(&comments, color);
    if !review_comments.is_empty() {
        println!(
            "\n{}\n",
            palette::fmt_heading(
                &format!("Review comments ({}):", review_comments.len()),
                color
            )
        );
        for comment in &review_comments {
            println!(
                "{} on {} ({}):",
                palette::fmt_name(&comment.user.login, color),
                palette::fmt_path(&comment.path, color),
                timestamp(&comment.created_at)
            );
            println!("{}\n", wrap_body(&comment.body));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::merge_status;

    #[test]
    fn merge_status_prefers_merged_flag() {
        assert_eq!(merge_status(true, Some(false)), "Merged");
        assert_eq!(merge_status(false, Some(true)), "Ready to merge");
        assert_eq!(
            merge_status(false, Some(false)),
            "Conflicts need to be resolved"
        );
        assert_eq!(merge_status(false, None), "Unknown");
    }
}

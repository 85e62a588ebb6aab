//! Implementation of the `hubqueue project` commands.

use clap::Subcommand;
use tracing::warn;

use crate::{
    commands::{confirm, timestamp},
    context::Context,
    error::Result,
    github::{
        GitHubClient, RepoName,
        projects::{CardContentKind, CardPosition, ProjectTemplate, card_content_ref},
        types::ProjectCard,
    },
    palette,
    table::{OutputFormat, Table},
};

/// Project board subcommands.
#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// List project boards of a repository.
    List {
        /// Repository as `owner/repo`.
        #[arg(long)]
        repo: Option<String>,
        /// Output format.
        #[arg(long, value_enum, default_value = "simple")]
        format: OutputFormat,
    },
    /// Show a board with its columns and cards.
    View {
        /// Project id.
        project_id: u64,
    },
    /// Create an empty board.
    Create {
        /// Board name.
        name: String,
        /// Repository as `owner/repo`.
        #[arg(long)]
        repo: Option<String>,
        /// Board description.
        #[arg(long)]
        body: Option<String>,
    },
    /// Create a board with a predefined column layout.
    CreateFromTemplate {
        /// Board name.
        name: String,
        /// Layout: `basic`, `automated`, or `bug_triage`.
        #[arg(long, default_value = "basic")]
        template: String,
        /// Repository as `owner/repo`.
        #[arg(long)]
        repo: Option<String>,
        /// Board description.
        #[arg(long)]
        body: Option<String>,
    },
    /// Add a column to a board.
    AddColumn {
        /// Project id.
        project_id: u64,
        /// Column name.
        name: String,
    },
    /// Add a card linking an issue.
    AddIssue {
        /// Column id.
        column_id: u64,
        /// Issue number.
        number: u64,
        /// Repository as `owner/repo`.
        #[arg(long)]
        repo: Option<String>,
    },
    /// Add a card linking a pull request.
    AddPr {
        /// Column id.
        column_id: u64,
        /// Pull request number.
        number: u64,
        /// Repository as `owner/repo`.
        #[arg(long)]
        repo: Option<String>,
    },
    /// Add a note card.
    AddNote {
        /// Column id.
        column_id: u64,
        /// Note text.
        note: String,
    },
    /// Move a card.
    MoveCard {
        /// Card id.
        card_id: u64,
        /// Destination column id.
        column_id: u64,
        /// `top`, `bottom`, or `after:<card_id>`.
        #[arg(long, default_value = "top")]
        position: String,
    },
    /// Delete a card.
    DeleteCard {
        /// Card id.
        card_id: u64,
    },
    /// Delete a column.
    DeleteColumn {
        /// Column id.
        column_id: u64,
    },
    /// Delete a board.
    Delete {
        /// Project id.
        project_id: u64,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Execute a project subcommand.
pub async fn run(ctx: &Context, command: ProjectCommand) -> Result<()> {
    let client = ctx.client()?;
    let color = ctx.use_color();
    match command {
        ProjectCommand::List { repo, format } => {
            list(ctx, &client, &ctx.repo(repo.as_deref())?, format).await
        }
        ProjectCommand::View { project_id } => view(ctx, &client, project_id).await,
        ProjectCommand::Create { name, repo, body } => {
            let repo = ctx.repo(repo.as_deref())?;
            let project = client.create_project(&repo, &name, body.as_deref()).await?;
            println!(
                "Created project {} (id {})",
                palette::fmt_name(&project.name, color),
                project.id
            );
            println!("URL: {}", palette::fmt_path(&project.html_url, color));
            Ok(())
        }
        ProjectCommand::CreateFromTemplate {
            name,
            template,
            repo,
            body,
        } => {
            let template = ProjectTemplate::parse(&template)?;
            let repo = ctx.repo(repo.as_deref())?;
            create_from_template(ctx, &client, &repo, &name, body.as_deref(), template).await
        }
        ProjectCommand::AddColumn { project_id, name } => {
            let column = client.create_column(project_id, &name).await?;
            println!(
                "Added column {} (id {})",
                palette::fmt_name(&column.name, color),
                column.id
            );
            Ok(())
        }
        ProjectCommand::AddIssue {
            column_id,
            number,
            repo,
        } => {
            let repo = ctx.repo(repo.as_deref())?;
            add_content(&client, &repo, column_id, number, CardContentKind::Issue).await
        }
        ProjectCommand::AddPr {
            column_id,
            number,
            repo,
        } => {
            let repo = ctx.repo(repo.as_deref())?;
            add_content(&client, &repo, column_id, number, CardContentKind::PullRequest).await
        }
        ProjectCommand::AddNote { column_id, note } => {
            let card = client.create_note_card(column_id, &note).await?;
            println!("Added note card {}", card.id);
            Ok(())
        }
        ProjectCommand::MoveCard {
            card_id,
            column_id,
            position,
        } => {
            let position = CardPosition::parse(&position)?;
            client.move_card(card_id, column_id, position).await?;
            println!("Moved card {card_id} to column {column_id} ({position})");
            Ok(())
        }
        ProjectCommand::DeleteCard { card_id } => {
            client.delete_card(card_id).await?;
            println!("Deleted card {card_id}");
            Ok(())
        }
        ProjectCommand::DeleteColumn { column_id } => {
            client.delete_column(column_id).await?;
            println!("Deleted column {column_id}");
            Ok(())
        }
        ProjectCommand::Delete { project_id, yes } => {
            if !yes && !confirm(&format!("Delete project {project_id}?"), false)? {
                println!("Aborted.");
                return Ok(());
            }
            client.delete_project(project_id).await?;
            println!("Deleted project {project_id}");
            Ok(())
        }
    }
}

/// `project list`.
async fn list(
    ctx: &Context,
    client: &GitHubClient,
    repo: &RepoName,
    format: OutputFormat,
) -> Result<()> {
    let projects = client.list_projects(repo).await?;
    if projects.is_empty() {
        println!("No projects found for {repo}");
        return Ok(());
    }
    let color = ctx.use_color();
    println!("Projects for {repo}:");
    match format {
        OutputFormat::Simple => {
            for project in &projects {
                println!(
                    "{} - {} ({})",
                    project.id,
                    palette::fmt_name(&project.name, color),
                    project.state
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["ID", "Number", "Name", "State", "Updated"]);
            for project in &projects {
                table.row([
                    project.id.to_string(),
                    format!("#{}", project.number),
                    project.name.clone(),
                    palette::fmt_state(&project.state, color),
                    timestamp(&project.updated_at),
                ]);
            }
            println!("{}", table.render());
        }
    }
    Ok(())
}

/// `project add-issue` and `project add-pr`: cards link by global id, not
/// by number.
async fn add_content(
    client: &GitHubClient,
    repo: &RepoName,
    column_id: u64,
    number: u64,
    kind: CardContentKind,
) -> Result<()> {
    let (content_id, label) = match kind {
        CardContentKind::Issue => (client.issue(repo, number).await?.id, "issue"),
        CardContentKind::PullRequest => (client.pull(repo, number).await?.id, "pull request"),
    };
    let card = client
        .create_content_card(column_id, content_id, kind)
        .await?;
    println!("Added {label} #{number} as card {}", card.id);
    Ok(())
}

/// `project create-from-template`.
async fn create_from_template(
    ctx: &Context,
    client: &GitHubClient,
    repo: &RepoName,
    name: &str,
    body: Option<&str>,
    template: ProjectTemplate,
) -> Result<()> {
    let color = ctx.use_color();
    let project = client.create_project(repo, name, body).await?;
    println!(
        "Created project {} (id {}) from template {}",
        palette::fmt_name(&project.name, color),
        project.id,
        template.name()
    );
    for column in template.columns() {
        let created = client.create_column(project.id, column).await?;
        println!("  Added column {} (id {})", created.name, created.id);
    }
    println!("URL: {}", palette::fmt_path(&project.html_url, color));
    Ok(())
}

/// Repository a card's `content_url` points into.
fn content_repo(content_url: &str) -> Option<RepoName> {
    let (_, tail) = content_url.split_once("/repos/")?;
    let mut parts = tail.split('/');
    let owner = parts.next()?;
    let repo = parts.next()?;
    RepoName::parse(&format!("{owner}/{repo}")).ok()
}

/// One-line description of a card, resolving linked issues and pull
/// requests. Lookup failures fall back to the raw URL.
async fn describe_card(client: &GitHubClient, card: &ProjectCard) -> String {
    if let Some(note) = &card.note {
        return format!("Note: {}", note.lines().next().unwrap_or_default());
    }
    let Some(url) = card.content_url.as_deref() else {
        return "(empty card)".to_string();
    };
    let (Some((kind, number)), Some(repo)) = (card_content_ref(url), content_repo(url)) else {
        return url.to_string();
    };
    let resolved = match kind {
        CardContentKind::Issue => client
            .issue(&repo, number)
            .await
            .map(|issue| format!("Issue #{number}: {} ({})", issue.title, issue.state)),
        CardContentKind::PullRequest => client
            .pull(&repo, number)
            .await
            .map(|pull| format!("PR #{number}: {} ({})", pull.title, pull.state)),
    };
    resolved.unwrap_or_else(|error| {
        warn!(%url, %error, "could not resolve card content");
        url.to_string()
    })
}

/// `project view`.
async fn view(ctx: &Context, client: &GitHubClient, project_id: u64) -> Result<()> {
    let color = ctx.use_color();
    let project = client.project(project_id).await?;
    println!(
        "{}",
        palette::fmt_heading(&format!("Project {}: {}", project.id, project.name), color)
    );
    println!("State: {}", palette::fmt_state(&project.state, color));
    if let Some(body) = project.body.as_deref().filter(|body| !body.is_empty()) {
        println!("Description: {body}");
    }
    println!("Created at: {}", timestamp(&project.created_at));
    println!("URL: {}", palette::fmt_path(&project.html_url, color));

    let columns = client.project_columns(project_id).await?;
    if columns.is_empty() {
        println!("\nNo columns.");
        return Ok(());
    }
    for column in &columns {
        let cards = client.column_cards(column.id).await?;
        println!(
            "\n{} (id {}, {} card(s))",
            palette::fmt_heading(&column.name, color),
            column.id,
            cards.len()
        );
        for card in &cards {
            println!("  [{}] {}", card.id, describe_card(client, card).await);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::content_repo;

    #[test]
    fn content_repo_reads_api_urls() {
        let repo = content_repo("https://api.github.com/repos/octo/hello/issues/7").expect("repo");
        assert_eq!(repo.to_string(), "octo/hello");
        assert!(content_repo("https://example.com/x").is_none());
    }
}

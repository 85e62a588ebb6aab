//! Implementation of the `hubqueue workflow` commands.

use std::time::Duration;

use clap::Subcommand;

use crate::{
    commands::{password, timestamp},
    context::Context,
    error::{Error, Result},
    github::{
        RepoName,
        actions::{DEFAULT_MONITOR_INTERVAL, DEFAULT_MONITOR_TIMEOUT, RunFilter, parse_inputs},
        types::WorkflowRun,
    },
    palette,
    poll::SystemClock,
    system::format_bytes,
    table::{OutputFormat, Table},
};

/// Workflow subcommands.
#[derive(Debug, Subcommand)]
pub enum WorkflowCommand {
    /// List workflows.
    List {
        /// Output format.
        #[arg(long, value_enum, default_value = "simple")]
        format: OutputFormat,
    },
    /// Dispatch a workflow run.
    Trigger {
        /// Workflow id or file name.
        workflow: String,
        /// Git ref to run on.
        #[arg(long = "ref", default_value = "main")]
        git_ref: String,
        /// Workflow input as `key=value` (repeatable).
        #[arg(long = "input")]
        inputs: Vec<String>,
    },
    /// List workflow runs.
    Runs {
        /// Workflow id or file name.
        #[arg(long)]
        workflow: Option<String>,
        /// Run status.
        #[arg(long)]
        status: Option<String>,
        /// Branch name.
        #[arg(long)]
        branch: Option<String>,
        /// Maximum number of runs.
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Output format.
        #[arg(long, value_enum, default_value = "simple")]
        format: OutputFormat,
    },
    /// Show a run and its jobs.
    View {
        /// Run id.
        run_id: u64,
    },
    /// Wait for a run to finish.
    Monitor {
        /// Run id.
        run_id: u64,
        /// Seconds between checks.
        #[arg(long, default_value_t = DEFAULT_MONITOR_INTERVAL)]
        interval: u64,
        /// Seconds before giving up.
        #[arg(long, default_value_t = DEFAULT_MONITOR_TIMEOUT)]
        timeout: u64,
    },
    /// Cancel a run.
    Cancel {
        /// Run id.
        run_id: u64,
    },
    /// Re-run a run.
    Rerun {
        /// Run id.
        run_id: u64,
    },
    /// List secret names.
    Secrets,
    /// Create or update a secret.
    SetSecret {
        /// Secret name.
        name: String,
        /// Secret value (prompted for when omitted).
        #[arg(long)]
        value: Option<String>,
    },
    /// Delete a secret.
    DeleteSecret {
        /// Secret name.
        name: String,
    },
    /// List Actions caches.
    Caches {
        /// Output format.
        #[arg(long, value_enum, default_value = "simple")]
        format: OutputFormat,
    },
    /// Delete a cache by id or every cache with a key.
    DeleteCache {
        /// Cache id.
        #[arg(long, conflicts_with = "key")]
        id: Option<u64>,
        /// Cache key.
        #[arg(long)]
        key: Option<String>,
    },
}

/// Execute a workflow subcommand.
pub async fn run(
    ctx: &Context,
    repo: Option<&str>,
    command: WorkflowCommand,
) -> Result<()> {
    let repo = ctx.repo(repo)?;
    match command {
        WorkflowCommand::List { format } => list(ctx, &repo, format).await,
        WorkflowCommand::Trigger {
            workflow,
            git_ref,
            inputs,
        } => trigger(ctx, &repo, &workflow, &git_ref, &inputs).await,
        WorkflowCommand::Runs {
            workflow,
            status,
            branch,
            limit,
            format,
        } => {
            let filter = RunFilter {
                workflow,
                status,
                branch,
                limit: Some(limit),
            };
            runs(ctx, &repo, &filter, format).await
        }
        WorkflowCommand::View { run_id } => view(ctx, &repo, run_id).await,
        WorkflowCommand::Monitor {
            run_id,
            interval,
            timeout,
        } => monitor(ctx, &repo, run_id, interval, timeout).await,
        WorkflowCommand::Cancel { run_id } => {
            ctx.client()?.cancel_run(&repo, run_id).await?;
            println!("Cancellation requested for run {run_id}");
            Ok(())
        }
        WorkflowCommand::Rerun { run_id } => {
            ctx.client()?.rerun_run(&repo, run_id).await?;
            println!("Re-run requested for run {run_id}");
            Ok(())
        }
        WorkflowCommand::Secrets => secrets(ctx, &repo).await,
        WorkflowCommand::SetSecret { name, value } => {
            let value = match value {
                Some(value) => value,
                None => password(&format!("Value for {name}:"))?,
            };
            ctx.client()?.put_secret(&repo, &name, &value).await?;
            println!(
                "Secret {} saved for {repo}",
                palette::fmt_name(&name, ctx.use_color())
            );
            Ok(())
        }
        WorkflowCommand::DeleteSecret { name } => {
            ctx.client()?.delete_secret(&repo, &name).await?;
            println!("Deleted secret {name}");
            Ok(())
        }
        WorkflowCommand::Caches { format } => caches(ctx, &repo, format).await,
        WorkflowCommand::DeleteCache { id, key } => {
            delete_cache(ctx, &repo, id, key.as_deref()).await
        }
    }
}

/// Conclusion if finished, else the status.
fn run_state(run: &WorkflowRun) -> &str {
    run.conclusion.as_deref().unwrap_or(&run.status)
}

/// `workflow list`.
async fn list(ctx: &Context, repo: &RepoName, format: OutputFormat) -> Result<()> {
    let workflows = ctx.client()?.list_workflows(repo).await?;
    if workflows.is_empty() {
        println!("No workflows found for {repo}");
        return Ok(());
    }
    let color = ctx.use_color();
    println!("Workflows for {repo}:");
    match format {
        OutputFormat::Simple => {
            for workflow in &workflows {
                println!(
                    "{} - {} ({})",
                    workflow.id,
                    palette::fmt_name(&workflow.name, color),
                    workflow.path
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["ID", "Name", "Path", "State"]);
            for workflow in &workflows {
                table.row([
                    workflow.id.to_string(),
                    workflow.name.clone(),
                    workflow.path.clone(),
                    workflow.state.clone(),
                ]);
            }
            println!("{}", table.render());
        }
    }
    Ok(())
}

/// `workflow trigger`.
async fn trigger(
    ctx: &Context,
    repo: &RepoName,
    workflow: &str,
    git_ref: &str,
    inputs: &[String],
) -> Result<()> {
    let inputs = parse_inputs(inputs)?;
    let client = ctx.client()?;
    let workflow = client.workflow(repo, workflow).await?;
    client
        .dispatch_workflow(repo, workflow.id, git_ref, &inputs)
        .await?;
    println!(
        "Triggered {} on {git_ref}",
        palette::fmt_name(&workflow.name, ctx.use_color())
    );
    Ok(())
}

/// `workflow runs`.
async fn runs(
    ctx: &Context,
    repo: &RepoName,
    filter: &RunFilter,
    format: OutputFormat,
) -> Result<()> {
    let runs = ctx.client()?.list_runs(repo, filter).await?;
    if runs.is_empty() {
        println!("No workflow runs found for {repo}");
        return Ok(());
    }
    let color = ctx.use_color();
    println!("Workflow runs for {repo}:");
    match format {
        OutputFormat::Simple => {
            for run in &runs {
                println!(
                    "{} - {} [{}] {}",
                    run.id,
                    run.name.as_deref().unwrap_or("(unnamed)"),
                    palette::fmt_state(run_state(run), color),
                    run.head_branch.as_deref().unwrap_or("-")
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["ID", "Name", "State", "Branch", "Event", "Created"]);
            for run in &runs {
                table.row([
                    run.id.to_string(),
                    run.name.clone().unwrap_or_default(),
                    palette::fmt_state(run_state(run), color),
                    run.head_branch.clone().unwrap_or_default(),
                    run.event.clone(),
                    timestamp(&run.created_at),
                ]);
            }
            println!("{}", table.render());
        }
    }
    Ok(())
}

/// `workflow view`.
async fn view(ctx: &Context, repo: &RepoName, run_id: u64) -> Result<()> {
    let client = ctx.client()?;
    let run = client.workflow_run(repo, run_id).await?;
    let jobs = client.run_jobs(repo, run_id).await?;
    let color = ctx.use_color();
    println!(
        "{}",
        palette::fmt_heading(
            &format!(
                "Run {}: {}",
                run.id,
                run.name.as_deref().unwrap_or("(unnamed)")
            ),
            color
        )
    );
    println!("Status: {}", palette::fmt_state(run_state(&run), color));
    println!("Branch: {}", run.head_branch.as_deref().unwrap_or("-"));
    println!("Commit: {}", run.head_sha);
    println!("Event: {}", run.event);
    println!("Created at: {}", timestamp(&run.created_at));
    println!("URL: {}", palette::fmt_path(&run.html_url, color));
    if jobs.is_empty() {
        return Ok(());
    }
    println!("\n{}", palette::fmt_heading("Jobs:", color));
    for job in &jobs {
        let state = job.conclusion.as_deref().unwrap_or(&job.status);
        println!("  {} [{}]", job.name, palette::fmt_state(state, color));
        for step in &job.steps {
            let state = step.conclusion.as_deref().unwrap_or(&step.status);
            println!("    {}. {} [{state}]", step.number, step.name);
        }
    }
    Ok(())
}

/// `workflow monitor`.
async fn monitor(
    ctx: &Context,
    repo: &RepoName,
    run_id: u64,
    interval: u64,
    timeout: u64,
) -> Result<()> {
    let client = ctx.client()?;
    let clock = SystemClock::start();
    println!("Monitoring run {run_id} (timeout {timeout}s)...");
    let result = client
        .monitor_workflow_run(
            repo,
            run_id,
            &clock,
            Duration::from_secs(interval),
            Duration::from_secs(timeout),
        )
        .await?;
    let color = ctx.use_color();
    if result.timed_out {
        println!(
            "{}",
            palette::fmt_warning(
                &format!(
                    "Timed out after {timeout}s; run is still {}",
                    result.run.status
                ),
                color
            )
        );
        return Ok(());
    }
    let conclusion = result.conclusion.as_deref().unwrap_or("unknown");
    println!(
        "Run {run_id} completed: {}",
        palette::fmt_state(conclusion, color)
    );
    println!("URL: {}", palette::fmt_path(&result.run.html_url, color));
    Ok(())
}

/// `workflow secrets`.
async fn secrets(ctx: &Context, repo: &RepoName) -> Result<()> {
    let secrets = ctx.client()?.list_secrets(repo).await?;
    if secrets.is_empty() {
        println!("No secrets found for {repo}");
        return Ok(());
    }
    let mut table = Table::new(["Name", "Updated"]);
    for secret in &secrets {
        table.row([secret.name.clone(), timestamp(&secret.updated_at)]);
    }
    println!("Secrets for {repo}:");
    println!("{}", table.render());
    Ok(())
}

/// `workflow caches`.
async fn caches(ctx: &Context, repo: &RepoName, format: OutputFormat) -> Result<()> {
    let caches = ctx.client()?.list_caches(repo).await?;
    if caches.is_empty() {
        println!("No caches found for {repo}");
        return Ok(());
    }
    println!("Caches for {repo}:");
    match format {
        OutputFormat::Simple => {
            for cache in &caches {
                println!(
                    "{} - {} ({})",
                    cache.id,
                    cache.key,
                    format_bytes(cache.size_in_bytes)
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["ID", "Key", "Ref", "Size", "Last used"]);
            for cache in &caches {
                table.row([
                    cache.id.to_string(),
                    cache.key.clone(),
                    cache.git_ref.clone(),
                    format_bytes(cache.size_in_bytes),
                    cache
                        .last_accessed_at
                        .as_ref()
                        .map(timestamp)
                        .unwrap_or_default(),
                ]);
            }
            println!("{}", table.render());
        }
    }
    Ok(())
}

/// `workflow delete-cache`.
async fn delete_cache(
    ctx: &Context,
    repo: &RepoName,
    id: Option<u64>,
    key: Option<&str>,
) -> Result<()> {
    let client = ctx.client()?;
    match (id, key) {
        (Some(id), _) => {
            client.delete_cache_by_id(repo, id).await?;
            println!("Deleted cache {id}");
        }
        (None, Some(key)) => {
            client.delete_cache_by_key(repo, key).await?;
            println!("Deleted caches with key {key}");
        }
        (None, None) => {
            return Err(Error::validation("Specify a cache with --id or --key"));
        }
    }
    Ok(())
}

//! Implementation of the `hubqueue notifications` commands.

use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use tokio::signal;
use tracing::info;

use crate::{
    commands::timestamp,
    context::Context,
    error::Result,
    github::{
        notifications::{self, DEFAULT_WATCH_INTERVAL, NotificationFilter},
        types::Notification,
    },
    palette,
    poll::SystemClock,
    table::{OutputFormat, Table},
};

/// Notification subcommands.
#[derive(Debug, Subcommand)]
pub enum NotificationsCommand {
    /// List notification threads.
    List {
        /// Include threads already read.
        #[arg(long)]
        all: bool,
        /// Only threads you participate in.
        #[arg(long)]
        participating: bool,
        /// Only threads updated after this RFC 3339 time.
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Only threads updated before this RFC 3339 time.
        #[arg(long)]
        before: Option<DateTime<Utc>>,
        /// Maximum number of threads.
        #[arg(long)]
        limit: Option<usize>,
        /// Output format.
        #[arg(long, value_enum, default_value = "simple")]
        format: OutputFormat,
    },
    /// Mark one thread as read.
    Read {
        /// Thread id.
        thread_id: String,
    },
    /// Mark every notification as read.
    ReadAll {
        /// Only notifications for this repository (`owner/repo`).
        #[arg(long)]
        repo: Option<String>,
    },
    /// Print new notifications as they arrive until interrupted.
    Watch {
        /// Seconds between checks.
        #[arg(long, default_value_t = DEFAULT_WATCH_INTERVAL)]
        interval: u64,
        /// Stop after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
        /// Only threads you participate in.
        #[arg(long)]
        participating: bool,
    },
}

/// Execute a notifications subcommand.
pub async fn run(ctx: &Context, command: NotificationsCommand) -> Result<()> {
    match command {
        NotificationsCommand::List {
            all,
            participating,
            since,
            before,
            limit,
            format,
        } => {
            let filter = NotificationFilter {
                all,
                participating,
                since,
                before,
                limit,
            };
            list(ctx, &filter, format).await
        }
        NotificationsCommand::Read { thread_id } => {
            ctx.client()?.mark_thread_read(&thread_id).await?;
            println!("Marked thread {thread_id} as read");
            Ok(())
        }
        NotificationsCommand::ReadAll { repo } => {
            let client = ctx.client()?;
            match repo {
                Some(repo) => {
                    let repo = ctx.repo(Some(&repo))?;
                    client.mark_all_read(Some(&repo)).await?;
                    println!("Marked all notifications for {repo} as read");
                }
                None => {
                    client.mark_all_read(None).await?;
                    println!("Marked all notifications as read");
                }
            }
            Ok(())
        }
        NotificationsCommand::Watch {
            interval,
            timeout,
            participating,
        } => watch(ctx, interval, timeout, participating).await,
    }
}

/// One-line rendering of a notification.
fn describe(notification: &Notification, color: bool) -> String {
    format!(
        "[{}] {} - {} ({})",
        palette::fmt_name(&notification.repository.full_name, color),
        notification.subject.kind,
        notification.subject.title,
        notification.reason
    )
}

/// `notifications list`.
async fn list(ctx: &Context, filter: &NotificationFilter, format: OutputFormat) -> Result<()> {
    let notifications = ctx.client()?.list_notifications(filter).await?;
    if notifications.is_empty() {
        println!("No notifications.");
        return Ok(());
    }
    let color = ctx.use_color();
    match format {
        OutputFormat::Simple => {
            for notification in &notifications {
                let marker = if notification.unread { "*" } else { " " };
                println!("{marker} {} {}", notification.id, describe(notification, color));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["ID", "Repository", "Type", "Title", "Reason", "Updated"]);
            for notification in &notifications {
                table.row([
                    notification.id.clone(),
                    notification.repository.full_name.clone(),
                    notification.subject.kind.clone(),
                    notification.subject.title.clone(),
                    notification.reason.clone(),
                    timestamp(&notification.updated_at),
                ]);
            }
            println!("{}", table.render());
        }
    }
    Ok(())
}

/// `notifications watch`.
async fn watch(
    ctx: &Context,
    interval: u64,
    timeout: Option<u64>,
    participating: bool,
) -> Result<()> {
    let client = &ctx.client()?;
    let color = ctx.use_color();
    let clock = SystemClock::start();
    println!("Watching notifications every {interval}s. Press Ctrl-C to stop.");
    let watcher = notifications::watch(
        &clock,
        Duration::from_secs(interval),
        timeout.map(Duration::from_secs),
        move |since| {
            let filter = NotificationFilter {
                participating,
                since,
                ..NotificationFilter::default()
            };
            async move { client.list_notifications(&filter).await }
        },
        |notification| {
            println!(
                "{} {}",
                timestamp(&notification.updated_at),
                describe(notification, color)
            );
        },
    );
    tokio::select! {
        result = watcher => result,
        _ = signal::ctrl_c() => {
            info!("notification watcher interrupted");
            println!("\nStopped watching notifications.");
            Ok(())
        }
    }
}

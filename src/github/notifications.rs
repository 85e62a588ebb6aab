//! Notification threads and the polling watcher.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    future::Future,
    time::Duration,
};

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    github::{GitHubClient, RepoName, types::Notification},
    poll::{Clock, poll_until},
};

/// Default seconds between notification checks.
pub const DEFAULT_WATCH_INTERVAL: u64 = 60;

/// Filters for listing notifications.
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    /// Include threads already marked read.
    pub all: bool,
    /// Only threads the user participates in.
    pub participating: bool,
    /// Only threads updated after this time.
    pub since: Option<DateTime<Utc>>,
    /// Only threads updated before this time.
    pub before: Option<DateTime<Utc>>,
    /// Maximum number to return.
    pub limit: Option<usize>,
}

impl GitHubClient {
    /// Notification threads for the authenticated user.
    pub(crate) async fn list_notifications(
        &self,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>> {
        let mut query = vec![
            ("all", filter.all.to_string()),
            ("participating", filter.participating.to_string()),
        ];
        if let Some(since) = filter.since {
            query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(before) = filter.before {
            query.push(("before", before.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        self.get_pages("/notifications", &query, filter.limit).await
    }

    /// Mark one thread as read.
    pub(crate) async fn mark_thread_read(&self, thread_id: &str) -> Result<()> {
        self.call(Method::PATCH, &format!("/notifications/threads/{thread_id}"))
            .await
    }

    /// Mark every notification (optionally for one repository) as read.
    pub(crate) async fn mark_all_read(&self, repo: Option<&RepoName>) -> Result<()> {
        let path = match repo {
            Some(repo) => format!("{}/notifications", repo.path()),
            None => "/notifications".to_string(),
        };
        self.send_json(Method::PUT, &path, &json!({ "read": true }))
            .await
    }
}

/// Poll for notifications and hand each one not seen before to `on_new`.
///
/// The first fetch only records what already exists; its error aborts the
/// watcher. Later fetch errors are logged and polling continues. Without a
/// timeout the watcher runs until the caller drops it.
///
/// Threads last updated before the previous check are forgotten, since the
/// `since` filter only returns them again after new activity.
pub async fn watch<C, F, Fut, H>(
    clock: &C,
    interval: Duration,
    timeout: Option<Duration>,
    fetch: F,
    on_new: H,
) -> Result<()>
where
    C: Clock,
    F: Fn(Option<DateTime<Utc>>) -> Fut,
    Fut: Future<Output = Result<Vec<Notification>>>,
    H: FnMut(&Notification),
{
    let seen = &RefCell::new(HashMap::new());
    let last_check: &Cell<Option<DateTime<Utc>>> = &Cell::new(None);
    let on_new = &RefCell::new(on_new);
    let fetch = &fetch;

    poll_until(
        clock,
        interval,
        timeout,
        move || async move {
            let since = last_check.get();
            let checked_at = Utc::now();
            let batch = match fetch(since).await {
                Ok(batch) => batch,
                Err(error) if since.is_none() => return Err(error),
                Err(error) => {
                    warn!(%error, "failed to poll notifications");
                    return Ok(());
                }
            };
            last_check.set(Some(checked_at));
            let mut seen = seen.borrow_mut();
            if since.is_none() {
                seen.extend(
                    batch
                        .into_iter()
                        .map(|notification| (notification.id, notification.updated_at)),
                );
                info!(known = seen.len(), "watching notifications");
                return Ok(());
            }
            let mut handler = on_new.borrow_mut();
            let mut fresh = 0_usize;
            for notification in batch {
                if seen
                    .insert(notification.id.clone(), notification.updated_at)
                    .is_none()
                {
                    fresh += 1;
                    (*handler)(&notification);
                }
            }
            if let Some(since) = since {
                seen.retain(|_, updated_at| *updated_at >= since);
            }
            debug!(fresh, known = seen.len(), "notification poll finished");
            Ok(())
        },
        |()| false,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        time::Duration,
    };

    use chrono::{DateTime, TimeDelta, Utc};

    use super::watch;
    use crate::{
        error::Error,
        github::types::{Notification, NotificationRepository, NotificationSubject},
        poll::testing::ManualClock,
    };

    fn notification(id: &str) -> Notification {
        notification_at(id, Utc::now())
    }

    fn notification_at(id: &str, updated_at: DateTime<Utc>) -> Notification {
        Notification {
            id: id.to_string(),
            unread: true,
            reason: "mention".to_string(),
            updated_at,
            subject: NotificationSubject {
                title: format!("thread {id}"),
                kind: "Issue".to_string(),
                url: None,
            },
            repository: NotificationRepository {
                full_name: "o/r".to_string(),
                html_url: String::new(),
            },
        }
    }

    #[tokio::test]
    async fn reports_only_unseen_threads() {
        let clock = ManualClock::default();
        let calls = Cell::new(0_usize);
        let reported = RefCell::new(Vec::new());
        watch(
            &clock,
            Duration::from_secs(60),
            Some(Duration::from_secs(120)),
            |_since| {
                calls.set(calls.get() + 1);
                let batch = match calls.get() {
                    1 => vec![notification("1")],
                    2 => vec![notification("1"), notification("2")],
                    _ => vec![notification("2"), notification("3")],
                };
                async move { Ok(batch) }
            },
            |notification| reported.borrow_mut().push(notification.id.clone()),
        )
        .await
        .expect("watch");
        assert_eq!(*reported.borrow(), ["2", "3"]);
    }

    #[tokio::test]
    async fn later_errors_do_not_stop_watching() {
        let clock = ManualClock::default();
        let calls = Cell::new(0_usize);
        let reported = RefCell::new(Vec::new());
        watch(
            &clock,
            Duration::from_secs(60),
            Some(Duration::from_secs(120)),
            |_since| {
                calls.set(calls.get() + 1);
                let result = match calls.get() {
                    1 => Ok(Vec::new()),
                    2 => Err(Error::validation("flaky")),
                    _ => Ok(vec![notification("9")]),
                };
                async move { result }
            },
            |notification| reported.borrow_mut().push(notification.id.clone()),
        )
        .await
        .expect("watch");
        assert_eq!(calls.get(), 3);
        assert_eq!(*reported.borrow(), ["9"]);
    }

    #[tokio::test]
    async fn first_error_aborts() {
        let clock = ManualClock::default();
        let error = watch(
            &clock,
            Duration::from_secs(60),
            None,
            |_since| async { Err(Error::InvalidToken) },
            |_| {},
        )
        .await
        .expect_err("should fail");
        assert!(matches!(error, Error::InvalidToken));
    }

    #[tokio::test]
    async fn stale_threads_are_forgotten_and_reported_on_new_activity() {
        let clock = ManualClock::default();
        let calls = Cell::new(0_usize);
        let reported = RefCell::new(Vec::new());
        let yesterday = Utc::now() - TimeDelta::days(1);
        watch(
            &clock,
            Duration::from_secs(60),
            Some(Duration::from_secs(120)),
            |_since| {
                calls.set(calls.get() + 1);
                let batch = match calls.get() {
                    1 => vec![notification_at("1", yesterday)],
                    2 => Vec::new(),
                    _ => vec![notification("1")],
                };
                async move { Ok(batch) }
            },
            |notification| reported.borrow_mut().push(notification.id.clone()),
        )
        .await
        .expect("watch");
        assert_eq!(calls.get(), 3);
        assert_eq!(*reported.borrow(), ["1"]);
    }
}

//! Poll a remote resource until it reaches a terminal state.

use std::{
    future::Future,
    time::{Duration, Instant},
};

use tokio::time;
use tracing::trace;

use crate::error::Result;

/// Source of elapsed time and sleeps for polling loops.
pub trait Clock {
    /// Time elapsed since the clock started.
    fn elapsed(&self) -> Duration;

    /// Wait for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// Wall clock backed by tokio timers.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    /// When the clock was created.
    start: Instant,
}

impl SystemClock {
    /// Start a new clock now.
    pub(crate) fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        time::sleep(duration).await;
    }
}

/// How a polling loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The predicate accepted this value.
    Completed(T),
    /// The timeout elapsed; carries the last value fetched.
    TimedOut(T),
}

/// Fetch repeatedly until `is_done` accepts a value or `timeout` elapses.
///
/// Fetch errors propagate immediately. Without a timeout the loop only ends
/// when the predicate passes or the caller drops the future.
pub async fn poll_until<C, T, F, Fut, D>(
    clock: &C,
    interval: Duration,
    timeout: Option<Duration>,
    mut fetch: F,
    is_done: D,
) -> Result<PollOutcome<T>>
where
    C: Clock,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    D: Fn(&T) -> bool,
{
    loop {
        let value = fetch().await?;
        if is_done(&value) {
            return Ok(PollOutcome::Completed(value));
        }
        if let Some(limit) = timeout
            && clock.elapsed() >= limit
        {
            return Ok(PollOutcome::TimedOut(value));
        }
        trace!(?interval, "poll not done, sleeping");
        clock.sleep(interval).await;
    }
}

#[cfg(test)]
pub mod testing {
    //! Deterministic clock for polling tests.

    use std::{cell::Cell, future::Future, time::Duration};

    use super::Clock;

    /// Clock whose time only advances when something sleeps.
    #[derive(Debug, Default)]
    pub struct ManualClock {
        /// Simulated elapsed time.
        now: Cell<Duration>,
        /// Number of sleeps requested.
        sleeps: Cell<usize>,
    }

    impl ManualClock {
        /// Number of sleeps so far.
        pub fn sleeps(&self) -> usize {
            self.sleeps.get()
        }
    }

    impl Clock for ManualClock {
        fn elapsed(&self) -> Duration {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
            self.now.set(self.now.get() + duration);
            self.sleeps.set(self.sleeps.get() + 1);
            async {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, time::Duration};

    use super::{PollOutcome, poll_until, testing::ManualClock};
    use crate::error::{Error, Result};

    #[tokio::test]
    async fn returns_first_value_without_sleeping() {
        let clock = ManualClock::default();
        let outcome = poll_until(
            &clock,
            Duration::from_secs(5),
            Some(Duration::from_secs(30)),
            || async { Ok("completed") },
            |status| *status == "completed",
        )
        .await
        .expect("poll");
        assert_eq!(outcome, PollOutcome::Completed("completed"));
        assert_eq!(clock.sleeps(), 0);
    }

    #[tokio::test]
    async fn times_out_after_bounded_polls() {
        let clock = ManualClock::default();
        let fetches = Cell::new(0_usize);
        let outcome = poll_until(
            &clock,
            Duration::from_secs(5),
            Some(Duration::from_secs(20)),
            || {
                fetches.set(fetches.get() + 1);
                async { Ok("in_progress") }
            },
            |status| *status == "completed",
        )
        .await
        .expect("poll");
        assert_eq!(outcome, PollOutcome::TimedOut("in_progress"));
        assert_eq!(fetches.get(), 5);
        assert_eq!(clock.sleeps(), 4);
    }

    #[tokio::test]
    async fn fetch_error_propagates() {
        let clock = ManualClock::default();
        let result: Result<PollOutcome<()>> = poll_until(
            &clock,
            Duration::from_secs(1),
            None,
            || async { Err(Error::validation("boom")) },
            |_| false,
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(clock.sleeps(), 0);
    }
}

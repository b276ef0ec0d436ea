//! Cursor-based polling monitor.
//!
//! [`PollMonitor`] drives a fetch function at a fixed interval, emitting
//! every returned event in order and advancing its cursor. Fetch failures
//! are retried after a backoff; a [`RetryPolicy`] can bound how many may
//! happen in a row. A [`CancellationToken`] stops the loop cleanly at any
//! sleep or before the next fetch. In-flight fetches are never interrupted.

pub mod cursor;

pub use cursor::Cursor;

use crate::error::{MonitorError, Result};
use crate::protocol::NexusEvent;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// How many consecutive fetch failures the monitor tolerates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Keep retrying forever.
    #[default]
    Unbounded,
    /// Stop with an error after this many failures in a row.
    MaxConsecutive(u32),
}

impl RetryPolicy {
    /// Maps a configured ceiling to a policy; `0` means unbounded.
    #[must_use]
    pub const fn from_max_errors(max: u32) -> Self {
        if max == 0 {
            Self::Unbounded
        } else {
            Self::MaxConsecutive(max)
        }
    }

    const fn is_exhausted(self, consecutive: u32) -> bool {
        match self {
            Self::Unbounded => false,
            Self::MaxConsecutive(max) => consecutive >= max,
        }
    }
}

/// Polling parameters.
///
/// # Examples
///
/// ```
/// use nexus_adapter::monitor::{PollConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let config = PollConfig::new(Duration::from_secs(10))
///     .with_error_backoff(Duration::from_secs(30))
///     .with_retry_policy(RetryPolicy::MaxConsecutive(5));
/// assert_eq!(config.error_backoff(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    error_backoff: Option<Duration>,
    retry: RetryPolicy,
}

impl PollConfig {
    /// Polls every `interval`, backing off by the same amount after errors.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            error_backoff: None,
            retry: RetryPolicy::Unbounded,
        }
    }

    /// Sets the wait after a failed fetch. Zero falls back to the interval.
    #[must_use]
    pub const fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = Some(backoff);
        self
    }

    /// Sets the consecutive-error policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Interval between successful polls.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait after a failed fetch.
    #[must_use]
    pub fn error_backoff(&self) -> Duration {
        self.error_backoff
            .filter(|b| !b.is_zero())
            .unwrap_or(self.interval)
    }

    /// Consecutive-error policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidInterval`] if the interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(MonitorError::InvalidInterval {
                reason: "interval must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Result of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchBatch<C> {
    /// Events to emit, in order.
    pub events: Vec<NexusEvent>,
    /// New cursor; `None` or an unset cursor keeps the current one.
    pub cursor: Option<C>,
}

impl<C> FetchBatch<C> {
    /// A batch that advances the cursor to `cursor`.
    #[must_use]
    pub const fn new(events: Vec<NexusEvent>, cursor: C) -> Self {
        Self {
            events,
            cursor: Some(cursor),
        }
    }

    /// A batch with no events that keeps the cursor.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            events: Vec::new(),
            cursor: None,
        }
    }
}

/// Where the monitor loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Fetching or waiting for the next interval.
    Running,
    /// Waiting after a failed fetch.
    BackingOff,
    /// Cancelled; the loop has returned.
    Stopped,
}

/// Summary of a finished monitor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorReport<C> {
    /// Cursor to persist for the next run.
    pub cursor: C,
    /// Number of fetch calls made.
    pub polls: u64,
    /// Number of events passed to the sink.
    pub events_emitted: u64,
    /// Final state.
    pub state: MonitorState,
}

/// Polling loop over a fetch function.
pub struct PollMonitor<C, F> {
    config: PollConfig,
    fetch: F,
    cursor: C,
    state: MonitorState,
    consecutive_errors: u32,
    polls: u64,
    events_emitted: u64,
}

impl<C, F, Fut> PollMonitor<C, F>
where
    C: Cursor,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = anyhow::Result<FetchBatch<C>>>,
{
    /// Creates a monitor starting at `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidInterval`] if the configuration is
    /// invalid.
    pub fn new(config: PollConfig, initial: C, fetch: F) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fetch,
            cursor: initial,
            state: MonitorState::Running,
            consecutive_errors: 0,
            polls: 0,
            events_emitted: 0,
        })
    }

    /// Runs until cancelled, passing every fetched event to `emit`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::TooManyErrors`] when the retry policy is
    /// exhausted, or the first error returned by `emit`. Cancellation is not
    /// an error.
    pub async fn run<E>(mut self, mut emit: E, cancel: &CancellationToken) -> Result<MonitorReport<C>>
    where
        E: FnMut(NexusEvent) -> Result<()>,
    {
        info!(
            interval_ms = duration_ms(self.config.interval()),
            cursor = ?self.cursor,
            "monitor started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.polls += 1;
            match (self.fetch)(self.cursor.clone()).await {
                Ok(batch) => {
                    self.state = MonitorState::Running;
                    self.consecutive_errors = 0;

                    let count = batch.events.len();
                    for event in batch.events {
                        emit(event)?;
                        self.events_emitted += 1;
                    }
                    if count > 0 {
                        debug!(events = count, "emitted events");
                    }

                    if let Some(next) = batch.cursor
                        && !next.is_unset()
                    {
                        self.cursor = next;
                    }

                    if !sleep_or_cancel(self.config.interval(), cancel).await {
                        break;
                    }
                }
                Err(err) => {
                    self.consecutive_errors = self.consecutive_errors.saturating_add(1);
                    error!(
                        consecutive_errors = self.consecutive_errors,
                        error = %format!("{err:#}"),
                        "poll fetch failed"
                    );

                    if self.config.retry_policy().is_exhausted(self.consecutive_errors) {
                        return Err(MonitorError::TooManyErrors {
                            count: self.consecutive_errors,
                            last: format!("{err:#}"),
                        }
                        .into());
                    }

                    self.state = MonitorState::BackingOff;
                    if !sleep_or_cancel(self.config.error_backoff(), cancel).await {
                        break;
                    }
                }
            }
        }

        self.state = MonitorState::Stopped;
        info!(
            polls = self.polls,
            events = self.events_emitted,
            "monitor shutting down (cancelled)"
        );
        Ok(MonitorReport {
            cursor: self.cursor,
            polls: self.polls,
            events_emitted: self.events_emitted,
            state: self.state,
        })
    }
}

/// Sleeps for `duration`; returns `false` if cancelled first.
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::EventBuilder;
    use anyhow::anyhow;
    use std::sync::{Arc, Mutex};

    fn event(n: u64) -> NexusEvent {
        EventBuilder::new("test", &format!("test:{n}"))
            .timestamp_ms(0)
            .build()
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = PollMonitor::new(PollConfig::new(Duration::ZERO), 0_u64, |_c: u64| async {
            Ok(FetchBatch::empty())
        });
        assert!(matches!(
            result,
            Err(crate::Error::Monitor(MonitorError::InvalidInterval { .. }))
        ));
    }

    #[test]
    fn test_error_backoff_defaults_to_interval() {
        let config = PollConfig::new(Duration::from_secs(5));
        assert_eq!(config.error_backoff(), Duration::from_secs(5));
        let config = config.with_error_backoff(Duration::ZERO);
        assert_eq!(config.error_backoff(), Duration::from_secs(5));
    }

    #[test]
    fn test_retry_policy_from_max_errors() {
        assert_eq!(RetryPolicy::from_max_errors(0), RetryPolicy::Unbounded);
        assert_eq!(
            RetryPolicy::from_max_errors(3),
            RetryPolicy::MaxConsecutive(3)
        );
        assert!(!RetryPolicy::Unbounded.is_exhausted(u32::MAX));
        assert!(RetryPolicy::MaxConsecutive(3).is_exhausted(3));
        assert!(!RetryPolicy::MaxConsecutive(3).is_exhausted(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_ceiling_stops_without_extra_call() {
        let calls = Arc::new(Mutex::new(0_u32));
        let counter = Arc::clone(&calls);
        let config = PollConfig::new(Duration::from_secs(1))
            .with_retry_policy(RetryPolicy::MaxConsecutive(3));
        let monitor = PollMonitor::new(config, 1_u64, move |_c| {
            *counter.lock().unwrap() += 1;
            async { Err(anyhow!("backend down")) }
        })
        .unwrap();

        let cancel = CancellationToken::new();
        let err = monitor.run(|_| Ok(()), &cancel).await.unwrap_err();
        assert_eq!(*calls.lock().unwrap(), 3);
        assert!(matches!(
            err,
            crate::Error::Monitor(MonitorError::TooManyErrors { count: 3, ref last }) if last == "backend down"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_keeps_retrying_until_cancelled() {
        let calls = Arc::new(Mutex::new(0_u32));
        let counter = Arc::clone(&calls);
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        let monitor = PollMonitor::new(PollConfig::new(Duration::from_secs(1)), 1_u64, move |_c| {
            let mut n = counter.lock().unwrap();
            *n += 1;
            if *n == 50 {
                stopper.cancel();
            }
            async { Err(anyhow!("still down")) }
        })
        .unwrap();

        let report = monitor.run(|_| Ok(()), &cancel).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), 50);
        assert_eq!(report.state, MonitorState::Stopped);
        assert_eq!(report.polls, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_error_count_saturates() {
        let calls = Arc::new(Mutex::new(0_u32));
        let counter = Arc::clone(&calls);
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        let mut monitor = PollMonitor::new(PollConfig::new(Duration::from_secs(1)), 1_u64, move |_c| {
            let mut n = counter.lock().unwrap();
            *n += 1;
            if *n == 3 {
                stopper.cancel();
            }
            async { Err(anyhow!("still down")) }
        })
        .unwrap();
        monitor.consecutive_errors = u32::MAX - 1;

        let report = monitor.run(|_| Ok(()), &cancel).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), 3);
        assert_eq!(report.polls, 3);
        assert_eq!(report.state, MonitorState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_error_count() {
        // fail, fail, ok, fail, fail, ok ... never three failures in a row.
        let calls = Arc::new(Mutex::new(0_u32));
        let counter = Arc::clone(&calls);
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        let config = PollConfig::new(Duration::from_secs(1))
            .with_retry_policy(RetryPolicy::MaxConsecutive(3));
        let monitor = PollMonitor::new(config, 1_u64, move |_c| {
            let mut n = counter.lock().unwrap();
            *n += 1;
            let current = *n;
            if current == 9 {
                stopper.cancel();
            }
            async move {
                if current % 3 == 0 {
                    Ok(FetchBatch::empty())
                } else {
                    Err(anyhow!("flaky"))
                }
            }
        })
        .unwrap();

        let report = monitor.run(|_| Ok(()), &cancel).await.unwrap();
        assert_eq!(report.polls, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_advances_and_unset_is_ignored() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        let monitor = PollMonitor::new(PollConfig::new(Duration::from_secs(1)), 10_u64, move |c| {
            let mut log = log.lock().unwrap();
            log.push(c);
            let batch = match log.len() {
                1 => FetchBatch::new(vec![event(1), event(2)], 12),
                2 => FetchBatch::new(Vec::new(), 0),
                3 => FetchBatch::empty(),
                _ => {
                    stopper.cancel();
                    FetchBatch::new(vec![event(3)], 13)
                }
            };
            async move { Ok(batch) }
        })
        .unwrap();

        let mut emitted = Vec::new();
        let report = monitor
            .run(
                |e| {
                    emitted.push(e.event_id);
                    Ok(())
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![10, 12, 12, 12]);
        assert_eq!(emitted, vec!["test:1", "test:2", "test:3"]);
        assert_eq!(report.cursor, 13);
        assert_eq!(report.events_emitted, 3);
        assert_eq!(report.state, MonitorState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start_makes_no_calls() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut calls = 0;
        let monitor = PollMonitor::new(
            PollConfig::new(Duration::from_secs(1)),
            "start".to_string(),
            |_c: String| {
                calls += 1;
                async { Ok(FetchBatch::empty()) }
            },
        )
        .unwrap();
        let report = monitor.run(|_| Ok(()), &cancel).await.unwrap();
        assert_eq!(calls, 0);
        assert_eq!(report.polls, 0);
        assert_eq!(report.cursor, "start");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_interval_sleep() {
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            stopper.cancel();
        });

        let start = tokio::time::Instant::now();
        let monitor = PollMonitor::new(
            PollConfig::new(Duration::from_secs(3600)),
            0_u64,
            |_c| async { Ok(FetchBatch::empty()) },
        )
        .unwrap();
        let report = monitor.run(|_| Ok(()), &cancel).await.unwrap();
        assert_eq!(report.polls, 1);
        assert!(start.elapsed() < Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_emit_failure_is_fatal() {
        let cancel = CancellationToken::new();
        let monitor = PollMonitor::new(PollConfig::new(Duration::from_secs(1)), 0_u64, |_c| async {
            Ok(FetchBatch::new(vec![event(1)], 1))
        })
        .unwrap();
        let result = monitor
            .run(
                |_| Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe).into()),
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}

//! Run status classification and the poll loop.
//!
//! A run is remote-owned: the relay only observes its status until it
//! reaches a terminal state. Polling uses bounded exponential backoff under
//! an overall deadline instead of an unbounded fixed-interval loop.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::ApiError;
use super::client::AssistantsClient;

// ── Status ────────────────────────────────────────────────────────────────────

/// Remote run status as reported on the wire.
///
/// Statuses this relay does not know about (the remote service may grow
/// new ones) are non-terminal: polling continues until the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// A terminal status means no further remote progress will occur.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        )
    }

    pub fn is_success(self) -> bool {
        self == RunStatus::Completed
    }
}

// ── Poll loop ─────────────────────────────────────────────────────────────────

/// Pacing and deadline for [`poll_until_terminal`].
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay before the second status query; doubles each round.
    pub initial_interval: Duration,
    /// Backoff ceiling.
    pub max_interval: Duration,
    /// Overall deadline for the whole loop.
    pub deadline: Duration,
}

impl PollOptions {
    pub fn from_config(cfg: &crate::config::AssistantConfig) -> Self {
        Self {
            initial_interval: Duration::from_millis(cfg.poll_initial_interval_ms),
            max_interval: Duration::from_millis(cfg.poll_max_interval_ms),
            deadline: Duration::from_secs(cfg.run_timeout_seconds),
        }
    }
}

/// Query run status until it is terminal or the deadline passes.
///
/// The first query happens immediately; subsequent queries back off
/// exponentially from `initial_interval` up to `max_interval`. Returns the
/// terminal status — mapping a non-success status to an answer (or the lack
/// of one) is the caller's concern. Exceeding the deadline is
/// [`ApiError::Timeout`].
pub async fn poll_until_terminal(
    client: &AssistantsClient,
    thread_id: &str,
    run_id: &str,
    opts: &PollOptions,
) -> Result<RunStatus, ApiError> {
    let started = tokio::time::Instant::now();
    let mut interval = opts.initial_interval;

    loop {
        let status = client.retrieve_run(thread_id, run_id).await?;

        if status.is_terminal() {
            debug!(%thread_id, %run_id, ?status, elapsed = ?started.elapsed(), "run reached terminal state");
            return Ok(status);
        }

        if started.elapsed() >= opts.deadline {
            warn!(%thread_id, %run_id, ?status, deadline = ?opts.deadline, "run poll deadline exceeded");
            return Err(ApiError::Timeout(format!(
                "run {run_id} still {status:?} after {:?}",
                opts.deadline
            )));
        }

        tokio::time::sleep(interval).await;
        interval = next_interval(interval, opts.max_interval);
    }
}

/// Next backoff interval: double the current one, capped at `max`.
fn next_interval(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}

//! Client for the remote assistant service.
//!
//! `client` speaks the assistants/threads/runs/messages wire protocol over
//! authenticated HTTPS; `run` owns run-status classification and the poll
//! loop. Wire types stay private to `client` — callers see only the
//! projections exported here.

pub mod client;
pub mod run;

pub use client::{AssistantsClient, ThreadMessage};
pub use run::{PollOptions, RunStatus, poll_until_terminal};

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("assistant api request failed: {0}")]
    Request(String),

    #[error("run poll deadline exceeded: {0}")]
    Timeout(String),
}

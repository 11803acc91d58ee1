//! Relay orchestration: one question in, one assistant answer out.
//!
//! The assistant id is resolved exactly once, before the HTTP listener
//! starts — either taken from config/env or created remotely — and is
//! immutable for the rest of the process. Every question then follows the
//! same path: fresh thread, user message, run, poll, extract.

use tracing::{info, warn};

use crate::assistant::{ApiError, AssistantsClient, PollOptions, ThreadMessage, poll_until_terminal};
use crate::config::Config;
use crate::error::AppError;

pub struct RelayService {
    client: AssistantsClient,
    assistant_id: String,
    poll: PollOptions,
}

impl RelayService {
    /// Wire up a service from parts. Tests use this to inject a mock endpoint.
    pub fn new(client: AssistantsClient, assistant_id: String, poll: PollOptions) -> Self {
        Self { client, assistant_id, poll }
    }

    /// Resolve the assistant and build the service.
    ///
    /// A configured id wins; otherwise one assistant is created remotely with
    /// the configured name/instructions/model. The created id is logged so an
    /// operator can pin it via `ASSISTANT_ID` and skip creation on the next
    /// boot — the relay itself never persists it.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = AssistantsClient::new(
            config.assistant.api_base_url.clone(),
            config.assistant.request_timeout_seconds,
            config.api_key.clone(),
        )
        .map_err(|e| AppError::Relay(e.to_string()))?;

        let assistant_id = match &config.assistant.id {
            Some(id) => {
                info!(assistant_id = %id, "using configured assistant");
                id.clone()
            }
            None => {
                info!("no existing assistant configured, creating new");
                let id = client
                    .create_assistant(
                        &config.assistant.name,
                        &config.assistant.instructions,
                        &config.assistant.model,
                    )
                    .await
                    .map_err(|e| AppError::Relay(format!("assistant creation failed: {e}")))?;
                info!(assistant_id = %id, "assistant created — pin it with ASSISTANT_ID to reuse");
                id
            }
        };

        Ok(Self::new(
            client,
            assistant_id,
            PollOptions::from_config(&config.assistant),
        ))
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    /// Forward a question and wait for the answer.
    ///
    /// `Ok(None)` means the run ended in a terminal failure state, or no
    /// assistant message was produced for it — the caller relays `null`
    /// rather than an error, matching the remote-owned failure semantics.
    pub async fn ask(&self, question: &str) -> Result<Option<String>, ApiError> {
        let thread_id = self.client.create_thread().await?;
        self.client.add_user_message(&thread_id, question).await?;

        let (run_id, initial_status) =
            self.client.create_run(&thread_id, &self.assistant_id).await?;

        let status = if initial_status.is_terminal() {
            initial_status
        } else {
            poll_until_terminal(&self.client, &thread_id, &run_id, &self.poll).await?
        };

        if !status.is_success() {
            warn!(%thread_id, %run_id, ?status, "run ended without success — no answer");
            return Ok(None);
        }

        let messages = self.client.list_messages(&thread_id).await?;
        Ok(extract_answer(&messages, &run_id))
    }
}

/// The answer is the most recently created assistant message tagged with the
/// current run. Messages from other runs or roles never qualify.
fn extract_answer(messages: &[ThreadMessage], run_id: &str) -> Option<String> {
    messages
        .iter()
        .filter(|m| m.role == "assistant" && m.run_id.as_deref() == Some(run_id))
        .max_by_key(|m| m.created_at)
        .and_then(|m| m.text.clone())
}

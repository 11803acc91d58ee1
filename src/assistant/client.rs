//! HTTP client for the assistants wire protocol.
//!
//! One method per remote operation: create assistant, create thread, append
//! message, create run, retrieve run, list messages. All wire types are
//! private to this module — callers only see [`ThreadMessage`] and the
//! domain types in [`super::run`]. Constructed once at startup, then cheaply
//! cloned because `reqwest::Client` is an `Arc` internally.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use super::ApiError;
use super::run::RunStatus;

/// Tool enabled on assistants the relay creates itself.
const ASSISTANT_TOOL_TYPE: &str = "retrieval";

/// Version header required by the assistants endpoints.
const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

// ── Public projection ─────────────────────────────────────────────────────────

/// A thread message reduced to the fields the relay cares about.
#[derive(Debug, Clone)]
pub struct ThreadMessage {
    pub id: String,
    /// `"user"` or `"assistant"`.
    pub role: String,
    /// Run that produced this message — absent on caller-appended messages.
    pub run_id: Option<String>,
    pub created_at: i64,
    /// First `text` content block, if any.
    pub text: Option<String>,
}

// ── Client ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AssistantsClient {
    client: Client,
    /// API root without trailing slash, e.g. `https://api.openai.com/v1`.
    api_base_url: String,
    api_key: Option<String>,
}

impl AssistantsClient {
    /// Build a client from config values and an optional API key.
    ///
    /// `api_key` is `None` only against keyless mocks. When present it is
    /// sent as `Authorization: Bearer <key>` on every request.
    pub fn new(
        api_base_url: String,
        request_timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(request_timeout_seconds))
            .build()
            .map_err(|e| ApiError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.decorate(self.client.post(format!("{}{path}", self.api_base_url)))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.decorate(self.client.get(format!("{}{path}", self.api_base_url)))
    }

    fn decorate(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header(BETA_HEADER.0, BETA_HEADER.1);
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    /// Create an assistant with a fixed configuration. Returns its id.
    pub async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        model: &str,
    ) -> Result<String, ApiError> {
        let payload = CreateAssistantRequest {
            name: name.to_string(),
            instructions: instructions.to_string(),
            model: model.to_string(),
            tools: vec![Tool { tool_type: ASSISTANT_TOOL_TYPE.to_string() }],
        };

        debug!(%model, "creating assistant");
        let resp = self.send_json(self.post("/assistants").json(&payload)).await?;
        let created: ObjectWithId = self.parse(resp).await?;
        Ok(created.id)
    }

    /// Create an empty conversation thread. Returns its id.
    pub async fn create_thread(&self) -> Result<String, ApiError> {
        let resp = self
            .send_json(self.post("/threads").json(&serde_json::json!({})))
            .await?;
        let created: ObjectWithId = self.parse(resp).await?;
        debug!(thread_id = %created.id, "thread created");
        Ok(created.id)
    }

    /// Append `content` to the thread as a user message. Returns the message id.
    pub async fn add_user_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<String, ApiError> {
        let payload = CreateMessageRequest {
            role: "user".to_string(),
            content: content.to_string(),
        };

        let resp = self
            .send_json(self.post(&format!("/threads/{thread_id}/messages")).json(&payload))
            .await?;
        let created: ObjectWithId = self.parse(resp).await?;
        debug!(%thread_id, message_id = %created.id, "user message appended");
        Ok(created.id)
    }

    /// Start a run on the thread. Returns the run id and its initial status.
    pub async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<(String, RunStatus), ApiError> {
        let payload = CreateRunRequest { assistant_id: assistant_id.to_string() };

        let resp = self
            .send_json(self.post(&format!("/threads/{thread_id}/runs")).json(&payload))
            .await?;
        let run: RunObject = self.parse(resp).await?;
        debug!(%thread_id, run_id = %run.id, status = ?run.status, "run created");
        Ok((run.id, run.status))
    }

    /// Fetch the current status of a run.
    pub async fn retrieve_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunStatus, ApiError> {
        let resp = self
            .send_json(self.get(&format!("/threads/{thread_id}/runs/{run_id}")))
            .await?;
        let run: RunObject = self.parse(resp).await?;
        trace!(%thread_id, %run_id, status = ?run.status, "run status");
        Ok(run.status)
    }

    /// List all messages on the thread, newest first as returned by the API.
    pub async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError> {
        let resp = self
            .send_json(self.get(&format!("/threads/{thread_id}/messages")))
            .await?;
        let listed: ListMessagesResponse = self.parse(resp).await?;

        Ok(listed
            .data
            .into_iter()
            .map(|m| ThreadMessage {
                id: m.id,
                role: m.role,
                run_id: m.run_id,
                created_at: m.created_at,
                text: m
                    .content
                    .into_iter()
                    .find_map(|block| block.text.map(|t| t.value)),
            })
            .collect())
    }

    async fn send_json(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "assistant api request failed (transport)");
            ApiError::Request(e.to_string())
        })?;
        check_status(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize assistant api response");
            ApiError::Request(format!("failed to parse response body: {e}"))
        })
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "type")]
    tool_type: String,
}

#[derive(Debug, Serialize)]
struct CreateAssistantRequest {
    name: String,
    instructions: String,
    model: String,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest {
    assistant_id: String,
}

#[derive(Debug, Deserialize)]
struct ObjectWithId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: RunStatus,
}

#[derive(Debug, Deserialize)]
struct ListMessagesResponse {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    id: String,
    role: String,
    #[serde(default)]
    run_id: Option<String>,
    #[serde(default)]
    created_at: i64,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    value: String,
}

// Error envelope used by the remote API.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = env
            .error
            .code
            .map(|v| match v {
                serde_json::Value::String(s) => format!(" [code={s}]"),
                other => format!(" [code={other}]"),
            })
            .unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(%status, %message, "assistant api returned HTTP error");
    Err(ApiError::Request(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_stripped() {
        let c = AssistantsClient::new("http://localhost:1/v1/".into(), 1, None).unwrap();
        assert_eq!(c.api_base_url, "http://localhost:1/v1");
    }

    #[test]
    fn message_projection_picks_first_text_block() {
        let raw = serde_json::json!({
            "data": [{
                "id": "msg_1",
                "role": "assistant",
                "run_id": "run_1",
                "created_at": 7,
                "content": [
                    { "type": "image_file", "image_file": { "file_id": "file_1" } },
                    { "type": "text", "text": { "value": "it was the gardener", "annotations": [] } }
                ]
            }]
        });
        let listed: ListMessagesResponse = serde_json::from_value(raw).unwrap();
        let text = listed.data[0]
            .content
            .iter()
            .find_map(|b| b.text.as_ref().map(|t| t.value.clone()));
        assert_eq!(text.as_deref(), Some("it was the gardener"));
    }

    #[test]
    fn user_message_without_run_id_deserializes() {
        let raw = serde_json::json!({
            "id": "msg_2",
            "role": "user",
            "run_id": null,
            "created_at": 3,
            "content": [{ "type": "text", "text": { "value": "who did it?", "annotations": [] } }]
        });
        let msg: MessageObject = serde_json::from_value(raw).unwrap();
        assert!(msg.run_id.is_none());
        assert_eq!(msg.role, "user");
    }

    #[test]
    fn error_envelope_formats_code() {
        let body = r#"{"error":{"message":"bad key","code":"invalid_api_key"}}"#;
        let env: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(env.error.message, "bad key");
        assert_eq!(
            env.error.code,
            Some(serde_json::Value::String("invalid_api_key".into()))
        );
    }
}

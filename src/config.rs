//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the path given with `-f`), then applies `SLEUTH_BIND`,
//! `SLEUTH_LOG_LEVEL` and `ASSISTANT_ID` env overrides. The API credential
//! comes from `OPENAI_API_KEY` only — never from TOML.

use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::error::AppError;

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Socket address to bind the listener to.
    pub bind: String,
}

/// Remote assistant service configuration.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Pre-existing assistant id. `None` means create one at startup.
    pub id: Option<String>,
    /// API root, e.g. `https://api.openai.com/v1` — no trailing slash.
    pub api_base_url: String,
    /// Model passed when the relay creates the assistant.
    pub model: String,
    /// Assistant display name used at creation time.
    pub name: String,
    /// Assistant instructions used at creation time.
    pub instructions: String,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_seconds: u64,
    /// Overall deadline for a single run poll loop, in seconds.
    pub run_timeout_seconds: u64,
    /// First poll interval in milliseconds; doubles on each poll.
    pub poll_initial_interval_ms: u64,
    /// Poll interval ceiling in milliseconds.
    pub poll_max_interval_ms: u64,
}

/// Fully-resolved relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    pub http: HttpConfig,
    pub assistant: AssistantConfig,
    /// API key from `OPENAI_API_KEY` env — `None` only makes sense against
    /// keyless local mocks. Never sourced from TOML.
    pub api_key: Option<String>,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    relay: RawRelay,
    #[serde(default)]
    http: RawHttp,
    #[serde(default)]
    assistant: RawAssistant,
}

#[derive(Deserialize)]
struct RawRelay {
    bot_name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize)]
struct RawHttp {
    #[serde(default = "default_http_bind")]
    bind: String,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self { bind: default_http_bind() }
    }
}

#[derive(Deserialize)]
struct RawAssistant {
    #[serde(default)]
    id: Option<String>,
    #[serde(default = "default_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_assistant_name")]
    name: String,
    #[serde(default = "default_instructions")]
    instructions: String,
    #[serde(default = "default_request_timeout_seconds")]
    request_timeout_seconds: u64,
    #[serde(default = "default_run_timeout_seconds")]
    run_timeout_seconds: u64,
    #[serde(default = "default_poll_initial_interval_ms")]
    poll_initial_interval_ms: u64,
    #[serde(default = "default_poll_max_interval_ms")]
    poll_max_interval_ms: u64,
}

impl Default for RawAssistant {
    fn default() -> Self {
        Self {
            id: None,
            api_base_url: default_api_base_url(),
            model: default_model(),
            name: default_assistant_name(),
            instructions: default_instructions(),
            request_timeout_seconds: default_request_timeout_seconds(),
            run_timeout_seconds: default_run_timeout_seconds(),
            poll_initial_interval_ms: default_poll_initial_interval_ms(),
            poll_max_interval_ms: default_poll_max_interval_ms(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_http_bind() -> String { "127.0.0.1:8880".to_string() }
fn default_api_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_model() -> String { "gpt-4-1106-preview".to_string() }
fn default_assistant_name() -> String { "Murder mystery helper".to_string() }
fn default_instructions() -> String {
    "You're a murder mystery assistant, helping solve murder mysteries.".to_string()
}
fn default_request_timeout_seconds() -> u64 { 60 }
fn default_run_timeout_seconds() -> u64 { 120 }
fn default_poll_initial_interval_ms() -> u64 { 1000 }
fn default_poll_max_interval_ms() -> u64 { 5000 }

/// Load config from `config/default.toml` (or `path_override`), then apply
/// env-var overrides.
pub fn load(path_override: Option<&Path>) -> Result<Config, AppError> {
    let bind_override = env::var("SLEUTH_BIND").ok();
    let log_level_override = env::var("SLEUTH_LOG_LEVEL").ok();
    let assistant_id_override = env::var("ASSISTANT_ID").ok();
    let api_key = env::var("OPENAI_API_KEY").ok();

    load_from(
        path_override.unwrap_or(Path::new("config/default.toml")),
        bind_override.as_deref(),
        log_level_override.as_deref(),
        assistant_id_override.as_deref(),
        api_key,
    )
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    bind_override: Option<&str>,
    log_level_override: Option<&str>,
    assistant_id_override: Option<&str>,
    api_key: Option<String>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let assistant_id = assistant_id_override
        .map(str::to_string)
        .or(parsed.assistant.id)
        .filter(|id| !id.is_empty());

    Ok(Config {
        bot_name: parsed.relay.bot_name,
        log_level: log_level_override
            .unwrap_or(&parsed.relay.log_level)
            .to_string(),
        http: HttpConfig {
            bind: bind_override.unwrap_or(&parsed.http.bind).to_string(),
        },
        assistant: AssistantConfig {
            id: assistant_id,
            api_base_url: parsed.assistant.api_base_url,
            model: parsed.assistant.model,
            name: parsed.assistant.name,
            instructions: parsed.assistant.instructions,
            request_timeout_seconds: parsed.assistant.request_timeout_seconds,
            run_timeout_seconds: parsed.assistant.run_timeout_seconds,
            poll_initial_interval_ms: parsed.assistant.poll_initial_interval_ms,
            poll_max_interval_ms: parsed.assistant.poll_max_interval_ms,
        },
        api_key,
    })
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for tests — localhost endpoint, short timeouts, no key.
impl Config {
    pub fn test_default() -> Self {
        Self {
            bot_name: "test".into(),
            log_level: "info".into(),
            http: HttpConfig { bind: "127.0.0.1:0".into() },
            assistant: AssistantConfig {
                id: Some("asst_test".into()),
                api_base_url: "http://127.0.0.1:0/v1".into(),
                model: "test-model".into(),
                name: "test assistant".into(),
                instructions: "test instructions".into(),
                request_timeout_seconds: 5,
                run_timeout_seconds: 5,
                poll_initial_interval_ms: 10,
                poll_max_interval_ms: 50,
            },
            api_key: None,
        }
    }
}

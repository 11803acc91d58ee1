//! sleuth-relay — HTTP façade over a hosted assistants API.
//!
//! The relay accepts free-text questions over HTTP, forwards each one to
//! the remote assistant service (thread → message → run), polls the run to
//! a terminal state, and returns the final assistant-authored message.
//! All reasoning happens remotely; this crate is wiring.

pub mod assistant;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod relay;

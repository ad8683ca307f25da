//! Host event contract.
//!
//! The host runtime may hand the pipe two callbacks: a status-event emitter
//! feeding its UI, and an interactive event requester. Both are modeled as
//! traits with no-op default implementations so callers never juggle
//! nullable callables.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Coarse lifecycle phase reported to the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPhase {
    /// Work is still underway.
    InProgress,
    /// Terminal emission for this request.
    Complete,
}

/// Severity of a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    /// Routine progress.
    Info,
    /// Something degraded but the request continues.
    Warning,
    /// The request failed or is about to fail.
    Error,
}

/// Payload of a status event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    /// Lifecycle phase (`complete` iff `done`).
    pub status: StatusPhase,
    /// Severity level.
    pub level: StatusLevel,
    /// Human-readable progress message.
    pub description: String,
    /// Whether this is the terminal emission for the request.
    pub done: bool,
}

/// An event sent to the host, in the host's `{"type", "data"}` wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// Progress notification for the host UI.
    Status(StatusData),
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by host callbacks.
///
/// The pipe does not catch these; a failing emitter propagates to the host
/// exactly like any other unhandled failure.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The host failed to deliver the event.
    #[error("event delivery failed: {0}")]
    Delivery(String),
    /// The host does not support the requested interaction.
    #[error("event not supported by host: {0}")]
    Unsupported(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Host-supplied status event sink.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Deliver one event to the host.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if the host fails to accept the event.
    async fn emit(&self, event: Event) -> Result<(), EventError>;
}

/// Host-supplied interactive requester.
///
/// Part of the plugin contract; this pipe never initiates an interaction,
/// but implementations must be accepted and carried.
#[async_trait]
pub trait EventCall: Send + Sync {
    /// Send a request to the host and await its answer.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if the host rejects the interaction.
    async fn call(&self, request: Value) -> Result<Value, EventError>;
}

// ---------------------------------------------------------------------------
// Default implementations
// ---------------------------------------------------------------------------

/// Emitter used when the host supplies no status callback. Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

#[async_trait]
impl EventEmitter for NoopEmitter {
    async fn emit(&self, _event: Event) -> Result<(), EventError> {
        Ok(())
    }
}

/// Requester used when the host supplies no interactive callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventCall;

#[async_trait]
impl EventCall for NoopEventCall {
    async fn call(&self, _request: Value) -> Result<Value, EventError> {
        Ok(Value::Null)
    }
}

/// Emitter that logs events through `tracing`. Used by the local harness
/// binary in place of a real host UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmitter;

#[async_trait]
impl EventEmitter for LogEmitter {
    async fn emit(&self, event: Event) -> Result<(), EventError> {
        let Event::Status(data) = event;
        match data.level {
            StatusLevel::Error => {
                tracing::error!(done = data.done, status = ?data.status, "{}", data.description);
            }
            StatusLevel::Warning => {
                tracing::warn!(done = data.done, status = ?data.status, "{}", data.description);
            }
            StatusLevel::Info => {
                tracing::info!(done = data.done, status = ?data.status, "{}", data.description);
            }
        }
        Ok(())
    }
}

//! External collaborators of the draft engine.
//!
//! The engine only sees these traits: a record store, an AI page generator,
//! and a fire-and-forget beacon used when the page is torn down. HTTP
//! implementations live in [`http`], an in-process store and beacon in
//! [`memory`].

pub mod http;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{GenerateRequest, GenerateResponse, PageId, PersistedPage, UpsertPageRequest};
use tokio_util::task::TaskTracker;

pub use http::{HttpBeacon, HttpPageGenerator, HttpPagePersistence};
pub use memory::{InMemoryPagePersistence, MemoryBeacon};

/// Why the persistence service declined a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    Forbidden,
    NotFound,
    Conflict,
    Invalid,
    Server,
}

impl RejectionKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            500..=599 => Self::Server,
            _ => Self::Invalid,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Invalid => "invalid",
            Self::Server => "server",
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected ({}): {message}", .kind.as_str())]
    Rejected { kind: RejectionKind, message: String },

    #[error("undecodable response: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("generator returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Failed(String),

    #[error("malformed generator response: {0}")]
    Malformed(String),
}

/// Store for page records. Owns ownership checks and slug assignment.
#[async_trait]
pub trait PagePersistence: Send + Sync + 'static {
    /// Create (no id) or update (id present) a page record.
    async fn upsert(&self, request: UpsertPageRequest) -> Result<PersistedPage, PersistenceError>;

    async fn fetch(&self, id: &PageId) -> Result<PersistedPage, PersistenceError>;
}

/// AI page generation service.
#[async_trait]
pub trait PageGenerator: Send + Sync + 'static {
    /// Returns the flat generated document (content keys plus `theme`).
    async fn generate(&self, request: GenerateRequest) -> Result<serde_json::Value, GenerationError>;
}

/// Non-blocking transmission that outlives the editor session.
///
/// `send` must return immediately. `true` only means the payload was queued;
/// delivery is never confirmed. The process calls `drain` before exiting so
/// queued transmissions still get their attempt.
#[async_trait]
pub trait BeaconTransport: Send + Sync + 'static {
    fn send(&self, payload: &UpsertPageRequest) -> bool;

    /// Wait up to `timeout` for queued transmissions. Returns how many were
    /// still pending when it gave up.
    async fn drain(&self, _timeout: Duration) -> usize {
        0
    }
}

/// Close `tracker` and wait for its tasks, bounded by `timeout`.
pub(crate) async fn drain_tracker(tracker: &TaskTracker, timeout: Duration) -> usize {
    tracker.close();
    if tokio::time::timeout(timeout, tracker.wait()).await.is_err() {
        tracing::warn!(pending = tracker.len(), "Gave up waiting for queued beacons");
    }
    tracker.len()
}

/// Unwrap the generator envelope into the generated document.
pub fn unwrap_generate_response(
    response: GenerateResponse,
) -> Result<serde_json::Value, GenerationError> {
    if !response.success {
        return Err(GenerationError::Failed(
            response
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "page generation failed".to_string()),
        ));
    }
    match response.data {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(GenerationError::Malformed(
            "success response without data".to_string(),
        )),
    }
}

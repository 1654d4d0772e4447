//! reqwest-backed collaborators talking to the page API.

use std::time::Duration;

use async_trait::async_trait;
use shared_types::{GenerateRequest, GenerateResponse, PageId, PersistedPage, UpsertPageRequest};
use tokio_util::task::TaskTracker;

use super::{
    drain_tracker, unwrap_generate_response, BeaconTransport, GenerationError, PageGenerator, PagePersistence,
    PersistenceError, RejectionKind,
};

const USER_AGENT: &str = "PageDraft-Editor/0.1";

fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Trim a response body down to something fit for an error message.
fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(message) = value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
        {
            return message.to_string();
        }
    }
    trimmed.chars().take(240).collect()
}

#[derive(Debug, Clone)]
pub struct HttpPagePersistence {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPagePersistence {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PersistenceError> {
        let http = build_client(timeout).map_err(|e| PersistenceError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn decode(response: reqwest::Response) -> Result<PersistedPage, PersistenceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Rejected {
                kind: RejectionKind::from_status(status.as_u16()),
                message: excerpt(&body),
            });
        }
        response
            .json::<PersistedPage>()
            .await
            .map_err(|e| PersistenceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PagePersistence for HttpPagePersistence {
    async fn upsert(&self, request: UpsertPageRequest) -> Result<PersistedPage, PersistenceError> {
        let builder = match &request.id {
            Some(id) => self
                .http
                .put(join_url(&self.base_url, &format!("api/pages/{id}"))),
            None => self.http.post(join_url(&self.base_url, "api/pages")),
        };
        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn fetch(&self, id: &PageId) -> Result<PersistedPage, PersistenceError> {
        let response = self
            .http
            .get(join_url(&self.base_url, &format!("api/pages/{id}")))
            .send()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;
        Self::decode(response).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpPageGenerator {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpPageGenerator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let http = build_client(timeout).map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: join_url(base_url, "api/generate"),
        })
    }
}

#[async_trait]
impl PageGenerator for HttpPageGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<serde_json::Value, GenerationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        let envelope: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        unwrap_generate_response(envelope)
    }
}

/// Beacon that posts from a tracked background task and never waits for the
/// result.
#[derive(Debug, Clone)]
pub struct HttpBeacon {
    http: reqwest::Client,
    endpoint: String,
    in_flight: TaskTracker,
}

impl HttpBeacon {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PersistenceError> {
        let http = build_client(timeout).map_err(|e| PersistenceError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: join_url(base_url, "api/pages/beacon"),
            in_flight: TaskTracker::new(),
        })
    }
}

#[async_trait]
impl BeaconTransport for HttpBeacon {
    fn send(&self, payload: &UpsertPageRequest) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available for beacon send");
            return false;
        };
        let request = self.http.post(&self.endpoint).json(payload);
        let record_id = payload.id.clone();
        self.in_flight.spawn_on(
            async move {
                match request.send().await {
                    Ok(response) if response.status().is_success() => {
                        tracing::debug!(record_id = ?record_id, "Beacon delivered");
                    }
                    Ok(response) => {
                        tracing::debug!(
                            record_id = ?record_id,
                            status = response.status().as_u16(),
                            "Beacon rejected"
                        );
                    }
                    Err(e) => {
                        tracing::debug!(record_id = ?record_id, error = %e, "Beacon transport failed");
                    }
                }
            },
            &runtime,
        );
        true
    }

    async fn drain(&self, timeout: Duration) -> usize {
        drain_tracker(&self.in_flight, timeout).await
    }
}

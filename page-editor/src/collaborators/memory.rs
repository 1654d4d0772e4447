//! In-process page store and its beacon.
//!
//! Mirrors the service contract: creates derive a unique slug from the
//! business name, updates keep the existing slug, unknown ids are rejected.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use shared_types::{slugify, PageId, PersistedPage, UpsertPageRequest};
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;

use super::{drain_tracker, BeaconTransport, PagePersistence, PersistenceError, RejectionKind};

#[derive(Debug, Default)]
pub struct InMemoryPagePersistence {
    pages: Mutex<HashMap<PageId, PersistedPage>>,
}

impl InMemoryPagePersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as if it had been created earlier.
    pub async fn insert(&self, page: PersistedPage) {
        self.pages.lock().await.insert(page.id.clone(), page);
    }

    pub async fn get(&self, id: &PageId) -> Option<PersistedPage> {
        self.pages.lock().await.get(id).cloned()
    }

    pub async fn pages(&self) -> Vec<PersistedPage> {
        self.pages.lock().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.pages.lock().await.len()
    }

    fn unique_slug(pages: &HashMap<PageId, PersistedPage>, title: &str) -> String {
        let taken: HashSet<&str> = pages.values().filter_map(|p| p.slug.as_deref()).collect();
        let base = slugify(title);
        if !taken.contains(base.as_str()) {
            return base;
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !taken.contains(candidate.as_str()))
            .unwrap_or(base)
    }
}

#[async_trait]
impl PagePersistence for InMemoryPagePersistence {
    async fn upsert(&self, request: UpsertPageRequest) -> Result<PersistedPage, PersistenceError> {
        let mut pages = self.pages.lock().await;
        let title = request.page_content.business_name().to_string();

        let page = match request.id {
            Some(id) => {
                let Some(existing) = pages.get(&id) else {
                    return Err(PersistenceError::Rejected {
                        kind: RejectionKind::NotFound,
                        message: format!("page {id} not found"),
                    });
                };
                PersistedPage {
                    id,
                    slug: existing.slug.clone(),
                    title: Some(title),
                    template_id: request.template_id,
                    page_content: request.page_content,
                    page_style: request.page_style,
                    original_prompt: request.original_prompt,
                    published: request.published.unwrap_or(existing.published),
                    updated_at: Some(Utc::now()),
                }
            }
            None => PersistedPage {
                id: PageId::new(),
                slug: Some(Self::unique_slug(&pages, &title)),
                title: Some(title),
                template_id: request.template_id,
                page_content: request.page_content,
                page_style: request.page_style,
                original_prompt: request.original_prompt,
                published: request.published.unwrap_or(false),
                updated_at: Some(Utc::now()),
            },
        };

        pages.insert(page.id.clone(), page.clone());
        Ok(page)
    }

    async fn fetch(&self, id: &PageId) -> Result<PersistedPage, PersistenceError> {
        self.pages
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::Rejected {
                kind: RejectionKind::NotFound,
                message: format!("page {id} not found"),
            })
    }
}

/// Beacon for offline sessions: writes into the in-memory store from a
/// tracked background task.
#[derive(Debug, Clone)]
pub struct MemoryBeacon {
    store: Arc<InMemoryPagePersistence>,
    in_flight: TaskTracker,
}

impl MemoryBeacon {
    pub fn new(store: Arc<InMemoryPagePersistence>) -> Self {
        Self {
            store,
            in_flight: TaskTracker::new(),
        }
    }
}

#[async_trait]
impl BeaconTransport for MemoryBeacon {
    fn send(&self, payload: &UpsertPageRequest) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return false;
        };
        let store = self.store.clone();
        let payload = payload.clone();
        self.in_flight.spawn_on(
            async move {
                if let Err(e) = store.upsert(payload).await {
                    tracing::debug!(error = %e, "Offline beacon write failed");
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

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use page_editor::actors::page_editor::{DraftSeed, EditorEvent, PageEditorArguments};
use page_editor::collaborators::{
    BeaconTransport, GenerationError, InMemoryPagePersistence, PageGenerator, PagePersistence,
    PersistenceError,
};
use page_editor::config::EditorConfig;
use page_editor::PageEditorHandle;
use serde_json::json;
use shared_types::{GenerateRequest, PageId, PersistedPage, UpsertPageRequest};
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const ORIGIN: &str = "https://pages.example.com";

/// In-memory store that records when each upsert arrived.
#[derive(Default)]
pub struct RecordingPersistence {
    store: InMemoryPagePersistence,
    calls: Mutex<Vec<(Instant, UpsertPageRequest)>>,
    delay: Mutex<Duration>,
    fail: AtomicBool,
}

impl RecordingPersistence {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(Instant, UpsertPageRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub async fn seed_record(&self, name: &str) -> PersistedPage {
        self.store
            .upsert(UpsertPageRequest {
                id: None,
                template_id: "bold".to_string(),
                page_content: shared_types::ContentDocument::from_value(
                    &json!({"business": {"name": name}}),
                ),
                page_style: Default::default(),
                original_prompt: "a neighbourhood bakery".to_string(),
                published: None,
            })
            .await
            .unwrap()
    }
}

#[async_trait]
impl PagePersistence for RecordingPersistence {
    async fn upsert(&self, request: UpsertPageRequest) -> Result<PersistedPage, PersistenceError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::Transport("connection reset".to_string()));
        }
        self.store.upsert(request).await
    }

    async fn fetch(&self, id: &PageId) -> Result<PersistedPage, PersistenceError> {
        self.store.fetch(id).await
    }
}

/// Generator that replays queued responses.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<serde_json::Value, GenerationError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
    delay: Mutex<Duration>,
}

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: Result<serde_json::Value, GenerationError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<serde_json::Value, GenerationError> {
        self.requests.lock().unwrap().push(request);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Failed("no scripted response".to_string())))
    }
}

pub struct RecordingBeacon {
    sent: Mutex<Vec<UpsertPageRequest>>,
    accept: AtomicBool,
    attempts: AtomicUsize,
}

impl RecordingBeacon {
    pub fn new(accept: bool) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            accept: AtomicBool::new(accept),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn sent(&self) -> Vec<UpsertPageRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl BeaconTransport for RecordingBeacon {
    fn send(&self, payload: &UpsertPageRequest) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.accept.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().unwrap().push(payload.clone());
        true
    }
}

pub fn generated_page(name: &str, headline: &str) -> serde_json::Value {
    json!({
        "business": {"name": name},
        "hero": {"headline": headline, "subheadline": "Baked fresh every morning"},
        "features": [{"title": "Sourdough", "description": "48 hour ferment"}],
        "theme": {"mode": "dark", "accentColor": "#f59e0b"},
    })
}

pub fn test_config() -> EditorConfig {
    EditorConfig {
        autosave_debounce_ms: 3_000,
        notice_ttl_ms: 5_000,
        public_origin: ORIGIN.to_string(),
        api_base_url: "http://127.0.0.1:9".to_string(),
        request_timeout_ms: 5_000,
    }
}

pub struct TestEditor {
    pub handle: PageEditorHandle,
    pub persistence: Arc<RecordingPersistence>,
    pub generator: Arc<ScriptedGenerator>,
    pub beacon: Arc<RecordingBeacon>,
    pub events: mpsc::UnboundedReceiver<EditorEvent>,
}

impl TestEditor {
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub async fn spawn_editor(seed: DraftSeed) -> TestEditor {
    spawn_editor_with(seed, RecordingPersistence::new(), RecordingBeacon::new(true)).await
}

pub async fn spawn_editor_with(
    seed: DraftSeed,
    persistence: Arc<RecordingPersistence>,
    beacon: Arc<RecordingBeacon>,
) -> TestEditor {
    let generator = ScriptedGenerator::new();
    let (events_tx, events) = mpsc::unbounded_channel();
    let (handle, _join) = PageEditorHandle::spawn(PageEditorArguments {
        seed,
        persistence: persistence.clone(),
        generator: generator.clone(),
        beacon: beacon.clone(),
        events: Some(events_tx),
        config: test_config(),
    })
    .await
    .unwrap();
    TestEditor {
        handle,
        persistence,
        generator,
        beacon,
        events,
    }
}

/// Blank draft with a prompt so regeneration is allowed.
pub fn blank_seed() -> DraftSeed {
    DraftSeed::blank("bold", "a neighbourhood bakery")
}

/// Let spawned tasks and actor mailboxes run without advancing the clock far.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

//! Draft state and the editor phase machine
//!
//! ```text
//! Idle ──patch──▶ Dirty ──timer/save/hidden/publish──▶ Saving ──ok──▶ Idle | Dirty
//!   │               │                                    └─err──▶ Dirty
//!   └──regenerate───┴──▶ Regenerating ──ok──▶ Dirty
//!                                     └─err──▶ (phase before the attempt)
//! ```
//!
//! `Saving` and `Regenerating` are variants of one enum, so a draft can
//! never be in both at once.

use chrono::{DateTime, Utc};
use ractor::RpcReplyPort;
use serde::Serialize;
use shared_types::{ContentDocument, PageId, PersistedPage, StyleDocument, UpsertPageRequest};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::actors::page_editor::protocol::{EditorError, FlushOutcome, PublishReceipt, SaveReceipt};
use crate::actors::page_editor::regenerate::accept_generated;

/// The editable document plus its persistence bookkeeping.
#[derive(Debug, Clone)]
pub struct DraftState {
    pub content: ContentDocument,
    pub style: StyleDocument,
    pub template_id: String,
    pub record_id: Option<PageId>,
    pub slug: Option<String>,
    pub original_prompt: String,
    /// Bumped once per accepted edit
    pub revision: u64,
    /// Highest revision confirmed persisted (or handed to the beacon)
    pub saved_revision: u64,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub published: bool,
    /// Last save failure; cleared by the next successful save
    pub last_error: Option<String>,
    pub notice: Option<EditorNotice>,
}

impl DraftState {
    pub fn from_seed(seed: DraftSeed) -> Self {
        Self {
            content: seed.content,
            style: seed.style,
            template_id: seed.template_id,
            record_id: seed.record_id,
            slug: seed.slug,
            original_prompt: seed.original_prompt,
            revision: u64::from(seed.unsaved),
            saved_revision: 0,
            last_saved_at: seed.last_saved_at,
            published: seed.published,
            last_error: None,
            notice: None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.revision > self.saved_revision
    }

    pub fn title(&self) -> &str {
        self.content.business_name()
    }

    /// Payload shared by autosave, explicit save, publish and the beacon.
    pub fn save_payload(&self, published: Option<bool>) -> UpsertPageRequest {
        UpsertPageRequest {
            id: self.record_id.clone(),
            template_id: self.template_id.clone(),
            page_content: self.content.clone(),
            page_style: self.style.clone(),
            original_prompt: self.original_prompt.clone(),
            published,
        }
    }
}

/// Initial document for an editor session.
#[derive(Debug, Clone)]
pub struct DraftSeed {
    pub content: ContentDocument,
    pub style: StyleDocument,
    pub template_id: String,
    pub record_id: Option<PageId>,
    pub slug: Option<String>,
    pub original_prompt: String,
    pub published: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Seed has never been persisted; the session starts dirty.
    pub unsaved: bool,
}

impl DraftSeed {
    /// Resume editing a stored record.
    pub fn from_record(page: PersistedPage) -> Self {
        Self {
            content: page.page_content,
            style: page.page_style,
            template_id: page.template_id,
            record_id: Some(page.id),
            slug: page.slug,
            original_prompt: page.original_prompt,
            published: page.published,
            last_saved_at: page.updated_at,
            unsaved: false,
        }
    }

    /// Start from a freshly generated document that has not been saved yet.
    pub fn from_generated(
        raw: &serde_json::Value,
        original_prompt: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Result<Self, EditorError> {
        let (content, style) = accept_generated(raw, &StyleDocument::default())?;
        Ok(Self {
            content,
            style,
            template_id: template_id.into(),
            record_id: None,
            slug: None,
            original_prompt: original_prompt.into(),
            published: false,
            last_saved_at: None,
            unsaved: true,
        })
    }

    /// Default document, nothing to save until the first edit.
    pub fn blank(template_id: impl Into<String>, original_prompt: impl Into<String>) -> Self {
        Self {
            content: ContentDocument::default(),
            style: StyleDocument::default(),
            template_id: template_id.into(),
            record_id: None,
            slug: None,
            original_prompt: original_prompt.into(),
            published: false,
            last_saved_at: None,
            unsaved: false,
        }
    }
}

#[derive(Debug)]
pub enum EditorPhase {
    Idle,
    Dirty,
    Saving(InFlightSave),
    Regenerating(RegenerationSnapshot),
}

impl EditorPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dirty => "dirty",
            Self::Saving(_) => "saving",
            Self::Regenerating(_) => "regenerating",
        }
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, Self::Saving(_))
    }

    pub fn is_regenerating(&self) -> bool {
        matches!(self, Self::Regenerating(_))
    }

    /// `Idle` or `Dirty` depending on the draft, for use once nothing is in flight.
    pub fn settled(draft: &DraftState) -> Self {
        if draft.is_dirty() {
            Self::Dirty
        } else {
            Self::Idle
        }
    }
}

/// A persistence call currently running.
#[derive(Debug)]
pub struct InFlightSave {
    pub ticket: u64,
    /// Revision carried by the payload
    pub revision: u64,
    pub publish: bool,
    pub waiters: Vec<SaveWaiter>,
    /// Save to issue once this one completes
    pub follow_up: Option<FollowUp>,
}

impl InFlightSave {
    /// Attach a caller: join this save if it already carries every edit,
    /// otherwise queue an explicit follow-up.
    pub fn attach(&mut self, current_revision: u64, waiter: Option<SaveWaiter>) {
        if self.revision >= current_revision {
            self.waiters.extend(waiter);
        } else {
            let follow_up = self.follow_up.get_or_insert_with(FollowUp::default);
            follow_up.explicit = true;
            follow_up.waiters.extend(waiter);
        }
    }

    /// Queue a publish behind this save. Returns false if one was already queued.
    pub fn queue_publish(&mut self, waiter: SaveWaiter) -> bool {
        let follow_up = self.follow_up.get_or_insert_with(FollowUp::default);
        follow_up.explicit = true;
        follow_up.waiters.push(waiter);
        !std::mem::replace(&mut follow_up.publish, true)
    }
}

/// A queued save. Timer-driven follow-ups are dropped if the save before them
/// fails; explicit ones always run.
#[derive(Debug, Default)]
pub struct FollowUp {
    pub explicit: bool,
    /// Issue the follow-up with `published: true`
    pub publish: bool,
    pub waiters: Vec<SaveWaiter>,
}

/// Callers awaiting the outcome of a save.
#[derive(Debug)]
pub enum SaveWaiter {
    Save(RpcReplyPort<Result<SaveReceipt, EditorError>>),
    Publish(RpcReplyPort<Result<PublishReceipt, EditorError>>),
    Flush(RpcReplyPort<FlushOutcome>),
}

impl SaveWaiter {
    pub fn resolve(self, outcome: &Result<SaveReceipt, EditorError>, public_origin: &str) {
        match self {
            Self::Save(reply) => {
                let _ = reply.send(outcome.clone());
            }
            Self::Publish(reply) => {
                let result = outcome
                    .as_ref()
                    .map_err(Clone::clone)
                    .and_then(|receipt| PublishReceipt::from_receipt(receipt, public_origin));
                let _ = reply.send(result);
            }
            Self::Flush(reply) => {
                let flush = match outcome {
                    Ok(receipt) => FlushOutcome::Saved {
                        receipt: receipt.clone(),
                    },
                    Err(err) => FlushOutcome::Failed {
                        message: err.to_string(),
                    },
                };
                let _ = reply.send(flush);
            }
        }
    }
}

/// Pre-regeneration document and the caller waiting on the result.
#[derive(Debug)]
pub struct RegenerationSnapshot {
    pub content: ContentDocument,
    pub style: StyleDocument,
    pub started_at: Instant,
    pub reply: Option<RpcReplyPort<Result<u64, EditorError>>>,
}

/// Debounce timer task. Aborting it is the cancellation.
#[derive(Debug)]
pub struct PendingSaveTimer {
    pub generation: u64,
    pub handle: JoinHandle<()>,
}

impl PendingSaveTimer {
    pub fn cancel(self) {
        self.handle.abort();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    RegenerationFailed,
}

/// Dismissible, time-limited message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorNotice {
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
    #[serde(skip)]
    pub expires: Instant,
}

impl EditorNotice {
    pub fn regeneration_failed(message: impl Into<String>, ttl: std::time::Duration) -> Self {
        Self {
            kind: NoticeKind::RegenerationFailed,
            message: message.into(),
            raised_at: Utc::now(),
            expires: Instant::now() + ttl,
        }
    }

    pub fn is_active(&self, now: Instant) -> bool {
        now < self.expires
    }
}

/// Read-only view of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftSnapshot {
    pub content: ContentDocument,
    pub style: StyleDocument,
    pub template_id: String,
    pub record_id: Option<PageId>,
    pub slug: Option<String>,
    pub original_prompt: String,
    pub phase: &'static str,
    pub revision: u64,
    pub dirty: bool,
    pub saving: bool,
    pub regenerating: bool,
    pub published: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub notice: Option<EditorNotice>,
}

impl DraftSnapshot {
    pub fn capture(draft: &DraftState, phase: &EditorPhase) -> Self {
        Self {
            content: draft.content.clone(),
            style: draft.style.clone(),
            template_id: draft.template_id.clone(),
            record_id: draft.record_id.clone(),
            slug: draft.slug.clone(),
            original_prompt: draft.original_prompt.clone(),
            phase: phase.name(),
            revision: draft.revision,
            dirty: draft.is_dirty(),
            saving: phase.is_saving(),
            regenerating: phase.is_regenerating(),
            published: draft.published,
            last_saved_at: draft.last_saved_at,
            last_error: draft.last_error.clone(),
            notice: draft
                .notice
                .clone()
                .filter(|notice| notice.is_active(Instant::now())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn generated() -> serde_json::Value {
        json!({
            "business": {"name": "Crumb & Co"},
            "hero": {"headline": "Fresh bread", "subheadline": "Daily"},
            "theme": {"mode": "dark", "accentColor": "#FF0000"},
        })
    }

    #[test]
    fn test_generated_seed_starts_dirty() {
        let seed = DraftSeed::from_generated(&generated(), "a bakery", "bold").unwrap();
        let draft = DraftState::from_seed(seed);
        assert!(draft.is_dirty());
        assert_eq!(draft.title(), "Crumb & Co");
        assert_eq!(draft.style.accent_color.as_str(), "#ff0000");
    }

    #[test]
    fn test_generated_seed_rejects_missing_headline() {
        let err = DraftSeed::from_generated(&json!({"hero": {"headline": ""}}), "p", "t").unwrap_err();
        assert!(matches!(err, EditorError::InvalidContent(_)));
    }

    #[test]
    fn test_record_seed_starts_clean() {
        let page = PersistedPage {
            id: PageId("rec-1".to_string()),
            slug: Some("crumb-co".to_string()),
            title: None,
            template_id: "bold".to_string(),
            page_content: ContentDocument::default(),
            page_style: StyleDocument::default(),
            original_prompt: "a bakery".to_string(),
            published: true,
            updated_at: None,
        };
        let draft = DraftState::from_seed(DraftSeed::from_record(page));
        assert!(!draft.is_dirty());
        assert!(draft.published);
        assert_eq!(draft.save_payload(None).id, Some(PageId("rec-1".to_string())));
    }

    #[test]
    fn test_attach_joins_or_queues() {
        let mut in_flight = InFlightSave {
            ticket: 1,
            revision: 4,
            publish: false,
            waiters: Vec::new(),
            follow_up: None,
        };
        in_flight.attach(4, None);
        assert!(in_flight.follow_up.is_none());

        in_flight.attach(5, None);
        assert!(in_flight.follow_up.as_ref().is_some_and(|f| f.explicit && !f.publish));
    }

    #[tokio::test]
    async fn test_queue_publish_marks_follow_up_once() {
        let mut in_flight = InFlightSave {
            ticket: 1,
            revision: 4,
            publish: false,
            waiters: Vec::new(),
            follow_up: None,
        };
        let (first, _rx1) = tokio::sync::oneshot::channel();
        let (second, _rx2) = tokio::sync::oneshot::channel();

        assert!(in_flight.queue_publish(SaveWaiter::Publish(first.into())));
        assert!(!in_flight.queue_publish(SaveWaiter::Publish(second.into())));

        let follow_up = in_flight.follow_up.as_ref().unwrap();
        assert!(follow_up.explicit && follow_up.publish);
        assert_eq!(follow_up.waiters.len(), 2);
    }

    #[test]
    fn test_settled_phase_follows_revisions() {
        let mut draft = DraftState::from_seed(DraftSeed::blank("t", "p"));
        assert_eq!(EditorPhase::settled(&draft).name(), "idle");
        draft.revision = 2;
        draft.saved_revision = 1;
        assert_eq!(EditorPhase::settled(&draft).name(), "dirty");
    }
}

//! PageEditorActor message protocol
//!
//! Defines the messages accepted by the editor actor, the receipts it hands
//! back, and the notifications it pushes to surrounding chrome.

use chrono::{DateTime, Utc};
use ractor::RpcReplyPort;
use serde::Serialize;
use shared_types::{
    public_page_url, ContentError, FieldPatch, PageId, PatchError, PersistedPage, StyleError,
};

use crate::actors::page_editor::state::DraftSnapshot;
use crate::collaborators::{GenerationError, PersistenceError};

/// Messages handled by PageEditorActor
#[derive(Debug)]
pub enum PageEditorMsg {
    /// Apply one content edit. Replies with the new revision.
    ApplyPatch {
        patch: FieldPatch,
        reply: RpcReplyPort<Result<u64, EditorError>>,
    },
    /// Apply several content edits as one revision, all or nothing.
    ApplyPatches {
        patches: Vec<FieldPatch>,
        reply: RpcReplyPort<Result<u64, EditorError>>,
    },
    /// Apply one theme edit.
    ApplyStylePatch {
        patch: FieldPatch,
        reply: RpcReplyPort<Result<u64, EditorError>>,
    },
    /// Save now, bypassing the debounce.
    Save {
        reply: RpcReplyPort<Result<SaveReceipt, EditorError>>,
    },
    /// Replace the document with a freshly generated one.
    Regenerate {
        reply: RpcReplyPort<Result<u64, EditorError>>,
    },
    Publish {
        reply: RpcReplyPort<Result<PublishReceipt, EditorError>>,
    },
    /// The host page became hidden.
    VisibilityHidden {
        reply: Option<RpcReplyPort<FlushOutcome>>,
    },
    /// The host page is being torn down.
    Unload {
        reply: Option<RpcReplyPort<FlushOutcome>>,
    },
    GetSnapshot {
        reply: RpcReplyPort<DraftSnapshot>,
    },
    DismissNotice,

    // Internal callbacks
    AutosaveDue {
        generation: u64,
    },
    SaveFinished {
        ticket: u64,
        result: Result<PersistedPage, PersistenceError>,
    },
    RegenerateFinished {
        result: Result<serde_json::Value, GenerationError>,
    },
}

/// Errors reported to editor callers
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Missing input detected before any network call
    #[error("validation failed: {0}")]
    Validation(String),

    /// Operation not allowed in the current phase
    #[error("editor is busy ({phase})")]
    Busy { phase: &'static str },

    #[error("invalid patch: {0}")]
    InvalidPatch(#[from] PatchError),

    #[error("invalid style: {0}")]
    InvalidStyle(#[from] StyleError),

    #[error("save failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Generated document failed structural validation
    #[error("generated content rejected: {0}")]
    InvalidContent(#[from] ContentError),

    #[error("editor actor unavailable: {0}")]
    ActorUnavailable(String),
}

/// Result of a completed save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReceipt {
    pub record_id: PageId,
    pub slug: Option<String>,
    /// Edit revision the save carried
    pub revision: u64,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    pub record_id: PageId,
    pub slug: String,
    pub url: String,
}

impl PublishReceipt {
    pub fn from_receipt(receipt: &SaveReceipt, public_origin: &str) -> Result<Self, EditorError> {
        let slug = receipt.slug.clone().ok_or_else(|| {
            EditorError::Validation(format!(
                "page {} was saved without a slug; cannot build a public URL",
                receipt.record_id
            ))
        })?;
        Ok(Self {
            record_id: receipt.record_id.clone(),
            url: public_page_url(public_origin, &slug),
            slug,
        })
    }
}

/// What a visibility or unload flush did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FlushOutcome {
    /// Nothing unsaved
    Clean,
    Saved { receipt: SaveReceipt },
    Failed { message: String },
    /// Regeneration in progress; its own completion re-arms autosave.
    Deferred,
    BeaconQueued,
    BeaconRefused,
}

/// Notifications for surrounding chrome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    PublishingChanged {
        publishing: bool,
    },
    TitleUpdated {
        title: String,
    },
    Saved {
        record_id: PageId,
        revision: u64,
        saved_at: DateTime<Utc>,
    },
    SaveFailed {
        message: String,
    },
    Regenerated {
        revision: u64,
    },
    RegenerationFailed {
        message: String,
    },
}

impl EditorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PublishingChanged { .. } => shared_types::EVENT_PAGE_PUBLISHING,
            Self::TitleUpdated { .. } => shared_types::EVENT_PAGE_TITLE_UPDATED,
            Self::Saved { .. } => shared_types::EVENT_PAGE_SAVED,
            Self::SaveFailed { .. } => shared_types::EVENT_PAGE_SAVE_FAILED,
            Self::Regenerated { .. } => shared_types::EVENT_PAGE_REGENERATED,
            Self::RegenerationFailed { .. } => shared_types::EVENT_PAGE_REGENERATION_FAILED,
        }
    }
}

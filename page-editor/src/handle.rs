use ractor::{Actor, ActorRef};
use shared_types::FieldPatch;
use tokio::task::JoinHandle;

use crate::actors::page_editor::{
    DraftSnapshot, EditorError, FlushOutcome, PageEditorActor, PageEditorArguments, PageEditorMsg,
    PublishReceipt, SaveReceipt,
};

/// Typed front for a running editor session.
#[derive(Clone)]
pub struct PageEditorHandle {
    actor: ActorRef<PageEditorMsg>,
}

fn unavailable(err: impl std::fmt::Display) -> EditorError {
    EditorError::ActorUnavailable(err.to_string())
}

impl PageEditorHandle {
    pub fn new(actor: ActorRef<PageEditorMsg>) -> Self {
        Self { actor }
    }

    pub async fn spawn(args: PageEditorArguments) -> Result<(Self, JoinHandle<()>), EditorError> {
        let (actor, join) = Actor::spawn(None, PageEditorActor, args)
            .await
            .map_err(unavailable)?;
        Ok((Self { actor }, join))
    }

    pub fn actor(&self) -> ActorRef<PageEditorMsg> {
        self.actor.clone()
    }

    pub async fn apply_patch(&self, patch: FieldPatch) -> Result<u64, EditorError> {
        ractor::call!(self.actor, |reply| PageEditorMsg::ApplyPatch { patch, reply })
            .map_err(unavailable)?
    }

    pub async fn apply_patches(&self, patches: Vec<FieldPatch>) -> Result<u64, EditorError> {
        ractor::call!(self.actor, |reply| PageEditorMsg::ApplyPatches { patches, reply })
            .map_err(unavailable)?
    }

    pub async fn apply_style_patch(&self, patch: FieldPatch) -> Result<u64, EditorError> {
        ractor::call!(self.actor, |reply| PageEditorMsg::ApplyStylePatch { patch, reply })
            .map_err(unavailable)?
    }

    pub async fn save(&self) -> Result<SaveReceipt, EditorError> {
        ractor::call!(self.actor, |reply| PageEditorMsg::Save { reply }).map_err(unavailable)?
    }

    pub async fn regenerate(&self) -> Result<u64, EditorError> {
        ractor::call!(self.actor, |reply| PageEditorMsg::Regenerate { reply })
            .map_err(unavailable)?
    }

    pub async fn publish(&self) -> Result<PublishReceipt, EditorError> {
        ractor::call!(self.actor, |reply| PageEditorMsg::Publish { reply }).map_err(unavailable)?
    }

    /// Awaits the flush save, if one was needed.
    pub async fn visibility_hidden(&self) -> Result<FlushOutcome, EditorError> {
        ractor::call!(self.actor, |reply| PageEditorMsg::VisibilityHidden {
            reply: Some(reply)
        })
        .map_err(unavailable)
    }

    /// Returns as soon as the beacon was handed the payload.
    pub async fn unload(&self) -> Result<FlushOutcome, EditorError> {
        ractor::call!(self.actor, |reply| PageEditorMsg::Unload { reply: Some(reply) })
            .map_err(unavailable)
    }

    pub async fn snapshot(&self) -> Result<DraftSnapshot, EditorError> {
        ractor::call!(self.actor, |reply| PageEditorMsg::GetSnapshot { reply })
            .map_err(unavailable)
    }

    pub fn dismiss_notice(&self) -> Result<(), EditorError> {
        self.actor
            .cast(PageEditorMsg::DismissNotice)
            .map_err(unavailable)
    }

    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

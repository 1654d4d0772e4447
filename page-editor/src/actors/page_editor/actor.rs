//! PageEditorActor - single mutation authority for one draft
//!
//! Every edit, save, regeneration and lifecycle signal for a page goes
//! through this actor. Network calls run in spawned tasks that report back
//! by message, so edits keep applying while a save or generation is running.

use std::sync::Arc;

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use shared_types::FieldPatch;
use tokio::sync::mpsc;

use crate::actors::page_editor::protocol::{EditorError, EditorEvent, PageEditorMsg};
use crate::actors::page_editor::state::{
    DraftSeed, DraftSnapshot, DraftState, EditorPhase, PendingSaveTimer,
};
use crate::collaborators::{BeaconTransport, PageGenerator, PagePersistence};
use crate::config::EditorConfig;

/// PageEditorActor - owns one editor session
#[derive(Debug, Default)]
pub struct PageEditorActor;

/// Arguments for spawning PageEditorActor
#[derive(Clone)]
pub struct PageEditorArguments {
    pub seed: DraftSeed,
    pub persistence: Arc<dyn PagePersistence>,
    pub generator: Arc<dyn PageGenerator>,
    pub beacon: Arc<dyn BeaconTransport>,
    /// Receives publishing/title/save/regeneration notifications
    pub events: Option<mpsc::UnboundedSender<EditorEvent>>,
    pub config: EditorConfig,
}

/// Internal state for PageEditorActor
pub struct PageEditorState {
    pub(crate) draft: DraftState,
    pub(crate) phase: EditorPhase,
    pub(crate) timer: Option<PendingSaveTimer>,
    pub(crate) timer_generation: u64,
    pub(crate) next_ticket: u64,
    pub(crate) persistence: Arc<dyn PagePersistence>,
    pub(crate) generator: Arc<dyn PageGenerator>,
    pub(crate) beacon: Arc<dyn BeaconTransport>,
    events: Option<mpsc::UnboundedSender<EditorEvent>>,
    pub(crate) config: EditorConfig,
}

impl PageEditorState {
    pub(crate) fn emit(&mut self, event: EditorEvent) {
        let Some(events) = &self.events else {
            return;
        };
        tracing::debug!(event = event.name(), "Emitting editor event");
        if events.send(event).is_err() {
            tracing::debug!("Editor event receiver dropped; disabling notifications");
            self.events = None;
        }
    }

    pub(crate) fn cancel_autosave(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    /// Record an accepted edit. `Saving` stays `Saving`; the save in flight
    /// simply no longer covers the latest revision.
    pub(crate) fn record_edit(&mut self) -> u64 {
        self.draft.revision += 1;
        if matches!(self.phase, EditorPhase::Idle) {
            self.phase = EditorPhase::Dirty;
        }
        self.draft.revision
    }

    pub(crate) fn busy_regenerating(&self) -> Result<(), EditorError> {
        if self.phase.is_regenerating() {
            return Err(EditorError::Busy {
                phase: self.phase.name(),
            });
        }
        Ok(())
    }

    pub(crate) fn busy_in_flight(&self) -> Result<(), EditorError> {
        if self.phase.is_saving() || self.phase.is_regenerating() {
            return Err(EditorError::Busy {
                phase: self.phase.name(),
            });
        }
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot::capture(&self.draft, &self.phase)
    }
}

#[async_trait]
impl Actor for PageEditorActor {
    type Msg = PageEditorMsg;
    type State = PageEditorState;
    type Arguments = PageEditorArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let draft = DraftState::from_seed(args.seed);
        tracing::info!(
            actor_id = %myself.get_id(),
            record_id = ?draft.record_id,
            template_id = %draft.template_id,
            unsaved = draft.is_dirty(),
            "PageEditorActor starting"
        );

        let mut state = PageEditorState {
            phase: EditorPhase::settled(&draft),
            draft,
            timer: None,
            timer_generation: 0,
            next_ticket: 1,
            persistence: args.persistence,
            generator: args.generator,
            beacon: args.beacon,
            events: args.events,
            config: args.config,
        };
        if state.draft.is_dirty() {
            self.arm_autosave(&myself, &mut state);
        }
        Ok(state)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            PageEditorMsg::ApplyPatch { patch, reply } => {
                let result = self.handle_apply_patches(&myself, state, vec![patch]);
                let _ = reply.send(result);
            }
            PageEditorMsg::ApplyPatches { patches, reply } => {
                let result = self.handle_apply_patches(&myself, state, patches);
                let _ = reply.send(result);
            }
            PageEditorMsg::ApplyStylePatch { patch, reply } => {
                let result = self.handle_apply_style_patch(&myself, state, patch);
                let _ = reply.send(result);
            }
            PageEditorMsg::Save { reply } => {
                self.handle_save(&myself, state, reply);
            }
            PageEditorMsg::Regenerate { reply } => {
                self.handle_regenerate(&myself, state, reply);
            }
            PageEditorMsg::Publish { reply } => {
                self.handle_publish(&myself, state, reply);
            }
            PageEditorMsg::VisibilityHidden { reply } => {
                self.handle_visibility_hidden(&myself, state, reply);
            }
            PageEditorMsg::Unload { reply } => {
                let outcome = self.handle_unload(state);
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
            PageEditorMsg::GetSnapshot { reply } => {
                let _ = reply.send(state.snapshot());
            }
            PageEditorMsg::DismissNotice => {
                state.draft.notice = None;
            }
            PageEditorMsg::AutosaveDue { generation } => {
                self.handle_autosave_due(&myself, state, generation);
            }
            PageEditorMsg::SaveFinished { ticket, result } => {
                self.handle_save_finished(&myself, state, ticket, result);
            }
            PageEditorMsg::RegenerateFinished { result } => {
                self.handle_regenerate_finished(&myself, state, result);
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.cancel_autosave();
        if state.draft.is_dirty() {
            tracing::warn!(
                actor_id = %myself.get_id(),
                record_id = ?state.draft.record_id,
                revision = state.draft.revision,
                saved_revision = state.draft.saved_revision,
                "PageEditorActor stopped with unsaved edits"
            );
        } else {
            tracing::info!(actor_id = %myself.get_id(), "PageEditorActor stopped");
        }
        Ok(())
    }
}

impl PageEditorActor {
    fn handle_apply_patches(
        &self,
        myself: &ActorRef<PageEditorMsg>,
        state: &mut PageEditorState,
        patches: Vec<FieldPatch>,
    ) -> Result<u64, EditorError> {
        state.busy_regenerating()?;
        if patches.is_empty() {
            return Ok(state.draft.revision);
        }

        let next = state.draft.content.apply_patches(&patches)?;
        let title_changed = next.business_name() != state.draft.title();
        state.draft.content = next;
        let revision = state.record_edit();
        self.arm_autosave(myself, state);

        tracing::debug!(
            revision,
            patches = patches.len(),
            first_path = %patches[0].path,
            "Applied content patch"
        );
        if title_changed {
            let title = state.draft.title().to_string();
            state.emit(EditorEvent::TitleUpdated { title });
        }
        Ok(revision)
    }

    fn handle_apply_style_patch(
        &self,
        myself: &ActorRef<PageEditorMsg>,
        state: &mut PageEditorState,
        patch: FieldPatch,
    ) -> Result<u64, EditorError> {
        state.busy_regenerating()?;
        let next = state.draft.style.apply_patch(&patch.path, patch.value)?;
        state.draft.style = next;
        let revision = state.record_edit();
        self.arm_autosave(myself, state);
        tracing::debug!(revision, path = %patch.path, "Applied style patch");
        Ok(revision)
    }
}

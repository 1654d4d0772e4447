//! Flush paths for the host page going hidden or away.
//!
//! Hidden: the session is still alive, so issue a normal awaited save.
//! Unload: hand the payload to the beacon and assume it will be delivered.

use ractor::{ActorRef, RpcReplyPort};

use crate::actors::page_editor::actor::{PageEditorActor, PageEditorState};
use crate::actors::page_editor::protocol::{FlushOutcome, PageEditorMsg};
use crate::actors::page_editor::state::{EditorPhase, SaveWaiter};

impl PageEditorActor {
    pub(crate) fn handle_visibility_hidden(
        &self,
        myself: &ActorRef<PageEditorMsg>,
        state: &mut PageEditorState,
        reply: Option<RpcReplyPort<FlushOutcome>>,
    ) {
        let respond = |reply: Option<RpcReplyPort<FlushOutcome>>, outcome: FlushOutcome| {
            if let Some(reply) = reply {
                let _ = reply.send(outcome);
            }
        };

        if !state.draft.is_dirty() {
            respond(reply, FlushOutcome::Clean);
            return;
        }

        let current_revision = state.draft.revision;
        if state.phase.is_regenerating() {
            tracing::debug!("Page hidden during regeneration; flush deferred");
            respond(reply, FlushOutcome::Deferred);
            return;
        }
        if let EditorPhase::Saving(in_flight) = &mut state.phase {
            in_flight.attach(current_revision, reply.map(SaveWaiter::Flush));
            return;
        }

        tracing::info!(revision = current_revision, "Page hidden; flushing draft");
        let waiters = reply.map(SaveWaiter::Flush).into_iter().collect();
        self.dispatch_save(myself, state, false, waiters);
    }

    pub(crate) fn handle_unload(&self, state: &mut PageEditorState) -> FlushOutcome {
        state.cancel_autosave();
        if !state.draft.is_dirty() {
            return FlushOutcome::Clean;
        }

        let payload = state.draft.save_payload(None);
        if !state.beacon.send(&payload) {
            tracing::warn!(
                record_id = ?payload.id,
                revision = state.draft.revision,
                "Beacon refused unload payload; edits remain unsaved"
            );
            return FlushOutcome::BeaconRefused;
        }

        tracing::info!(
            record_id = ?payload.id,
            revision = state.draft.revision,
            "Queued unload beacon"
        );
        // No delivery confirmation is possible; treat as saved.
        state.draft.saved_revision = state.draft.revision;
        if matches!(state.phase, EditorPhase::Dirty) {
            state.phase = EditorPhase::Idle;
        }
        FlushOutcome::BeaconQueued
    }
}

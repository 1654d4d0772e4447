//! Debounced autosave and the shared save primitive.

use chrono::Utc;
use ractor::{ActorRef, RpcReplyPort};
use shared_types::PersistedPage;

use crate::actors::page_editor::actor::{PageEditorActor, PageEditorState};
use crate::actors::page_editor::protocol::{EditorError, EditorEvent, PageEditorMsg, SaveReceipt};
use crate::actors::page_editor::state::{EditorPhase, InFlightSave, PendingSaveTimer, SaveWaiter};
use crate::collaborators::PersistenceError;

impl PageEditorActor {
    /// Restart the quiet-period timer. Each call supersedes the previous one.
    pub(crate) fn arm_autosave(&self, myself: &ActorRef<PageEditorMsg>, state: &mut PageEditorState) {
        state.cancel_autosave();
        state.timer_generation += 1;
        let generation = state.timer_generation;
        let delay = state.config.autosave_debounce();
        let timer_ref = myself.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = timer_ref.cast(PageEditorMsg::AutosaveDue { generation });
        });
        state.timer = Some(PendingSaveTimer { generation, handle });
    }

    pub(crate) fn handle_autosave_due(
        &self,
        myself: &ActorRef<PageEditorMsg>,
        state: &mut PageEditorState,
        generation: u64,
    ) {
        if state.timer.as_ref().map(|timer| timer.generation) != Some(generation) {
            tracing::debug!(generation, "Ignoring superseded autosave timer");
            return;
        }
        state.timer = None;

        if matches!(state.phase, EditorPhase::Dirty) {
            self.dispatch_save(myself, state, false, Vec::new());
        } else if let EditorPhase::Saving(in_flight) = &mut state.phase {
            tracing::debug!(
                ticket = in_flight.ticket,
                "Save in flight; scheduling autosave for after it completes"
            );
            in_flight.follow_up.get_or_insert_with(Default::default);
        }
    }

    /// Issue a persistence call for the current revision. Callers guarantee
    /// nothing else is in flight.
    pub(crate) fn dispatch_save(
        &self,
        myself: &ActorRef<PageEditorMsg>,
        state: &mut PageEditorState,
        publish: bool,
        waiters: Vec<SaveWaiter>,
    ) {
        state.cancel_autosave();
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        let revision = state.draft.revision;
        let payload = state.draft.save_payload(publish.then_some(true));

        tracing::info!(
            ticket,
            revision,
            record_id = ?payload.id,
            publish,
            "Saving page draft"
        );

        let persistence = state.persistence.clone();
        let reply_to = myself.clone();
        tokio::spawn(async move {
            let result = persistence.upsert(payload).await;
            if reply_to
                .cast(PageEditorMsg::SaveFinished { ticket, result })
                .is_err()
            {
                tracing::debug!(ticket, "Editor stopped before save completed");
            }
        });

        state.phase = EditorPhase::Saving(InFlightSave {
            ticket,
            revision,
            publish,
            waiters,
            follow_up: None,
        });
    }

    pub(crate) fn handle_save(
        &self,
        myself: &ActorRef<PageEditorMsg>,
        state: &mut PageEditorState,
        reply: RpcReplyPort<Result<SaveReceipt, EditorError>>,
    ) {
        if let Err(err) = state.busy_regenerating() {
            let _ = reply.send(Err(err));
            return;
        }
        let current_revision = state.draft.revision;
        if let EditorPhase::Saving(in_flight) = &mut state.phase {
            in_flight.attach(current_revision, Some(SaveWaiter::Save(reply)));
            return;
        }
        self.dispatch_save(myself, state, false, vec![SaveWaiter::Save(reply)]);
    }

    pub(crate) fn handle_save_finished(
        &self,
        myself: &ActorRef<PageEditorMsg>,
        state: &mut PageEditorState,
        ticket: u64,
        result: Result<PersistedPage, PersistenceError>,
    ) {
        let in_flight = match std::mem::replace(&mut state.phase, EditorPhase::Idle) {
            EditorPhase::Saving(in_flight) if in_flight.ticket == ticket => in_flight,
            other => {
                state.phase = other;
                tracing::debug!(ticket, "Ignoring completion for unknown save");
                return;
            }
        };

        let outcome = match result {
            Ok(page) => {
                if state.draft.record_id.is_none() {
                    tracing::info!(record_id = %page.id, slug = ?page.slug, "Adopted new page record");
                }
                state.draft.record_id = Some(page.id.clone());
                if page.slug.is_some() {
                    state.draft.slug = page.slug.clone();
                }
                state.draft.saved_revision = state.draft.saved_revision.max(in_flight.revision);
                let saved_at = page.updated_at.unwrap_or_else(Utc::now);
                state.draft.last_saved_at = Some(saved_at);
                state.draft.last_error = None;
                if in_flight.publish && state.draft.slug.is_some() {
                    state.draft.published = true;
                }

                tracing::info!(
                    ticket,
                    revision = in_flight.revision,
                    record_id = %page.id,
                    still_dirty = state.draft.is_dirty(),
                    "Page draft saved"
                );
                state.emit(EditorEvent::Saved {
                    record_id: page.id.clone(),
                    revision: in_flight.revision,
                    saved_at,
                });
                Ok(SaveReceipt {
                    record_id: page.id,
                    slug: state.draft.slug.clone(),
                    revision: in_flight.revision,
                    saved_at,
                })
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(ticket, revision = in_flight.revision, error = %message, "Page save failed");
                state.draft.last_error = Some(message.clone());
                state.emit(EditorEvent::SaveFailed { message });
                Err(EditorError::Persistence(err))
            }
        };

        if in_flight.publish {
            state.emit(EditorEvent::PublishingChanged { publishing: false });
        }
        for waiter in in_flight.waiters {
            waiter.resolve(&outcome, &state.config.public_origin);
        }
        state.phase = EditorPhase::settled(&state.draft);

        match in_flight.follow_up {
            Some(follow_up) if follow_up.explicit => {
                self.dispatch_save(myself, state, follow_up.publish, follow_up.waiters);
            }
            Some(follow_up) if outcome.is_ok() && state.draft.is_dirty() => {
                self.dispatch_save(myself, state, false, follow_up.waiters);
            }
            Some(_) => {
                tracing::debug!(ticket, "Dropping autosave follow-up");
            }
            None => {}
        }
    }
}

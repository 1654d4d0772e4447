use ractor::{ActorRef, RpcReplyPort};

use crate::actors::page_editor::actor::{PageEditorActor, PageEditorState};
use crate::actors::page_editor::protocol::{EditorError, EditorEvent, PageEditorMsg, PublishReceipt};
use crate::actors::page_editor::state::{EditorPhase, SaveWaiter};

impl PageEditorActor {
    /// Save with `published: true`, immediately or right after the save in
    /// flight. The URL is derived from the slug the store returns; `published`
    /// only flips on success.
    pub(crate) fn handle_publish(
        &self,
        myself: &ActorRef<PageEditorMsg>,
        state: &mut PageEditorState,
        reply: RpcReplyPort<Result<PublishReceipt, EditorError>>,
    ) {
        if let Err(err) = state.busy_regenerating() {
            let _ = reply.send(Err(err));
            return;
        }

        if let EditorPhase::Saving(in_flight) = &mut state.phase {
            tracing::info!(
                ticket = in_flight.ticket,
                "Save in flight; publishing once it completes"
            );
            let newly_queued = in_flight.queue_publish(SaveWaiter::Publish(reply));
            if newly_queued {
                state.emit(EditorEvent::PublishingChanged { publishing: true });
            }
            return;
        }

        tracing::info!(record_id = ?state.draft.record_id, "Publishing page");
        state.emit(EditorEvent::PublishingChanged { publishing: true });
        self.dispatch_save(myself, state, true, vec![SaveWaiter::Publish(reply)]);
    }
}

//! Regeneration with snapshot rollback.
//!
//! The live document is only replaced once the generated one has passed
//! validation, so observers see either the old document or a complete new
//! one.

use ractor::{ActorRef, RpcReplyPort};
use shared_types::{split_generated, ContentDocument, GenerateRequest, StyleDocument};
use tokio::time::Instant;

use crate::actors::page_editor::actor::{PageEditorActor, PageEditorState};
use crate::actors::page_editor::protocol::{EditorError, EditorEvent, PageEditorMsg};
use crate::actors::page_editor::state::{EditorNotice, EditorPhase, RegenerationSnapshot};
use crate::collaborators::GenerationError;

/// Validate a generated document and split out its theme. A missing theme
/// keeps `current_style`.
pub fn accept_generated(
    raw: &serde_json::Value,
    current_style: &StyleDocument,
) -> Result<(ContentDocument, StyleDocument), EditorError> {
    let (content, theme) = split_generated(raw)?;
    let style = match theme {
        Some(theme) => StyleDocument::from_theme(&theme)?,
        None => current_style.clone(),
    };
    Ok((content, style))
}

impl PageEditorActor {
    pub(crate) fn handle_regenerate(
        &self,
        myself: &ActorRef<PageEditorMsg>,
        state: &mut PageEditorState,
        reply: RpcReplyPort<Result<u64, EditorError>>,
    ) {
        if state.draft.original_prompt.trim().is_empty() {
            let _ = reply.send(Err(EditorError::Validation(
                "an original prompt is required to regenerate".to_string(),
            )));
            return;
        }
        if let Err(err) = state.busy_in_flight() {
            let _ = reply.send(Err(err));
            return;
        }

        state.cancel_autosave();
        let request = GenerateRequest {
            prompt: state.draft.original_prompt.clone(),
            existing_config: Some(state.draft.content.with_theme(state.draft.style.to_value())),
            template_id: Some(state.draft.template_id.clone()).filter(|t| !t.is_empty()),
        };
        tracing::info!(
            record_id = ?state.draft.record_id,
            revision = state.draft.revision,
            "Regenerating page"
        );

        let generator = state.generator.clone();
        let reply_to = myself.clone();
        tokio::spawn(async move {
            let result = generator.generate(request).await;
            if reply_to
                .cast(PageEditorMsg::RegenerateFinished { result })
                .is_err()
            {
                tracing::debug!("Editor stopped before regeneration completed");
            }
        });

        state.phase = EditorPhase::Regenerating(RegenerationSnapshot {
            content: state.draft.content.clone(),
            style: state.draft.style.clone(),
            started_at: Instant::now(),
            reply: Some(reply),
        });
    }

    pub(crate) fn handle_regenerate_finished(
        &self,
        myself: &ActorRef<PageEditorMsg>,
        state: &mut PageEditorState,
        result: Result<serde_json::Value, GenerationError>,
    ) {
        let snapshot = match std::mem::replace(&mut state.phase, EditorPhase::Idle) {
            EditorPhase::Regenerating(snapshot) => snapshot,
            other => {
                state.phase = other;
                tracing::debug!("Ignoring regeneration result outside regeneration");
                return;
            }
        };
        let elapsed_ms = snapshot.started_at.elapsed().as_millis() as u64;

        let outcome = result
            .map_err(EditorError::from)
            .and_then(|raw| accept_generated(&raw, &snapshot.style));

        let reply_value = match outcome {
            Ok((content, style)) => {
                let title_changed = content.business_name() != state.draft.title();
                state.draft.content = content;
                state.draft.style = style;
                state.draft.notice = None;
                state.draft.revision += 1;
                let revision = state.draft.revision;
                state.phase = EditorPhase::Dirty;
                self.arm_autosave(myself, state);

                tracing::info!(revision, elapsed_ms, "Regeneration applied");
                state.emit(EditorEvent::Regenerated { revision });
                if title_changed {
                    let title = state.draft.title().to_string();
                    state.emit(EditorEvent::TitleUpdated { title });
                }
                Ok(revision)
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(error = %message, elapsed_ms, "Regeneration failed; restoring draft");
                state.draft.content = snapshot.content;
                state.draft.style = snapshot.style;
                state.draft.notice = Some(EditorNotice::regeneration_failed(
                    message.clone(),
                    state.config.notice_ttl(),
                ));
                state.phase = EditorPhase::settled(&state.draft);
                if state.draft.is_dirty() {
                    self.arm_autosave(myself, state);
                }
                state.emit(EditorEvent::RegenerationFailed { message });
                Err(err)
            }
        };

        if let Some(reply) = snapshot.reply {
            let _ = reply.send(reply_value);
        }
    }
}

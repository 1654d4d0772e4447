//! Line-oriented session driver.
//!
//! Reads one JSON command per line, runs it against the editor and writes one
//! JSON result per line. Editor notifications are interleaved as
//! `{"event": ...}` lines. End of input flushes the draft like a hidden page.

use serde::Deserialize;
use serde_json::json;
use shared_types::FieldPatch;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::actors::page_editor::{EditorError, EditorEvent};
use crate::handle::PageEditorHandle;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DriverCommand {
    Patch { path: String, value: serde_json::Value },
    Patches { patches: Vec<FieldPatch> },
    Style { path: String, value: serde_json::Value },
    Save,
    Regenerate,
    Publish,
    Hidden,
    Unload,
    Status,
    Dismiss,
}

impl DriverCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Patch { .. } => "patch",
            Self::Patches { .. } => "patches",
            Self::Style { .. } => "style",
            Self::Save => "save",
            Self::Regenerate => "regenerate",
            Self::Publish => "publish",
            Self::Hidden => "hidden",
            Self::Unload => "unload",
            Self::Status => "status",
            Self::Dismiss => "dismiss",
        }
    }
}

fn to_json<T: serde::Serialize>(value: T) -> Result<serde_json::Value, EditorError> {
    serde_json::to_value(value).map_err(|e| EditorError::Validation(e.to_string()))
}

/// Run one command and render its result line.
pub async fn execute(handle: &PageEditorHandle, command: DriverCommand) -> serde_json::Value {
    let op = command.name();
    let result = match command {
        DriverCommand::Patch { path, value } => handle
            .apply_patch(FieldPatch::new(path, value))
            .await
            .map(|revision| json!({ "revision": revision })),
        DriverCommand::Patches { patches } => handle
            .apply_patches(patches)
            .await
            .map(|revision| json!({ "revision": revision })),
        DriverCommand::Style { path, value } => handle
            .apply_style_patch(FieldPatch::new(path, value))
            .await
            .map(|revision| json!({ "revision": revision })),
        DriverCommand::Save => handle.save().await.and_then(to_json),
        DriverCommand::Regenerate => handle
            .regenerate()
            .await
            .map(|revision| json!({ "revision": revision })),
        DriverCommand::Publish => handle.publish().await.and_then(to_json),
        DriverCommand::Hidden => handle.visibility_hidden().await.and_then(to_json),
        DriverCommand::Unload => handle.unload().await.and_then(to_json),
        DriverCommand::Status => handle.snapshot().await.and_then(to_json),
        DriverCommand::Dismiss => handle.dismiss_notice().map(|()| serde_json::Value::Null),
    };

    match result {
        Ok(value) => json!({ "op": op, "ok": true, "result": value }),
        Err(err) => json!({ "op": op, "ok": false, "error": err.to_string() }),
    }
}

async fn write_line<W>(writer: &mut W, value: &serde_json::Value) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = value.to_string();
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

fn event_line(event: &EditorEvent) -> serde_json::Value {
    serde_json::to_value(event).unwrap_or_else(|e| json!({ "event": "unserializable", "error": e.to_string() }))
}

/// Drive a session until input ends, then flush and stop the editor.
pub async fn run<R, W>(
    handle: PageEditorHandle,
    input: R,
    mut output: W,
    mut events: mpsc::UnboundedReceiver<EditorEvent>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let rendered = match serde_json::from_str::<DriverCommand>(trimmed) {
                    Ok(command) => {
                        tracing::debug!(op = command.name(), "Driver command");
                        execute(&handle, command).await
                    }
                    Err(e) => json!({ "ok": false, "error": format!("bad command: {e}") }),
                };
                write_line(&mut output, &rendered).await?;
            }
            Some(event) = events.recv() => {
                write_line(&mut output, &event_line(&event)).await?;
            }
        }
    }

    let flushed = execute(&handle, DriverCommand::Hidden).await;
    write_line(&mut output, &flushed).await?;
    handle.stop();

    // Sender lives in the actor state; the channel closes once it stops.
    while let Some(event) = events.recv().await {
        write_line(&mut output, &event_line(&event)).await?;
    }
    Ok(())
}

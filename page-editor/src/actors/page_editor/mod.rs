//! PageEditorActor - draft editing and persistence for one page
//!
//! The actor owns the [`DraftState`] and is the only thing that mutates it:
//! - Applies dotted-path patches to content and style
//! - Debounces autosave and serializes saves for the record
//! - Flushes on visibility-hidden (awaited save) and unload (beacon)
//! - Regenerates the page with rollback on failure or invalid output
//! - Publishes and derives the public URL
//!
//! ## Phases
//!
//! ```text
//! Idle → Dirty → Saving → Idle | Dirty
//!          ↓
//!     Regenerating → Dirty | (previous)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ractor::Actor;
//! use page_editor::actors::page_editor::{PageEditorActor, PageEditorArguments};
//!
//! let (editor_ref, _handle) = Actor::spawn(None, PageEditorActor, args).await?;
//! ```

pub mod actor;
mod autosave;
mod lifecycle;
mod publish;
pub mod protocol;
pub mod regenerate;
pub mod state;

pub use actor::{PageEditorActor, PageEditorArguments, PageEditorState};
pub use protocol::{
    EditorError, EditorEvent, FlushOutcome, PageEditorMsg, PublishReceipt, SaveReceipt,
};
pub use state::{DraftSeed, DraftSnapshot, DraftState, EditorNotice, EditorPhase, NoticeKind};

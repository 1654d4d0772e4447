//! PageDraft editor - draft engine for AI-generated marketing pages
//!
//! This crate holds the editing session for one page: an actor that applies
//! field patches, autosaves with a debounce, flushes on page teardown,
//! regenerates through an AI collaborator with rollback, and publishes.

pub mod actors;
pub mod collaborators;
pub mod config;
pub mod driver;
pub mod handle;

pub use handle::PageEditorHandle;

//! Shared types between the page editor engine and its frontends
//!
//! These types are used by both:
//! - the draft engine actors (native Rust)
//! - editor UIs and the persistence/generation HTTP services (JSON)
//!
//! Serializable with serde; the UI-facing ones also export TypeScript
//! bindings through ts-rs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod content;
pub mod node;
pub mod patch;
pub mod style;

pub use content::{
    apply_patch, default_tree, materialize, split_generated, ContentDocument, ContentError,
    PageContent, DEFAULT_SECTION_ORDER, REQUIRED_FIELDS, SECTION_ORDER_KEY, THEME_KEY,
};
pub use node::{Node, NodeMap};
pub use patch::{FieldPatch, FieldPath, PatchError};
pub use style::{AccentColor, StyleDocument, StyleError, ThemeMode};

// ============================================================================
// Identity
// ============================================================================

/// Identifier of a persisted page record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
pub struct PageId(pub String);

impl PageId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Persistence wire types
// ============================================================================

/// Body of every persistence write: autosave, explicit save, publish, beacon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
pub struct UpsertPageRequest {
    /// Absent on create; the server assigns id and slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PageId>,
    pub template_id: String,
    #[ts(type = "Record<string, unknown>")]
    pub page_content: ContentDocument,
    #[ts(type = "Record<string, unknown>")]
    pub page_style: StyleDocument,
    pub original_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

/// A page record as returned by the persistence service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
pub struct PersistedPage {
    pub id: PageId,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub page_content: ContentDocument,
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub page_style: StyleDocument,
    #[serde(default)]
    pub original_prompt: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Generation wire types
// ============================================================================

/// Request to the AI page generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    /// Current document (content keys plus `theme`) used as context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "Record<string, unknown> | null")]
    pub existing_config: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

/// Generator response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default)]
    #[ts(type = "Record<string, unknown> | null")]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Public URL of a published page: `<origin>/page/<slug>`.
pub fn public_page_url(origin: &str, slug: &str) -> String {
    format!("{}/page/{}", origin.trim_end_matches('/'), slug)
}

/// Lowercase ASCII slug from a page title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

// Editor notification names
pub const EVENT_PAGE_SAVED: &str = "page.saved";
pub const EVENT_PAGE_SAVE_FAILED: &str = "page.save_failed";
pub const EVENT_PAGE_PUBLISHING: &str = "page.publishing";
pub const EVENT_PAGE_TITLE_UPDATED: &str = "page.title_updated";
pub const EVENT_PAGE_REGENERATED: &str = "page.regenerated";
pub const EVENT_PAGE_REGENERATION_FAILED: &str = "page.regeneration_failed";

// ============================================================================
// Tests
// ============================================================================

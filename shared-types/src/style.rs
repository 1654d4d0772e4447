//! Theme settings for a page.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::node::Node;
use crate::patch::{set_path, FieldPath, PatchError};

pub const DEFAULT_ACCENT_COLOR: &str = "#6366f1";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("invalid accent color '{0}'")]
    InvalidAccentColor(String),

    #[error("malformed theme: {0}")]
    Malformed(String),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

/// A `#rgb` or `#rrggbb` hex color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccentColor(String);

impl AccentColor {
    pub fn parse(raw: &str) -> Result<Self, StyleError> {
        let candidate = raw.trim();
        let valid = candidate
            .strip_prefix('#')
            .map(|hex| (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
            .unwrap_or(false);
        if valid {
            Ok(Self(candidate.to_ascii_lowercase()))
        } else {
            Err(StyleError::InvalidAccentColor(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccentColor {
    fn default() -> Self {
        Self(DEFAULT_ACCENT_COLOR.to_string())
    }
}

impl TryFrom<String> for AccentColor {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccentColor> for String {
    fn from(color: AccentColor) -> Self {
        color.0
    }
}

/// Theme sub-document. Unknown theme keys (fonts, radii, ...) pass through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleDocument {
    pub mode: ThemeMode,
    pub accent_color: AccentColor,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StyleDocument {
    /// Parse a `theme` sub-tree. Absent fields take their defaults; present
    /// fields must be valid.
    pub fn from_theme(theme: &serde_json::Value) -> Result<Self, StyleError> {
        if !theme.is_object() {
            return Err(StyleError::Malformed(format!(
                "expected object, found {}",
                Node::from(theme).kind()
            )));
        }
        serde_json::from_value(theme.clone()).map_err(|e| StyleError::Malformed(e.to_string()))
    }

    pub fn to_value(&self) -> serde_json::Value {
        let mut map = self.extra.clone();
        map.insert(
            "mode".to_string(),
            serde_json::json!(match self.mode {
                ThemeMode::Light => "light",
                ThemeMode::Dark => "dark",
            }),
        );
        map.insert(
            "accentColor".to_string(),
            serde_json::Value::String(self.accent_color.as_str().to_string()),
        );
        serde_json::Value::Object(map)
    }

    /// Apply a dotted-path edit. The result must still be a valid theme.
    pub fn apply_patch(&self, path: &str, value: serde_json::Value) -> Result<Self, StyleError> {
        let path = FieldPath::parse(path)?;
        let root = Node::from(self.to_value());
        let patched = set_path(&root, &path, Node::from(value))?;
        Self::from_theme(&patched.to_value())
    }
}

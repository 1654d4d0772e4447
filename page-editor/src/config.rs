//! Editor configuration: built-in defaults, optional TOML file, env overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/page-editor.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period after the last edit before an autosave fires.
    pub autosave_debounce_ms: u64,
    /// Lifetime of the regeneration failure notice.
    pub notice_ttl_ms: u64,
    /// Origin used to build public page URLs.
    pub public_origin: String,
    /// Base URL of the page API (persistence, generation, beacon).
    pub api_base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: 3_000,
            notice_ttl_ms: 5_000,
            public_origin: "http://localhost:3000".to_string(),
            api_base_url: "http://localhost:3000".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl EditorConfig {
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.clamp(1_000, 120_000))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Apply `PAGE_EDITOR_*` overrides from `lookup`. Unparsable numbers are
    /// ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("PAGE_EDITOR_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(origin) = non_empty("PAGE_EDITOR_PUBLIC_ORIGIN") {
            self.public_origin = origin;
        }
        if let Some(raw) = non_empty("PAGE_EDITOR_AUTOSAVE_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.autosave_debounce_ms = ms,
                Err(e) => tracing::warn!(
                    value = %raw,
                    error = %e,
                    "Ignoring invalid PAGE_EDITOR_AUTOSAVE_MS"
                ),
            }
        }
    }
}

/// Load configuration from `PAGE_EDITOR_CONFIG_PATH`, else the nearest
/// `config/page-editor.toml`, else defaults; then apply env overrides.
pub fn load_editor_config() -> EditorConfig {
    let path = std::env::var("PAGE_EDITOR_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| find_default_config_path(DEFAULT_CONFIG_PATH));

    let mut config = match path {
        Some(path) => load_config_file(&path),
        None => {
            tracing::info!("No editor config file found; using built-in defaults");
            EditorConfig::default()
        }
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    config
}

fn load_config_file(path: &Path) -> EditorConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Failed to read editor config file; using built-in defaults"
            );
            return EditorConfig::default();
        }
    };
    EditorConfig::from_toml_str(&content).unwrap_or_else(|err| {
        tracing::warn!(
            path = %path.display(),
            error = %err,
            "Failed to parse editor config TOML; using built-in defaults"
        );
        EditorConfig::default()
    })
}

fn find_default_config_path(relative_path: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;
    loop {
        let candidate = current.join(relative_path);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

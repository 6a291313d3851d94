use std::{collections::HashMap, fs, path::Path, time::Duration};

use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "assist.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
    pub catalog_prompt_limit: usize,
    pub bio_max_chars: usize,
    pub bio_tone: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://generativelanguage.googleapis.com".into(),
            model: "gemini-2.5-flash".into(),
            request_timeout_secs: 30,
            catalog_prompt_limit: 50,
            bio_max_chars: 280,
            bio_tone: "professional".into(),
        }
    }
}

impl Settings {
    /// The configured key, or `None` when it is missing or blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(DEFAULT_SETTINGS_FILE)
}

pub fn load_settings_from(path: impl AsRef<Path>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path.as_ref()) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        return;
    };

    let get = |key: &str| {
        file_cfg.get(key).map(|value| match value {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };

    if let Some(v) = get("api_key") {
        settings.api_key = Some(v);
    }
    if let Some(v) = get("api_base_url") {
        settings.api_base_url = v;
    }
    if let Some(v) = get("model") {
        settings.model = v;
    }
    if let Some(v) = get("request_timeout_secs").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = get("catalog_prompt_limit").and_then(|v| v.parse().ok()) {
        settings.catalog_prompt_limit = v;
    }
    if let Some(v) = get("bio_max_chars").and_then(|v| v.parse().ok()) {
        settings.bio_max_chars = v;
    }
    if let Some(v) = get("bio_tone") {
        settings.bio_tone = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    for name in ["GEMINI_API_KEY", "API_KEY", "APP__API_KEY"] {
        if let Some(v) = var(name) {
            settings.api_key = Some(v);
        }
    }

    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("APP__MODEL") {
        settings.model = v;
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = var("APP__CATALOG_PROMPT_LIMIT") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.catalog_prompt_limit = parsed;
        }
    }
    if let Some(v) = var("APP__BIO_MAX_CHARS") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.bio_max_chars = parsed;
        }
    }
    if let Some(v) = var("APP__BIO_TONE") {
        settings.bio_tone = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

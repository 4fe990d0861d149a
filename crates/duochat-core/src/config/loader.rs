//! Config loader — reads `~/.duochat/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.duochat/config.json`
//! 3. Environment variables `DUOCHAT_*` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderSettings};
use crate::types::ProviderKind;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path (no env overrides).
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return Config::default();
        }
    };

    migrate_config(&mut raw);

    match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// The browser build stored `{"apiConfig": {"provider", "apiKey"}}`; hoist the
/// inner record to the top level unless the top level already has a key.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(obj) = raw.as_object_mut() else {
        return;
    };
    let Some(legacy) = obj.remove("apiConfig") else {
        return;
    };
    if let Some(legacy) = legacy.as_object() {
        for field in ["provider", "apiKey"] {
            if let Some(val) = legacy.get(field) {
                if !obj.contains_key(field) {
                    obj.insert(field.to_string(), val.clone());
                }
            }
        }
        debug!("Migrated apiConfig → top-level provider/apiKey");
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Supported overrides:
/// - `DUOCHAT_PROVIDER` → `provider`
/// - `DUOCHAT_API_KEY` → `apiKey`
/// - `DUOCHAT_PROVIDERS__<NAME>__MODEL` → `providers.<name>.model`
/// - `DUOCHAT_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.apiBase`
/// - `DUOCHAT_PROVIDERS__<NAME>__MAX_TOKENS` → `providers.<name>.maxTokens`
/// - `DUOCHAT_VOICE__API_KEY` → `voice.apiKey`
/// - `DUOCHAT_VOICE__LANGUAGE` → `voice.language`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("DUOCHAT_PROVIDER") {
        match val.parse::<ProviderKind>() {
            Ok(kind) => config.provider = kind,
            Err(e) => warn!("Ignoring DUOCHAT_PROVIDER: {}", e),
        }
    }
    if let Ok(val) = std::env::var("DUOCHAT_API_KEY") {
        config.api_key = val;
    }

    apply_provider_env(&mut config.providers.openai, "OPENAI");
    apply_provider_env(&mut config.providers.gemini, "GEMINI");

    if let Ok(val) = std::env::var("DUOCHAT_VOICE__API_KEY") {
        config.voice.api_key = val;
    }
    if let Ok(val) = std::env::var("DUOCHAT_VOICE__LANGUAGE") {
        config.voice.language = val;
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(settings: &mut ProviderSettings, name: &str) {
    if let Ok(val) = std::env::var(format!("DUOCHAT_PROVIDERS__{name}__MODEL")) {
        settings.model = Some(val);
    }
    if let Ok(val) = std::env::var(format!("DUOCHAT_PROVIDERS__{name}__API_BASE")) {
        settings.api_base = Some(val);
    }
    if let Ok(val) = std::env::var(format!("DUOCHAT_PROVIDERS__{name}__MAX_TOKENS")) {
        if let Ok(n) = val.parse::<u32>() {
            settings.max_tokens = Some(n);
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

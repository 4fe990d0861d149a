//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProvidersConfig`, `CameraConfig`, `VoiceConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! The top-level `provider` + `apiKey` pair is the persisted API record;
//! everything else is optional tuning with defaults.

use serde::{Deserialize, Serialize};

use crate::types::{ApiConfig, ProviderKind};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.duochat/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Active provider.
    pub provider: ProviderKind,
    /// API key for the active provider.
    pub api_key: String,
    pub providers: ProvidersConfig,
    pub camera: CameraConfig,
    pub voice: VoiceConfig,
}

impl Config {
    /// The provider/key record passed into each send.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.provider, self.api_key.clone())
    }

    /// Replace the provider/key record.
    pub fn set_api_config(&mut self, api: &ApiConfig) {
        self.provider = api.provider;
        self.api_key = api.api_key.trim().to_string();
    }

    /// Key used for speech transcription.
    ///
    /// Falls back to the chat key when the active provider is OpenAI, since the
    /// default transcription endpoint is OpenAI's.
    pub fn transcription_key(&self) -> Option<&str> {
        if !self.voice.api_key.trim().is_empty() {
            return Some(self.voice.api_key.trim());
        }
        if self.provider == ProviderKind::OpenAi && !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim());
        }
        None
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Optional per-provider overrides. Unset fields fall back to the registry defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    /// Model identifier (e.g. `"gpt-4o"`, `"gemini-1.5-flash"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Custom API base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Maximum tokens to generate (OpenAI only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Settings for both providers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub openai: ProviderSettings,
    pub gemini: ProviderSettings,
}

impl ProvidersConfig {
    pub fn get(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Gemini => &self.gemini,
        }
    }

    pub fn get_mut(&mut self, kind: ProviderKind) -> &mut ProviderSettings {
        match kind {
            ProviderKind::OpenAi => &mut self.openai,
            ProviderKind::Gemini => &mut self.gemini,
        }
    }
}

// ─────────────────────────────────────────────
// Camera
// ─────────────────────────────────────────────

/// Still-capture command used by the camera collector.
///
/// `{device}` and `{output}` are substituted before the command runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraConfig {
    /// Shell command that writes one JPEG frame to `{output}`.
    pub command: String,
    /// Device for the user-facing camera.
    pub front_device: String,
    /// Device for the environment-facing camera.
    pub rear_device: String,
    /// Seconds before a capture is abandoned.
    pub timeout_secs: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            command: "fswebcam --no-banner -q -r 1280x720 -d {device} --jpeg 80 {output}".to_string(),
            front_device: "/dev/video0".to_string(),
            rear_device: "/dev/video0".to_string(),
            timeout_secs: 15,
        }
    }
}

// ─────────────────────────────────────────────
// Voice
// ─────────────────────────────────────────────

/// Recording + transcription settings for the voice collector.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceConfig {
    /// Shell command that records audio to `{output}` until killed.
    pub record_command: String,
    /// Recognition language (BCP-47, e.g. `"en-US"`).
    pub language: String,
    /// Transcription API key. Empty falls back to the OpenAI chat key.
    pub api_key: String,
    /// OpenAI-compatible transcription endpoint.
    pub transcription_url: String,
    /// Transcription model.
    pub model: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            record_command: "arecord -q -f S16_LE -r 16000 -c 1 {output}".to_string(),
            language: "en-US".to_string(),
            api_key: String::new(),
            transcription_url: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            model: "whisper-1".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert!(config.api_key.is_empty());
        assert!(!config.api_config().is_configured());
        assert_eq!(config.voice.language, "en-US");
        assert!(config.camera.command.contains("{output}"));
    }

    #[test]
    fn test_minimal_record_deserializes() {
        let config: Config =
            serde_json::from_str(r#"{"provider":"gemini","apiKey":"k"}"#).unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.api_key, "k");
        assert_eq!(config.providers, ProvidersConfig::default());
    }

    #[test]
    fn test_set_api_config_trims_key() {
        let mut config = Config::default();
        config.set_api_config(&ApiConfig::new(ProviderKind::Gemini, "  abc  "));
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.api_key, "abc");
    }

    #[test]
    fn test_transcription_key_fallback() {
        let mut config = Config::default();
        assert_eq!(config.transcription_key(), None);

        config.api_key = "sk-chat".into();
        assert_eq!(config.transcription_key(), Some("sk-chat"));

        config.provider = ProviderKind::Gemini;
        assert_eq!(config.transcription_key(), None);

        config.voice.api_key = "sk-voice".into();
        assert_eq!(config.transcription_key(), Some("sk-voice"));
    }

    #[test]
    fn test_provider_settings_skip_unset_fields() {
        let json = serde_json::to_value(ProviderSettings {
            model: Some("gpt-4o-mini".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert!(json.get("apiBase").is_none());
        assert!(json.get("maxTokens").is_none());
    }
}

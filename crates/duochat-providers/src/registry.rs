//! Provider registry — static specs for the two supported LLM providers.
//!
//! Each `ProviderSpec` carries the defaults used when the config leaves a
//! field unset: API base, model, token limit, and where to get a key.

use duochat_core::config::ProviderSettings;
use duochat_core::types::ProviderKind;

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    /// Internal name (e.g. `"openai"`), matches config keys.
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"OpenAI (GPT-4o)"`.
    pub display_name: &'static str,
    /// API base URL without trailing slash.
    pub default_api_base: &'static str,
    /// Model used when the config has none.
    pub default_model: &'static str,
    /// Token limit sent when the config has none. `None` omits the field.
    pub default_max_tokens: Option<u32>,
    /// Where users obtain an API key (shown by `duochat setup`).
    pub key_url: &'static str,
}

/// Both providers, in the order `setup` lists them.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        kind: ProviderKind::OpenAi,
        name: "openai",
        display_name: "OpenAI",
        default_api_base: "https://api.openai.com/v1",
        default_model: "gpt-4o",
        default_max_tokens: Some(1000),
        key_url: "https://platform.openai.com/api-keys",
    },
    ProviderSpec {
        kind: ProviderKind::Gemini,
        name: "gemini",
        display_name: "Gemini",
        default_api_base: "https://generativelanguage.googleapis.com/v1beta",
        default_model: "gemini-1.5-flash",
        default_max_tokens: None,
        key_url: "https://aistudio.google.com/app/apikey",
    },
];

/// Spec for a provider kind.
pub fn find_by_kind(kind: ProviderKind) -> &'static ProviderSpec {
    match kind {
        ProviderKind::OpenAi => &PROVIDERS[0],
        ProviderKind::Gemini => &PROVIDERS[1],
    }
}

/// Find a provider spec by its config name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    let name = name.to_lowercase();
    PROVIDERS.iter().find(|s| s.name == name)
}

// ─────────────────────────────────────────────
// Endpoint resolution
// ─────────────────────────────────────────────

/// Where and how an adapter sends requests, after config overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub api_base: String,
    pub model: String,
    pub max_tokens: Option<u32>,
}

impl Endpoint {
    /// Join a path onto the API base, tolerating a trailing slash.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Merge user settings over the spec defaults. Blank strings count as unset.
pub fn resolve_endpoint(spec: &ProviderSpec, settings: &ProviderSettings) -> Endpoint {
    let non_blank = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

    Endpoint {
        api_base: non_blank(&settings.api_base).unwrap_or_else(|| spec.default_api_base.to_string()),
        model: non_blank(&settings.model).unwrap_or_else(|| spec.default_model.to_string()),
        max_tokens: settings.max_tokens.or(spec.default_max_tokens),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

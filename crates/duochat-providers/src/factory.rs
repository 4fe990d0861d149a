//! Provider selection — turns an `ApiConfig` into a ready adapter.
//!
//! The conversation calls this once per send with the config it was handed,
//! so a provider or key change takes effect on the next message.

use duochat_core::config::ProvidersConfig;
use duochat_core::types::{ApiConfig, ProviderKind};
use tracing::debug;

use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;
use crate::registry::{find_by_kind, resolve_endpoint};
use crate::traits::ChatProvider;

/// Why a provider could not be built.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no API key configured for {0}; run `duochat setup`")]
    MissingApiKey(ProviderKind),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Build the adapter for `api`, applying per-provider overrides from `settings`.
///
/// A blank key is rejected here, so no request can go out without one.
pub fn create_provider(
    api: &ApiConfig,
    settings: &ProvidersConfig,
) -> Result<Box<dyn ChatProvider>, ProviderError> {
    if !api.is_configured() {
        return Err(ProviderError::MissingApiKey(api.provider));
    }

    let spec = find_by_kind(api.provider);
    let endpoint = resolve_endpoint(spec, settings.get(api.provider));

    debug!(
        provider = spec.display_name,
        model = %endpoint.model,
        api_base = %endpoint.api_base,
        "Creating LLM provider"
    );

    let key = api.api_key.trim();
    Ok(match api.provider {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(key, endpoint)?),
        ProviderKind::Gemini => Box::new(GeminiProvider::new(key, endpoint)?),
    })
}

/// Source of providers for the conversation controller.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, api: &ApiConfig) -> Result<Box<dyn ChatProvider>, ProviderError>;
}

/// Builds real HTTP adapters.
#[derive(Clone, Debug, Default)]
pub struct HttpProviderFactory {
    settings: ProvidersConfig,
}

impl HttpProviderFactory {
    pub fn new(settings: ProvidersConfig) -> Self {
        Self { settings }
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(&self, api: &ApiConfig) -> Result<Box<dyn ChatProvider>, ProviderError> {
        create_provider(api, &self.settings)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

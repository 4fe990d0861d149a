//! HTTP plumbing shared by both adapters: client construction and the
//! send → status → parse pipeline that turns every failure into
//! `ChatResponse::Error`.

use std::time::Duration;

use duochat_core::types::ChatResponse;
use tracing::{debug, error};

use crate::factory::ProviderError;

/// Whole-request timeout for chat calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Build the connection-pooled client each adapter holds.
pub(crate) fn build_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Client(e.to_string()))
}

/// Send one prepared request and interpret the reply.
///
/// `parse` maps a 2xx JSON body to a `ChatResponse`; everything else is
/// handled here.
pub(crate) async fn execute(
    provider: &str,
    request: reqwest::RequestBuilder,
    parse: fn(&serde_json::Value) -> ChatResponse,
) -> ChatResponse {
    let response = match request.send().await {
        Ok(resp) => resp,
        Err(e) => {
            // The URL can carry the API key as a query parameter.
            let e = e.without_url();
            error!(provider, error = %e, "HTTP request failed");
            return ChatResponse::error(format!("Error calling {}: {}", provider, e));
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        error!(provider, status = %status, body = %body, "API error");
        return ChatResponse::error(vendor_error_message(provider, status, &body));
    }

    match response.json::<serde_json::Value>().await {
        Ok(body) => {
            let resp = parse(&body);
            debug!(provider, is_error = resp.is_error(), chars = resp.content().len(), "LLM response received");
            resp
        }
        Err(e) => {
            let e = e.without_url();
            error!(provider, error = %e, "Failed to parse LLM response");
            ChatResponse::error(format!("Error parsing {} response: {}", provider, e))
        }
    }
}

/// Pull `error.message` out of a vendor error body, or describe the status.
pub(crate) fn vendor_error_message(provider: &str, status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(String::from))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("{} API error ({})", provider, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_vendor_error_message_from_body() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            vendor_error_message("OpenAI", StatusCode::UNAUTHORIZED, body),
            "Incorrect API key provided"
        );
    }

    #[test]
    fn test_vendor_error_message_fallback() {
        assert_eq!(
            vendor_error_message("Gemini", StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            "Gemini API error (502 Bad Gateway)"
        );
        assert_eq!(
            vendor_error_message("Gemini", StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": {}}"#),
            "Gemini API error (500 Internal Server Error)"
        );
    }
}

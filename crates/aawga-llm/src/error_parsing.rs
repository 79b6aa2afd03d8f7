//! Mapping of non-success HTTP responses onto [`ProviderError`].
//!
//! OpenAI-compatible servers disagree on the error envelope. Recognized:
//! - Standard: `{"error": {"message": "...", "type": "...", "code": "..."}}`
//! - Detail:   `{"detail": "..."}`
//! - Flat:     `{"message": "...", "code": "..."}`

use serde_json::Value;

use crate::provider::ProviderError;

/// Parsed API error information.
#[derive(Debug)]
pub struct ApiErrorInfo {
    /// Human-readable error message.
    pub message: String,
    /// Provider-specific error code (e.g. `"invalid_api_key"`).
    pub code: Option<String>,
    /// Whether the request can be retried (429 or 5xx).
    pub retryable: bool,
}

/// Parse an error body into structured info, falling back to the raw text.
pub fn parse_api_error(body: &str, status: u16) -> ApiErrorInfo {
    let retryable = status == 429 || status >= 500;
    let fallback = || format!("HTTP {status}: {body}");

    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return ApiErrorInfo {
            message: fallback(),
            code: None,
            retryable,
        };
    };

    let error = &json["error"];
    let (message, code) = if let Some(msg) = error["message"].as_str() {
        let code = error["code"].as_str().or_else(|| error["type"].as_str());
        (msg.to_string(), code)
    } else if let Some(msg) = json["detail"].as_str().or_else(|| json["message"].as_str()) {
        (msg.to_string(), json["code"].as_str())
    } else {
        (fallback(), None)
    };

    ApiErrorInfo {
        message,
        code: code.map(String::from),
        retryable,
    }
}

/// Parse a `Retry-After` header: integer seconds or an HTTP date.
pub fn parse_retry_after(value: &str) -> Option<u64> {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(seconds.saturating_mul(1000));
    }
    let date = chrono::DateTime::parse_from_rfc2822(value.trim()).ok()?;
    let delay_ms = date
        .signed_duration_since(chrono::Utc::now())
        .num_milliseconds();
    Some(u64::try_from(delay_ms).unwrap_or(0))
}

/// Classify a failed response.
///
/// 401/403 become [`ProviderError::Auth`], 429 becomes
/// [`ProviderError::RateLimited`], anything else [`ProviderError::Api`].
pub fn error_for_status(status: u16, body: &str, retry_after: Option<&str>) -> ProviderError {
    let info = parse_api_error(body, status);
    match status {
        401 | 403 => ProviderError::Auth {
            message: info.message,
        },
        429 => ProviderError::RateLimited {
            retry_after_ms: retry_after.and_then(parse_retry_after).unwrap_or(0),
            message: info.message,
        },
        _ => ProviderError::Api {
            status,
            message: info.message,
            code: info.code,
            retryable: info.retryable,
        },
    }
}

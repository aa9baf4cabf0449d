//! Shared plumbing for calling the hosted functions and REST API

use crate::core::error::{ErrorResponse, PaylinkError};
use reqwest::{RequestBuilder, Response};

/// Join a base URL and a path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Attach the bearer token and, when present, the project's public key
pub fn authorize(request: RequestBuilder, access_token: &str, anon_key: Option<&str>) -> RequestBuilder {
    let request = request.bearer_auth(access_token);
    match anon_key {
        Some(key) => request.header("apikey", key),
        None => request,
    }
}

pub fn transport_error(service: &str, err: reqwest::Error) -> PaylinkError {
    tracing::warn!(service, error = %err, "request failed before a response arrived");
    PaylinkError::upstream(service, err)
}

/// Turn a non-success response into an error
///
/// Functions answer `{error: "..."}`; anything else leaves the message empty
/// so the user sees the generic fallback.
pub async fn error_from_response(service: &str, response: Response) -> PaylinkError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .or_else(|_| {
            serde_json::from_str::<serde_json::Value>(&body).map(|v| {
                v.get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string()
            })
        })
        .unwrap_or_default();

    tracing::warn!(service, %status, message = %message, "upstream returned an error");

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return PaylinkError::Unauthorized {
            message: if message.is_empty() {
                "session expired".to_string()
            } else {
                message
            },
        };
    }

    PaylinkError::upstream(service, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://fn.test/", "/mint-payment-token"),
            "https://fn.test/mint-payment-token"
        );
        assert_eq!(join_url("https://fn.test", "rest/v1"), "https://fn.test/rest/v1");
    }
}

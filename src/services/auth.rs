use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderName};
use reqwest::header::{HeaderValue, AUTHORIZATION as OUT_AUTHORIZATION, CONTENT_TYPE};

/// Strip an optional `Bearer ` prefix from an Authorization value
fn normalize_auth_value_to_key(value: &str) -> String {
    value
        .trim()
        .strip_prefix("Bearer ")
        .map(str::trim)
        .unwrap_or(value.trim())
        .to_string()
}

/// Extract the client's API key from `Authorization` or `x-api-key`
pub fn extract_client_key(headers: &HeaderMap) -> Option<String> {
    let x_api_key_header = HeaderName::from_static("x-api-key");
    let raw_x_api_key = headers
        .get(&x_api_key_header)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let raw_authorization = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    raw_authorization
        .as_ref()
        .map(|auth| normalize_auth_value_to_key(auth))
        .or(raw_x_api_key)
}

/// Mask sensitive tokens for logs while keeping useful context
pub fn mask_token(token: &str) -> String {
    if token.len() > 12 {
        format!("{}...{}", &token[..6], &token[token.len() - 4..])
    } else if !token.is_empty() {
        "***".to_string()
    } else {
        "<empty>".into()
    }
}

/// Headers for the forwarded backend request: JSON content type plus bearer
/// auth from the client key, falling back to the configured backend key.
pub fn build_forward_headers(
    client_key: Option<&str>,
    backend_key: Option<&str>,
) -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let key = client_key.or(backend_key);
    if let Some(key) = key {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", key)) {
            headers.insert(OUT_AUTHORIZATION, value);
        }
    } else {
        log::warn!("⚠️  No client key or BACKEND_KEY - backend request may fail auth");
    }
    headers
}

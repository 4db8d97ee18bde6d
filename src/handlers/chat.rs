use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use futures::TryStreamExt;
use std::io;

use crate::models::App;
use crate::services::{build_forward_headers, extract_client_key, mask_token, RequestOptions};

/// Chat-completions passthrough: the raw JSON body goes through the
/// interceptor stack and on to the backend; the backend response streams
/// back unchanged (status and content type preserved, no validation).
pub async fn chat_completions(
    State(app): State<App>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, (StatusCode, &'static str)> {
    let client_key = extract_client_key(&headers);
    if let Some(key) = &client_key {
        log::debug!("🔑 Forwarding client key {}", mask_token(key));
    }

    let options = RequestOptions {
        headers: build_forward_headers(client_key.as_deref(), app.backend_key.as_deref()),
        body: Some(body),
    };

    let res = app
        .sender
        .send(&app.backend_url, options)
        .await
        .map_err(|e| {
            log::error!("❌ Backend request failed: {}", e);
            (StatusCode::BAD_GATEWAY, "backend_request_failed")
        })?;

    let status = res.status();
    let content_type = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .cloned();

    log::info!("✅ Backend responded {}", status);

    let mut builder = Response::builder().status(status.as_u16());
    if let Some(ct) = content_type {
        builder = builder.header(axum::http::header::CONTENT_TYPE, ct);
    }
    builder
        .body(Body::from_stream(res.bytes_stream().map_err(io::Error::other)))
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "response_build_failed"))
}

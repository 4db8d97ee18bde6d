use axum::{
    routing::{get, post},
    Router,
};
use log::{info, warn};
use std::{env, sync::Arc, time::Duration};

mod constants;
mod handlers;
mod models;
mod services;
mod utils;

use constants::{DEFAULT_BACKEND_TIMEOUT_SECS, DEFAULT_PROMPT_DIR, MAX_BODY_SIZE};
use handlers::{chat_completions, health_check};
use models::{App, ProviderOptions};
use services::{FsPromptStore, HttpSender, InstructionInterceptor, InterceptConfig};

fn provider_options_from_env() -> ProviderOptions {
    match env::var("PROVIDER_OPTIONS") {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(options) => options,
            Err(e) => {
                warn!("⚠️  Ignoring unparseable PROVIDER_OPTIONS: {}", e);
                ProviderOptions::default()
            }
        },
        Err(_) => ProviderOptions::default(),
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let backend_url = env::var("BACKEND_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8000/v1/chat/completions".into());
    let backend_key = env::var("BACKEND_KEY").ok();
    let backend_timeout_secs = env::var("BACKEND_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);
    let prompt_dir = env::var("PROMPT_DIR").unwrap_or_else(|_| DEFAULT_PROMPT_DIR.into());

    let provider_options = provider_options_from_env();
    let config = InterceptConfig::from_provider_options(&provider_options);

    info!("🚀 Instruction-injecting proxy starting...");
    info!("   Backend URL: {}", backend_url);
    info!(
        "   Backend Key: {}",
        if backend_key.is_some() { "Set (fallback)" } else { "Not set" }
    );
    info!("   Backend Timeout: {}s", backend_timeout_secs);
    info!(
        "   Instruction Injection: {}",
        if config.add_instruction { "Enabled" } else { "Disabled" }
    );
    info!("   Prompt Dir: {}", prompt_dir);

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(1024)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(backend_timeout_secs))
        .build()
        .unwrap();

    // Explicit sender stack: interceptor wraps the terminal HTTP sender
    let sender = InstructionInterceptor::new(
        HttpSender::new(client),
        config,
        FsPromptStore::new(prompt_dir.clone()),
    );

    let app = App {
        sender: Arc::new(sender),
        backend_url,
        backend_key,
        add_instruction: config.add_instruction,
        prompt_dir,
    };

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/v1/chat/completions", post(chat_completions))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(tower_http::compression::CompressionLayer::new())
        .with_state(app);

    let port = env::var("HOST_PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse::<u16>()
        .unwrap_or(8080);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();
    info!("   Listening on: 0.0.0.0:{}", port);
    axum::serve(listener, router).await.unwrap();
}

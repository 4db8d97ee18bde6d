use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::constants::DEFAULT_INSTRUCTIONS;
use crate::models::ProviderOptions;
use crate::services::prompt_store::PromptStore;
use crate::services::resolver::InstructionResolver;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Transport settings carried alongside a request body.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// The request-sending primitive: `(target, options) -> Response`.
///
/// `HttpSender` is the terminal implementation; decorators like
/// [`InstructionInterceptor`] wrap another sender and implement the same
/// trait, so the stack is composed explicitly at startup instead of
/// patching any global.
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(&self, target: &str, options: RequestOptions) -> Result<reqwest::Response, BoxError>;
}

/// Terminal sender: POSTs the body to the target URL over a shared client.
pub struct HttpSender {
    client: reqwest::Client,
}

impl HttpSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RequestSender for HttpSender {
    async fn send(&self, target: &str, options: RequestOptions) -> Result<reqwest::Response, BoxError> {
        let mut req = self.client.post(target).headers(options.headers);
        if let Some(body) = options.body {
            req = req.body(body);
        }
        Ok(req.send().await?)
    }
}

/// Per-instance interception settings (no process-wide flag).
#[derive(Clone, Copy, Debug, Default)]
pub struct InterceptConfig {
    pub add_instruction: bool,
}

impl InterceptConfig {
    /// Enable injection iff the provider options carry `addInstruction`
    /// as exactly boolean `true`.
    pub fn from_provider_options(options: &ProviderOptions) -> Self {
        Self {
            add_instruction: options.instruction_injection_enabled(),
        }
    }
}

/// Decorator that rewrites chat-completion request bodies before sending.
///
/// With injection disabled, or for any body that is absent, unparseable or
/// not a JSON object, the call is forwarded untouched (fail-open). Otherwise
/// the body is mutated per the policy:
/// - models whose lowercased name contains `gpt` get `max_output_tokens`
///   and `max_tokens` removed;
/// - a non-empty prompt-file text for the model overwrites `instructions`;
/// - absent that, the caller's own non-empty `instructions` are kept, and
///   the built-in default fills the gap.
pub struct InstructionInterceptor<S, P> {
    inner: S,
    config: InterceptConfig,
    resolver: InstructionResolver<P>,
}

impl<S, P: PromptStore> InstructionInterceptor<S, P> {
    pub fn new(inner: S, config: InterceptConfig, store: P) -> Self {
        Self {
            inner,
            config,
            resolver: InstructionResolver::new(store),
        }
    }

    /// Apply the mutation policy to a serialized body. `None` means the
    /// body should be forwarded as-is.
    async fn rewrite_body(&self, body: &str) -> Result<Option<String>, BoxError> {
        let parsed: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(_) => return Ok(None),
        };
        let Value::Object(mut obj) = parsed else {
            return Ok(None);
        };

        let model = obj
            .get("model")
            .and_then(|m| m.as_str())
            .unwrap_or("")
            .to_string();

        // gpt* backends reject explicit token limits on this endpoint
        if model.to_lowercase().contains("gpt") {
            obj.remove("max_output_tokens");
            obj.remove("max_tokens");
        }

        let file_instructions = self.resolver.resolve(&model).await?;
        match file_instructions {
            Some(text) if !text.trim().is_empty() => {
                obj.insert("instructions".into(), Value::String(text));
            }
            _ => {
                let has_existing = obj
                    .get("instructions")
                    .and_then(|v| v.as_str())
                    .is_some_and(|s| !s.trim().is_empty());
                if !has_existing {
                    obj.insert("instructions".into(), Value::String(DEFAULT_INSTRUCTIONS.into()));
                }
            }
        }

        Ok(Some(Value::Object(obj).to_string()))
    }
}

#[async_trait]
impl<S: RequestSender, P: PromptStore> RequestSender for InstructionInterceptor<S, P> {
    async fn send(&self, target: &str, options: RequestOptions) -> Result<reqwest::Response, BoxError> {
        if !self.config.add_instruction {
            return self.inner.send(target, options).await;
        }

        let Some(body) = options.body.as_deref() else {
            return self.inner.send(target, options).await;
        };

        match self.rewrite_body(body).await? {
            Some(new_body) => {
                let forwarded = RequestOptions {
                    headers: options.headers,
                    body: Some(new_body),
                };
                self.inner.send(target, forwarded).await
            }
            None => self.inner.send(target, options).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Sender that records what it was asked to forward.
    #[derive(Default)]
    struct RecordingSender {
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl RecordingSender {
        fn last_body(&self) -> Option<String> {
            self.calls.lock().unwrap().last().and_then(|(_, b)| b.clone())
        }

        fn last_json(&self) -> Value {
            serde_json::from_str(&self.last_body().unwrap()).unwrap()
        }
    }

    #[async_trait]
    impl RequestSender for Arc<RecordingSender> {
        async fn send(&self, target: &str, options: RequestOptions) -> Result<reqwest::Response, BoxError> {
            self.calls
                .lock()
                .unwrap()
                .push((target.to_string(), options.body));
            Ok(reqwest::Response::from(axum::http::Response::new("ok".to_string())))
        }
    }

    struct MemoryStore {
        files: HashMap<String, String>,
    }

    impl MemoryStore {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }

        fn empty() -> Self {
            Self::new(&[])
        }
    }

    #[async_trait]
    impl PromptStore for MemoryStore {
        async fn load(&self, name: &str) -> io::Result<String> {
            self.files
                .get(name)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))
        }
    }

    fn enabled() -> InterceptConfig {
        InterceptConfig { add_instruction: true }
    }

    fn options_with(body: &str) -> RequestOptions {
        RequestOptions {
            headers: HeaderMap::new(),
            body: Some(body.to_string()),
        }
    }

    const TARGET: &str = "http://backend/v1/chat/completions";

    #[tokio::test]
    async fn disabled_flag_forwards_body_byte_identical() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor = InstructionInterceptor::new(
            sender.clone(),
            InterceptConfig { add_instruction: false },
            MemoryStore::new(&[("gpt-4o_prompt.md", "never applied")]),
        );

        let body = r#"{"model":"gpt-4o","max_tokens":100}"#;
        interceptor.send(TARGET, options_with(body)).await.unwrap();

        assert_eq!(sender.last_body().as_deref(), Some(body));
    }

    #[tokio::test]
    async fn missing_body_forwards_unchanged() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor =
            InstructionInterceptor::new(sender.clone(), enabled(), MemoryStore::empty());

        interceptor
            .send(TARGET, RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(sender.last_body(), None);
    }

    #[tokio::test]
    async fn unparseable_body_forwards_unchanged_without_error() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor =
            InstructionInterceptor::new(sender.clone(), enabled(), MemoryStore::empty());

        interceptor
            .send(TARGET, options_with("{not json"))
            .await
            .unwrap();

        assert_eq!(sender.last_body().as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn non_object_body_forwards_unchanged() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor =
            InstructionInterceptor::new(sender.clone(), enabled(), MemoryStore::empty());

        interceptor
            .send(TARGET, options_with(r#"[1,2,3]"#))
            .await
            .unwrap();

        assert_eq!(sender.last_body().as_deref(), Some(r#"[1,2,3]"#));
    }

    #[tokio::test]
    async fn gpt_models_lose_token_limit_fields() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor =
            InstructionInterceptor::new(sender.clone(), enabled(), MemoryStore::empty());

        let body = r#"{"model":"gpt-4o","max_tokens":100,"max_output_tokens":200}"#;
        interceptor.send(TARGET, options_with(body)).await.unwrap();

        let forwarded = sender.last_json();
        assert!(forwarded.get("max_tokens").is_none());
        assert!(forwarded.get("max_output_tokens").is_none());
    }

    #[tokio::test]
    async fn non_gpt_models_keep_token_limits() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor =
            InstructionInterceptor::new(sender.clone(), enabled(), MemoryStore::empty());

        let body = r#"{"model":"claude-3","max_tokens":100}"#;
        interceptor.send(TARGET, options_with(body)).await.unwrap();

        assert_eq!(sender.last_json()["max_tokens"], 100);
    }

    #[tokio::test]
    async fn prompt_file_text_is_injected() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor = InstructionInterceptor::new(
            sender.clone(),
            enabled(),
            MemoryStore::new(&[("my-model_prompt.md", "Custom instructions")]),
        );

        let body = r#"{"model":"My-Model"}"#;
        interceptor.send(TARGET, options_with(body)).await.unwrap();

        assert_eq!(sender.last_json()["instructions"], "Custom instructions");
    }

    #[tokio::test]
    async fn prompt_file_text_overrides_caller_instructions() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor = InstructionInterceptor::new(
            sender.clone(),
            enabled(),
            MemoryStore::new(&[("my-model_prompt.md", "Custom instructions")]),
        );

        let body = r#"{"model":"my-model","instructions":"Keep mine"}"#;
        interceptor.send(TARGET, options_with(body)).await.unwrap();

        assert_eq!(sender.last_json()["instructions"], "Custom instructions");
    }

    #[tokio::test]
    async fn caller_instructions_survive_when_no_prompt_file_exists() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor =
            InstructionInterceptor::new(sender.clone(), enabled(), MemoryStore::empty());

        let body = r#"{"model":"claude-3","instructions":"Keep mine"}"#;
        interceptor.send(TARGET, options_with(body)).await.unwrap();

        assert_eq!(sender.last_json()["instructions"], "Keep mine");
    }

    #[tokio::test]
    async fn default_instructions_fill_the_gap() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor =
            InstructionInterceptor::new(sender.clone(), enabled(), MemoryStore::empty());

        let body = r#"{"model":"claude-3"}"#;
        interceptor.send(TARGET, options_with(body)).await.unwrap();

        assert_eq!(sender.last_json()["instructions"], DEFAULT_INSTRUCTIONS);
    }

    #[tokio::test]
    async fn whitespace_only_prompt_file_falls_back_to_caller() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor = InstructionInterceptor::new(
            sender.clone(),
            enabled(),
            MemoryStore::new(&[("my-model_prompt.md", "   \n")]),
        );

        let body = r#"{"model":"my-model","instructions":"Keep mine"}"#;
        interceptor.send(TARGET, options_with(body)).await.unwrap();

        assert_eq!(sender.last_json()["instructions"], "Keep mine");
    }

    #[tokio::test]
    async fn absent_model_gets_default_instructions() {
        let sender = Arc::new(RecordingSender::default());
        let interceptor =
            InstructionInterceptor::new(sender.clone(), enabled(), MemoryStore::empty());

        interceptor
            .send(TARGET, options_with(r#"{"messages":[]}"#))
            .await
            .unwrap();

        assert_eq!(sender.last_json()["instructions"], DEFAULT_INSTRUCTIONS);
    }
}

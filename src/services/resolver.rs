use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::constants::PROMPT_FILE_SUFFIX;
use crate::services::prompt_store::PromptStore;
use crate::utils::{to_safe_filename_key, to_underscore_key};

/// Maps a model identifier to its prompt-file instructions, if any.
///
/// Results are memoized per lowercased-trimmed identifier for the life of the
/// process, including the "no prompt file exists" outcome, so each distinct
/// model name hits the store at most once. The cache is a plain value map
/// under an `RwLock`; two concurrent first lookups for the same name may both
/// load, which is harmless since they store the same value.
pub struct InstructionResolver<S> {
    store: S,
    cache: Arc<RwLock<HashMap<String, Option<String>>>>,
}

impl<S: PromptStore> InstructionResolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Candidate prompt file names for a lowercased model identifier,
    /// most specific first. The underscore variant is skipped when it
    /// coincides with the filename-safe one.
    fn candidate_names(model_lower: &str) -> Vec<String> {
        let safe_key = to_safe_filename_key(model_lower);
        let underscore_key = to_underscore_key(model_lower);

        let mut candidates = Vec::with_capacity(2);
        if !safe_key.is_empty() {
            candidates.push(format!("{}{}", safe_key, PROMPT_FILE_SUFFIX));
        }
        if !underscore_key.is_empty() && underscore_key != safe_key {
            candidates.push(format!("{}{}", underscore_key, PROMPT_FILE_SUFFIX));
        }
        candidates
    }

    /// Resolve instructions for `model`.
    ///
    /// Returns `Ok(None)` when the identifier is empty or no prompt file
    /// matches any candidate name. Missing files fall through to the next
    /// candidate; any other store error propagates without being cached.
    pub async fn resolve(&self, model: &str) -> io::Result<Option<String>> {
        let model_lower = model.trim().to_lowercase();
        if model_lower.is_empty() {
            return Ok(None);
        }

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&model_lower) {
                return Ok(cached.clone());
            }
        }

        for name in Self::candidate_names(&model_lower) {
            match self.store.load(&name).await {
                Ok(text) => {
                    log::debug!("📄 Loaded instructions for {} from {}", model_lower, name);
                    let mut cache = self.cache.write().await;
                    cache.insert(model_lower, Some(text.clone()));
                    return Ok(Some(text));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }

        let mut cache = self.cache.write().await;
        cache.insert(model_lower, None);
        Ok(None)
    }
}

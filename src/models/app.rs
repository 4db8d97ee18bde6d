use std::sync::Arc;

use crate::services::RequestSender;

// ---------- App with the composed sender stack ----------

#[derive(Clone)]
pub struct App {
    /// Interceptor-wrapped sender; handlers never talk to the client directly
    pub sender: Arc<dyn RequestSender>,
    pub backend_url: String,
    pub backend_key: Option<String>,
    /// Surfaced by /health so a misconfigured flag is visible at a glance
    pub add_instruction: bool,
    pub prompt_dir: String,
}

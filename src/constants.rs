/// Application-wide constants
///
/// This module centralizes the fixed values used throughout the proxy:
/// the prompt-file naming convention, the built-in fallback instructions,
/// and request size limits.

// ============================================================================
// Prompt Resources
// ============================================================================

/// Suffix appended to a normalized model key to form a prompt file name,
/// e.g. `gpt-4o` -> `gpt-4o_prompt.md`
pub const PROMPT_FILE_SUFFIX: &str = "_prompt.md";

/// Directory searched for prompt files when PROMPT_DIR is not set
pub const DEFAULT_PROMPT_DIR: &str = "prompts";

/// Fallback instructions injected when no prompt file matches the model
/// and the caller did not supply its own non-empty `instructions` field
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful coding assistant.
- Be concise and direct.
- Follow the user's requirements; ask one clarifying question if needed.
- Don't guess or fabricate details.
- Prefer minimal, safe changes.
- Don't commit or push unless explicitly asked.
- Reply in plain text.";

// ============================================================================
// Request Limits
// ============================================================================

/// Maximum accepted request body size (10MB)
/// Chat-completion payloads with inline images can get large
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

// ============================================================================
// Backend Defaults
// ============================================================================

/// Default end-to-end timeout for a forwarded backend request
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 600;

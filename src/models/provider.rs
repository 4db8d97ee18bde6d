use serde::Deserialize;
use serde_json::Value;

/// Options block of a provider configuration entry.
///
/// `addInstruction` is kept as a raw JSON value: injection is enabled only
/// by an exact boolean `true`. Truthy strings, numbers or null are treated
/// as disabled rather than rejected, so a misconfigured block degrades to
/// the pass-through behavior.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderOptions {
    #[serde(rename = "addInstruction")]
    pub add_instruction: Value,
}

impl ProviderOptions {
    pub fn instruction_injection_enabled(&self) -> bool {
        self.add_instruction == Value::Bool(true)
    }
}

pub mod chat;
pub mod health;

pub use chat::chat_completions;
pub use health::health_check;

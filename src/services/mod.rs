pub mod auth;
pub mod interceptor;
pub mod prompt_store;
pub mod resolver;

pub use auth::*;
pub use interceptor::*;
pub use prompt_store::*;
pub use resolver::*;

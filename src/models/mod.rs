pub mod app;
pub mod provider;

pub use app::*;
pub use provider::*;

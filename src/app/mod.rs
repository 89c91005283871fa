//! Application layer containing business logic and shared state.

pub mod service;
pub mod state;

pub use service::{DirectoryService, SAFE_APPS_CACHE_TTL};
pub use state::AppState;

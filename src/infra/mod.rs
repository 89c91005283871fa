//! Infrastructure layer implementations.

pub mod cache;
pub mod database;
pub mod observability;

pub use cache::{SharedCache, cache_key};
pub use database::{PostgresClient, PostgresConfig};
pub use observability::{PrometheusHandle, init_metrics, init_metrics_handle};

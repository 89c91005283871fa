//! Chain Config Service
//!
//! A read-mostly directory service exposing reference data about
//! blockchain networks ("chains") and the third-party web applications
//! ("safe apps") available on them, via a paginated, filterable HTTP API.
//!
//! # Architecture Overview
//!
//! This crate is organized into four main layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   API Layer                  │
//! │   HTTP handlers, routing, rate limiting      │
//! ├─────────────────────────────────────────────┤
//! │               Application Layer              │
//! │   Directory service, response cache, state   │
//! ├─────────────────────────────────────────────┤
//! │                 Domain Layer                 │
//! │  Entities, query model, validation, traits   │
//! ├─────────────────────────────────────────────┤
//! │             Infrastructure Layer             │
//! │  PostgreSQL adapter, cache region, metrics   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Key Features
//!
//! - **Trait-based abstraction**: the persistence store sits behind
//!   repository traits, so handlers and service logic never see sqlx
//! - **Dependency injection**: components receive their dependencies
//!   through constructors; tests swap in in-memory mocks
//! - **Pre-write validation**: hex colors, semver strings and the gas
//!   price exclusivity invariant reject writes with field-level errors
//! - **Response caching**: the safe-apps listing is served from a named
//!   10-minute TTL cache region keyed by the request query parameters
//! - **Error handling**: hierarchical error types mapped to structured
//!   HTTP error bodies
//! - **Logging**: structured logging with `tracing`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use chain_config_service::api::create_router;
//! use chain_config_service::app::AppState;
//! use chain_config_service::infra::PostgresClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(PostgresClient::with_defaults(&database_url).await?);
//!
//!     let state = Arc::new(AppState::new(
//!         store.clone(),
//!         store.clone(),
//!         store.clone(),
//!         store.clone(),
//!     ));
//!
//!     let router = create_router(state);
//!     axum::serve(listener, router).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

// Reusable mocks and fixtures, shared with the black-box tests
pub mod test_utils;

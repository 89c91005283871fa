//! Application state management.
//!
//! Shared state accessible to all request handlers via Axum's State
//! extractor. All contained types are `Arc`-wrapped and `Send + Sync`.

use std::sync::Arc;

use crate::domain::{ChainRepository, FeatureRepository, SafeAppRepository, WalletRepository};
use crate::infra::PrometheusHandle;

use super::service::DirectoryService;

/// Shared application state for the Axum web server.
#[derive(Clone)]
pub struct AppState {
    /// The directory service containing the read logic and the
    /// safe-apps cache region.
    pub service: Arc<DirectoryService>,

    /// Chain repository, also used for readiness checks.
    pub chain_repo: Arc<dyn ChainRepository>,

    /// Prometheus handle rendered at GET /metrics, when installed.
    pub metrics: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    /// Creates a new `AppState`, wiring the service to the provided
    /// repositories.
    #[must_use]
    pub fn new(
        chain_repo: Arc<dyn ChainRepository>,
        safe_app_repo: Arc<dyn SafeAppRepository>,
        wallet_repo: Arc<dyn WalletRepository>,
        feature_repo: Arc<dyn FeatureRepository>,
    ) -> Self {
        let service = Arc::new(DirectoryService::new(
            Arc::clone(&chain_repo),
            safe_app_repo,
            wallet_repo,
            feature_repo,
        ));

        Self {
            service,
            chain_repo,
            metrics: None,
        }
    }

    /// Attaches a metrics handle for the /metrics endpoint.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<PrometheusHandle>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

//! Application service layer.
//!
//! Orchestrates the repositories and the safe-apps response cache behind
//! the read endpoints. All methods are independent, stateless reads; the
//! cache region is the only shared mutable state.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::domain::{
    AppError, Chain, ChainId, ChainOrdering, ChainRepository, Feature, FeatureRepository,
    HealthResponse, HealthStatus, PageRequest, SafeAppFilter, SafeAppRepository, SafeAppResponse,
    Wallet, WalletRepository,
};
use crate::infra::cache::{SharedCache, cache_key};

/// How long safe-apps responses stay cached. Entries are never invalidated
/// on data change; staleness up to this window is accepted.
pub const SAFE_APPS_CACHE_TTL: Duration = Duration::from_secs(60 * 10);

/// Directory service backing the read API.
///
/// Holds trait objects for all repositories, enabling dependency injection
/// and mock-backed tests, plus the dedicated `safe-apps` cache region.
pub struct DirectoryService {
    chain_repo: Arc<dyn ChainRepository>,
    safe_app_repo: Arc<dyn SafeAppRepository>,
    wallet_repo: Arc<dyn WalletRepository>,
    feature_repo: Arc<dyn FeatureRepository>,
    safe_apps_cache: SharedCache,
}

impl DirectoryService {
    #[must_use]
    pub fn new(
        chain_repo: Arc<dyn ChainRepository>,
        safe_app_repo: Arc<dyn SafeAppRepository>,
        wallet_repo: Arc<dyn WalletRepository>,
        feature_repo: Arc<dyn FeatureRepository>,
    ) -> Self {
        Self {
            chain_repo,
            safe_app_repo,
            wallet_repo,
            feature_repo,
            // a region of its own so its sizing/eviction is tunable
            // independently of any other caching
            safe_apps_cache: SharedCache::new("safe-apps"),
        }
    }

    /// The safe-apps cache region (exposed for tests and diagnostics).
    #[must_use]
    pub fn safe_apps_cache(&self) -> &SharedCache {
        &self.safe_apps_cache
    }

    /// One page of chains plus the total count for the pagination envelope.
    #[instrument(skip(self))]
    pub async fn list_chains(
        &self,
        ordering: &ChainOrdering,
        page: &PageRequest,
    ) -> Result<(u64, Vec<Chain>), AppError> {
        let count = self.chain_repo.count_chains().await?;
        let chains = self.chain_repo.list_chains(ordering, page).await?;
        Ok((count, chains))
    }

    #[instrument(skip(self))]
    pub async fn chain_by_id(&self, id: ChainId) -> Result<Chain, AppError> {
        self.chain_repo
            .chain_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("chain {id}")))
    }

    /// Case-sensitive lookup by the unique EIP-3770 short name.
    #[instrument(skip(self))]
    pub async fn chain_by_short_name(&self, short_name: &str) -> Result<Chain, AppError> {
        self.chain_repo
            .chain_by_short_name(short_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("chain with short name {short_name:?}")))
    }

    /// All visible safe apps, optionally narrowed to one chain, served
    /// through the 10-minute cache region.
    ///
    /// The cache key derives from the full raw query string, so distinct
    /// `chainId` values cache independently. Concurrent misses on the same
    /// key may each hit the store; the last write wins.
    #[instrument(skip(self))]
    pub async fn safe_apps(
        &self,
        raw_query: Option<&str>,
        chain_id_param: Option<&str>,
    ) -> Result<serde_json::Value, AppError> {
        let key = cache_key(raw_query);

        if let Some(cached) = self.safe_apps_cache.get(&key).await {
            counter!("safe_apps_cache_hits_total").increment(1);
            debug!(key = %key, "safe apps served from cache");
            return Ok(cached);
        }
        counter!("safe_apps_cache_misses_total").increment(1);

        let filter = SafeAppFilter::from_param(chain_id_param);
        let apps = self.safe_app_repo.visible_safe_apps(&filter).await?;
        let responses: Vec<SafeAppResponse> =
            apps.into_iter().map(SafeAppResponse::from).collect();

        let payload = serde_json::to_value(responses)?;
        self.safe_apps_cache
            .set_ex(&key, &payload, SAFE_APPS_CACHE_TTL)
            .await?;

        Ok(payload)
    }

    /// Wallets NOT enabled on the given chain: the set difference of all
    /// wallets minus the chain's enabled wallets, computed by the store.
    #[instrument(skip(self))]
    pub async fn disabled_wallets(&self, chain_id: ChainId) -> Result<Vec<Wallet>, AppError> {
        self.wallet_repo.wallets_disabled_on(chain_id).await
    }

    /// Features enabled on the given chain.
    #[instrument(skip(self))]
    pub async fn chain_features(&self, chain_id: ChainId) -> Result<Vec<Feature>, AppError> {
        self.feature_repo.features_enabled_on(chain_id).await
    }

    /// Health of the backing store.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthResponse {
        let database = match self.chain_repo.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = ?e, "Database health check failed");
                HealthStatus::Unhealthy
            }
        };
        HealthResponse::new(database)
    }
}

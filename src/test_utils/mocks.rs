//! Mock implementations for testing.
//!
//! In-memory implementations of the repository traits that can be
//! configured to simulate success, failure, and unhealthy-store scenarios.
//! Query semantics (ordering, filtering, set difference) reuse the same
//! domain constructs as the relational adapter, so behavior stays aligned.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use validator::Validate;

use crate::domain::{
    AppError, Chain, ChainId, ChainOrdering, ChainRepository, DatabaseError, Feature,
    FeatureRepository, GasPrice, GasPriceRecord, PageRequest, SafeApp, SafeAppFilter,
    SafeAppRepository, Wallet, WalletRepository,
};

/// Configuration for mock behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// If true, operations will fail.
    pub should_fail: bool,
    /// Custom error message for failures.
    pub error_message: Option<String>,
}

impl MockConfig {
    /// Creates a config that always succeeds.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// Creates a config that always fails.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }

    fn check(&self) -> Result<(), AppError> {
        if self.should_fail {
            let msg = self
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock store error".to_string());
            return Err(AppError::Database(DatabaseError::Query(msg)));
        }
        Ok(())
    }
}

/// Mock chain repository backed by a `Vec`.
pub struct MockChainRepository {
    chains: Mutex<Vec<Chain>>,
    gas_prices: Mutex<Vec<GasPrice>>,
    config: MockConfig,
    call_count: AtomicU64,
    is_healthy: AtomicBool,
}

impl MockChainRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            chains: Mutex::new(Vec::new()),
            gas_prices: Mutex::new(Vec::new()),
            config,
            call_count: AtomicU64::new(0),
            is_healthy: AtomicBool::new(true),
        }
    }

    /// Creates a mock that always fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Seeds a chain directly, bypassing write validation.
    pub fn add_chain(&self, chain: Chain) {
        self.chains.lock().unwrap().push(chain);
    }

    /// Gets the number of times any method was called.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Sets the health status.
    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.chains.lock().unwrap().clear();
        self.gas_prices.lock().unwrap().clear();
    }

    fn tick(&self) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for MockChainRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainRepository for MockChainRepository {
    async fn health_check(&self) -> Result<(), AppError> {
        self.tick();
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Mock store unhealthy".to_string(),
            )));
        }
        self.config.check()
    }

    async fn count_chains(&self) -> Result<u64, AppError> {
        self.tick();
        self.config.check()?;
        Ok(self.chains.lock().unwrap().len() as u64)
    }

    async fn list_chains(
        &self,
        ordering: &ChainOrdering,
        page: &PageRequest,
    ) -> Result<Vec<Chain>, AppError> {
        self.tick();
        self.config.check()?;

        let mut chains = self.chains.lock().unwrap().clone();
        ordering.sort(&mut chains);
        Ok(chains
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn chain_by_id(&self, id: ChainId) -> Result<Option<Chain>, AppError> {
        self.tick();
        self.config.check()?;
        Ok(self
            .chains
            .lock()
            .unwrap()
            .iter()
            .find(|chain| chain.id == id)
            .cloned())
    }

    async fn chain_by_short_name(&self, short_name: &str) -> Result<Option<Chain>, AppError> {
        self.tick();
        self.config.check()?;
        Ok(self
            .chains
            .lock()
            .unwrap()
            .iter()
            .find(|chain| chain.short_name == short_name)
            .cloned())
    }

    async fn insert_chain(&self, chain: &Chain) -> Result<(), AppError> {
        self.tick();
        self.config.check()?;
        chain.validate().map_err(AppError::from)?;

        let mut chains = self.chains.lock().unwrap();
        if chains
            .iter()
            .any(|existing| existing.id == chain.id || existing.short_name == chain.short_name)
        {
            return Err(AppError::Database(DatabaseError::Duplicate(format!(
                "chain {} / {}",
                chain.id, chain.short_name
            ))));
        }
        chains.push(chain.clone());
        Ok(())
    }

    async fn gas_prices(&self, chain_id: ChainId) -> Result<Vec<GasPrice>, AppError> {
        self.tick();
        self.config.check()?;
        let mut prices: Vec<GasPrice> = self
            .gas_prices
            .lock()
            .unwrap()
            .iter()
            .filter(|price| price.chain_id == chain_id)
            .cloned()
            .collect();
        prices.sort_by_key(|price| price.rank);
        Ok(prices)
    }

    async fn insert_gas_price(&self, record: &GasPriceRecord) -> Result<GasPrice, AppError> {
        self.tick();
        self.config.check()?;
        let gas_price = GasPrice::try_from(record.clone()).map_err(AppError::from)?;
        self.gas_prices.lock().unwrap().push(gas_price.clone());
        Ok(gas_price)
    }
}

/// Mock safe app repository backed by a `Vec`.
pub struct MockSafeAppRepository {
    apps: Mutex<Vec<SafeApp>>,
    config: MockConfig,
    call_count: AtomicU64,
}

impl MockSafeAppRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            apps: Mutex::new(Vec::new()),
            config,
            call_count: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Seeds an app directly, bypassing write validation.
    pub fn add_app(&self, app: SafeApp) {
        self.apps.lock().unwrap().push(app);
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.apps.lock().unwrap().clear();
    }
}

impl Default for MockSafeAppRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SafeAppRepository for MockSafeAppRepository {
    async fn visible_safe_apps(&self, filter: &SafeAppFilter) -> Result<Vec<SafeApp>, AppError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.config.check()?;
        Ok(self
            .apps
            .lock()
            .unwrap()
            .iter()
            .filter(|app| app.visible && filter.matches(app))
            .cloned()
            .collect())
    }

    async fn insert_safe_app(&self, app: &SafeApp) -> Result<SafeApp, AppError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.config.check()?;
        app.validate().map_err(AppError::from)?;

        let mut apps = self.apps.lock().unwrap();
        let mut stored = app.clone();
        if stored.id == 0 {
            stored.id = apps.len() as i64 + 1;
        }
        apps.push(stored.clone());
        Ok(stored)
    }
}

/// Mock wallet repository: each wallet carries the set of chains it is
/// enabled on.
pub struct MockWalletRepository {
    wallets: Mutex<Vec<(Wallet, HashSet<ChainId>)>>,
    config: MockConfig,
}

impl MockWalletRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            wallets: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Seeds a wallet enabled on the given chains.
    pub fn add_wallet(&self, key: &str, chains: &[ChainId]) {
        self.wallets.lock().unwrap().push((
            Wallet {
                key: key.to_string(),
            },
            chains.iter().copied().collect(),
        ));
    }

    fn collect_sorted(&self, predicate: impl Fn(&HashSet<ChainId>) -> bool) -> Vec<Wallet> {
        let mut wallets: Vec<Wallet> = self
            .wallets
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, chains)| predicate(chains))
            .map(|(wallet, _)| wallet.clone())
            .collect();
        wallets.sort();
        wallets
    }
}

impl Default for MockWalletRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletRepository for MockWalletRepository {
    async fn all_wallets(&self) -> Result<Vec<Wallet>, AppError> {
        self.config.check()?;
        Ok(self.collect_sorted(|_| true))
    }

    async fn wallets_enabled_on(&self, chain_id: ChainId) -> Result<Vec<Wallet>, AppError> {
        self.config.check()?;
        Ok(self.collect_sorted(|chains| chains.contains(&chain_id)))
    }

    async fn wallets_disabled_on(&self, chain_id: ChainId) -> Result<Vec<Wallet>, AppError> {
        self.config.check()?;
        Ok(self.collect_sorted(|chains| !chains.contains(&chain_id)))
    }

    async fn insert_wallet(&self, wallet: &Wallet, chains: &[ChainId]) -> Result<(), AppError> {
        self.config.check()?;
        let mut wallets = self.wallets.lock().unwrap();
        if wallets.iter().any(|(existing, _)| existing.key == wallet.key) {
            return Err(AppError::Database(DatabaseError::Duplicate(
                wallet.key.clone(),
            )));
        }
        wallets.push((wallet.clone(), chains.iter().copied().collect()));
        Ok(())
    }
}

/// Mock feature repository, a structural twin of [`MockWalletRepository`].
pub struct MockFeatureRepository {
    features: Mutex<Vec<(Feature, HashSet<ChainId>)>>,
    config: MockConfig,
}

impl MockFeatureRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            features: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Seeds a feature enabled on the given chains.
    pub fn add_feature(&self, key: &str, chains: &[ChainId]) {
        self.features.lock().unwrap().push((
            Feature {
                key: key.to_string(),
            },
            chains.iter().copied().collect(),
        ));
    }
}

impl Default for MockFeatureRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeatureRepository for MockFeatureRepository {
    async fn features_enabled_on(&self, chain_id: ChainId) -> Result<Vec<Feature>, AppError> {
        self.config.check()?;
        let mut features: Vec<Feature> = self
            .features
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, chains)| chains.contains(&chain_id))
            .map(|(feature, _)| feature.clone())
            .collect();
        features.sort();
        Ok(features)
    }

    async fn insert_feature(&self, feature: &Feature, chains: &[ChainId]) -> Result<(), AppError> {
        self.config.check()?;
        let mut features = self.features.lock().unwrap();
        if features
            .iter()
            .any(|(existing, _)| existing.key == feature.key)
        {
            return Err(AppError::Database(DatabaseError::Duplicate(
                feature.key.clone(),
            )));
        }
        features.push((feature.clone(), chains.iter().copied().collect()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::U256;

    use super::*;
    use crate::test_utils::fixtures;

    #[tokio::test]
    async fn test_mock_chain_insert_and_get() {
        let mock = MockChainRepository::new();
        mock.insert_chain(&fixtures::chain(1, 100, "Ethereum"))
            .await
            .unwrap();

        let fetched = mock.chain_by_id(1).await.unwrap();
        assert_eq!(fetched.unwrap().name, "Ethereum");
        assert!(mock.chain_by_id(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_chain_insert_rejects_invalid() {
        let mock = MockChainRepository::new();
        let mut chain = fixtures::chain(1, 100, "Ethereum");
        chain.theme.background_color = "black".to_string();

        let err = mock.insert_chain(&chain).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(mock.count_chains().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mock_chain_insert_rejects_duplicate_short_name() {
        let mock = MockChainRepository::new();
        mock.insert_chain(&fixtures::chain(1, 100, "Eth"))
            .await
            .unwrap();

        let duplicate = fixtures::chain(2, 100, "Eth");
        let err = mock.insert_chain(&duplicate).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Database(DatabaseError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_chain_failure_mode() {
        let mock = MockChainRepository::failing("connection reset");
        let err = mock.count_chains().await.unwrap_err();
        assert!(matches!(err, AppError::Database(DatabaseError::Query(_))));
    }

    #[tokio::test]
    async fn test_mock_chain_call_count() {
        let mock = MockChainRepository::new();
        assert_eq!(mock.call_count(), 0);

        let _ = mock.health_check().await;
        let _ = mock.count_chains().await;
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_gas_prices_ranked() {
        let mock = MockChainRepository::new();
        mock.insert_gas_price(
            &GasPriceRecord::oracle(1, "https://oracle.example", "fast").with_rank(50),
        )
        .await
        .unwrap();
        mock.insert_gas_price(&GasPriceRecord::fixed(1, U256::from(7u64)).with_rank(10))
            .await
            .unwrap();

        let prices = mock.gas_prices(1).await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].rank, 10);
    }

    #[tokio::test]
    async fn test_mock_gas_price_insert_rejects_invalid() {
        let mock = MockChainRepository::new();
        let record =
            GasPriceRecord::oracle(1, "https://oracle.example", "fast")
                .with_fixed_wei_value(U256::one());

        let err = mock.insert_gas_price(&record).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(mock.gas_prices(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_safe_apps_visibility_and_filter() {
        let mock = MockSafeAppRepository::new();
        mock.add_app(fixtures::safe_app(1, "A", &[1, 4], true));
        mock.add_app(fixtures::safe_app(2, "B", &[4], true));
        mock.add_app(fixtures::safe_app(3, "C", &[4], false));

        let all = mock.visible_safe_apps(&SafeAppFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);

        let on_four = mock
            .visible_safe_apps(&SafeAppFilter::from_param(Some("4")))
            .await
            .unwrap();
        assert_eq!(on_four.len(), 2);

        let on_one = mock
            .visible_safe_apps(&SafeAppFilter::from_param(Some("1")))
            .await
            .unwrap();
        assert_eq!(on_one.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_safe_app_insert_assigns_id_and_validates() {
        let mock = MockSafeAppRepository::new();

        let mut app = fixtures::safe_app(0, "Swap", &[1], true);
        let stored = mock.insert_safe_app(&app).await.unwrap();
        assert_eq!(stored.id, 1);

        app.url = "not a url".to_string();
        let err = mock.insert_safe_app(&app).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_mock_wallets_set_difference() {
        let mock = MockWalletRepository::new();
        mock.add_wallet("metamask", &[1]);
        mock.add_wallet("ledger", &[1, 4]);
        mock.add_wallet("trezor", &[4]);

        let disabled = mock.wallets_disabled_on(1).await.unwrap();
        let keys: Vec<&str> = disabled.iter().map(|w| w.key.as_str()).collect();
        assert_eq!(keys, vec!["trezor"]);

        let enabled = mock.wallets_enabled_on(1).await.unwrap();
        assert_eq!(enabled.len() + disabled.len(), mock.all_wallets().await.unwrap().len());
    }

    #[tokio::test]
    async fn test_mock_wallet_duplicate_key() {
        let mock = MockWalletRepository::new();
        let wallet = Wallet {
            key: "metamask".to_string(),
        };
        mock.insert_wallet(&wallet, &[1]).await.unwrap();

        let err = mock.insert_wallet(&wallet, &[4]).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Database(DatabaseError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_features_enabled_on() {
        let mock = MockFeatureRepository::new();
        mock.add_feature("eip1559", &[1, 4]);
        mock.add_feature("delegates", &[4]);

        let on_one = mock.features_enabled_on(1).await.unwrap();
        assert_eq!(on_one.len(), 1);
        assert_eq!(on_one[0].key, "eip1559");
    }

    #[tokio::test]
    async fn test_mock_feature_duplicate_key() {
        let mock = MockFeatureRepository::new();
        let feature = Feature {
            key: "eip1559".to_string(),
        };
        mock.insert_feature(&feature, &[1]).await.unwrap();

        let err = mock.insert_feature(&feature, &[4]).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Database(DatabaseError::Duplicate(_))
        ));
    }
}

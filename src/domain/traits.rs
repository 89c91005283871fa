//! Domain traits defining contracts for the persistence store.

use async_trait::async_trait;

use super::error::AppError;
use super::query::{ChainOrdering, PageRequest, SafeAppFilter};
use super::types::{Chain, ChainId, Feature, GasPrice, GasPriceRecord, SafeApp, Wallet};

/// Read/write access to chains and their ranked gas prices.
///
/// Write methods exist for the out-of-band admin tooling and the test
/// suite; none of them is reachable through the HTTP surface. Every write
/// runs the pre-persistence validation and rejects with field-level errors.
#[async_trait]
pub trait ChainRepository: Send + Sync {
    /// Check store connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Total number of chains, for the pagination envelope
    async fn count_chains(&self) -> Result<u64, AppError>;

    /// One page of chains in the given order
    async fn list_chains(
        &self,
        ordering: &ChainOrdering,
        page: &PageRequest,
    ) -> Result<Vec<Chain>, AppError>;

    /// Exact match on the numeric primary key
    async fn chain_by_id(&self, id: ChainId) -> Result<Option<Chain>, AppError>;

    /// Exact, case-sensitive match on the unique EIP-3770 short name
    async fn chain_by_short_name(&self, short_name: &str) -> Result<Option<Chain>, AppError>;

    /// Validated insert of a chain descriptor
    async fn insert_chain(&self, chain: &Chain) -> Result<(), AppError>;

    /// Gas prices of a chain, best rank first
    async fn gas_prices(&self, chain_id: ChainId) -> Result<Vec<GasPrice>, AppError>;

    /// Validated insert of a gas price row
    async fn insert_gas_price(&self, record: &GasPriceRecord) -> Result<GasPrice, AppError>;
}

/// Read/write access to the safe app catalog.
#[async_trait]
pub trait SafeAppRepository: Send + Sync {
    /// All visible safe apps matching the filter
    async fn visible_safe_apps(&self, filter: &SafeAppFilter) -> Result<Vec<SafeApp>, AppError>;

    /// Validated insert, returning the stored app with its assigned id
    async fn insert_safe_app(&self, app: &SafeApp) -> Result<SafeApp, AppError>;
}

/// Wallet enablement per chain.
///
/// `wallets_disabled_on` is derived as the set difference of all wallets
/// minus the chain's enabled wallets; implementations backed by a
/// relational store must push the difference down to the store instead of
/// materializing both sides.
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn all_wallets(&self) -> Result<Vec<Wallet>, AppError>;

    async fn wallets_enabled_on(&self, chain_id: ChainId) -> Result<Vec<Wallet>, AppError>;

    async fn wallets_disabled_on(&self, chain_id: ChainId) -> Result<Vec<Wallet>, AppError>;

    async fn insert_wallet(&self, wallet: &Wallet, chains: &[ChainId]) -> Result<(), AppError>;
}

/// Feature enablement per chain. Structurally a twin of
/// [`WalletRepository`] but without any derived set.
#[async_trait]
pub trait FeatureRepository: Send + Sync {
    async fn features_enabled_on(&self, chain_id: ChainId) -> Result<Vec<Feature>, AppError>;

    async fn insert_feature(&self, feature: &Feature, chains: &[ChainId]) -> Result<(), AppError>;
}

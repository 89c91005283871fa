//! PostgreSQL persistence adapter.

use async_trait::async_trait;
use ethers::types::U256;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::{
    AppError, Chain, ChainId, ChainOrdering, ChainRepository, DatabaseError, Feature,
    FeatureRepository, GasPrice, GasPriceRecord, PageRequest, SafeApp, SafeAppFilter,
    SafeAppProvider, SafeAppRepository, Wallet, WalletRepository,
    types::{BlockExplorerUriTemplate, NativeCurrency, RpcAuthentication, RpcEndpoint, Theme},
};

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// PostgreSQL client with connection pooling, implementing every
/// repository trait of the domain layer.
pub struct PostgresClient {
    pool: PgPool,
}

const CHAIN_COLUMNS: &str = r#"
    id, relevance, name, short_name, description, l2,
    rpc_authentication, rpc_uri,
    safe_apps_rpc_authentication, safe_apps_rpc_uri,
    public_rpc_authentication, public_rpc_uri,
    block_explorer_uri_address_template, block_explorer_uri_tx_hash_template,
    block_explorer_uri_api_template,
    currency_name, currency_symbol, currency_decimals, currency_logo_uri,
    transaction_service_uri, vpc_transaction_service_uri,
    theme_text_color, theme_background_color,
    ens_registry_address, recommended_master_copy_version
"#;

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client with default configuration
    pub async fn with_defaults(database_url: &str) -> Result<Self, AppError> {
        Self::new(database_url, PostgresConfig::default()).await
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying connection pool (for testing)
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_chain(row: &sqlx::postgres::PgRow) -> Chain {
        let rpc_authentication: String = row.get("rpc_authentication");
        let safe_apps_rpc_authentication: String = row.get("safe_apps_rpc_authentication");
        let public_rpc_authentication: String = row.get("public_rpc_authentication");
        let ens_registry_address: Option<String> = row.get("ens_registry_address");

        Chain {
            id: row.get("id"),
            relevance: row.get("relevance"),
            name: row.get("name"),
            short_name: row.get("short_name"),
            description: row.get("description"),
            l2: row.get("l2"),
            rpc: RpcEndpoint {
                authentication: rpc_authentication
                    .parse()
                    .unwrap_or(RpcAuthentication::NoAuthentication),
                uri: row.get("rpc_uri"),
            },
            safe_apps_rpc: RpcEndpoint {
                authentication: safe_apps_rpc_authentication
                    .parse()
                    .unwrap_or(RpcAuthentication::NoAuthentication),
                uri: row.get("safe_apps_rpc_uri"),
            },
            public_rpc: RpcEndpoint {
                authentication: public_rpc_authentication
                    .parse()
                    .unwrap_or(RpcAuthentication::NoAuthentication),
                uri: row.get("public_rpc_uri"),
            },
            block_explorer_uri_template: BlockExplorerUriTemplate {
                address: row.get("block_explorer_uri_address_template"),
                tx_hash: row.get("block_explorer_uri_tx_hash_template"),
                api: row.get("block_explorer_uri_api_template"),
            },
            native_currency: NativeCurrency {
                name: row.get("currency_name"),
                symbol: row.get("currency_symbol"),
                decimals: row.get("currency_decimals"),
                logo_uri: row.get("currency_logo_uri"),
            },
            transaction_service_uri: row.get("transaction_service_uri"),
            vpc_transaction_service_uri: row.get("vpc_transaction_service_uri"),
            theme: Theme {
                text_color: row.get("theme_text_color"),
                background_color: row.get("theme_background_color"),
            },
            ens_registry_address: ens_registry_address.and_then(|value| value.parse().ok()),
            recommended_master_copy_version: row.get("recommended_master_copy_version"),
        }
    }

    fn row_to_gas_price(row: &sqlx::postgres::PgRow) -> Result<GasPrice, AppError> {
        let fixed_wei_value: Option<String> = row.get("fixed_wei_value");
        let fixed_wei_value = fixed_wei_value
            .map(|value| U256::from_dec_str(&value))
            .transpose()
            .map_err(|e| AppError::Internal(format!("stored wei value out of range: {e}")))?;
        let gwei_factor: Decimal = row.get("gwei_factor");

        let record = GasPriceRecord {
            chain_id: row.get("chain_id"),
            oracle_uri: row.get("oracle_uri"),
            oracle_parameter: row.get("oracle_parameter"),
            gwei_factor,
            fixed_wei_value,
            rank: row.get("rank"),
        };
        GasPrice::try_from(record)
            .map_err(|errors| AppError::Internal(format!("stored gas price inconsistent: {errors}")))
    }

    fn row_to_safe_app(row: &sqlx::postgres::PgRow) -> SafeApp {
        let provider_url: Option<String> = row.get("provider_url");
        let provider_name: Option<String> = row.get("provider_name");
        let provider = match (provider_url, provider_name) {
            (Some(url), Some(name)) => Some(SafeAppProvider { url, name }),
            _ => None,
        };

        SafeApp {
            id: row.get("id"),
            url: row.get("url"),
            name: row.get("name"),
            icon_url: row.get("icon_url"),
            description: row.get("description"),
            chain_ids: row.get("chain_ids"),
            provider,
            visible: row.get("visible"),
        }
    }
}

#[async_trait]
impl ChainRepository for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_chains(&self) -> Result<u64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM chains")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.get("count");
        Ok(count as u64)
    }

    #[instrument(skip(self))]
    async fn list_chains(
        &self,
        ordering: &ChainOrdering,
        page: &PageRequest,
    ) -> Result<Vec<Chain>, AppError> {
        // ordering renders from a field whitelist, never from raw input
        let query = format!(
            "SELECT {CHAIN_COLUMNS} FROM chains ORDER BY {} LIMIT $1 OFFSET $2",
            ordering.to_sql()
        );
        let rows = sqlx::query(&query)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(Self::row_to_chain).collect())
    }

    #[instrument(skip(self))]
    async fn chain_by_id(&self, id: ChainId) -> Result<Option<Chain>, AppError> {
        let query = format!("SELECT {CHAIN_COLUMNS} FROM chains WHERE id = $1");
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(Self::row_to_chain))
    }

    #[instrument(skip(self))]
    async fn chain_by_short_name(&self, short_name: &str) -> Result<Option<Chain>, AppError> {
        let query = format!("SELECT {CHAIN_COLUMNS} FROM chains WHERE short_name = $1");
        let row = sqlx::query(&query)
            .bind(short_name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::row_to_chain))
    }

    #[instrument(skip(self, chain), fields(chain_id = chain.id))]
    async fn insert_chain(&self, chain: &Chain) -> Result<(), AppError> {
        chain.validate().map_err(AppError::from)?;

        sqlx::query(
            r#"
            INSERT INTO chains (
                id, relevance, name, short_name, description, l2,
                rpc_authentication, rpc_uri,
                safe_apps_rpc_authentication, safe_apps_rpc_uri,
                public_rpc_authentication, public_rpc_uri,
                block_explorer_uri_address_template, block_explorer_uri_tx_hash_template,
                block_explorer_uri_api_template,
                currency_name, currency_symbol, currency_decimals, currency_logo_uri,
                transaction_service_uri, vpc_transaction_service_uri,
                theme_text_color, theme_background_color,
                ens_registry_address, recommended_master_copy_version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)
            "#,
        )
        .bind(chain.id)
        .bind(chain.relevance)
        .bind(&chain.name)
        .bind(&chain.short_name)
        .bind(&chain.description)
        .bind(chain.l2)
        .bind(chain.rpc.authentication.as_str())
        .bind(&chain.rpc.uri)
        .bind(chain.safe_apps_rpc.authentication.as_str())
        .bind(&chain.safe_apps_rpc.uri)
        .bind(chain.public_rpc.authentication.as_str())
        .bind(&chain.public_rpc.uri)
        .bind(&chain.block_explorer_uri_template.address)
        .bind(&chain.block_explorer_uri_template.tx_hash)
        .bind(&chain.block_explorer_uri_template.api)
        .bind(&chain.native_currency.name)
        .bind(&chain.native_currency.symbol)
        .bind(chain.native_currency.decimals)
        .bind(&chain.native_currency.logo_uri)
        .bind(&chain.transaction_service_uri)
        .bind(&chain.vpc_transaction_service_uri)
        .bind(&chain.theme.text_color)
        .bind(&chain.theme.background_color)
        // Debug formatting yields the full 0x-prefixed hex; Display elides
        .bind(chain.ens_registry_address.map(|address| format!("{address:?}")))
        .bind(&chain.recommended_master_copy_version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn gas_prices(&self, chain_id: ChainId) -> Result<Vec<GasPrice>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT chain_id, oracle_uri, oracle_parameter, gwei_factor,
                   fixed_wei_value::text AS fixed_wei_value, rank
            FROM gas_prices
            WHERE chain_id = $1
            ORDER BY rank ASC, id ASC
            "#,
        )
        .bind(chain_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_gas_price).collect()
    }

    #[instrument(skip(self, record), fields(chain_id = record.chain_id))]
    async fn insert_gas_price(&self, record: &GasPriceRecord) -> Result<GasPrice, AppError> {
        record.validate().map_err(AppError::from)?;

        sqlx::query(
            r#"
            INSERT INTO gas_prices
                (chain_id, oracle_uri, oracle_parameter, gwei_factor, fixed_wei_value, rank)
            VALUES ($1, $2, $3, $4, $5::numeric, $6)
            "#,
        )
        .bind(record.chain_id)
        .bind(&record.oracle_uri)
        .bind(&record.oracle_parameter)
        .bind(record.gwei_factor)
        .bind(record.fixed_wei_value.map(|value| value.to_string()))
        .bind(record.rank)
        .execute(&self.pool)
        .await?;

        GasPrice::try_from(record.clone()).map_err(AppError::from)
    }
}

#[async_trait]
impl SafeAppRepository for PostgresClient {
    #[instrument(skip(self))]
    async fn visible_safe_apps(&self, filter: &SafeAppFilter) -> Result<Vec<SafeApp>, AppError> {
        const COLUMNS: &str = "id, url, name, icon_url, description, chain_ids, \
                               provider_url, provider_name, visible";

        let rows = match filter.chain_id_text() {
            // chain ids are compared as text, exactly as they arrive in the query string
            Some(chain_id) => {
                let query = format!(
                    r#"
                    SELECT {COLUMNS} FROM safe_apps
                    WHERE visible = TRUE
                      AND EXISTS (
                        SELECT 1 FROM unnest(chain_ids) AS cid WHERE cid::text = $1
                      )
                    ORDER BY id
                    "#
                );
                sqlx::query(&query)
                    .bind(chain_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query =
                    format!("SELECT {COLUMNS} FROM safe_apps WHERE visible = TRUE ORDER BY id");
                sqlx::query(&query).fetch_all(&self.pool).await?
            }
        };

        Ok(rows.iter().map(Self::row_to_safe_app).collect())
    }

    #[instrument(skip(self, app), fields(app_name = %app.name))]
    async fn insert_safe_app(&self, app: &SafeApp) -> Result<SafeApp, AppError> {
        app.validate().map_err(AppError::from)?;

        let row = sqlx::query(
            r#"
            INSERT INTO safe_apps
                (url, name, icon_url, description, chain_ids, provider_url, provider_name, visible)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&app.url)
        .bind(&app.name)
        .bind(&app.icon_url)
        .bind(&app.description)
        .bind(&app.chain_ids)
        .bind(app.provider.as_ref().map(|p| p.url.clone()))
        .bind(app.provider.as_ref().map(|p| p.name.clone()))
        .bind(app.visible)
        .fetch_one(&self.pool)
        .await?;

        let mut stored = app.clone();
        stored.id = row.get("id");
        Ok(stored)
    }
}

#[async_trait]
impl WalletRepository for PostgresClient {
    #[instrument(skip(self))]
    async fn all_wallets(&self) -> Result<Vec<Wallet>, AppError> {
        let rows = sqlx::query("SELECT key FROM wallets ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Wallet { key: row.get("key") })
            .collect())
    }

    #[instrument(skip(self))]
    async fn wallets_enabled_on(&self, chain_id: ChainId) -> Result<Vec<Wallet>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT w.key FROM wallets w
            JOIN wallet_chains wc ON wc.wallet_id = w.id
            WHERE wc.chain_id = $1
            ORDER BY w.key
            "#,
        )
        .bind(chain_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Wallet { key: row.get("key") })
            .collect())
    }

    /// Set difference pushed down to the store; neither side is loaded
    /// into memory.
    #[instrument(skip(self))]
    async fn wallets_disabled_on(&self, chain_id: ChainId) -> Result<Vec<Wallet>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT key FROM wallets
            EXCEPT
            SELECT w.key FROM wallets w
            JOIN wallet_chains wc ON wc.wallet_id = w.id
            WHERE wc.chain_id = $1
            ORDER BY key
            "#,
        )
        .bind(chain_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Wallet { key: row.get("key") })
            .collect())
    }

    #[instrument(skip(self, wallet), fields(wallet_key = %wallet.key))]
    async fn insert_wallet(&self, wallet: &Wallet, chains: &[ChainId]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("INSERT INTO wallets (key) VALUES ($1) RETURNING id")
            .bind(&wallet.key)
            .fetch_one(&mut *tx)
            .await?;
        let wallet_id: i64 = row.get("id");

        for chain_id in chains {
            sqlx::query("INSERT INTO wallet_chains (wallet_id, chain_id) VALUES ($1, $2)")
                .bind(wallet_id)
                .bind(chain_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl FeatureRepository for PostgresClient {
    #[instrument(skip(self))]
    async fn features_enabled_on(&self, chain_id: ChainId) -> Result<Vec<Feature>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT f.key FROM features f
            JOIN feature_chains fc ON fc.feature_id = f.id
            WHERE fc.chain_id = $1
            ORDER BY f.key
            "#,
        )
        .bind(chain_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Feature { key: row.get("key") })
            .collect())
    }

    #[instrument(skip(self, feature), fields(feature_key = %feature.key))]
    async fn insert_feature(&self, feature: &Feature, chains: &[ChainId]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("INSERT INTO features (key) VALUES ($1) RETURNING id")
            .bind(&feature.key)
            .fetch_one(&mut *tx)
            .await?;
        let feature_id: i64 = row.get("id");

        for chain_id in chains {
            sqlx::query("INSERT INTO feature_chains (feature_id, chain_id) VALUES ($1, $2)")
                .bind(feature_id)
                .bind(chain_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

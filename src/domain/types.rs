//! Core domain entities of the configuration directory.
//!
//! Chains and their satellite records (gas prices, wallet/feature
//! enablement) are owned by the relational store and read-only from the
//! API's perspective; the types here double as the serialized response
//! shapes (camelCase on the wire).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation::{self, FieldErrors};

/// Canonical numeric chain id (EIP-155), also the primary key.
pub type ChainId = i64;

/// Authentication mode of an RPC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcAuthentication {
    ApiKeyPath,
    NoAuthentication,
}

impl RpcAuthentication {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcAuthentication::ApiKeyPath => "API_KEY_PATH",
            RpcAuthentication::NoAuthentication => "NO_AUTHENTICATION",
        }
    }
}

impl FromStr for RpcAuthentication {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "API_KEY_PATH" => Ok(RpcAuthentication::ApiKeyPath),
            "NO_AUTHENTICATION" => Ok(RpcAuthentication::NoAuthentication),
            other => Err(format!("unknown rpc authentication mode: {other}")),
        }
    }
}

/// An RPC endpoint group: where to reach the chain and how requests
/// authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RpcEndpoint {
    pub authentication: RpcAuthentication,
    #[validate(url(message = "Enter a valid URL"))]
    pub uri: String,
}

/// Block explorer URL templates; `{{address}}`, `{{txHash}}` and API query
/// placeholders are substituted by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlockExplorerUriTemplate {
    #[validate(url(message = "Enter a valid URL"))]
    pub address: String,
    #[validate(url(message = "Enter a valid URL"))]
    pub tx_hash: String,
    #[validate(url(message = "Enter a valid URL"))]
    pub api: String,
}

/// Native currency descriptor of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub symbol: String,
    pub decimals: i32,
    /// Storage path of the currency logo, derived via
    /// [`native_currency_logo_path`].
    pub logo_uri: String,
}

/// Theme colors used by clients when rendering the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[validate(custom(function = validation::hex_color))]
    pub text_color: String,
    #[validate(custom(function = validation::hex_color))]
    pub background_color: String,
}

/// A blockchain network descriptor.
///
/// `relevance` is the primary sort key of the list endpoint (lower sorts
/// first); `short_name` is the globally unique EIP-3770 prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub id: ChainId,
    pub relevance: i16,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub short_name: String,
    pub description: String,
    pub l2: bool,
    #[validate(nested)]
    pub rpc: RpcEndpoint,
    #[validate(nested)]
    pub safe_apps_rpc: RpcEndpoint,
    #[validate(nested)]
    pub public_rpc: RpcEndpoint,
    #[validate(nested)]
    pub block_explorer_uri_template: BlockExplorerUriTemplate,
    #[validate(nested)]
    pub native_currency: NativeCurrency,
    #[validate(url(message = "Enter a valid URL"))]
    pub transaction_service_uri: String,
    #[validate(url(message = "Enter a valid URL"))]
    pub vpc_transaction_service_uri: String,
    #[validate(nested)]
    pub theme: Theme,
    pub ens_registry_address: Option<Address>,
    #[validate(custom(function = validation::sem_ver))]
    pub recommended_master_copy_version: String,
}

/// Deterministic storage path for a chain's currency logo, keyed by chain
/// id and keeping the uploaded file's extension.
#[must_use]
pub fn native_currency_logo_path(chain_id: ChainId, original_filename: &str) -> String {
    let extension = std::path::Path::new(original_filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    format!("chains/{chain_id}/currency_logo{extension}")
}

/// Where a gas price comes from.
///
/// The tagged representation makes the illegal states (both an oracle and
/// a fixed value, or neither) unrepresentable after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GasPriceSource {
    Oracle {
        uri: String,
        parameter: String,
        /// Multiplier converting the oracle's output to the base gas unit.
        gwei_factor: Decimal,
    },
    Fixed {
        wei_value: U256,
    },
}

/// A gas price entry for a chain. A chain may have several, ranked; lower
/// rank is preferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    pub chain_id: ChainId,
    pub rank: i16,
    pub source: GasPriceSource,
}

/// Row-shaped gas price as supplied by admin tooling and stored in the
/// database: two nullable source columns whose consistency is enforced by
/// [`validation::validate_gas_price`] before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPriceRecord {
    pub chain_id: ChainId,
    pub oracle_uri: Option<String>,
    pub oracle_parameter: Option<String>,
    pub gwei_factor: Decimal,
    pub fixed_wei_value: Option<U256>,
    pub rank: i16,
}

impl GasPriceRecord {
    pub const DEFAULT_RANK: i16 = 100;

    /// An oracle-backed record with default factor and rank.
    #[must_use]
    pub fn oracle(chain_id: ChainId, uri: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            chain_id,
            oracle_uri: Some(uri.into()),
            oracle_parameter: Some(parameter.into()),
            gwei_factor: Decimal::ONE,
            fixed_wei_value: None,
            rank: Self::DEFAULT_RANK,
        }
    }

    /// A fixed-value record with default rank.
    #[must_use]
    pub fn fixed(chain_id: ChainId, wei_value: U256) -> Self {
        Self {
            chain_id,
            oracle_uri: None,
            oracle_parameter: None,
            gwei_factor: Decimal::ONE,
            fixed_wei_value: None,
            rank: Self::DEFAULT_RANK,
        }
        .with_fixed_wei_value(wei_value)
    }

    #[must_use]
    pub fn with_fixed_wei_value(mut self, wei_value: U256) -> Self {
        self.fixed_wei_value = Some(wei_value);
        self
    }

    #[must_use]
    pub fn with_gwei_factor(mut self, gwei_factor: Decimal) -> Self {
        self.gwei_factor = gwei_factor;
        self
    }

    #[must_use]
    pub fn with_rank(mut self, rank: i16) -> Self {
        self.rank = rank;
        self
    }

    /// Runs the cross-field consistency checks of §gas-price validation.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        validation::validate_gas_price(self)
    }
}

impl TryFrom<GasPriceRecord> for GasPrice {
    type Error = FieldErrors;

    fn try_from(record: GasPriceRecord) -> Result<Self, Self::Error> {
        record.validate()?;
        let source = match (record.oracle_uri, record.fixed_wei_value) {
            (Some(uri), None) => GasPriceSource::Oracle {
                uri,
                // validate() guarantees the parameter is present
                parameter: record.oracle_parameter.unwrap_or_default(),
                gwei_factor: record.gwei_factor,
            },
            (None, Some(wei_value)) => GasPriceSource::Fixed { wei_value },
            // unreachable after validate(), kept total for safety
            _ => {
                let mut errors = FieldErrors::default();
                errors.push("oracle_uri", "inconsistent gas price source");
                return Err(errors);
            }
        };
        Ok(GasPrice {
            chain_id: record.chain_id,
            rank: record.rank,
            source,
        })
    }
}

/// A named wallet integration, related many-to-many to chains.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique name/key identifying this wallet.
    pub key: String,
}

/// A named feature toggle, related many-to-many to chains.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Feature {
    /// Unique name/key identifying this feature.
    pub key: String,
}

/// Optional provider metadata of a safe app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeAppProvider {
    pub url: String,
    pub name: String,
}

/// A third-party web application available on one or more chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SafeApp {
    pub id: i64,
    #[validate(url(message = "Enter a valid URL"))]
    pub url: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub icon_url: String,
    pub description: String,
    pub chain_ids: Vec<ChainId>,
    pub provider: Option<SafeAppProvider>,
    pub visible: bool,
}

/// Serialized form of a safe app; the visibility flag is a filter input,
/// never part of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeAppResponse {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub icon_url: String,
    pub description: String,
    pub chain_ids: Vec<ChainId>,
    pub provider: Option<SafeAppProvider>,
}

impl From<SafeApp> for SafeAppResponse {
    fn from(app: SafeApp) -> Self {
        Self {
            id: app.id,
            url: app.url,
            name: app.name,
            icon_url: app.icon_url,
            description: app.description,
            chain_ids: app.chain_ids,
            provider: app.provider,
        }
    }
}

/// Health check status for services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check response for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub database: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    #[must_use]
    pub fn new(database: HealthStatus) -> Self {
        Self {
            status: database.clone(),
            database,
            timestamp: Utc::now(),
        }
    }
}

/// Error payload detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub r#type: String,
    pub message: String,
}

/// Error response body shared by all endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Rate limit response with a retry hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResponse {
    pub error: ErrorDetail,
    pub retry_after: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_authentication_round_trip() {
        assert_eq!(
            "API_KEY_PATH".parse::<RpcAuthentication>().unwrap(),
            RpcAuthentication::ApiKeyPath
        );
        assert_eq!(
            "NO_AUTHENTICATION".parse::<RpcAuthentication>().unwrap(),
            RpcAuthentication::NoAuthentication
        );
        assert!("BEARER".parse::<RpcAuthentication>().is_err());
        assert_eq!(RpcAuthentication::ApiKeyPath.as_str(), "API_KEY_PATH");
    }

    #[test]
    fn test_native_currency_logo_path() {
        assert_eq!(
            native_currency_logo_path(1, "ether.png"),
            "chains/1/currency_logo.png"
        );
        assert_eq!(
            native_currency_logo_path(100, "upload.v2.jpeg"),
            "chains/100/currency_logo.jpeg"
        );
        assert_eq!(native_currency_logo_path(5, "logo"), "chains/5/currency_logo");
    }

    #[test]
    fn test_gas_price_record_into_oracle_source() {
        let record = GasPriceRecord::oracle(1, "https://oracle.example", "fast")
            .with_gwei_factor(Decimal::new(15, 1))
            .with_rank(10);

        let gas_price = GasPrice::try_from(record).unwrap();
        assert_eq!(gas_price.chain_id, 1);
        assert_eq!(gas_price.rank, 10);
        match gas_price.source {
            GasPriceSource::Oracle {
                uri,
                parameter,
                gwei_factor,
            } => {
                assert_eq!(uri, "https://oracle.example");
                assert_eq!(parameter, "fast");
                assert_eq!(gwei_factor, Decimal::new(15, 1));
            }
            other => panic!("expected oracle source, got {:?}", other),
        }
    }

    #[test]
    fn test_gas_price_record_into_fixed_source() {
        let record = GasPriceRecord::fixed(100, U256::from(24_000_000_000u64));
        let gas_price = GasPrice::try_from(record).unwrap();
        assert_eq!(
            gas_price.source,
            GasPriceSource::Fixed {
                wei_value: U256::from(24_000_000_000u64)
            }
        );
    }

    #[test]
    fn test_gas_price_record_rejects_inconsistent_source() {
        let record = GasPriceRecord::oracle(1, "https://oracle.example", "fast")
            .with_fixed_wei_value(U256::one());
        let errors = GasPrice::try_from(record).unwrap_err();
        assert!(errors.contains_field("oracle_uri"));
        assert!(errors.contains_field("fixed_wei_value"));
    }

    #[test]
    fn test_chain_serializes_camel_case() {
        let chain = crate::test_utils::fixtures::chain(1, 100, "Ethereum");
        let json = serde_json::to_value(&chain).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["shortName"], "ethereum");
        assert!(json["rpc"]["authentication"].is_string());
        assert_eq!(json["rpc"]["authentication"], "API_KEY_PATH");
        assert!(json["blockExplorerUriTemplate"]["txHash"].is_string());
        assert!(json["nativeCurrency"]["logoUri"].is_string());
        assert!(json["theme"]["textColor"].is_string());
        assert!(json["recommendedMasterCopyVersion"].is_string());
        // field spelled out even when null
        assert!(json.as_object().unwrap().contains_key("ensRegistryAddress"));
    }

    #[test]
    fn test_chain_validate_rejects_bad_theme_and_version() {
        let mut chain = crate::test_utils::fixtures::chain(1, 100, "Ethereum");
        chain.theme.text_color = "red".to_string();
        chain.recommended_master_copy_version = "1.02.0".to_string();

        let errors = FieldErrors::from(validator::Validate::validate(&chain).unwrap_err());
        assert!(errors.contains_field("recommended_master_copy_version"));
        assert!(errors.contains_field("theme.text_color"));
    }

    #[test]
    fn test_safe_app_response_drops_visibility() {
        let app = crate::test_utils::fixtures::safe_app(1, "Compound", &[1, 4], true);
        let response = SafeAppResponse::from(app.clone());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["chainIds"], serde_json::json!([1, 4]));
        assert!(json["iconUrl"].is_string());
        assert!(!json.as_object().unwrap().contains_key("visible"));
    }

    #[test]
    fn test_health_response_tracks_database() {
        let healthy = HealthResponse::new(HealthStatus::Healthy);
        assert_eq!(healthy.status, HealthStatus::Healthy);

        let unhealthy = HealthResponse::new(HealthStatus::Unhealthy);
        assert_eq!(unhealthy.status, HealthStatus::Unhealthy);
    }
}

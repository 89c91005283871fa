//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod query;
pub mod traits;
pub mod types;
pub mod validation;

pub use error::{AppError, ConfigError, DatabaseError, ValidationError};
pub use query::{ChainOrderField, ChainOrdering, Direction, PageRequest, Paginated, SafeAppFilter};
pub use traits::{ChainRepository, FeatureRepository, SafeAppRepository, WalletRepository};
pub use types::{
    BlockExplorerUriTemplate, Chain, ChainId, ErrorDetail, ErrorResponse, Feature, GasPrice,
    GasPriceRecord, GasPriceSource, HealthResponse, HealthStatus, NativeCurrency,
    RateLimitResponse, RpcAuthentication, RpcEndpoint, SafeApp, SafeAppProvider, SafeAppResponse,
    Theme, Wallet, native_currency_logo_path,
};
pub use validation::{
    FieldError, FieldErrors, validate_gas_price, validate_hex_color, validate_semver,
};

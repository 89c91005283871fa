//! Ready-made domain records for tests.

use crate::domain::types::{
    BlockExplorerUriTemplate, Chain, ChainId, NativeCurrency, RpcAuthentication, RpcEndpoint,
    SafeApp, Theme, native_currency_logo_path,
};

/// A fully-populated, valid chain. The short name is the lowercased chain
/// name, so lookups can exercise case sensitivity.
#[must_use]
pub fn chain(id: ChainId, relevance: i16, name: &str) -> Chain {
    Chain {
        id,
        relevance,
        name: name.to_string(),
        short_name: name.to_lowercase(),
        description: String::new(),
        l2: false,
        rpc: RpcEndpoint {
            authentication: RpcAuthentication::ApiKeyPath,
            uri: "https://rpc.example/v1/".to_string(),
        },
        safe_apps_rpc: RpcEndpoint {
            authentication: RpcAuthentication::NoAuthentication,
            uri: "https://safe-apps-rpc.example/".to_string(),
        },
        public_rpc: RpcEndpoint {
            authentication: RpcAuthentication::NoAuthentication,
            uri: "https://public-rpc.example/".to_string(),
        },
        block_explorer_uri_template: BlockExplorerUriTemplate {
            address: "https://explorer.example/address/{{address}}".to_string(),
            tx_hash: "https://explorer.example/tx/{{txHash}}".to_string(),
            api: "https://explorer.example/api?module={{module}}&action={{action}}".to_string(),
        },
        native_currency: NativeCurrency {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
            logo_uri: native_currency_logo_path(id, "currency_logo.png"),
        },
        transaction_service_uri: "https://tx-service.example/".to_string(),
        vpc_transaction_service_uri: "https://vpc-tx-service.example/".to_string(),
        theme: Theme {
            text_color: "#ffffff".to_string(),
            background_color: "#000000".to_string(),
        },
        ens_registry_address: None,
        recommended_master_copy_version: "1.3.0".to_string(),
    }
}

/// A safe app with the given chain enablement and visibility.
#[must_use]
pub fn safe_app(id: i64, name: &str, chain_ids: &[ChainId], visible: bool) -> SafeApp {
    SafeApp {
        id,
        url: format!("https://apps.example/{}", name.to_lowercase()),
        name: name.to_string(),
        icon_url: format!("https://apps.example/{}/icon.png", name.to_lowercase()),
        description: format!("{name} app"),
        chain_ids: chain_ids.to_vec(),
        provider: None,
        visible,
    }
}

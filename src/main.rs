use std::env;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chain_config_service::api::{RateLimitConfig, create_router_with_rate_limit};
use chain_config_service::app::AppState;
use chain_config_service::infra::{PostgresClient, init_metrics_handle};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chain_config_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Read required environment variables
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3000);

    // Install the Prometheus recorder before any counter is touched
    let metrics = init_metrics_handle();

    // Connect and migrate
    let postgres = PostgresClient::with_defaults(&database_url).await?;
    postgres.run_migrations().await?;
    let store = Arc::new(postgres);

    // One PostgresClient serves every repository trait
    let mut state = AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }
    let state = Arc::new(state);

    let router = create_router_with_rate_limit(state, RateLimitConfig::from_env());

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Listening on http://{addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

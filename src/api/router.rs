//! HTTP routing configuration with optional per-IP rate limiting.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
};
use governor::{Quota, RateLimiter};
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::app::AppState;
use crate::domain::{ErrorDetail, RateLimitResponse};

use super::handlers::{
    chain_by_id_handler, chain_by_short_name_handler, health_check_handler, list_chains_handler,
    liveness_handler, metrics_handler, readiness_handler, safe_apps_handler,
};

/// Rate limiter configuration for the read endpoints. Health and metrics
/// probes are exempt.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per second per client IP
    pub read_rps: u32,
    /// Burst size per client IP
    pub read_burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            read_rps: 25,
            read_burst: 50,
        }
    }
}

impl RateLimitConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read_rps = std::env::var("RATE_LIMIT_RPS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.read_rps);
        let read_burst = std::env::var("RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.read_burst);

        Self {
            read_rps,
            read_burst,
        }
    }
}

/// A per-IP keyed limiter (prevents one client from starving the rest).
pub struct KeyedLimiter {
    limiter: RateLimiter<
        IpAddr,
        governor::state::keyed::DashMapStateStore<IpAddr>,
        governor::clock::DefaultClock,
    >,
    limit: u32,
}

impl KeyedLimiter {
    #[must_use]
    pub fn new(rps: u32, burst: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(rps.max(1)).unwrap())
            .allow_burst(NonZeroU32::new(burst.max(1)).unwrap());
        Self {
            limiter: RateLimiter::dashmap(quota),
            limit: rps,
        }
    }
}

/// Extract the client IP from proxy headers (client is first in
/// X-Forwarded-For), ConnectInfo, or fall back to 0.0.0.0 so unknown
/// clients share one bucket instead of being blocked.
fn client_ip_from_request<B>(request: &Request<B>) -> IpAddr {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
        && let Ok(ip) = first.trim().parse::<IpAddr>()
    {
        return ip;
    }
    if let Some(real_ip) = request.headers().get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && let Ok(ip) = value.trim().parse::<IpAddr>()
    {
        return ip;
    }
    if let Some(addr) = request.extensions().get::<SocketAddr>() {
        return addr.ip();
    }
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

/// Per-IP rate limit middleware for the read endpoints.
async fn rate_limit_middleware(
    State(limiter): State<Arc<KeyedLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let client_ip = client_ip_from_request(&request);
    match limiter.limiter.check_key(&client_ip) {
        Ok(_) => {
            let mut response = next.run(request).await;
            response.headers_mut().insert(
                "X-RateLimit-Limit",
                limiter.limit.to_string().parse().unwrap(),
            );
            response
        }
        Err(not_until) => {
            let wait_time = not_until.wait_time_from(governor::clock::Clock::now(
                &governor::clock::DefaultClock::default(),
            ));
            let retry_after = wait_time.as_secs();

            let body = RateLimitResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded. Please slow down your requests.".to_string(),
                },
                retry_after,
            };

            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            let headers = response.headers_mut();
            headers.insert(
                "X-RateLimit-Limit",
                limiter.limit.to_string().parse().unwrap(),
            );
            headers.insert("X-RateLimit-Remaining", "0".parse().unwrap());
            headers.insert("Retry-After", retry_after.to_string().parse().unwrap());
            response
        }
    }
}

fn chains_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_chains_handler))
        .route("/{id}", get(chain_by_id_handler))
        .route("/short-name/{short_name}", get(chain_by_short_name_handler))
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check_handler))
        .route("/live", get(liveness_handler))
        .route("/ready", get(readiness_handler))
}

/// Create router without rate limiting
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    Router::new()
        .nest("/chains", chains_routes())
        .route("/safe-apps", get(safe_apps_handler))
        .nest("/health", health_routes())
        .route("/metrics", get(metrics_handler))
        .layer(middleware)
        .with_state(app_state)
}

/// Create router with per-IP rate limiting on the read endpoints
pub fn create_router_with_rate_limit(app_state: Arc<AppState>, config: RateLimitConfig) -> Router {
    let read_limiter = Arc::new(KeyedLimiter::new(config.read_rps, config.read_burst));

    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    let read_routes = Router::new()
        .nest("/chains", chains_routes())
        .route("/safe-apps", get(safe_apps_handler))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&read_limiter),
            rate_limit_middleware,
        ));

    Router::new()
        .merge(read_routes)
        .nest("/health", health_routes())
        .route("/metrics", get(metrics_handler))
        .layer(middleware)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        response::IntoResponse,
        routing::get,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    use super::*;
    use crate::test_utils::mocks::{
        MockChainRepository, MockFeatureRepository, MockSafeAppRepository, MockWalletRepository,
    };

    fn mock_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::new(MockChainRepository::new()),
            Arc::new(MockSafeAppRepository::new()),
            Arc::new(MockWalletRepository::new()),
            Arc::new(MockFeatureRepository::new()),
        ))
    }

    async fn dummy_handler() -> impl IntoResponse {
        StatusCode::OK
    }

    #[test]
    fn test_rate_limit_config_default() {
        let config = RateLimitConfig::default();
        assert_eq!(config.read_rps, 25);
        assert_eq!(config.read_burst, 50);
    }

    #[tokio::test]
    async fn test_rate_limit_middleware_blocks_second_request() {
        let limiter = Arc::new(KeyedLimiter::new(1, 1));
        let app = Router::new()
            .route("/", get(dummy_handler))
            .layer(middleware::from_fn_with_state(
                limiter,
                rate_limit_middleware,
            ));

        let first = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert!(first.headers().contains_key("X-RateLimit-Limit"));

        let second = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("Retry-After"));
        assert_eq!(
            second.headers().get("X-RateLimit-Remaining").unwrap(),
            "0"
        );
    }

    /// One IP exhausting its bucket must not block another.
    #[tokio::test]
    async fn test_rate_limit_is_per_ip() {
        let limiter = Arc::new(KeyedLimiter::new(1, 1));
        let app = Router::new()
            .route("/", get(dummy_handler))
            .layer(middleware::from_fn_with_state(
                limiter,
                rate_limit_middleware,
            ));

        let request = |ip: &str| {
            Request::builder()
                .uri("/")
                .header("X-Forwarded-For", ip)
                .body(Body::empty())
                .unwrap()
        };

        app.clone().oneshot(request("192.168.1.1")).await.unwrap();
        let blocked = app.clone().oneshot(request("192.168.1.1")).await.unwrap();
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

        let other = app.oneshot(request("10.0.0.1")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_router_health_endpoints() {
        let router = create_router(mock_state());

        for uri in ["/health", "/health/live", "/health/ready"] {
            let res = router
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK, "uri: {uri}");
        }
    }

    #[tokio::test]
    async fn test_router_chain_detail_not_found() {
        let router = create_router(mock_state());

        let res = router
            .oneshot(
                Request::builder()
                    .uri("/chains/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_router_metrics_without_recorder() {
        let router = create_router(mock_state());

        let res = router
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rate_limited_router_health_is_exempt() {
        let config = RateLimitConfig {
            read_rps: 1,
            read_burst: 1,
        };
        let router = create_router_with_rate_limit(mock_state(), config);

        // drain the read budget
        router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/chains")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let limited = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/safe-apps")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

        // health probes keep responding
        for _ in 0..5 {
            let res = router
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/health/live")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }
    }
}

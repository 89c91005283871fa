//! HTTP request handlers for the read endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{OriginalUri, Path, Query, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;

use crate::app::AppState;
use crate::domain::{
    AppError, Chain, ChainId, ChainOrdering, DatabaseError, ErrorDetail, ErrorResponse,
    HealthResponse, HealthStatus, PageRequest, Paginated,
};

/// Query parameters of the chain list. All values are parsed leniently:
/// malformed numbers fall back to defaults, unknown ordering fields are
/// dropped.
#[derive(Debug, Deserialize)]
pub struct ListChainsQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub ordering: Option<String>,
}

/// Query parameters of the safe apps list.
#[derive(Debug, Deserialize)]
pub struct SafeAppsQuery {
    #[serde(rename = "chainId")]
    pub chain_id: Option<String>,
}

/// List chains, ordered and paginated.
pub async fn list_chains_handler(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListChainsQuery>,
) -> Result<Json<Paginated<Chain>>, AppError> {
    let ordering = ChainOrdering::parse(params.ordering.as_deref());
    let page = PageRequest::from_query(params.limit.as_deref(), params.offset.as_deref());

    let (count, chains) = state.service.list_chains(&ordering, &page).await?;

    // echo the ordering into the next/previous cursors
    let extra_query: Vec<(&str, String)> = params
        .ordering
        .as_ref()
        .map(|ordering| vec![("ordering", ordering.clone())])
        .unwrap_or_default();

    Ok(Json(Paginated::new(
        count,
        chains,
        &page,
        uri.path(),
        &extra_query,
    )))
}

/// Get a chain by its numeric id.
///
/// A non-numeric path segment can never match a chain, so it maps to the
/// same not-found outcome as a missing row.
pub async fn chain_by_id_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Chain>, AppError> {
    let id: ChainId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("chain {id}")))?;
    let chain = state.service.chain_by_id(id).await?;
    Ok(Json(chain))
}

/// Get a chain by its EIP-3770 short name (case-sensitive).
///
/// Short names may contain characters that need percent-encoding in the
/// path (e.g. whitespace); encoding is the caller's obligation.
pub async fn chain_by_short_name_handler(
    State(state): State<Arc<AppState>>,
    Path(short_name): Path<String>,
) -> Result<Json<Chain>, AppError> {
    let chain = state.service.chain_by_short_name(&short_name).await?;
    Ok(Json(chain))
}

/// List all visible safe apps, optionally filtered by `chainId`.
///
/// Served through the 10-minute response cache; the handler returns the
/// cached JSON payload verbatim, so repeats within the window are
/// byte-identical.
pub async fn safe_apps_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<SafeAppsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let payload = state
        .service
        .safe_apps(raw_query.as_deref(), params.chain_id.as_deref())
        .await?;
    Ok(Json(payload))
}

/// Detailed health check
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes liveness probe
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.service.health_check().await;
    match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Prometheus scrape output, when a recorder is installed.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> axum::response::Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_type, message) = match &self {
            AppError::Database(db_err) => match db_err {
                DatabaseError::Connection(_) | DatabaseError::PoolExhausted(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "database_error",
                    self.to_string(),
                ),
                DatabaseError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "not_found", self.to_string())
                }
                DatabaseError::Duplicate(_) => {
                    (StatusCode::CONFLICT, "duplicate", self.to_string())
                }
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    self.to_string(),
                ),
            },
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                self.to_string(),
            ),
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                self.to_string(),
            ),
            AppError::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "serialization_error",
                self.to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                self.to_string(),
            ),
        };

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound("chain 0".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = AppError::Validation(ValidationError::InvalidFormat("color".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_connection_failure_maps_to_503() {
        let err = AppError::Database(DatabaseError::Connection("refused".to_string()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_duplicate_maps_to_409() {
        let err = AppError::Database(DatabaseError::Duplicate("short_name".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_maps_to_500() {
        let err = AppError::Internal("boom".to_string());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

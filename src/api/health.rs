use axum::{Json, extract::State};
use std::sync::Arc;

use super::context::RequestContext;
use super::error::AppError;
use super::types::HealthDto;
use super::AppState;

/// `GET /api/v1/health`
///
/// Pings the store; a failed ping surfaces as a 500.
pub async fn health(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<HealthDto>, AppError> {
    state.users.ping().await.map_err(|e| ctx.fail(e))?;

    Ok(Json(HealthDto {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}

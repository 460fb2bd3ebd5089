use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    error::{AppError, AppResult},
    models::{find_device, DailyConsumption, Device, MonthToken, DEVICES},
    ranking::{rank_monthly, RankingEntry},
    AppState,
};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/devices", get(list_devices))
        .route("/api/consumption/{device_id}", get(device_history))
        .route("/api/ranking/monthly/{month}", get(monthly_ranking))
}

async fn list_devices() -> Json<&'static [Device]> {
    Json(DEVICES)
}

async fn device_history(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> AppResult<Json<Vec<DailyConsumption>>> {
    // ---
    let device = find_device(&device_id).ok_or_else(|| AppError::NotFound(format!("unknown device {device_id}")))?;

    let records = state.store.list_for_device(device.id).await?;
    debug!("GET /api/consumption/{} - {} records", device.id, records.len());
    Ok(Json(records))
}

#[derive(Debug, Serialize)]
struct RankingResponse {
    month: String,
    ranking: Vec<RankingEntry>,
}

async fn monthly_ranking(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> AppResult<Json<RankingResponse>> {
    // ---
    let month = MonthToken::parse(&month)?;
    let ranking = rank_monthly(&state.store, &month).await?;

    Ok(Json(RankingResponse {
        month: month.prefix(),
        ranking,
    }))
}

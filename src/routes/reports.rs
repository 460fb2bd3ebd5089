//! PDF report endpoints.
//!
//! Each request renders the document once; the same bytes are archived under
//! `REPORTS_DIR` and streamed back inline.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use chrono::Local;
use tracing::{info, warn};

use crate::{
    auth::SessionUser,
    error::{AppError, AppResult},
    models::{find_device, MonthToken, DEVICES},
    ranking::{compare_months, ranking_for_report},
    report::{self, ReportContext, ReportDocument},
    AppState,
};

// ---

pub fn monthly_router() -> Router<AppState> {
    Router::new().route("/api/report/monthly/pdf/{month}", get(monthly_pdf))
}

pub fn admin_router() -> Router<AppState> {
    Router::new().route(
        "/api/report/compare/pdf/{device_id}/{month_a}/{month_b}",
        get(comparison_pdf),
    )
}

/// Logo bytes from `LOGO_PATH`; a missing or unreadable file leaves the header without one.
async fn load_logo(state: &AppState) -> Option<Arc<Vec<u8>>> {
    // ---
    let path = state.config.logo_path.as_ref()?;
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(Arc::new(bytes)),
        Err(e) => {
            warn!("Logo {} not loaded: {}", path.display(), e);
            None
        }
    }
}

async fn context(state: &AppState, user: &SessionUser) -> ReportContext {
    ReportContext {
        company_name: state.config.company_name.clone(),
        generated_at: Local::now(),
        requested_by: user.username.clone(),
        logo: load_logo(state).await,
    }
}

/// Render, archive and respond; archive failures do not fail the request.
async fn deliver(state: &AppState, ctx: &ReportContext, doc: &ReportDocument, stem: &str) -> AppResult<Response> {
    // ---
    let bytes = report::render(doc)?;

    if let Err(e) = report::archive(&state.config.reports_dir, stem, ctx.generated_at, &bytes).await {
        warn!("Report {} not archived: {}", stem, e);
    }

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("inline; filename={stem}.pdf")),
        ],
        bytes,
    )
        .into_response())
}

async fn monthly_pdf(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(month): Path<String>,
) -> AppResult<Response> {
    // ---
    let month = MonthToken::parse(&month)?;
    info!("Generating monthly ranking report for {} (requested by {})", month, user.username);

    let totals = state.store.monthly_totals(&month).await?;
    let ranking = ranking_for_report(DEVICES, &totals);

    let ctx = context(&state, &user).await;
    let doc = report::monthly_ranking_report(&ctx, &month, &ranking);
    deliver(&state, &ctx, &doc, &format!("Monthly_Ranking_{month}")).await
}

async fn comparison_pdf(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path((device_id, month_a, month_b)): Path<(String, String, String)>,
) -> AppResult<Response> {
    // ---
    let device = find_device(&device_id).ok_or_else(|| AppError::NotFound(format!("unknown device {device_id}")))?;
    let month_a = MonthToken::parse(&month_a)?;
    let month_b = MonthToken::parse(&month_b)?;
    info!(
        "Generating comparison report for {} ({} vs {}, requested by {})",
        device.id, month_a, month_b, user.username
    );

    let comparison = compare_months(&state.store, device.id, &month_a, &month_b).await?;

    let ctx = context(&state, &user).await;
    let doc = report::comparison_report(&ctx, device, &month_a, &month_b, &comparison);
    deliver(
        &state,
        &ctx,
        &doc,
        &format!("Comparison_{}_{}_{}", device.id, month_a, month_b),
    )
    .await
}

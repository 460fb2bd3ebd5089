use axum::{extract::Request, middleware, Router};
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::{auth, AppState};

mod consumption;
mod health;
mod pages;
mod reports;

// ---

/// Assemble the full application router.
///
/// Three tiers: public routes, routes behind the login gate, and routes
/// behind the admin gate.
pub fn router(state: AppState) -> Router {
    // ---
    let logged_in = Router::new()
        .merge(pages::protected_router())
        .merge(consumption::router())
        .merge(reports::monthly_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_login));

    let admin_only = reports::admin_router()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    Router::new()
        .merge(health::router())
        .merge(pages::public_router())
        .merge(logged_in)
        .merge(admin_only)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}

//! Login form, session handling and the dashboard page.

use axum::{
    extract::{Form, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    auth::{self, SessionUser},
    error::AppResult,
    AppState,
};

// ---

const LOGIN_PAGE: &str = include_str!("../../static/login.html");
const INDEX_PAGE: &str = include_str!("../../static/index.html");

pub fn public_router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/login.html", get(login_page))
        .route("/login", post(login))
        .route("/logout", get(logout))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Handle `POST /login`: open a session or bounce back with `?error=1`.
async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> AppResult<impl IntoResponse> {
    // ---
    let Some(profile) = auth::authenticate(&state.pool, &form.username, &form.password).await? else {
        warn!("Failed login for '{}'", form.username);
        return Ok(Redirect::to("/login.html?error=1").into_response());
    };

    info!("User '{}' logged in as {}", form.username, profile.as_str());
    let id = state
        .sessions
        .create(SessionUser {
            username: form.username,
            profile,
        })
        .await;

    Ok(([(header::SET_COOKIE, auth::session_cookie(&id))], Redirect::to("/")).into_response())
}

/// Handle `GET /logout`: drop the session and clear the cookie.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    // ---
    if let Some(id) = auth::session_id(&headers) {
        if let Some(user) = state.sessions.remove(&id).await {
            info!("User '{}' logged out", user.username);
        }
    }

    (
        [(header::SET_COOKIE, auth::expired_session_cookie())],
        Redirect::to("/login.html"),
    )
}

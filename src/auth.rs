//! Login, sessions and the two authorization gates.
//!
//! Sessions live in memory and are keyed by a random id carried in the
//! `session` cookie. A session expires [`SESSION_TTL`] after login; expired
//! entries are dropped whenever a new session is created. The gates run as middleware ahead of the handlers and put
//! the resolved [`SessionUser`] into the request extensions.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{error::AppError, AppState};

// ---

pub const SESSION_COOKIE: &str = "session";

pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Closed set of access profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Admin,
    Operator,
    Readonly,
}

impl Profile {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Profile::Admin),
            "operator" => Some(Profile::Operator),
            "readonly" => Some(Profile::Readonly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Admin => "admin",
            Profile::Operator => "operator",
            Profile::Readonly => "readonly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub username: String,
    pub profile: Profile,
}

/// Check a username/password pair against the `users` table.
pub async fn authenticate(pool: &SqlitePool, username: &str, password: &str) -> Result<Option<Profile>, AppError> {
    // ---
    let row: Option<String> = sqlx::query_scalar("SELECT profile FROM users WHERE username = ? AND password = ?")
        .bind(username)
        .bind(password)
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|p| {
        let profile = Profile::parse(&p);
        if profile.is_none() {
            warn!("User {} has unknown profile '{}'", username, p);
        }
        profile
    }))
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, (SessionUser, Instant)>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    pub async fn create(&self, user: SessionUser) -> Uuid {
        // ---
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, (_, created)| created.elapsed() < self.ttl);
        if sessions.len() < before {
            debug!("Pruned {} expired sessions", before - sessions.len());
        }

        sessions.insert(id, (user, Instant::now()));
        id
    }

    /// The session's user, unless it is unknown or expired.
    pub async fn get(&self, id: &Uuid) -> Option<SessionUser> {
        // ---
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|(_, created)| created.elapsed() < self.ttl)
            .map(|(user, _)| user.clone())
    }

    pub async fn remove(&self, id: &Uuid) -> Option<SessionUser> {
        self.sessions.write().await.remove(id).map(|(user, _)| user)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Session id from the `Cookie` header, if present and well-formed.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    // ---
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

pub fn session_cookie(id: &Uuid) -> String {
    format!(
        "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_TTL.as_secs()
    )
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<SessionUser> {
    let id = session_id(headers)?;
    state.sessions.get(&id).await
}

/// Gate: any authenticated profile; otherwise redirect to the login page.
pub async fn require_login(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, AppError> {
    // ---
    let user = current_user(&state, request.headers()).await.ok_or_else(|| {
        debug!("No session for {}", request.uri());
        AppError::Unauthorized
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Gate: admin profile only; anyone else gets "access denied".
pub async fn require_admin(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, AppError> {
    // ---
    match current_user(&state, request.headers()).await {
        Some(user) if user.profile == Profile::Admin => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        other => {
            debug!(
                "Admin gate refused {} for {:?}",
                request.uri(),
                other.map(|u| u.username)
            );
            Err(AppError::Forbidden)
        }
    }
}

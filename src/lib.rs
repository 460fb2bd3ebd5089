//! Intranet energy dashboard.
//!
//! Polls cumulative meter readings into per-day consumption records and serves
//! monthly rankings and comparison reports (JSON and PDF) over HTTP.
//!
//! Module map (EMBP: each module exposes a narrow gateway):
//! - `reading`     – cumulative counter source per device
//! - `accumulator` – periodic fold of readings into daily records
//! - `store`       – `daily_consumption` persistence
//! - `ranking`     – monthly totals, ranking and comparison
//! - `report`      – PDF layout, rendering and archiving
//! - `auth`        – login, sessions and authorization gates
//! - `routes`      – axum router

use std::sync::Arc;

use sqlx::SqlitePool;

pub mod accumulator;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod ranking;
pub mod reading;
pub mod report;
pub mod routes;
pub mod schema;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::ConsumptionStore;

// ---

/// Shared state handed to every route and middleware.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub store: ConsumptionStore,
    pub sessions: auth::SessionStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        // ---
        Self {
            store: ConsumptionStore::new(pool.clone()),
            pool,
            sessions: auth::SessionStore::default(),
            config: Arc::new(config),
        }
    }
}

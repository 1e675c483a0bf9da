use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;

use crate::{Config, SnapshotStore};

mod distributors;
mod health;
mod payments;
mod reports;

// ---

/// State shared by every route: the connection pool, the loaded config and
/// the snapshot store all handlers read through.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub pool: PgPool,
    pub config: Config,
    pub snapshots: Arc<SnapshotStore>,
}

pub fn router(pool: PgPool, config: Config) -> Router {
    // ---
    let state = AppState {
        pool,
        config,
        snapshots: Arc::new(SnapshotStore::new()),
    };

    Router::new()
        .merge(distributors::router())
        .merge(reports::router())
        .merge(payments::router())
        .merge(health::router())
        .with_state(state)
}

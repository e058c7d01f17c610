// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod keywords;
pub mod livefeed;
pub mod metrics;
pub mod pubdate;
pub mod similarity;
pub mod sources;
pub mod spotlight;
pub mod topics;

pub use crate::api::{router, AppState};
pub use crate::error::{AppError, FetchError};
pub use crate::ingest::registry::GetterRegistry;
pub use crate::ingest::types::{NewsItem, PubDate, SourceGetter};
pub use crate::sources::{SourceId, SourceTable};

use tracing::info;

/// Build the full application (state + router) from the environment.
/// The `/metrics` route is mounted by the binary, not here.
pub fn app_from_config(config: &config::AppConfig) -> anyhow::Result<shuttle_axum::axum::Router> {
    let table = config.load_sources()?;
    let client = reqwest::Client::builder()
        .timeout(config.fetch_timeout)
        .build()?;
    let registry = GetterRegistry::from_table(&table, client);
    info!(
        sources = table.len(),
        getters = registry.len(),
        constrained = config.constrained,
        ttl_secs = config.spotlight_ttl.as_secs(),
        "application state ready"
    );
    Ok(router(AppState::new(config, table, registry)))
}

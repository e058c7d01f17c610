use std::collections::HashMap;
use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::ingest::registry::GetterRegistry;
use crate::livefeed::{LiveFeedQuery, LiveFeedResponse, LiveFeedService, DEFAULT_LIMIT};
use crate::sources::{Category, SourceTable};
use crate::spotlight::{SpotlightCache, SpotlightResponse, SpotlightService};

/// Services shared by every request; built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub spotlight: Arc<SpotlightService>,
    pub livefeed: Arc<LiveFeedService>,
}

impl AppState {
    pub fn new(config: &AppConfig, table: SourceTable, registry: GetterRegistry) -> Self {
        let table = Arc::new(table);
        let registry = Arc::new(registry);
        let cache = Arc::new(SpotlightCache::new(config.spotlight_ttl));
        Self {
            spotlight: Arc::new(SpotlightService::new(
                table.clone(),
                registry.clone(),
                config.hottest_policy(),
                cache,
            )),
            livefeed: Arc::new(LiveFeedService::new(table, registry)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/spotlight", get(spotlight))
        .route("/livefeed", get(livefeed))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn spotlight(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<SpotlightResponse>, AppError> {
    let force = q.get("refresh").is_some_and(|v| v == "true");
    let resp = state.spotlight.get(force).await?;
    Ok(Json(resp))
}

async fn livefeed(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<LiveFeedResponse>, AppError> {
    let query = parse_livefeed_query(&q)?;
    Ok(Json(state.livefeed.get(query).await))
}

/// Missing category means `all`; missing, non-numeric or zero limit means the default.
pub fn parse_livefeed_query(q: &HashMap<String, String>) -> Result<LiveFeedQuery, AppError> {
    let category = match q.get("category").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Category::All,
        Some(raw) => raw.parse::<Category>().map_err(AppError::Validation)?,
    };
    let limit = q
        .get("limit")
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_LIMIT);
    Ok(LiveFeedQuery { category, limit })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn livefeed_query_defaults() {
        let parsed = parse_livefeed_query(&q(&[])).unwrap();
        assert_eq!(parsed.category, Category::All);
        assert_eq!(parsed.limit, DEFAULT_LIMIT);

        for bad in ["abc", "0", "-3", ""] {
            let parsed = parse_livefeed_query(&q(&[("limit", bad)])).unwrap();
            assert_eq!(parsed.limit, DEFAULT_LIMIT, "limit={bad}");
        }
    }

    #[test]
    fn livefeed_query_parses_values() {
        let parsed = parse_livefeed_query(&q(&[("category", "tech"), ("limit", "7")])).unwrap();
        assert_eq!(parsed.category, Category::Tech);
        assert_eq!(parsed.limit, 7);
    }

    #[test]
    fn unknown_category_is_validation_error() {
        assert!(matches!(
            parse_livefeed_query(&q(&[("category", "sports")])),
            Err(AppError::Validation(_))
        ));
    }
}

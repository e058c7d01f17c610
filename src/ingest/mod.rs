// src/ingest/mod.rs
pub mod providers;
pub mod registry;
pub mod types;

use std::time::Instant;

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

use crate::error::FetchError;
use crate::ingest::registry::GetterRegistry;
use crate::ingest::types::NewsItem;
use crate::sources::SourceId;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fanout_requests_total", "Fan-out rounds started.");
        describe_counter!(
            "fanout_source_errors_total",
            "Per-source failures isolated by fan-out (missing getter, error, panic)."
        );
        describe_histogram!("fanout_duration_ms", "Wall time of one fan-out round.");
        describe_counter!("ingest_items_total", "Items parsed by feed getters.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Normalize a title: decode entities, strip tags, collapse whitespace.
pub fn normalize_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    out
}

/// Items fetched for one source; `items` is empty when the fetch failed.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source_id: SourceId,
    pub items: Vec<NewsItem>,
}

/// Call every getter concurrently and wait for all of them to settle.
///
/// Output has the same length and order as `ids`. A missing, failing or
/// panicking getter is logged and yields an empty list; it never affects
/// the other sources. No retries, no timeout.
pub async fn fetch_all(registry: &GetterRegistry, ids: &[SourceId]) -> Vec<SourceBatch> {
    ensure_metrics_described();
    counter!("fanout_requests_total").increment(1);
    let t0 = Instant::now();

    let tasks = ids.iter().map(|id| {
        let id = id.clone();
        let resolved = registry.resolve(&id);
        async move {
            let outcome = match resolved {
                Ok(getter) => {
                    // Spawned so a panicking getter is caught at the join handle.
                    match tokio::spawn(async move { getter.fetch().await }).await {
                        Ok(Ok(items)) => Ok(items),
                        Ok(Err(cause)) => Err(FetchError::Source {
                            source_id: id.clone(),
                            cause,
                        }),
                        Err(_join) => Err(FetchError::TaskPanicked(id.clone())),
                    }
                }
                Err(e) => Err(e),
            };
            settle(id, outcome)
        }
    });

    let out = join_all(tasks).await;

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("fanout_duration_ms").record(ms);
    tracing::debug!(
        target: "ingest",
        sources = ids.len(),
        items = out.iter().map(|b| b.items.len()).sum::<usize>(),
        elapsed_ms = ms,
        "fan-out settled"
    );
    out
}

fn settle(source_id: SourceId, outcome: Result<Vec<NewsItem>, FetchError>) -> SourceBatch {
    match outcome {
        Ok(items) => SourceBatch { source_id, items },
        Err(e) => {
            counter!("fanout_source_errors_total").increment(1);
            match &e {
                FetchError::TaskPanicked(_) => {
                    tracing::error!(source_id = %e.source_id(), error = %e, "source getter panicked")
                }
                _ => tracing::warn!(source_id = %e.source_id(), error = %e, "source fetch failed"),
            }
            SourceBatch {
                source_id,
                items: Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_title_collapses_ws_and_tags() {
        let s = "  Hello,&nbsp;&nbsp; <b>world</b>  ";
        assert_eq!(normalize_title(s), "Hello, world");
    }

    #[test]
    fn normalize_title_keeps_cjk() {
        assert_eq!(normalize_title(" 苹果 \n 发布会 "), "苹果 发布会");
    }

    #[tokio::test]
    async fn empty_id_list_settles_to_empty_output() {
        let reg = GetterRegistry::new();
        assert!(fetch_all(&reg, &[]).await.is_empty());
    }
}

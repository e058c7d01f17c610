//! # Live Feed
//!
//! Merges every eligible `realtime` source into one newest-first list.
//! `has_more` only says the list hit the limit; there is no cursor, clients
//! ask again with a bigger limit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::gauge;
use serde::Serialize;

use crate::ingest::registry::GetterRegistry;
use crate::ingest::{fetch_all, SourceBatch};
use crate::pubdate::{normalize_or, to_iso};
use crate::sources::{Category, SourceId, SourceTable};

pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveFeedExtra {
    pub info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeedItem {
    pub id: String,
    pub source_id: SourceId,
    pub source_name: String,
    pub source_color: String,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_url: Option<String>,
    pub pub_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<LiveFeedExtra>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeedResponse {
    pub items: Vec<LiveFeedItem>,
    pub has_more: bool,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy)]
pub struct LiveFeedQuery {
    pub category: Category,
    pub limit: usize,
}

impl Default for LiveFeedQuery {
    fn default() -> Self {
        Self {
            category: Category::All,
            limit: DEFAULT_LIMIT,
        }
    }
}

pub struct LiveFeedService {
    table: Arc<SourceTable>,
    registry: Arc<GetterRegistry>,
}

impl LiveFeedService {
    pub fn new(table: Arc<SourceTable>, registry: Arc<GetterRegistry>) -> Self {
        Self { table, registry }
    }

    pub async fn get(&self, query: LiveFeedQuery) -> LiveFeedResponse {
        self.get_at(Utc::now(), query).await
    }

    pub async fn get_at(&self, now: DateTime<Utc>, query: LiveFeedQuery) -> LiveFeedResponse {
        let ids = self.table.realtime_sources(query.category);
        let batches = fetch_all(&self.registry, &ids).await;
        let items = merge(&batches, &self.table, now, query.limit);

        tracing::debug!(
            target: "livefeed",
            sources = ids.len(),
            category = ?query.category,
            returned = items.len(),
            "live feed merged"
        );
        gauge!("livefeed_items_returned").set(items.len() as f64);

        LiveFeedResponse {
            has_more: items.len() == query.limit,
            items,
            updated_at: to_iso(now),
        }
    }
}

/// Flatten, tag, sort newest first and truncate to `limit`.
pub fn merge(
    batches: &[SourceBatch],
    table: &SourceTable,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<LiveFeedItem> {
    let mut dated: Vec<(DateTime<Utc>, LiveFeedItem)> = batches
        .iter()
        .flat_map(|b| {
            let name = table.display_name(&b.source_id);
            let color = table.display_color(&b.source_id);
            b.items.iter().enumerate().map(move |(idx, it)| {
                let local_id = if it.id.is_empty() {
                    idx.to_string()
                } else {
                    it.id.clone()
                };
                let when = normalize_or(it.pub_date.as_ref(), now);
                let item = LiveFeedItem {
                    id: format!("livefeed-{}-{}", b.source_id, local_id),
                    source_id: b.source_id.clone(),
                    source_name: name.clone(),
                    source_color: color.clone(),
                    title: it.title.clone(),
                    url: it.url.clone(),
                    mobile_url: it.mobile_url.clone(),
                    pub_date: to_iso(when),
                    extra: it
                        .extra
                        .as_ref()
                        .and_then(|e| e.info.clone())
                        .map(|info| LiveFeedExtra { info }),
                };
                (when, item)
            })
        })
        .collect();

    // stable: ties keep source order, then item order
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated.into_iter().take(limit).map(|(_, it)| it).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{ItemExtra, NewsItem, PubDate};

    fn sid(s: &str) -> SourceId {
        SourceId::new(s).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn composite_ids_and_fallbacks() {
        let mut with_info = NewsItem::new("", "untitled id", "https://x/0");
        with_info.extra = Some(ItemExtra {
            info: Some("hot".into()),
            ..Default::default()
        });
        let batches = vec![SourceBatch {
            source_id: sid("ghost"),
            items: vec![
                with_info,
                NewsItem::new("abc", "has id", "https://x/1")
                    .with_pub_date(PubDate::Text("2000-01-01 00:00".into())),
            ],
        }];
        let now = at("2024-06-01T00:00:00Z");
        let out = merge(&batches, &SourceTable::default(), now, 10);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "livefeed-ghost-0");
        assert_eq!(out[0].pub_date, "2024-06-01T00:00:00.000Z");
        assert_eq!(out[0].source_name, "ghost");
        assert_eq!(out[0].source_color, "gray");
        assert_eq!(out[0].extra, Some(LiveFeedExtra { info: "hot".into() }));
        assert_eq!(out[1].id, "livefeed-ghost-abc");
        assert!(out[1].extra.is_none());
    }

    #[test]
    fn sorted_desc_and_truncated() {
        let batches = vec![
            SourceBatch {
                source_id: sid("a"),
                items: vec![
                    NewsItem::new("1", "a1", "u").with_pub_date(PubDate::Millis(1_000)),
                    NewsItem::new("2", "a2", "u").with_pub_date(PubDate::Millis(3_000)),
                ],
            },
            SourceBatch {
                source_id: sid("b"),
                items: vec![NewsItem::new("1", "b1", "u").with_pub_date(PubDate::Millis(2_000))],
            },
        ];
        let out = merge(&batches, &SourceTable::default(), Utc::now(), 2);
        let titles: Vec<&str> = out.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["a2", "b1"]);
    }

    #[test]
    fn out_of_range_dates_fall_back_to_now() {
        let batches = vec![SourceBatch {
            source_id: sid("a"),
            items: vec![
                NewsItem::new("old", "old", "u")
                    .with_pub_date(PubDate::Text("2023-01-01 00:00".into())),
                NewsItem::new("micros", "micros", "u")
                    .with_pub_date(PubDate::Millis(1_704_067_200_000_000)),
                NewsItem::new("new", "new", "u")
                    .with_pub_date(PubDate::Text("2024-03-01 00:00".into())),
            ],
        }];
        let now = at("2024-06-01T00:00:00Z");
        let out = merge(&batches, &SourceTable::default(), now, 10);

        let ids: Vec<&str> = out.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["livefeed-a-micros", "livefeed-a-new", "livefeed-a-old"]);
        assert_eq!(out[0].pub_date, "2024-06-01T00:00:00.000Z");
        for w in out.windows(2) {
            assert!(w[0].pub_date >= w[1].pub_date);
        }
    }
}

//! # Spotlight
//!
//! Cross-platform hot topics: fan out to every eligible `hottest` source,
//! cluster the results, and keep the last answer in a single TTL slot.
//!
//! The slot is replaced as a whole snapshot under a `RwLock`. Concurrent
//! forced refreshes may each recompute; the last writer wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use parking_lot::RwLock;
use serde::Serialize;

use crate::error::AppError;
use crate::ingest::registry::GetterRegistry;
use crate::ingest::{fetch_all, SourceBatch};
use crate::pubdate::to_iso;
use crate::sources::{HottestPolicy, SourceId, SourceTable};
use crate::topics::{group_by_topic, ClusterOptions, TopicGroup, MAX_TOPICS};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotlightPlatform {
    pub source_id: SourceId,
    pub source_name: String,
    pub rank: usize,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotlightTopic {
    pub id: String,
    pub keyword: String,
    pub title: String,
    pub platforms: Vec<SpotlightPlatform>,
    pub platform_count: usize,
    pub max_rank: usize,
    pub first_seen_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotlightResponse {
    pub topics: Vec<SpotlightTopic>,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
struct Slot {
    topics: Vec<SpotlightTopic>,
    computed_at: DateTime<Utc>,
}

/// Single process-wide slot holding the last computed topics.
#[derive(Debug)]
pub struct SpotlightCache {
    slot: RwLock<Option<Slot>>,
    ttl: chrono::Duration,
}

impl SpotlightCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Cached topics and their computation time, if younger than the TTL.
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<(Vec<SpotlightTopic>, DateTime<Utc>)> {
        let guard = self.slot.read();
        let slot = guard.as_ref()?;
        if now - slot.computed_at < self.ttl {
            Some((slot.topics.clone(), slot.computed_at))
        } else {
            None
        }
    }

    /// Overwrite the slot.
    pub fn store(&self, topics: Vec<SpotlightTopic>, computed_at: DateTime<Utc>) {
        *self.slot.write() = Some(Slot {
            topics,
            computed_at,
        });
    }

    pub fn computed_at(&self) -> Option<DateTime<Utc>> {
        self.slot.read().as_ref().map(|s| s.computed_at)
    }
}

pub struct SpotlightService {
    table: Arc<SourceTable>,
    registry: Arc<GetterRegistry>,
    policy: HottestPolicy,
    options: ClusterOptions,
    cache: Arc<SpotlightCache>,
}

impl SpotlightService {
    pub fn new(
        table: Arc<SourceTable>,
        registry: Arc<GetterRegistry>,
        policy: HottestPolicy,
        cache: Arc<SpotlightCache>,
    ) -> Self {
        Self {
            table,
            registry,
            policy,
            options: ClusterOptions::default(),
            cache,
        }
    }

    pub fn cache(&self) -> &SpotlightCache {
        &self.cache
    }

    /// Sources this service fans out to.
    pub fn eligible_sources(&self) -> Vec<SourceId> {
        self.table.hottest_sources(&self.policy)
    }

    pub async fn get(&self, force_refresh: bool) -> Result<SpotlightResponse, AppError> {
        self.get_at(Utc::now(), force_refresh).await
    }

    /// `get` with an explicit clock reading.
    pub async fn get_at(
        &self,
        now: DateTime<Utc>,
        force_refresh: bool,
    ) -> Result<SpotlightResponse, AppError> {
        if !force_refresh {
            if let Some((topics, computed_at)) = self.cache.fresh(now) {
                counter!("spotlight_cache_hits_total").increment(1);
                return Ok(SpotlightResponse {
                    topics,
                    updated_at: to_iso(computed_at),
                });
            }
        }
        counter!("spotlight_cache_misses_total").increment(1);

        let ids = self.eligible_sources();
        let batches = fetch_all(&self.registry, &ids).await;
        let groups = self.cluster(batches).await?;
        let topics = to_topics(&groups, &self.table, now);

        tracing::info!(
            target: "spotlight",
            sources = ids.len(),
            topics = topics.len(),
            forced = force_refresh,
            "spotlight recomputed"
        );
        gauge!("spotlight_topics").set(topics.len() as f64);

        self.cache.store(topics.clone(), now);
        Ok(SpotlightResponse {
            topics,
            updated_at: to_iso(now),
        })
    }

    /// Clustering is CPU-bound, so it runs off the async workers.
    async fn cluster(&self, batches: Vec<SourceBatch>) -> Result<Vec<TopicGroup>, AppError> {
        let opts = self.options;
        tokio::task::spawn_blocking(move || group_by_topic(&batches, opts))
            .await
            .map_err(|e| AppError::Aggregation(anyhow::anyhow!("topic clustering task failed: {e}")))
    }
}

/// Top `MAX_TOPICS` groups rendered for output.
pub fn to_topics(groups: &[TopicGroup], table: &SourceTable, now: DateTime<Utc>) -> Vec<SpotlightTopic> {
    let stamp = to_iso(now);
    let now_ms = now.timestamp_millis();
    groups
        .iter()
        .take(MAX_TOPICS)
        .enumerate()
        .map(|(index, group)| SpotlightTopic {
            id: format!("spotlight-{now_ms}-{index}"),
            keyword: group.keyword.clone(),
            title: group.representative().title.clone(),
            platforms: group
                .items
                .iter()
                .map(|it| SpotlightPlatform {
                    source_id: it.source_id.clone(),
                    source_name: table.display_name(&it.source_id),
                    rank: it.rank,
                    title: it.title.clone(),
                    url: it.url.clone(),
                })
                .collect(),
            platform_count: group.platform_count,
            max_rank: group.max_rank,
            first_seen_at: stamp.clone(),
            updated_at: stamp.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::NewsItem;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn empty_cache_is_not_fresh() {
        let c = SpotlightCache::new(DEFAULT_CACHE_TTL);
        assert!(c.fresh(Utc::now()).is_none());
        assert!(c.computed_at().is_none());
    }

    #[test]
    fn ttl_boundary_is_exclusive() {
        let c = SpotlightCache::new(Duration::from_secs(300));
        let t0 = at("2024-01-01T00:00:00Z");
        c.store(Vec::new(), t0);

        assert!(c.fresh(t0).is_some());
        assert!(c.fresh(at("2024-01-01T00:04:59Z")).is_some());
        assert!(c.fresh(at("2024-01-01T00:05:00Z")).is_none());
    }

    #[test]
    fn store_overwrites_whole_slot() {
        let c = SpotlightCache::new(Duration::from_secs(300));
        let t0 = at("2024-01-01T00:00:00Z");
        let t1 = at("2024-01-01T00:01:00Z");
        c.store(Vec::new(), t0);
        c.store(Vec::new(), t1);
        assert_eq!(c.computed_at(), Some(t1));
        let (_, when) = c.fresh(t1).unwrap();
        assert_eq!(when, t1);
    }

    #[test]
    fn only_top_ten_groups_are_rendered() {
        // three sources, each listing the same 12 tags; a lists them in
        // reverse so best ranks differ per topic
        let batch = |id: &str, order: Vec<usize>| SourceBatch {
            source_id: SourceId::new(id).unwrap(),
            items: order
                .into_iter()
                .map(|n| NewsItem::new(format!("{id}-{n}"), format!("#话题{n}#"), format!("https://{id}/{n}")))
                .collect(),
        };
        let batches = vec![
            batch("a", (0..12).rev().collect()),
            batch("b", (0..12).collect()),
            batch("c", (0..12).collect()),
        ];
        let groups = group_by_topic(&batches, ClusterOptions::default());
        assert_eq!(groups.len(), 12);
        assert!(groups.iter().all(|g| g.platform_count == 3));

        let now = at("2024-01-01T00:00:00Z");
        let topics = to_topics(&groups, &SourceTable::default(), now);
        assert_eq!(topics.len(), MAX_TOPICS);

        let keywords: Vec<&str> = topics.iter().map(|t| t.keyword.as_str()).collect();
        let want: Vec<&str> = groups[..MAX_TOPICS].iter().map(|g| g.keyword.as_str()).collect();
        assert_eq!(keywords, want);
        for w in topics.windows(2) {
            assert!(w[0].max_rank <= w[1].max_rank);
        }
        assert_eq!(topics[0].keyword, "话题11");
        assert_eq!(topics[1].keyword, "话题0");
        let dropped: Vec<&str> = groups[MAX_TOPICS..].iter().map(|g| g.keyword.as_str()).collect();
        assert_eq!(dropped, vec!["话题6", "话题5"]);
        assert!(groups[MAX_TOPICS..].iter().all(|g| g.max_rank > topics[9].max_rank));

        let now_ms = now.timestamp_millis();
        for (i, t) in topics.iter().enumerate() {
            assert_eq!(t.id, format!("spotlight-{now_ms}-{i}"));
        }
    }
}

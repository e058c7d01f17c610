//! # Topic Clusterer
//!
//! Seed-based greedy grouping of items across sources.
//!
//! Each unused item seeds a group; later unused items join when they come
//! from a source not yet in the group and their keywords match the *seed's*
//! keywords. Membership is never re-checked against other members, so the
//! result depends on input order.
//!
//! Groups below `min_platforms` are dropped; the rest are ordered by
//! platform count (desc) then best rank (asc). O(n²) over the flattened
//! item count, which stays in the low hundreds.

use crate::ingest::types::PubDate;
use crate::ingest::SourceBatch;
use crate::keywords::{extract_keywords, label_for};
use crate::similarity::{should_group, DEFAULT_SIMILARITY_THRESHOLD};
use crate::sources::SourceId;

pub const DEFAULT_MIN_PLATFORMS: usize = 3;
/// Groups kept for presentation.
pub const MAX_TOPICS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct ClusterOptions {
    pub min_platforms: usize,
    pub similarity_threshold: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_platforms: DEFAULT_MIN_PLATFORMS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicItem {
    pub source_id: SourceId,
    /// 1-based position within its own source's list.
    pub rank: usize,
    pub title: String,
    pub url: String,
    pub keywords: Vec<String>,
    pub pub_date: Option<PubDate>,
}

/// Invariants: distinct `source_id` per item, `platform_count == items.len()`,
/// `max_rank == min(rank)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicGroup {
    pub keyword: String,
    pub items: Vec<TopicItem>,
    pub platform_count: usize,
    /// Best (smallest) rank in the group.
    pub max_rank: usize,
}

impl TopicGroup {
    fn seeded(seed: TopicItem) -> Self {
        Self {
            keyword: label_for(&seed.keywords, &seed.title),
            platform_count: 1,
            max_rank: seed.rank,
            items: vec![seed],
        }
    }

    fn admit(&mut self, item: TopicItem) {
        self.max_rank = self.max_rank.min(item.rank);
        self.items.push(item);
        self.platform_count = self.items.len();
    }

    fn has_source(&self, id: &SourceId) -> bool {
        self.items.iter().any(|i| &i.source_id == id)
    }

    /// Lowest-rank item; the earliest one wins exact ties.
    pub fn representative(&self) -> &TopicItem {
        let mut best = &self.items[0];
        for it in &self.items[1..] {
            if it.rank < best.rank {
                best = it;
            }
        }
        best
    }
}

/// Flatten batches into topic items, ranking each within its own source.
pub fn flatten(batches: &[SourceBatch]) -> Vec<TopicItem> {
    batches
        .iter()
        .flat_map(|b| {
            b.items.iter().enumerate().map(move |(i, n)| TopicItem {
                source_id: b.source_id.clone(),
                rank: i + 1,
                title: n.title.clone(),
                url: n.url.clone(),
                keywords: extract_keywords(&n.title),
                pub_date: n.pub_date.clone(),
            })
        })
        .collect()
}

/// Every surviving group, sorted. Callers truncate to `MAX_TOPICS`.
pub fn group_by_topic(batches: &[SourceBatch], opts: ClusterOptions) -> Vec<TopicGroup> {
    let items = flatten(batches);
    let mut used = vec![false; items.len()];
    let mut groups = Vec::new();

    for seed_idx in 0..items.len() {
        if used[seed_idx] {
            continue;
        }
        used[seed_idx] = true;
        let seed = &items[seed_idx];
        let mut group = TopicGroup::seeded(seed.clone());

        for other_idx in 0..items.len() {
            if used[other_idx] {
                continue;
            }
            let other = &items[other_idx];
            if group.has_source(&other.source_id) {
                continue;
            }
            if should_group(&seed.keywords, &other.keywords, opts.similarity_threshold) {
                used[other_idx] = true;
                group.admit(other.clone());
            }
        }

        groups.push(group);
    }

    groups.retain(|g| g.platform_count >= opts.min_platforms);
    // stable: equal keys keep seed order
    groups.sort_by(|a, b| {
        b.platform_count
            .cmp(&a.platform_count)
            .then(a.max_rank.cmp(&b.max_rank))
    });
    groups
}

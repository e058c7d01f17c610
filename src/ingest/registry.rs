// src/ingest/registry.rs
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;

use crate::error::FetchError;
use crate::ingest::providers::rss::RssGetter;
use crate::ingest::types::{FnGetter, NewsItem, SourceGetter};
use crate::sources::{SourceId, SourceTable};

/// Maps source ids to their fetch capability.
#[derive(Clone, Default)]
pub struct GetterRegistry {
    getters: HashMap<SourceId, Arc<dyn SourceGetter>>,
}

impl GetterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the getter for `id`.
    pub fn register(&mut self, id: SourceId, getter: Arc<dyn SourceGetter>) -> &mut Self {
        self.getters.insert(id, getter);
        self
    }

    pub fn register_fn<F, Fut>(&mut self, id: SourceId, f: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<NewsItem>>> + Send + 'static,
    {
        self.register(id, Arc::new(FnGetter(f)))
    }

    pub fn resolve(&self, id: &SourceId) -> Result<Arc<dyn SourceGetter>, FetchError> {
        self.getters
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotRegistered(id.clone()))
    }

    pub fn contains(&self, id: &SourceId) -> bool {
        self.getters.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.getters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.getters.is_empty()
    }

    /// One `RssGetter` per descriptor that carries a `feed` URL.
    pub fn from_table(table: &SourceTable, client: reqwest::Client) -> Self {
        let mut reg = Self::new();
        for d in table.iter() {
            if let Some(url) = d.feed.as_deref() {
                reg.register(
                    d.id.clone(),
                    Arc::new(RssGetter::from_url(url, client.clone())),
                );
            }
        }
        tracing::info!(
            target: "ingest",
            registered = reg.len(),
            sources = table.len(),
            "getter registry built from descriptor table"
        );
        reg
    }
}

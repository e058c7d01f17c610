// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Publication time as a source reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PubDate {
    /// Unix epoch milliseconds.
    Millis(i64),
    /// Source-specific text (RFC 3339, RFC 2822, "2024-01-01 08:00", ...).
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<PubDate>,
}

/// One entry of a source's ordered list. Position in the list is its rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Empty when the source has no stable id.
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<PubDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<ItemExtra>,
}

impl NewsItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            mobile_url: None,
            pub_date: None,
            extra: None,
        }
    }

    pub fn with_pub_date(mut self, pub_date: PubDate) -> Self {
        self.pub_date = Some(pub_date);
        self
    }
}

/// Produces the current ordered item list of one source.
/// Timeouts and retries are the getter's own business.
#[async_trait::async_trait]
pub trait SourceGetter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<NewsItem>>;
}

/// Adapts an async closure into a `SourceGetter`.
pub struct FnGetter<F>(pub F);

#[async_trait::async_trait]
impl<F, Fut> SourceGetter for FnGetter<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<NewsItem>>> + Send,
{
    async fn fetch(&self) -> Result<Vec<NewsItem>> {
        (self.0)().await
    }
}

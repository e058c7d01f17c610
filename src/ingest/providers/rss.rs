use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::normalize_title;
use crate::ingest::types::{ItemExtra, NewsItem, PubDate, SourceGetter};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// Generic RSS 2.0 getter. Document order is kept, so the first `<item>`
/// is rank 1.
pub struct RssGetter {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssGetter {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    /// Timeouts come from the shared `client`.
    pub fn from_url(url: &str, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<NewsItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = normalize_title(it.title.as_deref().unwrap_or_default());
            let Some(link) = it.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
            else {
                continue;
            };
            if title.is_empty() {
                continue;
            }

            let hover = it
                .description
                .as_deref()
                .map(normalize_title)
                .filter(|d| !d.is_empty());

            out.push(NewsItem {
                id: it
                    .guid
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .unwrap_or_else(|| link.clone()),
                title,
                url: link,
                mobile_url: None,
                pub_date: it
                    .pub_date
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .map(PubDate::Text),
                extra: hover.map(|h| ItemExtra {
                    hover: Some(h),
                    ..Default::default()
                }),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_items_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceGetter for RssGetter {
    async fn fetch(&self) -> Result<Vec<NewsItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url.as_str())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .with_context(|| format!("rss http get {url}"))?
                    .text()
                    .await
                    .with_context(|| format!("rss http body {url}"))?;
                Self::parse_items_from_str(&body)
            }
        }
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

// src/config.rs
//! Process configuration from env (`.env` honoured) and the descriptor table
//! from TOML or JSON.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::{HottestPolicy, SourceDescriptor, SourceId, SourceTable};
use crate::spotlight::DEFAULT_CACHE_TTL;

pub const ENV_SOURCES_CONFIG_PATH: &str = "SOURCES_CONFIG_PATH";
pub const ENV_SPOTLIGHT_CACHE_TTL_SECS: &str = "SPOTLIGHT_CACHE_TTL_SECS";
pub const ENV_SPOTLIGHT_FLAGSHIP_SOURCE: &str = "SPOTLIGHT_FLAGSHIP_SOURCE";
pub const ENV_CONSTRAINED_DEPLOYMENT: &str = "CONSTRAINED_DEPLOYMENT";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";

pub const DEFAULT_SOURCES_TOML: &str = "config/sources.toml";
pub const DEFAULT_SOURCES_JSON: &str = "config/sources.json";
pub const DEFAULT_FLAGSHIP_SOURCE: &str = "weibo";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sources_path: Option<PathBuf>,
    pub spotlight_ttl: Duration,
    pub flagship: Option<SourceId>,
    pub constrained: bool,
    pub fetch_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources_path: None,
            spotlight_ttl: DEFAULT_CACHE_TTL,
            flagship: SourceId::new(DEFAULT_FLAGSHIP_SOURCE).ok(),
            constrained: false,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            sources_path: std::env::var(ENV_SOURCES_CONFIG_PATH)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            spotlight_ttl: parse_secs_env(ENV_SPOTLIGHT_CACHE_TTL_SECS).unwrap_or(d.spotlight_ttl),
            flagship: match std::env::var(ENV_SPOTLIGHT_FLAGSHIP_SOURCE) {
                Ok(raw) if raw.trim().is_empty() => None,
                Ok(raw) => match SourceId::new(raw.trim()) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::warn!(error = %e, "invalid {ENV_SPOTLIGHT_FLAGSHIP_SOURCE}, using default");
                        d.flagship
                    }
                },
                Err(_) => d.flagship,
            },
            constrained: parse_bool_env(ENV_CONSTRAINED_DEPLOYMENT),
            fetch_timeout: parse_secs_env(ENV_FETCH_TIMEOUT_SECS).unwrap_or(d.fetch_timeout),
        }
    }

    pub fn hottest_policy(&self) -> HottestPolicy {
        HottestPolicy {
            flagship: self.flagship.clone(),
            constrained: self.constrained,
        }
    }

    /// Explicit path must exist; otherwise defaults, then an empty table.
    pub fn load_sources(&self) -> Result<SourceTable> {
        match &self.sources_path {
            Some(p) if p.exists() => load_sources_from(p),
            Some(p) => Err(anyhow!(
                "{ENV_SOURCES_CONFIG_PATH} points to non-existent path {}",
                p.display()
            )),
            None => load_sources_default(),
        }
    }
}

fn parse_secs_env(key: &str) -> Option<Duration> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring non-numeric duration");
            None
        }
    }
}

fn parse_bool_env(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Fallbacks: config/sources.toml, config/sources.json, empty table.
pub fn load_sources_default() -> Result<SourceTable> {
    let toml_p = PathBuf::from(DEFAULT_SOURCES_TOML);
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_SOURCES_JSON);
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    tracing::warn!("no descriptor table found, starting with no sources");
    Ok(SourceTable::default())
}

/// Load the descriptor table. Format is picked by extension, TOML otherwise.
pub fn load_sources_from(path: &Path) -> Result<SourceTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading descriptor table from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let entries = if ext == "json" {
        parse_json(&content)
    } else {
        parse_toml(&content)
    }
    .with_context(|| format!("parsing descriptor table {}", path.display()))?;
    SourceTable::new(entries)
}

fn parse_toml(s: &str) -> Result<Vec<SourceDescriptor>> {
    #[derive(Deserialize)]
    struct TomlTable {
        #[serde(default)]
        source: Vec<SourceDescriptor>,
    }
    let v: TomlTable = toml::from_str(s)?;
    Ok(v.source)
}

/// Either a bare array or `{ "source": [...] }`.
fn parse_json(s: &str) -> Result<Vec<SourceDescriptor>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum JsonTable {
        List(Vec<SourceDescriptor>),
        Wrapped { source: Vec<SourceDescriptor> },
    }
    Ok(match serde_json::from_str::<JsonTable>(s)? {
        JsonTable::List(v) => v,
        JsonTable::Wrapped { source } => source,
    })
}

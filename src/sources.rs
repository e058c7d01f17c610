//! # Sources
//!
//! Typed source identifiers and the read-only descriptor table.
//!
//! - `SourceId` is validated once at the boundary (config load, registry,
//!   tests) so the rest of the crate never handles raw id strings.
//! - Sub-sources carry their parent id as the prefix before the first `-`
//!   (e.g. `cls-telegraph` → `cls`).
//! - `SourceTable` keeps file order; that order drives fan-out and clustering.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SourceIdError;

/// Separator between a parent id and a sub-source suffix.
pub const SUB_SOURCE_SEPARATOR: char = '-';

/// Fallback color for sources missing from the table.
pub const DEFAULT_SOURCE_COLOR: &str = "gray";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
    pub fn new(raw: impl Into<String>) -> Result<Self, SourceIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(SourceIdError::Empty);
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-'))
        {
            return Err(SourceIdError::InvalidChar { id: raw, ch: bad });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parent id for a sub-source, `None` for a top-level source.
    pub fn parent(&self) -> Option<SourceId> {
        let (head, _) = self.0.split_once(SUB_SOURCE_SEPARATOR)?;
        if head.is_empty() {
            return None;
        }
        Some(SourceId(head.to_string()))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SourceId {
    type Err = SourceIdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SourceId {
    type Error = SourceIdError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SourceId> for String {
    fn from(value: SourceId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Ranked top-N snapshot.
    Hottest,
    /// Recent timestamped items.
    Realtime,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Finance,
    Tech,
    World,
    #[serde(other)]
    Other,
}

/// Live feed category filter. `All` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Finance,
    Tech,
    World,
}

impl Category {
    fn from_column(column: Column) -> Option<Self> {
        match column {
            Column::Finance => Some(Category::Finance),
            Column::Tech => Some(Category::Tech),
            Column::World => Some(Category::World),
            Column::Other => None,
        }
    }
}

impl FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Category::All),
            "finance" => Ok(Category::Finance),
            "tech" => Ok(Category::Tech),
            "world" => Ok(Category::World),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// `disable = true` or `disable = "cf"` (constrained deployments only).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DisableFlag {
    Flag(bool),
    Mode(String),
}

/// Mode string that disables a source only under constrained deployment.
pub const CONSTRAINED_DISABLE_MODE: &str = "cf";

impl DisableFlag {
    pub fn is_disabled(&self, constrained: bool) -> bool {
        match self {
            DisableFlag::Flag(b) => *b,
            DisableFlag::Mode(m) => constrained && m == CONSTRAINED_DISABLE_MODE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: SourceKind,
    #[serde(default)]
    pub column: Option<Column>,
    #[serde(default)]
    pub disable: Option<DisableFlag>,
    /// Alias of another source id; such entries are never fetched directly.
    #[serde(default)]
    pub redirect: Option<SourceId>,
    /// RSS/Atom-ish feed URL used to build a default getter.
    #[serde(default)]
    pub feed: Option<String>,
}

fn default_color() -> String {
    DEFAULT_SOURCE_COLOR.to_string()
}

fn default_kind() -> SourceKind {
    SourceKind::Other
}

impl SourceDescriptor {
    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }

    pub fn is_disabled(&self, constrained: bool) -> bool {
        self.disable
            .as_ref()
            .is_some_and(|d| d.is_disabled(constrained))
    }
}

/// Knobs for Spotlight source selection.
#[derive(Debug, Clone)]
pub struct HottestPolicy {
    /// Included even when its type is not `hottest`.
    pub flagship: Option<SourceId>,
    /// Honour `disable = "cf"` entries.
    pub constrained: bool,
}

/// Ordered, read-only descriptor table.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    entries: Vec<SourceDescriptor>,
    index: HashMap<SourceId, usize>,
}

impl SourceTable {
    /// Build a table; duplicate ids are rejected.
    pub fn new(entries: Vec<SourceDescriptor>) -> anyhow::Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, d) in entries.iter().enumerate() {
            if index.insert(d.id.clone(), i).is_some() {
                anyhow::bail!("duplicate source id '{}' in descriptor table", d.id);
            }
        }
        Ok(Self { entries, index })
    }

    pub fn get(&self, id: &SourceId) -> Option<&SourceDescriptor> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn display_name(&self, id: &SourceId) -> String {
        self.get(id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn display_color(&self, id: &SourceId) -> String {
        self.get(id)
            .map(|d| d.color.clone())
            .unwrap_or_else(default_color)
    }

    /// Spotlight candidates: every `hottest` source plus the flagship,
    /// minus disabled entries and redirects. Table order is preserved.
    pub fn hottest_sources(&self, policy: &HottestPolicy) -> Vec<SourceId> {
        self.entries
            .iter()
            .filter(|d| !d.is_disabled(policy.constrained))
            .filter(|d| !d.is_redirect())
            .filter(|d| d.kind == SourceKind::Hottest || policy.flagship.as_ref() == Some(&d.id))
            .map(|d| d.id.clone())
            .collect()
    }

    /// Live feed candidates: every non-redirect `realtime` source whose
    /// category matches (`All` matches everything).
    pub fn realtime_sources(&self, category: Category) -> Vec<SourceId> {
        self.entries
            .iter()
            .filter(|d| d.kind == SourceKind::Realtime && !d.is_redirect())
            .filter(|d| category == Category::All || self.category_of(&d.id) == category)
            .map(|d| d.id.clone())
            .collect()
    }

    /// Parent column wins for sub-sources; otherwise the source's own column.
    pub fn category_of(&self, id: &SourceId) -> Category {
        let from_parent = id
            .parent()
            .and_then(|p| self.get(&p))
            .and_then(|d| d.column)
            .and_then(Category::from_column);
        if let Some(c) = from_parent {
            return c;
        }
        self.get(id)
            .and_then(|d| d.column)
            .and_then(Category::from_column)
            .unwrap_or(Category::All)
    }
}

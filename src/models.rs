use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Originating publication site; closed set, wire format is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Portswigger,
    Medium,
    Hackerone,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Portswigger => "portswigger",
            Source::Medium => "medium",
            Source::Hackerone => "hackerone",
        }
    }

    /// Human-readable badge label.
    pub fn label(&self) -> &'static str {
        match self {
            Source::Portswigger => "PortSwigger",
            Source::Medium => "Medium",
            Source::Hackerone => "HackerOne",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "portswigger" => Ok(Source::Portswigger),
            "medium" => Ok(Source::Medium),
            "hackerone" => Ok(Source::Hackerone),
            _ => Err(format!("unknown source '{raw}'")),
        }
    }
}

/// A published security write-up as returned by the API. Records are kept
/// verbatim; timestamps stay as the ISO-8601 strings the server sent and are
/// parsed only where a sort key or display date is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Writeup {
    pub id: String,
    pub source: Source,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub published_at: String,
    pub created_at: String,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Writeup {
    pub fn published_ts(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.published_at)
    }
}

/// Lenient ISO-8601 parse: RFC 3339, then a naive datetime (assumed UTC),
/// then a bare date. Unparseable input yields `None` and sorts last.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    None
}

/// Source filter control: wildcard or a single site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceFilter {
    #[default]
    All,
    Only(Source),
}

impl SourceFilter {
    /// Query-parameter value; `None` means the parameter is omitted.
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            SourceFilter::All => None,
            SourceFilter::Only(source) => Some(source.as_str()),
        }
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFilter::All => f.write_str("all"),
            SourceFilter::Only(source) => f.write_str(source.as_str()),
        }
    }
}

impl FromStr for SourceFilter {
    type Err = String;
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == "all" {
            Ok(SourceFilter::All)
        } else {
            raw.parse().map(SourceFilter::Only)
        }
    }
}

/// Client-owned, ephemeral filter state. `favorites` is applied purely on the
/// client and never reaches the server; the remaining fields become query
/// parameters when non-default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteupFilters {
    pub source: SourceFilter,
    /// Empty string means no year filter.
    pub year: String,
    /// Empty string or a numeral "1".."12".
    pub month: String,
    pub favorites: bool,
    /// Free-text search, filtered server-side.
    pub q: String,
}

/// Cache key: the server-relevant filter tuple. `favorites` is deliberately
/// excluded since it never alters the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    source: SourceFilter,
    year: String,
    month: String,
    q: String,
}

impl WriteupFilters {
    pub fn query_key(&self) -> QueryKey {
        QueryKey {
            source: self.source,
            year: self.year.clone(),
            month: self.month.clone(),
            q: self.q.clone(),
        }
    }

    /// Reset the source/year/month controls, leaving favorites and the
    /// search box untouched.
    pub fn reset(&mut self) {
        self.source = SourceFilter::All;
        self.year.clear();
        self.month.clear();
    }

    /// Clear only the search field.
    pub fn clear_search(&mut self) {
        self.q.clear();
    }
}

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Local};

use crate::models::{Writeup, WriteupFilters};

/// Aggregates over the full result set matching source/year/month/q,
/// computed before the favorites filter so toggling favorites never moves
/// the numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metrics {
    pub total: usize,
    /// Count of distinct sources present.
    pub sources: usize,
    /// Items published in the viewer's current calendar month and year.
    pub monthly_count: usize,
    /// Localized date of the most recent item, or "-" when empty.
    pub freshest: String,
}

#[derive(Debug, Clone)]
pub struct DerivedView {
    pub visible: Vec<Writeup>,
    pub metrics: Metrics,
}

/// Pure sort/filter/aggregate step. `now` is the viewer's clock, passed in so
/// the monthly metric is testable. Sorting is descending by `published_at`;
/// `sort_by` is stable, so equal timestamps keep their input order and
/// unparseable timestamps sink to the end.
pub fn derive(raw: &[Writeup], filters: &WriteupFilters, now: DateTime<Local>) -> DerivedView {
    let mut sorted: Vec<Writeup> = raw.to_vec();
    sorted.sort_by(|a, b| b.published_ts().cmp(&a.published_ts()));

    let distinct: HashSet<_> = sorted.iter().map(|w| w.source).collect();
    let monthly_count = sorted
        .iter()
        .filter(|w| {
            w.published_ts()
                .map(|ts| {
                    let local = ts.with_timezone(&now.timezone());
                    local.year() == now.year() && local.month() == now.month()
                })
                .unwrap_or(false)
        })
        .count();
    let freshest = sorted
        .first()
        .and_then(|w| w.published_ts())
        .map(|ts| ts.with_timezone(&now.timezone()).format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string());
    let metrics = Metrics {
        total: sorted.len(),
        sources: distinct.len(),
        monthly_count,
        freshest,
    };

    if filters.favorites {
        sorted.retain(|w| w.is_favorite);
    }
    DerivedView {
        visible: sorted,
        metrics,
    }
}

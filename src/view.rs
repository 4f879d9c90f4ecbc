use chrono::Local;

use crate::models::{parse_timestamp, Writeup, WriteupFilters};
use crate::pipeline::Metrics;

/// Which (if any) empty-state message to show in place of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    None,
    /// Favorites filter is on and the full result set had items, but none
    /// are favorited.
    Favorites,
    /// A search term produced no results (favorites filter off).
    Search,
}

/// Classify the empty state. `total` is the pre-favorites count from the
/// pipeline metrics; `visible` the post-filter count. The two messages are
/// mutually exclusive and suppressed while pending or on error.
pub fn empty_state(
    filters: &WriteupFilters,
    total: usize,
    visible: usize,
    is_pending: bool,
    has_error: bool,
) -> EmptyState {
    if is_pending || has_error || visible > 0 {
        return EmptyState::None;
    }
    if filters.favorites {
        if total > 0 {
            EmptyState::Favorites
        } else {
            EmptyState::None
        }
    } else if !filters.q.is_empty() {
        EmptyState::Search
    } else {
        EmptyState::None
    }
}

pub fn favorites_empty_message() -> String {
    "No favorites yet. Star a write-up (fav N) to save it.".to_string()
}

/// The hinted action clears only the search field, not the other filters.
pub fn search_empty_message(q: &str) -> String {
    format!("No write-ups found for \"{q}\". Try other terms or run clear-search.")
}

/// Strip markup tags from a summary before display.
pub fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Localized display date; falls back to the raw string when unparseable.
pub fn format_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|ts| ts.with_timezone(&Local).format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn render_metrics(metrics: &Metrics) -> String {
    format!(
        "{} records | {} active sources | {} published this month | freshest {}",
        metrics.total, metrics.sources, metrics.monthly_count, metrics.freshest
    )
}

pub fn render_filters(filters: &WriteupFilters) -> String {
    let mut parts = vec![format!("source={}", filters.source)];
    if !filters.year.is_empty() {
        parts.push(format!("year={}", filters.year));
    }
    if !filters.month.is_empty() {
        parts.push(format!("month={}", filters.month));
    }
    if !filters.q.is_empty() {
        parts.push(format!("q=\"{}\"", filters.q));
    }
    if filters.favorites {
        parts.push("favorites-only".to_string());
    }
    format!("filters: {}", parts.join(" "))
}

pub fn render_result_count(visible: usize) -> String {
    format!("{visible} results found")
}

/// One result card. `is_favorite` comes from the per-card cell when one
/// exists, falling back to the fetched record.
pub fn render_card(index: usize, item: &Writeup, is_favorite: bool) -> String {
    let star = if is_favorite { "★" } else { "☆" };
    let summary = item
        .summary
        .as_deref()
        .map(strip_tags)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "No summary available.".to_string());
    let author = item
        .author
        .as_deref()
        .map(|a| format!("by {a}"))
        .unwrap_or_else(|| "Author not listed".to_string());
    format!(
        "{index:>3}. {star} [{}] {}  ({})\n     {}\n     {} | {}",
        item.source.label(),
        item.title,
        format_date(&item.published_at),
        summary,
        author,
        item.url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn wu(summary: Option<&str>, author: Option<&str>) -> Writeup {
        Writeup {
            id: "w1".into(),
            source: Source::Portswigger,
            title: "Cache poisoning deep dive".into(),
            url: "https://example.com/w1".into(),
            author: author.map(Into::into),
            summary: summary.map(Into::into),
            published_at: "2025-06-01T00:00:00Z".into(),
            created_at: "2025-06-01T00:00:00Z".into(),
            is_favorite: false,
        }
    }

    fn search_filters(q: &str, favorites: bool) -> WriteupFilters {
        WriteupFilters {
            q: q.into(),
            favorites,
            ..Default::default()
        }
    }

    #[test]
    fn strip_tags_removes_markup() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_tags("no tags here"), "no tags here");
        assert_eq!(strip_tags("a < b is fine once tagged <i>x</i>"), "a x");
        assert_eq!(strip_tags(""), "");
    }

    #[test]
    fn search_empty_needs_a_term_and_favorites_off() {
        assert_eq!(
            empty_state(&search_filters("xss", false), 0, 0, false, false),
            EmptyState::Search
        );
        // favorites filter on wins over the search classification
        assert_eq!(
            empty_state(&search_filters("xss", true), 3, 0, false, false),
            EmptyState::Favorites
        );
        // no search term, nothing to say
        assert_eq!(
            empty_state(&search_filters("", false), 0, 0, false, false),
            EmptyState::None
        );
    }

    #[test]
    fn favorites_empty_requires_a_non_empty_prefilter_list() {
        assert_eq!(
            empty_state(&search_filters("", true), 5, 0, false, false),
            EmptyState::Favorites
        );
        assert_eq!(
            empty_state(&search_filters("", true), 0, 0, false, false),
            EmptyState::None
        );
    }

    #[test]
    fn empty_states_suppressed_while_pending_or_on_error() {
        let filters = search_filters("xss", false);
        assert_eq!(empty_state(&filters, 0, 0, true, false), EmptyState::None);
        assert_eq!(empty_state(&filters, 0, 0, false, true), EmptyState::None);
    }

    #[test]
    fn no_empty_state_when_results_are_visible() {
        assert_eq!(
            empty_state(&search_filters("xss", false), 4, 4, false, false),
            EmptyState::None
        );
    }

    #[test]
    fn card_falls_back_for_missing_summary_and_author() {
        let card = render_card(1, &wu(None, None), false);
        assert!(card.contains("No summary available."));
        assert!(card.contains("Author not listed"));
        assert!(card.contains("☆"));
        assert!(card.contains("[PortSwigger]"));
    }

    #[test]
    fn card_strips_summary_markup_and_names_the_author() {
        let card = render_card(2, &wu(Some("<p>Great <em>bug</em></p>"), Some("jdoe")), true);
        assert!(card.contains("Great bug"));
        assert!(!card.contains("<p>"));
        assert!(card.contains("by jdoe"));
        assert!(card.contains("★"));
    }
}

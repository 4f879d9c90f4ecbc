use std::collections::HashMap;
use std::io::Write as _;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use writeup_radar::cache::{QueryCache, QueryPhase};
use writeup_radar::config::Config;
use writeup_radar::favorite::{FavoriteCell, Notify};
use writeup_radar::models::{SourceFilter, Writeup, WriteupFilters};
use writeup_radar::pipeline;
use writeup_radar::view::{self, EmptyState};
use writeup_radar::HttpWriteupApi;

struct TerminalNotifier;

impl Notify for TerminalNotifier {
    fn notify(&self, message: &str) {
        println!("! {message}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env automatically only in debug builds to reduce manual setup overhead.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    // Structured logging initialisation
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = Config::from_env();
    info!("Bootstrapping write-up radar");
    info!("API base: {}", config.api_base);

    let api = HttpWriteupApi::new(&config.api_base);
    let cache = QueryCache::with_windows(api.clone(), config.fresh_for, config.evict_after);
    let notifier = TerminalNotifier;
    let mut cells: HashMap<String, Arc<FavoriteCell>> = HashMap::new();
    let mut filters = WriteupFilters::default();

    println!("Bug Bounty Radar — curated security write-ups");
    print_help();
    let mut visible = render_screen(&cache, &filters, &cells).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let line = line.trim();
        let (cmd, rest) = line
            .split_once(' ')
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));
        match cmd {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                print_help();
                continue;
            }
            "show" => {}
            "source" => match SourceFilter::from_str(rest) {
                Ok(source) => filters.source = source,
                Err(e) => {
                    println!("{e} (use all, portswigger, medium or hackerone)");
                    continue;
                }
            },
            "year" => {
                if rest.is_empty() || rest == "clear" {
                    filters.year.clear();
                } else {
                    match rest.parse::<i32>() {
                        // the feed starts in 2025
                        Ok(year) if year >= 2025 => filters.year = rest.to_string(),
                        _ => {
                            println!("Year must be a number, 2025 or later");
                            continue;
                        }
                    }
                }
            }
            "month" => {
                if rest.is_empty() || rest == "clear" {
                    filters.month.clear();
                } else {
                    match rest.parse::<u32>() {
                        Ok(month) if (1..=12).contains(&month) => {
                            filters.month = month.to_string();
                        }
                        _ => {
                            println!("Month must be 1-12");
                            continue;
                        }
                    }
                }
            }
            "search" => {
                if rest.is_empty() {
                    println!("Usage: search <terms>");
                    continue;
                }
                filters.q = rest.to_string();
            }
            "clear-search" => filters.clear_search(),
            "favorites" => filters.favorites = !filters.favorites,
            "reset" => filters.reset(),
            "fav" => {
                let Ok(n) = rest.parse::<usize>() else {
                    println!("Usage: fav <card number>");
                    continue;
                };
                let Some(item) = n.checked_sub(1).and_then(|i| visible.get(i)) else {
                    println!("No card #{n} on screen");
                    continue;
                };
                let cell = cells
                    .entry(item.id.clone())
                    .or_insert_with(|| Arc::new(FavoriteCell::new(item)))
                    .clone();
                let starred = cell.toggle(&api, &notifier).await;
                println!("{} {}", if starred { "★" } else { "☆" }, item.title);
                continue;
            }
            other => {
                println!("Unknown command '{other}' (try help)");
                continue;
            }
        }
        visible = render_screen(&cache, &filters, &cells).await;
    }
    Ok(())
}

async fn render_screen(
    cache: &QueryCache<HttpWriteupApi>,
    filters: &WriteupFilters,
    cells: &HashMap<String, Arc<FavoriteCell>>,
) -> Vec<Writeup> {
    if matches!(cache.phase(filters), QueryPhase::Idle | QueryPhase::Stale) {
        println!("Loading write-ups...");
    }
    let query = cache.resolve(filters).await;
    println!("{}", view::render_filters(filters));
    if let Some(error) = &query.error {
        // error banner replaces the result rendering
        println!("Failed to load write-ups: {error}");
        return Vec::new();
    }
    let raw: &[Writeup] = query.data.as_ref().map(|d| d.as_slice()).unwrap_or(&[]);
    let derived = pipeline::derive(raw, filters, Local::now());
    println!("{}", view::render_metrics(&derived.metrics));
    match view::empty_state(
        filters,
        derived.metrics.total,
        derived.visible.len(),
        false,
        false,
    ) {
        EmptyState::Favorites => println!("{}", view::favorites_empty_message()),
        EmptyState::Search => println!("{}", view::search_empty_message(&filters.q)),
        EmptyState::None => {
            println!("{}", view::render_result_count(derived.visible.len()));
            for (i, item) in derived.visible.iter().enumerate() {
                let starred = cells
                    .get(&item.id)
                    .map(|c| c.is_favorite())
                    .unwrap_or(item.is_favorite);
                println!("{}", view::render_card(i + 1, item, starred));
            }
        }
    }
    derived.visible
}

fn print_help() {
    println!("commands: source <all|portswigger|medium|hackerone> | year <n|clear> | month <1-12|clear>");
    println!("          search <terms> | clear-search | favorites | fav <n> | reset | show | quit");
}

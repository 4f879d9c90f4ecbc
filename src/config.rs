use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Environment-derived settings. `WRITEUPS_API_BASE` points at the API;
/// the window knobs exist mostly for tests and local tuning.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub fresh_for: Duration,
    pub evict_after: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        fn dur_env(name: &str, default: u64) -> Duration {
            Duration::from_secs(
                std::env::var(name)
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(default),
            )
        }
        Self {
            api_base: std::env::var("WRITEUPS_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            fresh_for: dur_env("WRITEUPS_FRESH_SECS", 600),
            evict_after: dur_env("WRITEUPS_EVICT_SECS", 3600),
        }
    }
}

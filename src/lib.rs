pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod favorite;
pub mod models;
pub mod pipeline;
pub mod view;

// Re-export commonly used items for tests / external users
pub use api::{HttpWriteupApi, WriteupApi, FETCH_LIMIT};
pub use cache::{QueryCache, QueryPhase, QueryView};
pub use error::{ApiError, ApiResult};
pub use models::{Source, SourceFilter, Writeup, WriteupFilters};

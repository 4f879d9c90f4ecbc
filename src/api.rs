use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::models::{Writeup, WriteupFilters};

/// Fixed result limit sent on every list request; the server truncates.
pub const FETCH_LIMIT: u32 = 250;

#[async_trait]
pub trait WriteupApi: Send + Sync {
    async fn fetch_writeups(&self, filters: &WriteupFilters) -> ApiResult<Vec<Writeup>>;
    async fn set_favorite(&self, id: &str, value: bool) -> ApiResult<()>;
}

#[derive(Serialize)]
struct FavoritePatch {
    is_favorite: bool,
}

/// reqwest-backed client for the write-ups REST API.
#[derive(Clone)]
pub struct HttpWriteupApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWriteupApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// `limit` is always sent; the filter fields only when non-default.
    fn query_params(filters: &WriteupFilters) -> Vec<(&'static str, String)> {
        let mut params = vec![("limit", FETCH_LIMIT.to_string())];
        if let Some(source) = filters.source.as_param() {
            params.push(("source", source.to_string()));
        }
        if !filters.year.is_empty() {
            params.push(("year", filters.year.clone()));
        }
        if !filters.month.is_empty() {
            params.push(("month", filters.month.clone()));
        }
        if !filters.q.is_empty() {
            params.push(("q", filters.q.clone()));
        }
        params
    }
}

#[async_trait]
impl WriteupApi for HttpWriteupApi {
    async fn fetch_writeups(&self, filters: &WriteupFilters) -> ApiResult<Vec<Writeup>> {
        let params = Self::query_params(filters);
        debug!(?params, "fetching write-ups");
        let response = self
            .http
            .get(format!("{}/api/writeups", self.base_url))
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        // Guard array-ness before deserializing; individual records are taken
        // as-is beyond what the model fields require.
        let body: serde_json::Value = response.json().await.map_err(|_| ApiError::Shape)?;
        if !body.is_array() {
            return Err(ApiError::Shape);
        }
        serde_json::from_value(body).map_err(|_| ApiError::Shape)
    }

    async fn set_favorite(&self, id: &str, value: bool) -> ApiResult<()> {
        let response = self
            .http
            .patch(format!("{}/api/writeups/{}", self.base_url, id))
            .json(&FavoritePatch { is_favorite: value })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Source, SourceFilter};

    #[test]
    fn default_filters_send_only_limit() {
        let params = HttpWriteupApi::query_params(&WriteupFilters::default());
        assert_eq!(params, vec![("limit", "250".to_string())]);
    }

    #[test]
    fn each_non_default_field_adds_exactly_that_param() {
        let filters = WriteupFilters {
            source: SourceFilter::Only(Source::Portswigger),
            year: "2025".into(),
            month: "6".into(),
            favorites: true, // client-side only, must not appear
            q: "xss".into(),
        };
        let params = HttpWriteupApi::query_params(&filters);
        assert_eq!(
            params,
            vec![
                ("limit", "250".to_string()),
                ("source", "portswigger".to_string()),
                ("year", "2025".to_string()),
                ("month", "6".to_string()),
                ("q", "xss".to_string()),
            ]
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpWriteupApi::new("http://localhost:8000/");
        assert_eq!(api.base_url, "http://localhost:8000");
    }
}

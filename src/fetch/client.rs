//! HTTP client for the geo chart endpoints
//!
//! No retries: a failed request surfaces as [`ChartError::Request`] and the
//! caller decides whether the run continues.

use super::ChartSource;
use crate::config::ApiConfig;
use crate::constants::API_KEY_ENV;
use crate::error::{ChartError, Result};
use crate::models::ChartType;
use serde_json::Value;
use tracing::debug;

/// Chart API client
#[derive(Debug, Clone)]
pub struct ChartClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ChartClient {
    /// Build a client; fails when no API key is configured
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let api_key = api
            .api_key
            .clone()
            .ok_or_else(|| ChartError::MissingApiKey {
                var: API_KEY_ENV.to_string(),
            })?;

        let http_client = reqwest::Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| ChartError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: api.base_url.clone(),
            api_key,
        })
    }

    /// Query parameters for one chart page
    pub fn request_params(
        &self,
        country: &str,
        chart_type: ChartType,
        limit: u32,
        page: u32,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("method", chart_type.method()),
            ("country", country.to_string()),
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("limit", limit.to_string()),
            ("page", page.to_string()),
        ]
    }

    /// Fetch one chart page and decode the body as JSON.
    ///
    /// The body's shape is not checked here; the normalizer validates it.
    pub async fn fetch(
        &self,
        country: &str,
        chart_type: ChartType,
        limit: u32,
        page: u32,
    ) -> Result<Value> {
        let params = self.request_params(country, chart_type, limit, page);
        debug!(
            country = %country,
            method = %chart_type.method(),
            limit,
            page,
            "Requesting chart"
        );

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| request_error(country, chart_type, source))?;

        response
            .json::<Value>()
            .await
            .map_err(|source| request_error(country, chart_type, source))
    }
}

impl ChartSource for ChartClient {
    async fn fetch(
        &self,
        country: &str,
        chart_type: ChartType,
        limit: u32,
        page: u32,
    ) -> Result<Value> {
        ChartClient::fetch(self, country, chart_type, limit, page).await
    }
}

fn request_error(country: &str, chart_type: ChartType, source: reqwest::Error) -> ChartError {
    ChartError::Request {
        country: country.to_string(),
        chart_type: chart_type.to_string(),
        source,
    }
}

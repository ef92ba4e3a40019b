use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};
use url::Url;
use wreq::{Client, Response};
use wreq_util::Emulation;

use super::FetchError;
use crate::config::ApiConfig;

/// Anything that can hand back the raw listing records for a suburb.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listings(
        &self,
        suburb: &str,
        property_type: &str,
    ) -> Result<Vec<Value>, FetchError>;
}

pub struct SuburbFetcher {
    client: Client,
    config: ApiConfig,
}

impl SuburbFetcher {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .emulation(Emulation::Firefox139)
            .timeout(config.timeout())
            .build()?;

        Ok(SuburbFetcher { client, config })
    }

    pub fn build_request_url(&self, suburb: &str, property_type: &str) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &self.config.api.base_url,
            &[("suburb", suburb), ("property_type", property_type)],
        )
        .map_err(|e| FetchError::InvalidEndpoint {
            url: self.config.api.base_url.clone(),
            reason: e.to_string(),
        })
    }

    async fn fetch_with_auth(&self, url: &Url) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .header("Authorization", format!("Bearer {}", self.config.api.auth_token))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status(status));
        }

        Ok(response)
    }
}

#[async_trait]
impl ListingSource for SuburbFetcher {
    async fn fetch_listings(
        &self,
        suburb: &str,
        property_type: &str,
    ) -> Result<Vec<Value>, FetchError> {
        let suburb = suburb.trim();
        if suburb.is_empty() {
            return Err(FetchError::EmptySuburb);
        }

        let url = self.build_request_url(suburb, property_type)?;
        info!(
            "Fetching {} listings for {} ({})",
            self.config.api.name, suburb, property_type
        );

        let response = match self.fetch_with_auth(&url).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to fetch listings for {}: {}", suburb, e);
                return Err(e);
            }
        };

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let results = extract_results(&body);
        info!("Fetched {} listings for {}", results.len(), suburb);

        Ok(results)
    }
}

/// The `results` array of an API response; anything else counts as empty.
pub fn extract_results(body: &Value) -> Vec<Value> {
    body.get("results")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

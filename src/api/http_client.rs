use anyhow::{anyhow, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use std::num::NonZeroU32;
use tracing::{debug, warn};
use url::Url;

use super::{is_valid_symbol, parse_document, FinancialDataProvider, ProviderError};
use crate::models::{ServiceConfig, StatementDocument};

/// Statement documents served over HTTP at `{endpoint}/statements/{symbol}`
pub struct HttpStatementClient {
    client: Client,
    base_url: Url,
    credential: Option<String>,
    rate_limiter: DefaultDirectRateLimiter,
}

impl HttpStatementClient {
    pub fn new(config: &ServiceConfig, requests_per_minute: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("fin-metrics/0.1")
            .build()?;

        let base_url = Url::parse(&config.endpoint).map_err(|e| {
            anyhow!("Invalid financial data endpoint '{}': {}", config.endpoint, e)
        })?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!(
                "Financial data endpoint '{}' cannot be a base URL",
                config.endpoint
            ));
        }

        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            base_url,
            credential: config.credential.clone(),
            rate_limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        })
    }

    /// `None` for symbols that are not a single plain path segment
    fn statements_url(&self, symbol: &str) -> Option<Url> {
        if !is_valid_symbol(symbol) {
            return None;
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push("statements")
            .push(symbol);
        Some(url)
    }
}

#[async_trait::async_trait]
impl FinancialDataProvider for HttpStatementClient {
    async fn fetch_statements(&self, symbol: &str) -> Result<StatementDocument, ProviderError> {
        let url = self
            .statements_url(symbol)
            .ok_or_else(|| ProviderError::NotFound {
                symbol: symbol.to_string(),
            })?;

        self.rate_limiter.until_ready().await;
        debug!("Fetching statements for {} from {}", symbol, url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.credential {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Statement request for {} failed with {}: {}", symbol, status, body);
            return Err(ProviderError::Unavailable(format!(
                "HTTP {} for {}",
                status, symbol
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        parse_document(symbol, &body)
    }
}

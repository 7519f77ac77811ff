// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use reqwest::Client;
use std::time::Duration;

use crate::error::{ExchangeError, Result};
use crate::models::{CurrencyCode, RateTable, RatesResponse};

/// Source of rate tables. One call, one outbound request, no caching.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch(&self, base: &CurrencyCode) -> Result<RateTable>;

    async fn fetch_default(&self) -> Result<RateTable> {
        self.fetch(&CurrencyCode::default_base()).await
    }
}

/// Client for the open.er-api.com `latest` endpoint. No API key needed.
#[derive(Clone)]
pub struct ErApiClient {
    client: Client,
    base_url: String,
}

impl ErApiClient {
    pub const DEFAULT_URL: &'static str = "https://open.er-api.com/v6";

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn latest_url(&self, base: &CurrencyCode) -> String {
        format!("{}/latest/{}", self.base_url, base)
    }
}

#[async_trait::async_trait]
impl RateFetcher for ErApiClient {
    async fn fetch(&self, base: &CurrencyCode) -> Result<RateTable> {
        let url = self.latest_url(base);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExchangeError::fetch_failed(base, format!("request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExchangeError::fetch_failed(base, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(ExchangeError::fetch_failed(
                base,
                format!("API error: {status}"),
            ));
        }

        let parsed: RatesResponse = serde_json::from_str(&text).map_err(|e| {
            log::debug!("Raw response: {}", text);
            ExchangeError::fetch_failed(base, format!("failed to parse response: {e}"))
        })?;

        let table = parsed.into_rate_table(base)?;
        log::info!("Fetched {} rates for base {}", table.len(), base);
        Ok(table)
    }
}

// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use super::CurrencyCode;
use crate::error::{ExchangeError, Result};

/// Body of `GET /latest/{code}` on the open exchange rate API.
#[derive(Debug, Deserialize)]
pub struct RatesResponse {
    pub result: Option<String>,
    pub base_code: Option<String>,
    pub time_last_update_unix: Option<i64>,
    #[serde(rename = "error-type")]
    pub error_type: Option<String>,
    pub rates: Option<HashMap<String, f64>>,
}

impl RatesResponse {
    /// Turn the provider payload into a rate table for `requested`.
    /// Anything short of a complete, positive table is a fetch failure.
    pub fn into_rate_table(self, requested: &CurrencyCode) -> Result<RateTable> {
        if self.result.as_deref() == Some("error") {
            let kind = self.error_type.unwrap_or_else(|| "unknown".to_string());
            return Err(ExchangeError::fetch_failed(
                requested,
                format!("provider returned error: {kind}"),
            ));
        }

        if let Some(base_code) = &self.base_code {
            if !base_code.eq_ignore_ascii_case(requested.as_str()) {
                return Err(ExchangeError::fetch_failed(
                    requested,
                    format!("response is for base {base_code}"),
                ));
            }
        }

        let rates = self
            .rates
            .ok_or_else(|| ExchangeError::fetch_failed(requested, "response has no rates"))?;

        let mut table = RateTable::new(requested.clone(), rates)
            .map_err(|e| ExchangeError::fetch_failed(requested, e.to_string()))?;
        table.updated = self
            .time_last_update_unix
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
        Ok(table)
    }
}

/// Multipliers from one base currency to every other listed currency.
/// A table is only ever valid for the base it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    base: CurrencyCode,
    rates: BTreeMap<CurrencyCode, f64>,
    updated: Option<DateTime<Utc>>,
}

impl RateTable {
    pub fn new<K, I>(base: CurrencyCode, rates: I) -> anyhow::Result<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f64)>,
    {
        let mut table = BTreeMap::new();
        for (code, rate) in rates {
            let code = CurrencyCode::new(code.as_ref())?;
            if !rate.is_finite() || rate <= 0.0 {
                anyhow::bail!("rate for {} is not positive: {}", code, rate);
            }
            table.insert(code, rate);
        }
        if table.is_empty() {
            anyhow::bail!("rate table for {} is empty", base);
        }

        Ok(Self {
            base,
            rates: table,
            updated: None,
        })
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn get(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// When the provider last refreshed these rates, if it said.
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.rates.iter().map(|(code, rate)| (code, *rate))
    }
}

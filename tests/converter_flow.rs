// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use approx::assert_relative_eq;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::tempdir;

use currency_exchanger::api::RateFetcher;
use currency_exchanger::catalog::CurrencyCatalog;
use currency_exchanger::models::{CurrencyCode, RateTable};
use currency_exchanger::state::{Phase, RefreshPolicy};
use currency_exchanger::theme::ThemePreference;
use currency_exchanger::view::ConverterView;
use currency_exchanger::{ExchangeError, Result};

/// Serves fixed tables; unknown bases fail like the real service would.
struct FixedRates {
    tables: HashMap<CurrencyCode, RateTable>,
}

#[async_trait::async_trait]
impl RateFetcher for FixedRates {
    async fn fetch(&self, base: &CurrencyCode) -> Result<RateTable> {
        self.tables
            .get(base)
            .cloned()
            .ok_or_else(|| ExchangeError::fetch_failed(base, "provider returned error: unsupported-code"))
    }
}

fn code(c: &str) -> CurrencyCode {
    CurrencyCode::new(c).unwrap()
}

fn view(policy: RefreshPolicy) -> ConverterView {
    let usd = RateTable::new(code("USD"), [("EUR", 0.9), ("JPY", 150.0)]).unwrap();
    let fetcher = FixedRates {
        tables: HashMap::from([(code("USD"), usd)]),
    };
    let catalog = CurrencyCatalog::from_codes(["USD", "EUR", "JPY"].map(code));
    ConverterView::new(catalog, Arc::new(fetcher), policy)
}

#[tokio::test]
async fn test_ten_dollars_to_yen() {
    let mut view = view(RefreshPolicy::OnEdit);
    view.select_base("USD").unwrap();
    view.wait_for_rates().await.unwrap();

    // Edits after the fetch trigger a refresh before the table is reused
    view.select_target("JPY").unwrap();
    view.set_amount("10");
    assert_eq!(view.phase(), Phase::Stale);
    view.wait_for_rates().await.unwrap();
    assert_eq!(view.phase(), Phase::RatesReady);

    let result = view.submit().unwrap();
    assert_relative_eq!(result.value, 1500.0);
    assert_eq!(format!("{:.2}", result.rounded()), "1500.00");
    assert_eq!(result.to_string(), "10 USD = 1500.00 JPY");
}

#[tokio::test]
async fn test_failed_fetch_blocks_conversion() {
    let mut view = view(RefreshPolicy::BaseOnly);
    view.select_base("EUR").unwrap();
    view.select_target("JPY").unwrap();
    view.set_amount("10");

    let err = view.wait_for_rates().await.unwrap_err();
    assert!(matches!(err, ExchangeError::FetchFailed { .. }));
    assert!(matches!(view.submit(), Err(ExchangeError::InvalidSelection(_))));
    assert!(view.result().is_none());
}

#[tokio::test]
async fn test_bad_amount_blocks_conversion() {
    let mut view = view(RefreshPolicy::BaseOnly);
    view.select_base("USD").unwrap();
    view.select_target("EUR").unwrap();
    view.set_amount("12abc");
    view.wait_for_rates().await.unwrap();

    assert!(matches!(view.submit(), Err(ExchangeError::InvalidAmount(_))));
    assert!(view.result().is_none());
}

#[tokio::test]
async fn test_theme_toggle_through_view_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preferences.toml");

    let mut first = view(RefreshPolicy::OnEdit).with_theme(ThemePreference::load_from(&path));
    assert!(!first.dark_mode());
    assert!(first.toggle_theme().unwrap());

    let restarted = view(RefreshPolicy::OnEdit).with_theme(ThemePreference::load_from(&path));
    assert!(restarted.dark_mode());
}

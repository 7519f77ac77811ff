// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};

use crate::models::CurrencyCode;

const SUPPORTED_CURRENCIES: &str = include_str!("../data/supported-currencies.json");

/// Ordered list of currencies the user may pick from.
#[derive(Debug, Clone)]
pub struct CurrencyCatalog {
    codes: Vec<CurrencyCode>,
}

impl CurrencyCatalog {
    /// Catalog bundled with the binary.
    pub fn load() -> Result<Self> {
        let codes: Vec<CurrencyCode> = serde_json::from_str(SUPPORTED_CURRENCIES)
            .context("Failed to parse bundled currency list")?;
        Ok(Self::from_codes(codes))
    }

    /// Keeps the given order; later duplicates are dropped.
    pub fn from_codes(codes: impl IntoIterator<Item = CurrencyCode>) -> Self {
        let mut unique: Vec<CurrencyCode> = Vec::new();
        for code in codes {
            if !unique.contains(&code) {
                unique.push(code);
            }
        }
        Self { codes: unique }
    }

    pub fn list(&self) -> &[CurrencyCode] {
        &self.codes
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.codes.contains(code)
    }

    /// Case and whitespace insensitive substring match. An empty query
    /// returns everything.
    pub fn filter(&self, query: &str) -> Vec<CurrencyCode> {
        let needle = normalize(query);
        if needle.is_empty() {
            return self.codes.clone();
        }

        self.codes
            .iter()
            .filter(|code| normalize(code.as_str()).contains(&needle))
            .cloned()
            .collect()
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(codes: &[&str]) -> CurrencyCatalog {
        CurrencyCatalog::from_codes(codes.iter().map(|c| CurrencyCode::new(c).unwrap()))
    }

    fn codes(list: &[CurrencyCode]) -> Vec<&str> {
        list.iter().map(CurrencyCode::as_str).collect()
    }

    #[test]
    fn test_bundled_catalog() {
        let catalog = CurrencyCatalog::load().unwrap();
        assert!(catalog.list().len() > 100);
        assert_eq!(catalog.list()[0].as_str(), "USD");
        assert!(catalog.contains(&CurrencyCode::new("EUR").unwrap()));
        assert!(catalog.contains(&CurrencyCode::new("JPY").unwrap()));
    }

    #[test]
    fn test_filter_ignores_case_and_whitespace() {
        let catalog = catalog(&["USD", "EUR", "JPY"]);
        assert_eq!(codes(&catalog.filter("USD")), vec!["USD"]);
        assert_eq!(codes(&catalog.filter("us d")), vec!["USD"]);
        assert_eq!(codes(&catalog.filter(" u ")), vec!["USD", "EUR"]);
    }

    #[test]
    fn test_filter_keeps_catalog_order() {
        let catalog = catalog(&["JPY", "EUR", "USD"]);
        assert_eq!(codes(&catalog.filter("")), vec!["JPY", "EUR", "USD"]);
        assert_eq!(codes(&catalog.filter("   ")), vec!["JPY", "EUR", "USD"]);
        assert_eq!(codes(&catalog.filter("u")), vec!["EUR", "USD"]);
    }

    #[test]
    fn test_filter_without_match_is_empty() {
        let catalog = catalog(&["USD", "EUR", "JPY"]);
        assert!(catalog.filter("zzz").is_empty());
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let catalog = catalog(&["USD", "usd", "EUR"]);
        assert_eq!(codes(catalog.list()), vec!["USD", "EUR"]);
    }
}

// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO-style currency code such as "USD". Always trimmed and upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// The base used when the caller does not pick one.
    pub const DEFAULT_BASE: &'static str = "USD";

    pub fn new(code: &str) -> anyhow::Result<Self> {
        let code = code.trim();
        if code.is_empty() {
            anyhow::bail!("currency code empty");
        }
        if code.chars().any(char::is_whitespace) {
            anyhow::bail!("currency code {:?} contains whitespace", code);
        }
        Ok(Self(code.to_uppercase()))
    }

    pub fn default_base() -> Self {
        Self(Self::DEFAULT_BASE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::fmt;

use crate::error::{ExchangeError, Result};
use crate::models::{CurrencyCode, RateTable};

/// Outcome of one explicit conversion request. `value` keeps full precision;
/// only `rounded` and `Display` drop to cents.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub amount: f64,
    pub rate: f64,
    pub value: f64,
}

impl Conversion {
    pub fn rounded(&self) -> f64 {
        round_to_cents(self.value)
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} = {:.2} {}",
            self.amount,
            self.base,
            self.rounded(),
            self.target
        )
    }
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse the raw text of the amount field.
pub fn parse_amount(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ExchangeError::InvalidAmount(
            "enter an amount to convert".to_string(),
        ));
    }

    let amount: f64 = trimmed
        .parse()
        .map_err(|_| ExchangeError::InvalidAmount(format!("{trimmed:?} is not a number")))?;
    checked_amount(amount)
}

/// Rejects unusable amounts and folds `-0` into `0`.
fn checked_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() {
        return Err(ExchangeError::InvalidAmount(format!(
            "{amount} is not a finite number"
        )));
    }
    if amount < 0.0 {
        return Err(ExchangeError::InvalidAmount(format!(
            "{amount} is negative"
        )));
    }
    Ok(if amount == 0.0 { 0.0 } else { amount })
}

/// Convert `amount` of the table's base into `target`.
pub fn convert(table: &RateTable, target: &CurrencyCode, amount: f64) -> Result<Conversion> {
    let amount = checked_amount(amount)?;

    let rate = table.get(target).ok_or_else(|| {
        ExchangeError::InvalidSelection(format!(
            "no rate from {} to {}",
            table.base(),
            target
        ))
    })?;

    Ok(Conversion {
        base: table.base().clone(),
        target: target.clone(),
        amount,
        rate,
        value: amount * rate,
    })
}

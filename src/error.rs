// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::{error::Error, fmt::Display};

use crate::models::CurrencyCode;

/// Everything that can go wrong between picking currencies and showing a result.
/// None of these are fatal: the user can always retry the action.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeError {
    /// The rate service could not be reached or returned something unusable.
    FetchFailed { base: CurrencyCode, reason: String },
    /// No rate table for the selected base yet, or the target is not in it.
    InvalidSelection(String),
    /// The amount typed by the user is not a usable number.
    InvalidAmount(String),
}

pub type Result<T> = core::result::Result<T, ExchangeError>;

impl ExchangeError {
    pub fn fetch_failed(base: &CurrencyCode, reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            base: base.clone(),
            reason: reason.into(),
        }
    }
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExchangeError::FetchFailed { base, reason } => {
                write!(f, "Failed to fetch rates for {base}: {reason}")
            }
            ExchangeError::InvalidSelection(msg) => write!(f, "Invalid selection: {msg}"),
            ExchangeError::InvalidAmount(msg) => write!(f, "Invalid amount: {msg}"),
        }
    }
}

impl Error for ExchangeError {}

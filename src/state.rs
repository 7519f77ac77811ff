// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};

use crate::conversion::{self, Conversion};
use crate::error::{ExchangeError, Result};
use crate::models::{CurrencyCode, RateTable};

/// When edits to target or amount should trigger a new fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPolicy {
    /// Any change to base, target or amount refreshes the rates.
    #[default]
    OnEdit,
    /// Only a change of base refreshes; the table stays valid for its base.
    BaseOnly,
}

/// Identifies one outbound fetch. Only the most recently issued ticket may
/// populate the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub base: CurrencyCode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RatesStatus {
    /// No base chosen yet.
    Idle,
    Pending { ticket: FetchTicket },
    Ready { table: RateTable },
    /// Selection edited since `table` arrived; `ticket` is the refresh in flight.
    Stale { table: RateTable, ticket: FetchTicket },
    Failed { base: CurrencyCode, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    RatesPending,
    RatesReady,
    Stale,
    Failed,
}

/// What happened to a finished fetch when it was handed back to the state.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchApplied {
    Ready,
    Failed(ExchangeError),
    /// A newer fetch was issued after this one; the result was dropped.
    Discarded,
}

/// Base, target and amount as chosen by the user, plus the rate table that
/// belongs to the chosen base.
#[derive(Debug)]
pub struct SelectionState {
    base: Option<CurrencyCode>,
    target: Option<CurrencyCode>,
    amount: String,
    rates: RatesStatus,
    policy: RefreshPolicy,
    last_ticket: u64,
}

impl SelectionState {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            base: None,
            target: None,
            amount: String::new(),
            rates: RatesStatus::Idle,
            policy,
            last_ticket: 0,
        }
    }

    pub fn base(&self) -> Option<&CurrencyCode> {
        self.base.as_ref()
    }

    pub fn target(&self) -> Option<&CurrencyCode> {
        self.target.as_ref()
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn status(&self) -> &RatesStatus {
        &self.rates
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn phase(&self) -> Phase {
        match self.rates {
            RatesStatus::Idle => Phase::Idle,
            RatesStatus::Pending { .. } => Phase::RatesPending,
            RatesStatus::Ready { .. } => Phase::RatesReady,
            RatesStatus::Stale { .. } => Phase::Stale,
            RatesStatus::Failed { .. } => Phase::Failed,
        }
    }

    /// The fetch whose result is still awaited, if any.
    pub fn outstanding(&self) -> Option<&FetchTicket> {
        match &self.rates {
            RatesStatus::Pending { ticket } | RatesStatus::Stale { ticket, .. } => Some(ticket),
            _ => None,
        }
    }

    /// Rate table for the current base, if one has arrived.
    pub fn table(&self) -> Option<&RateTable> {
        match &self.rates {
            RatesStatus::Ready { table } | RatesStatus::Stale { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Choosing a different base drops the old table and asks for a new one.
    pub fn select_base(&mut self, base: CurrencyCode) -> Option<FetchTicket> {
        if self.base.as_ref() == Some(&base) {
            return match self.rates {
                RatesStatus::Failed { .. } => self.retry(),
                _ => None,
            };
        }

        self.base = Some(base.clone());
        let ticket = self.issue(base);
        self.rates = RatesStatus::Pending {
            ticket: ticket.clone(),
        };
        Some(ticket)
    }

    pub fn select_target(&mut self, target: CurrencyCode) -> Option<FetchTicket> {
        if self.target.as_ref() == Some(&target) {
            return None;
        }
        self.target = Some(target);
        self.edited()
    }

    pub fn set_amount(&mut self, amount: &str) -> Option<FetchTicket> {
        if self.amount == amount {
            return None;
        }
        self.amount = amount.to_string();
        self.edited()
    }

    /// Ask again for the current base, unless a fetch is already in flight.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        let base = self.base.clone()?;
        match &self.rates {
            RatesStatus::Pending { .. } | RatesStatus::Stale { .. } => None,
            RatesStatus::Ready { table } => {
                let table = table.clone();
                let ticket = self.issue(base);
                self.rates = RatesStatus::Stale {
                    table,
                    ticket: ticket.clone(),
                };
                Some(ticket)
            }
            RatesStatus::Idle | RatesStatus::Failed { .. } => {
                let ticket = self.issue(base);
                self.rates = RatesStatus::Pending {
                    ticket: ticket.clone(),
                };
                Some(ticket)
            }
        }
    }

    /// Hand a finished fetch back. Results for anything but the outstanding
    /// ticket are discarded, whatever order they arrive in.
    pub fn apply(&mut self, ticket: &FetchTicket, result: Result<RateTable>) -> FetchApplied {
        if self.outstanding() != Some(ticket) {
            return FetchApplied::Discarded;
        }

        match result {
            Ok(table) if table.base() == &ticket.base => {
                self.rates = RatesStatus::Ready { table };
                FetchApplied::Ready
            }
            Ok(table) => {
                let err = ExchangeError::fetch_failed(
                    &ticket.base,
                    format!("received rates for {}", table.base()),
                );
                self.fail(&ticket.base, &err);
                FetchApplied::Failed(err)
            }
            Err(err) => {
                self.fail(&ticket.base, &err);
                FetchApplied::Failed(err)
            }
        }
    }

    /// Convert the entered amount with the table for the current base.
    pub fn submit(&self) -> Result<Conversion> {
        let base = self.base.as_ref().ok_or_else(|| {
            ExchangeError::InvalidSelection("choose a currency to convert from".to_string())
        })?;
        let target = self.target.as_ref().ok_or_else(|| {
            ExchangeError::InvalidSelection("choose a currency to convert to".to_string())
        })?;

        let table = match &self.rates {
            RatesStatus::Ready { table } | RatesStatus::Stale { table, .. } => table,
            RatesStatus::Failed { reason, .. } => {
                return Err(ExchangeError::InvalidSelection(format!(
                    "rates for {base} are unavailable: {reason}"
                )))
            }
            RatesStatus::Idle | RatesStatus::Pending { .. } => {
                return Err(ExchangeError::InvalidSelection(format!(
                    "rates for {base} have not been loaded yet"
                )))
            }
        };

        let amount = conversion::parse_amount(&self.amount)?;
        conversion::convert(table, target, amount)
    }

    fn edited(&mut self) -> Option<FetchTicket> {
        let base = self.base.clone()?;
        match (&self.rates, self.policy) {
            (RatesStatus::Ready { table }, RefreshPolicy::OnEdit) => {
                let table = table.clone();
                let ticket = self.issue(base);
                self.rates = RatesStatus::Stale {
                    table,
                    ticket: ticket.clone(),
                };
                Some(ticket)
            }
            (RatesStatus::Failed { .. }, RefreshPolicy::OnEdit) => self.retry(),
            _ => None,
        }
    }

    fn fail(&mut self, base: &CurrencyCode, err: &ExchangeError) {
        let reason = match err {
            ExchangeError::FetchFailed { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        self.rates = RatesStatus::Failed {
            base: base.clone(),
            reason,
        };
    }

    fn issue(&mut self, base: CurrencyCode) -> FetchTicket {
        self.last_ticket += 1;
        FetchTicket {
            id: self.last_ticket,
            base,
        }
    }
}

// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::api::RateFetcher;
use crate::catalog::CurrencyCatalog;
use crate::conversion::Conversion;
use crate::error::{ExchangeError, Result};
use crate::models::{CurrencyCode, RateTable};
use crate::state::{FetchApplied, FetchTicket, Phase, RatesStatus, RefreshPolicy, SelectionState};
use crate::theme::ThemePreference;

/// A finished fetch on its way back to the view.
#[derive(Debug)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<RateTable>,
}

/// Owns everything the converter screen shows. Fetches run on spawned tokio
/// tasks and report back through a channel, so the view itself is only
/// touched from one place.
pub struct ConverterView {
    catalog: CurrencyCatalog,
    fetcher: Arc<dyn RateFetcher>,
    state: SelectionState,
    theme: Option<ThemePreference>,
    result: Option<Conversion>,
    error: Option<ExchangeError>,
    tx: UnboundedSender<FetchOutcome>,
    rx: UnboundedReceiver<FetchOutcome>,
}

impl ConverterView {
    pub fn new(
        catalog: CurrencyCatalog,
        fetcher: Arc<dyn RateFetcher>,
        policy: RefreshPolicy,
    ) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            catalog,
            fetcher,
            state: SelectionState::new(policy),
            theme: None,
            result: None,
            error: None,
            tx,
            rx,
        }
    }

    pub fn with_theme(mut self, theme: ThemePreference) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn catalog(&self) -> &CurrencyCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Result of the last successful submit.
    pub fn result(&self) -> Option<&Conversion> {
        self.result.as_ref()
    }

    /// Last problem worth showing to the user.
    pub fn error(&self) -> Option<&ExchangeError> {
        self.error.as_ref()
    }

    pub fn dark_mode(&self) -> bool {
        self.theme.as_ref().is_some_and(ThemePreference::dark_mode)
    }

    pub fn toggle_theme(&mut self) -> anyhow::Result<bool> {
        match self.theme.as_mut() {
            Some(theme) => theme.toggle(),
            None => anyhow::bail!("no theme preference loaded"),
        }
    }

    pub fn select_base(&mut self, code: &str) -> Result<()> {
        let code = self.lookup(code)?;
        let changed = self.state.base() != Some(&code);
        let ticket = self.state.select_base(code);
        if changed {
            // A result computed against another base no longer holds
            self.result = None;
        }
        self.dispatch(ticket);
        Ok(())
    }

    pub fn select_target(&mut self, code: &str) -> Result<()> {
        let code = self.lookup(code)?;
        let ticket = self.state.select_target(code);
        self.dispatch(ticket);
        Ok(())
    }

    /// Raw amount text, validated only on submit.
    pub fn set_amount(&mut self, text: &str) {
        let ticket = self.state.set_amount(text);
        self.dispatch(ticket);
    }

    pub fn retry(&mut self) {
        let ticket = self.state.retry();
        self.dispatch(ticket);
    }

    pub fn submit(&mut self) -> Result<&Conversion> {
        match self.state.submit() {
            Ok(conversion) => {
                log::info!("Converted {}", conversion);
                self.error = None;
                let conversion = self.result.insert(conversion);
                Ok(&*conversion)
            }
            Err(e) => {
                log::debug!("Submit rejected: {}", e);
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Apply every fetch that has finished so far, without waiting.
    pub fn poll_fetches(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.rx.try_recv() {
            self.apply(outcome);
            applied += 1;
        }
        applied
    }

    /// Wait for the next finished fetch and apply it.
    pub async fn next_fetch(&mut self) -> Option<FetchApplied> {
        let outcome = self.rx.recv().await?;
        Some(self.apply(outcome))
    }

    /// Wait until the outstanding fetch, if any, has been applied and
    /// return the table for the current base.
    pub async fn wait_for_rates(&mut self) -> Result<&RateTable> {
        while self.state.outstanding().is_some() {
            if self.next_fetch().await.is_none() {
                break;
            }
        }

        match self.state.status() {
            RatesStatus::Ready { table } | RatesStatus::Stale { table, .. } => Ok(table),
            RatesStatus::Failed { base, reason } => {
                Err(ExchangeError::fetch_failed(base, reason.clone()))
            }
            RatesStatus::Idle | RatesStatus::Pending { .. } => Err(
                ExchangeError::InvalidSelection("choose a currency to convert from".to_string()),
            ),
        }
    }

    /// Resolve a picked code. A rejected pick is kept as the current error,
    /// an accepted one clears an earlier selection error.
    fn lookup(&mut self, code: &str) -> Result<CurrencyCode> {
        let resolved = CurrencyCode::new(code)
            .map_err(|e| ExchangeError::InvalidSelection(e.to_string()))
            .and_then(|code| {
                if self.catalog.contains(&code) {
                    Ok(code)
                } else {
                    Err(ExchangeError::InvalidSelection(format!(
                        "{code} is not a supported currency"
                    )))
                }
            });

        match &resolved {
            Ok(_) => {
                if matches!(self.error, Some(ExchangeError::InvalidSelection(_))) {
                    self.error = None;
                }
            }
            Err(e) => self.error = Some(e.clone()),
        }
        resolved
    }

    fn dispatch(&self, ticket: Option<FetchTicket>) {
        let Some(ticket) = ticket else {
            return;
        };

        log::debug!("Fetching rates for {} (request {})", ticket.base, ticket.id);
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(&ticket.base).await;
            if tx.send(FetchOutcome { ticket, result }).is_err() {
                log::debug!("Converter view closed before rates arrived");
            }
        });
    }

    fn apply(&mut self, outcome: FetchOutcome) -> FetchApplied {
        let FetchOutcome { ticket, result } = outcome;
        let applied = self.state.apply(&ticket, result);
        match &applied {
            FetchApplied::Ready => {
                log::info!("Rates for {} ready (request {})", ticket.base, ticket.id);
                if matches!(self.error, Some(ExchangeError::FetchFailed { .. })) {
                    self.error = None;
                }
            }
            FetchApplied::Failed(e) => {
                log::warn!("{}", e);
                self.error = Some(e.clone());
            }
            FetchApplied::Discarded => {
                log::debug!(
                    "Discarding rates for {} (request {}), superseded",
                    ticket.base,
                    ticket.id
                );
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockRateFetcher;
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn code(c: &str) -> CurrencyCode {
        CurrencyCode::new(c).unwrap()
    }

    fn catalog() -> CurrencyCatalog {
        CurrencyCatalog::from_codes(["USD", "EUR", "JPY"].map(code))
    }

    fn table(base: &str, rates: &[(&str, f64)]) -> RateTable {
        RateTable::new(code(base), rates.iter().copied()).unwrap()
    }

    /// Each base answers only when the test says so.
    struct ScriptedFetcher {
        pending: Mutex<HashMap<CurrencyCode, oneshot::Receiver<Result<RateTable>>>>,
    }

    impl ScriptedFetcher {
        fn new() -> Self {
            Self {
                pending: Mutex::new(HashMap::new()),
            }
        }

        fn expect(&self, base: &str) -> oneshot::Sender<Result<RateTable>> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().insert(code(base), rx);
            tx
        }
    }

    #[async_trait::async_trait]
    impl RateFetcher for ScriptedFetcher {
        async fn fetch(&self, base: &CurrencyCode) -> Result<RateTable> {
            let rx = self.pending.lock().unwrap().remove(base);
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ExchangeError::fetch_failed(base, "dropped"))),
                None => Err(ExchangeError::fetch_failed(base, "unexpected fetch")),
            }
        }
    }

    #[tokio::test]
    async fn test_end_to_end_conversion() {
        let mut fetcher = MockRateFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|base| base.as_str() == "USD")
            .times(1)
            .returning(|_| Ok(table("USD", &[("EUR", 0.9), ("JPY", 150.0)])));

        let mut view = ConverterView::new(catalog(), Arc::new(fetcher), RefreshPolicy::BaseOnly);
        view.select_base("USD").unwrap();
        view.select_target("JPY").unwrap();
        view.set_amount("10");
        view.wait_for_rates().await.unwrap();

        let result = view.submit().unwrap();
        assert_relative_eq!(result.rounded(), 1500.0);
        assert_eq!(format!("{:.2}", result.rounded()), "1500.00");
        assert!(view.error().is_none());
    }

    #[tokio::test]
    async fn test_submit_before_fetch_resolves_is_invalid_selection() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let _usd = fetcher.expect("USD");

        let mut view = ConverterView::new(catalog(), fetcher.clone(), RefreshPolicy::OnEdit);
        view.select_base("USD").unwrap();
        view.select_target("JPY").unwrap();
        view.set_amount("10");

        assert!(matches!(view.submit(), Err(ExchangeError::InvalidSelection(_))));
        assert!(view.result().is_none());
        assert!(matches!(view.error(), Some(ExchangeError::InvalidSelection(_))));
    }

    #[tokio::test]
    async fn test_latest_base_wins_when_old_fetch_resolves_late() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let usd = fetcher.expect("USD");
        let eur = fetcher.expect("EUR");

        let mut view = ConverterView::new(catalog(), fetcher.clone(), RefreshPolicy::OnEdit);
        view.select_base("USD").unwrap();
        view.select_base("EUR").unwrap();

        eur.send(Ok(table("EUR", &[("JPY", 160.0)]))).unwrap();
        assert_eq!(view.next_fetch().await, Some(FetchApplied::Ready));

        usd.send(Ok(table("USD", &[("JPY", 150.0)]))).unwrap();
        assert_eq!(view.next_fetch().await, Some(FetchApplied::Discarded));

        assert_eq!(view.phase(), Phase::RatesReady);
        assert_eq!(view.state().table().unwrap().base(), &code("EUR"));
    }

    #[tokio::test]
    async fn test_latest_base_wins_when_old_fetch_resolves_first() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let usd = fetcher.expect("USD");
        let eur = fetcher.expect("EUR");

        let mut view = ConverterView::new(catalog(), fetcher.clone(), RefreshPolicy::OnEdit);
        view.select_base("USD").unwrap();
        view.select_base("EUR").unwrap();

        usd.send(Ok(table("USD", &[("JPY", 150.0)]))).unwrap();
        assert_eq!(view.next_fetch().await, Some(FetchApplied::Discarded));
        assert_eq!(view.phase(), Phase::RatesPending);

        eur.send(Ok(table("EUR", &[("JPY", 160.0)]))).unwrap();
        let rates = view.wait_for_rates().await.unwrap();
        assert_eq!(rates.base(), &code("EUR"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_surfaced() {
        let mut fetcher = MockRateFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|base| Err(ExchangeError::fetch_failed(base, "connection refused")));

        let mut view = ConverterView::new(catalog(), Arc::new(fetcher), RefreshPolicy::BaseOnly);
        view.select_base("EUR").unwrap();

        let err = view.wait_for_rates().await.unwrap_err();
        assert!(matches!(err, ExchangeError::FetchFailed { .. }));
        assert_eq!(view.phase(), Phase::Failed);
        assert!(matches!(view.error(), Some(ExchangeError::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let first = fetcher.expect("USD");

        let mut view = ConverterView::new(catalog(), fetcher.clone(), RefreshPolicy::BaseOnly);
        view.select_base("USD").unwrap();
        first
            .send(Err(ExchangeError::fetch_failed(&code("USD"), "timeout")))
            .unwrap();
        assert!(view.wait_for_rates().await.is_err());

        let second = fetcher.expect("USD");
        view.retry();
        second.send(Ok(table("USD", &[("EUR", 0.9)]))).unwrap();
        view.wait_for_rates().await.unwrap();
        assert_eq!(view.phase(), Phase::RatesReady);
        assert!(view.error().is_none());
    }

    #[tokio::test]
    async fn test_unknown_currency_is_rejected_without_fetching() {
        let mut fetcher = MockRateFetcher::new();
        fetcher.expect_fetch().times(0);

        let mut view = ConverterView::new(catalog(), Arc::new(fetcher), RefreshPolicy::OnEdit);
        assert!(matches!(
            view.select_base("GBP"),
            Err(ExchangeError::InvalidSelection(_))
        ));
        assert!(matches!(
            view.select_target(""),
            Err(ExchangeError::InvalidSelection(_))
        ));
        assert_eq!(view.phase(), Phase::Idle);
        assert!(matches!(view.error(), Some(ExchangeError::InvalidSelection(_))));
    }

    #[tokio::test]
    async fn test_valid_pick_clears_rejected_pick() {
        let mut fetcher = MockRateFetcher::new();
        fetcher.expect_fetch().times(0);

        let mut view = ConverterView::new(catalog(), Arc::new(fetcher), RefreshPolicy::OnEdit);
        assert!(view.select_target("XXX").is_err());
        assert!(view.error().is_some());

        view.select_target("EUR").unwrap();
        assert!(view.error().is_none());
    }

    #[tokio::test]
    async fn test_changing_base_clears_previous_result() {
        let mut fetcher = MockRateFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|base| Ok(table(base.as_str(), &[("USD", 1.1), ("EUR", 0.9), ("JPY", 150.0)])));

        let mut view = ConverterView::new(catalog(), Arc::new(fetcher), RefreshPolicy::BaseOnly);
        view.select_base("USD").unwrap();
        view.select_target("EUR").unwrap();
        view.set_amount("1");
        view.wait_for_rates().await.unwrap();
        view.submit().unwrap();
        assert!(view.result().is_some());

        view.select_base("JPY").unwrap();
        assert!(view.result().is_none());
    }
}

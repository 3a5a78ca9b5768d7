//! Fastest-success race across every configured exchange.
//!
//! Each exchange gets its own task. Outcomes flow into a completion queue sized
//! to the exchange count, so a task never waits to publish. The first success
//! cancels the shared scope and is returned without waiting for the rest; late
//! outcomes are discarded by their own task. Only when every exchange has
//! failed does the caller see an error, carrying one entry per exchange.

use crate::price_provider::PriceProvider;
use spot_oracle_common::{
    AggregateFailure, Exchange, ExchangeDirectory, FetchOutcome, Quote, RaceError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Cancellation owned by one race
pub struct CancelScope {
    tx: watch::Sender<bool>,
}

impl CancelScope {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

/// Task-side view of a `CancelScope`.
///
/// Reports cancelled once the scope is cancelled or dropped.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }
}

/// Race coordinator
pub struct PriceRace {
    exchanges: Arc<[Exchange]>,
    provider: Arc<dyn PriceProvider>,
    request_timeout: Duration,
}

impl PriceRace {
    pub fn new(
        directory: &ExchangeDirectory,
        provider: Arc<dyn PriceProvider>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            exchanges: directory.exchanges().into(),
            provider,
            request_timeout,
        }
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Returns the first successful quote for `pair`.
    pub async fn race(&self, pair: &str) -> Result<Quote, RaceError> {
        let span = info_span!("race", pair = %pair, exchanges = self.exchanges.len());
        self.run(pair).instrument(span).await
    }

    async fn run(&self, pair: &str) -> Result<Quote, RaceError> {
        let started = Instant::now();
        let deadline = started + self.request_timeout;
        let scope = CancelScope::new();
        let (tx, mut rx) = mpsc::channel::<FetchOutcome>(self.exchanges.len().max(1));

        for exchange in self.exchanges.iter().cloned() {
            let provider = Arc::clone(&self.provider);
            let token = scope.token();
            let tx = tx.clone();
            let pair = pair.to_string();

            tokio::spawn(
                async move {
                    let outcome = provider.fetch_price(&exchange, &pair, deadline).await;

                    if token.is_cancelled() {
                        debug!("Discarding late outcome from {}", exchange.id);
                        return;
                    }

                    // capacity equals the exchange count, so this only fails once the race is gone
                    if tx.try_send(outcome).is_err() {
                        debug!("Race for {} already finished, dropping outcome", exchange.id);
                    }
                }
                .in_current_span(),
            );
        }
        drop(tx);

        let mut failures = Vec::with_capacity(self.exchanges.len());
        let mut all_timed_out = true;

        while let Some(outcome) = rx.recv().await {
            match outcome.result {
                Ok(price) => {
                    scope.cancel();
                    info!(
                        "Got price {:.2} from {} in {:?}",
                        price,
                        outcome.source,
                        started.elapsed()
                    );
                    return Ok(Quote::new(price, outcome.source));
                }
                Err(ref e) => {
                    warn!("Error from {}: {}", outcome.source, e);
                    all_timed_out &= e.is_timeout();
                    failures.push(outcome.describe());
                }
            }

            if failures.len() == self.exchanges.len() {
                break;
            }
        }

        if failures.len() < self.exchanges.len() {
            error!(
                "Only {} of {} exchanges reported back",
                failures.len(),
                self.exchanges.len()
            );
        }

        let err = if all_timed_out && !failures.is_empty() {
            RaceError::DeadlineExceeded(AggregateFailure::all_timed_out(failures))
        } else {
            RaceError::AllFailed(AggregateFailure::all_failed(failures))
        };
        error!("{}", err);
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_provider::MockPriceProvider;
    use spot_oracle_common::{ExchangeId, FetchError};

    fn directory() -> ExchangeDirectory {
        ExchangeDirectory::standard()
    }

    #[test]
    fn test_token_follows_scope() {
        let scope = CancelScope::new();
        let token = scope.token();
        assert!(!token.is_cancelled());

        scope.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_token_cancelled_when_scope_dropped() {
        let scope = CancelScope::new();
        let token = scope.token();
        drop(scope);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_single_success_wins() {
        let mut provider = MockPriceProvider::new();
        provider
            .expect_fetch_price()
            .times(1..=3)
            .returning(|exchange, _, _| match exchange.id {
                ExchangeId::Bybit => FetchOutcome::success(ExchangeId::Bybit, 42.5),
                id => FetchOutcome::failure(id, FetchError::EmptyResult),
            });

        let race = PriceRace::new(&directory(), Arc::new(provider), Duration::from_secs(5));
        let quote = race.race("BTCUSDT").await.unwrap();

        assert_eq!(quote.source, ExchangeId::Bybit);
        assert_eq!(quote.price, 42.5);
    }

    #[tokio::test]
    async fn test_all_failures_are_aggregated() {
        let mut provider = MockPriceProvider::new();
        provider
            .expect_fetch_price()
            .times(3)
            .returning(|exchange, _, _| {
                FetchOutcome::failure(
                    exchange.id,
                    FetchError::Exchange {
                        code: "400".to_string(),
                        msg: "Bad Request".to_string(),
                    },
                )
            });

        let race = PriceRace::new(&directory(), Arc::new(provider), Duration::from_secs(5));
        let err = race.race("BTCUSDT").await.unwrap_err();

        let failure = match err {
            RaceError::AllFailed(failure) => failure,
            other => panic!("unexpected error: {:?}", other),
        };
        assert_eq!(failure.message, "all exchanges failed");
        assert_eq!(failure.errors.len(), 3);
        for id in ExchangeId::ALL {
            let expected = format!("{}: code=400, msg=Bad Request", id);
            assert!(failure.errors.contains(&expected), "missing {}", expected);
        }
    }

    #[tokio::test]
    async fn test_every_timeout_is_deadline_exceeded() {
        let mut provider = MockPriceProvider::new();
        provider
            .expect_fetch_price()
            .times(3)
            .returning(|exchange, _, _| FetchOutcome::failure(exchange.id, FetchError::Timeout));

        let race = PriceRace::new(&directory(), Arc::new(provider), Duration::from_millis(50));
        let err = race.race("BTCUSDT").await.unwrap_err();

        assert!(matches!(err, RaceError::DeadlineExceeded(_)));
        assert_eq!(err.failure().errors.len(), 3);
        assert_eq!(err.failure().message, "all exchanges timed out");
    }

    #[tokio::test]
    async fn test_mixed_timeouts_are_plain_failure() {
        let mut provider = MockPriceProvider::new();
        provider
            .expect_fetch_price()
            .times(3)
            .returning(|exchange, _, _| match exchange.id {
                ExchangeId::Binance => FetchOutcome::failure(ExchangeId::Binance, FetchError::EmptyResult),
                id => FetchOutcome::failure(id, FetchError::Timeout),
            });

        let race = PriceRace::new(&directory(), Arc::new(provider), Duration::from_millis(50));
        let err = race.race("BTCUSDT").await.unwrap_err();

        assert!(matches!(err, RaceError::AllFailed(_)));
        assert_eq!(err.failure().errors.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let provider = MockPriceProvider::new();
        let race = PriceRace::new(
            &ExchangeDirectory::from_exchanges(Vec::new()),
            Arc::new(provider),
            Duration::from_secs(1),
        );

        let err = race.race("BTCUSDT").await.unwrap_err();
        assert_eq!(err, RaceError::AllFailed(AggregateFailure::all_failed(Vec::new())));
    }

    #[tokio::test]
    async fn test_deadline_is_shared_by_every_call() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = Arc::clone(&seen);

        let mut provider = MockPriceProvider::new();
        provider
            .expect_fetch_price()
            .times(3)
            .returning(move |exchange, _, deadline| {
                recorded.lock().unwrap().push(deadline);
                FetchOutcome::failure(exchange.id, FetchError::EmptyResult)
            });

        let before = Instant::now();
        let race = PriceRace::new(&directory(), Arc::new(provider), Duration::from_secs(2));
        assert!(race.race("BTCUSDT").await.is_err());

        let deadlines = seen.lock().unwrap().clone();
        assert_eq!(deadlines.len(), 3);
        assert!(deadlines.iter().all(|d| *d == deadlines[0]));
        assert!(deadlines[0] >= before + Duration::from_secs(2));
    }
}

use crate::binance::BinanceFormat;
use crate::bitget::BitgetFormat;
use crate::bybit::BybitFormat;
use crate::transport::{HttpTransport, RawResponse};
use async_trait::async_trait;
use spot_oracle_common::{Exchange, ExchangeId, FetchError, FetchOutcome};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

/// Price source interface used by the race coordinator
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Never fails past its boundary: every failure becomes the error side of the outcome.
    async fn fetch_price(&self, exchange: &Exchange, pair: &str, deadline: Instant)
        -> FetchOutcome;
}

/// Exchange-specific response envelopes
pub trait WireFormat: Send + Sync {
    /// Decodes a 2xx body into a price.
    fn decode_price(&self, body: &str) -> Result<f64, FetchError>;

    /// Decodes a non-2xx body into the exchange's native error, if it is one.
    fn decode_error(&self, body: &str) -> Option<FetchError>;
}

pub fn wire_format(id: ExchangeId) -> &'static dyn WireFormat {
    match id {
        ExchangeId::Binance => &BinanceFormat,
        ExchangeId::Bybit => &BybitFormat,
        ExchangeId::Bitget => &BitgetFormat,
    }
}

/// Parses a decimal price string as the exchange wrote it.
pub fn parse_price(raw: &str) -> Result<f64, FetchError> {
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(FetchError::InvalidPrice(raw.to_string())),
    }
}

/// Maps a raw response to a price or the exchange's error
pub fn interpret_response(id: ExchangeId, response: &RawResponse) -> Result<f64, FetchError> {
    let format = wire_format(id);

    if !response.is_success() {
        return Err(format
            .decode_error(&response.body)
            .unwrap_or_else(|| FetchError::UnexpectedStatus {
                status: response.status,
                body: response.body.clone(),
            }));
    }

    format.decode_price(&response.body)
}

/// Source adapter: builds the ticker request and decodes the answer
pub struct SourceAdapter {
    transport: Arc<dyn HttpTransport>,
}

impl SourceAdapter {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    async fn fetch_once(
        &self,
        exchange: &Exchange,
        pair: &str,
        deadline: Instant,
    ) -> Result<f64, FetchError> {
        let url = exchange.price_url(pair);
        debug!("Requesting {} price for {}: {}", exchange.id, pair, url);

        let response = self.transport.get(&url, deadline).await?;
        interpret_response(exchange.id, &response)
    }
}

#[async_trait]
impl PriceProvider for SourceAdapter {
    async fn fetch_price(
        &self,
        exchange: &Exchange,
        pair: &str,
        deadline: Instant,
    ) -> FetchOutcome {
        match self.fetch_once(exchange, pair, deadline).await {
            Ok(price) => {
                info!("Got {} price {:.2} from {}", pair, price, exchange.id);
                FetchOutcome::success(exchange.id, price)
            }
            Err(e) => {
                warn!("Failed to fetch {} from {}: {}", pair, exchange.id, e);
                FetchOutcome::failure(exchange.id, e)
            }
        }
    }
}

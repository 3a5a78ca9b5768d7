use crate::error::FetchError;
use crate::exchange::ExchangeId;
use serde::Serialize;

/// Winning price of a race
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub price: f64,
    pub source: ExchangeId,
}

impl Quote {
    pub fn new(price: f64, source: ExchangeId) -> Self {
        Self { price, source }
    }
}

/// Result of asking one exchange for a price
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub source: ExchangeId,
    pub result: Result<f64, FetchError>,
}

impl FetchOutcome {
    pub fn success(source: ExchangeId, price: f64) -> Self {
        Self {
            source,
            result: Ok(price),
        }
    }

    pub fn failure(source: ExchangeId, error: FetchError) -> Self {
        Self {
            source,
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Entry used in an aggregate failure, e.g. `bybit: code=10001, msg=Not supported symbols`
    pub fn describe(&self) -> String {
        match &self.result {
            Ok(price) => format!("{}: price={}", self.source, price),
            Err(err) => format!("{}: {}", self.source, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_description() {
        let outcome = FetchOutcome::failure(
            ExchangeId::Bitget,
            FetchError::Exchange {
                code: "40034".to_string(),
                msg: "Parameter does not exist".to_string(),
            },
        );

        assert!(!outcome.is_success());
        assert_eq!(
            outcome.describe(),
            "bitget: code=40034, msg=Parameter does not exist"
        );
    }

    #[test]
    fn test_quote_serializes_source_name() {
        let quote = Quote::new(99999.99, ExchangeId::Binance);
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["source"], "binance");
        assert_eq!(json["price"], 99999.99);
    }
}

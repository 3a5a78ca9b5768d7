use crate::price_provider::{parse_price, WireFormat};
use serde::Deserialize;
use spot_oracle_common::FetchError;

/// `GET api/v3/ticker/price` success body
#[derive(Debug, Deserialize)]
pub struct BinanceTicker {
    #[serde(default)]
    pub symbol: String,
    pub price: String,
}

/// Binance error body, e.g. `{"code":-1121,"msg":"Invalid symbol."}`
#[derive(Debug, Deserialize)]
pub struct BinanceError {
    pub code: i64,
    pub msg: String,
}

pub struct BinanceFormat;

impl WireFormat for BinanceFormat {
    fn decode_price(&self, body: &str) -> Result<f64, FetchError> {
        let ticker: BinanceTicker =
            serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
        parse_price(&ticker.price)
    }

    fn decode_error(&self, body: &str) -> Option<FetchError> {
        let err: BinanceError = serde_json::from_str(body).ok()?;
        Some(FetchError::Exchange {
            code: err.code.to_string(),
            msg: err.msg,
        })
    }
}

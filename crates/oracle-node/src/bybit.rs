use crate::price_provider::{parse_price, WireFormat};
use serde::Deserialize;
use spot_oracle_common::FetchError;

/// `GET v5/market/tickers?category=spot` body
#[derive(Debug, Deserialize)]
pub struct BybitTickers {
    #[serde(rename = "retCode", default)]
    pub ret_code: i64,
    #[serde(rename = "retMsg", default)]
    pub ret_msg: String,
    #[serde(default)]
    pub result: Option<BybitResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BybitResult {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize)]
pub struct BybitTicker {
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "lastPrice")]
    pub last_price: String,
}

/// Bybit reports errors with the same `retCode`/`retMsg` pair on every status
#[derive(Debug, Deserialize)]
pub struct BybitError {
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg")]
    pub ret_msg: String,
}

pub struct BybitFormat;

impl WireFormat for BybitFormat {
    fn decode_price(&self, body: &str) -> Result<f64, FetchError> {
        let tickers: BybitTickers =
            serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

        if tickers.ret_code != 0 {
            return Err(FetchError::Exchange {
                code: tickers.ret_code.to_string(),
                msg: tickers.ret_msg,
            });
        }

        let ticker = tickers
            .result
            .and_then(|result| result.list.into_iter().next())
            .ok_or(FetchError::EmptyResult)?;

        parse_price(&ticker.last_price)
    }

    fn decode_error(&self, body: &str) -> Option<FetchError> {
        let err: BybitError = serde_json::from_str(body).ok()?;
        Some(FetchError::Exchange {
            code: err.ret_code.to_string(),
            msg: err.ret_msg,
        })
    }
}

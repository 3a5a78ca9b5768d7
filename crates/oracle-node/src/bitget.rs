use crate::price_provider::{parse_price, WireFormat};
use serde::Deserialize;
use spot_oracle_common::FetchError;

const SUCCESS_CODE: &str = "00000";

/// `GET api/v2/spot/market/tickers` body
#[derive(Debug, Deserialize)]
pub struct BitgetTickers {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Option<Vec<BitgetTicker>>,
}

#[derive(Debug, Deserialize)]
pub struct BitgetTicker {
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "lastPr")]
    pub last_pr: String,
}

/// Bitget error body, e.g. `{"code":"40034","msg":"Parameter does not exist","data":null}`
#[derive(Debug, Deserialize)]
pub struct BitgetError {
    pub code: String,
    pub msg: String,
}

pub struct BitgetFormat;

impl WireFormat for BitgetFormat {
    fn decode_price(&self, body: &str) -> Result<f64, FetchError> {
        let tickers: BitgetTickers =
            serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

        if !tickers.code.is_empty() && tickers.code != SUCCESS_CODE {
            return Err(FetchError::Exchange {
                code: tickers.code,
                msg: tickers.msg,
            });
        }

        let ticker = tickers
            .data
            .and_then(|data| data.into_iter().next())
            .ok_or(FetchError::EmptyResult)?;

        parse_price(&ticker.last_pr)
    }

    fn decode_error(&self, body: &str) -> Option<FetchError> {
        let err: BitgetError = serde_json::from_str(body).ok()?;
        Some(FetchError::Exchange {
            code: err.code,
            msg: err.msg,
        })
    }
}

//! Scripted exchange doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use spot_oracle_common::{ExchangeDirectory, FetchError};
use spot_oracle_node::{HttpTransport, PriceRace, RawResponse, SourceAdapter};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};

pub const BINANCE_OK: &str = r#"{"symbol":"BTCUSDT","price":"99999.99"}"#;
pub const BYBIT_OK: &str = r#"{"retCode":0,"retMsg":"OK","result":{"category":"spot","list":[{"symbol":"BTCUSDT","lastPrice":"99999.98"}]}}"#;
pub const BITGET_OK: &str = r#"{"code":"00000","msg":"success","data":[{"symbol":"BTCUSDT","lastPr":"99999.97"}]}"#;

pub const BINANCE_INVALID: &str = r#"{"code":-1100,"msg":"Illegal characters found in parameter 'symbol'; legal range is '^[A-Z0-9_.]{1,20}$'."}"#;
pub const BYBIT_INVALID: &str = r#"{"retCode":10001,"retMsg":"Not supported symbols","result":{}}"#;
pub const BITGET_INVALID: &str = r#"{"code":"40034","msg":"Parameter does not exist","data":null}"#;

#[derive(Clone)]
struct Script {
    needle: &'static str,
    delay: Duration,
    reply: Result<RawResponse, FetchError>,
}

/// Answers by matching a substring of the requested URL, after a per-route delay.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Vec<Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, needle: &'static str, delay_ms: u64, status: u16, body: &str) -> Self {
        self.scripts.push(Script {
            needle,
            delay: Duration::from_millis(delay_ms),
            reply: Ok(RawResponse::new(status, body)),
        });
        self
    }

    pub fn fail(mut self, needle: &'static str, delay_ms: u64, error: FetchError) -> Self {
        self.scripts.push(Script {
            needle,
            delay: Duration::from_millis(delay_ms),
            reply: Err(error),
        });
        self
    }

    /// Every exchange answers 200 with its own price after the given delays.
    pub fn all_ok(binance_ms: u64, bybit_ms: u64, bitget_ms: u64) -> Self {
        Self::new()
            .reply("binance", binance_ms, 200, BINANCE_OK)
            .reply("bybit", bybit_ms, 200, BYBIT_OK)
            .reply("bitget", bitget_ms, 200, BITGET_OK)
    }

    /// Every exchange rejects the pair with its native error envelope.
    pub fn all_invalid_pair() -> Self {
        Self::new()
            .reply("binance", 5, 400, BINANCE_INVALID)
            .reply("bybit", 10, 400, BYBIT_INVALID)
            .reply("bitget", 15, 400, BITGET_INVALID)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, deadline: Instant) -> Result<RawResponse, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        let script = self
            .scripts
            .iter()
            .find(|script| url.contains(script.needle))
            .cloned()
            .ok_or_else(|| FetchError::Transport(format!("no script for {}", url)))?;

        timeout_at(deadline, sleep(script.delay))
            .await
            .map_err(|_| FetchError::Timeout)?;

        script.reply
    }
}

pub fn race_over(transport: Arc<ScriptedTransport>, timeout: Duration) -> PriceRace {
    PriceRace::new(
        &ExchangeDirectory::standard(),
        Arc::new(SourceAdapter::new(transport)),
        timeout,
    )
}

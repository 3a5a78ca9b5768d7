use crate::config::ExchangesConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

/// Supported spot exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ExchangeId {
    Binance,
    Bybit,
    Bitget,
}

impl ExchangeId {
    pub const ALL: [ExchangeId; 3] = [ExchangeId::Binance, ExchangeId::Bybit, ExchangeId::Bitget];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "binance",
            ExchangeId::Bybit => "bybit",
            ExchangeId::Bitget => "bitget",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "https://api.binance.com",
            ExchangeId::Bybit => "https://api.bybit.com",
            ExchangeId::Bitget => "https://api.bitget.com",
        }
    }

    fn price_path(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "api/v3/ticker/price",
            ExchangeId::Bybit => "v5/market/tickers",
            ExchangeId::Bitget => "api/v2/spot/market/tickers",
        }
    }

    fn query_style(&self) -> QueryStyle {
        match self {
            ExchangeId::Bybit => QueryStyle::CategoryThenSymbol { category: "spot" },
            ExchangeId::Binance | ExchangeId::Bitget => QueryStyle::SymbolOnly,
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExchangeId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::Invalid(format!("unknown exchange: {}", s)))
    }
}

impl TryFrom<String> for ExchangeId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How the pair is encoded into the ticker query string.
///
/// Parameter order is part of each exchange's wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStyle {
    /// `?symbol=<PAIR>`
    SymbolOnly,
    /// `?category=<category>&symbol=<PAIR>`
    CategoryThenSymbol { category: &'static str },
}

/// Immutable descriptor of one price source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub id: ExchangeId,
    pub base_url: String,
    pub price_path: &'static str,
    pub query_style: QueryStyle,
}

impl Exchange {
    /// Descriptor with the exchange's public endpoint
    pub fn new(id: ExchangeId) -> Self {
        Self::with_base_url(id, id.default_base_url())
    }

    /// Descriptor pointing at a mirror or local double of the exchange API
    pub fn with_base_url(id: ExchangeId, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            id,
            base_url: base_url.trim_end_matches('/').to_string(),
            price_path: id.price_path(),
            query_style: id.query_style(),
        }
    }

    /// Full ticker URL for `pair`
    pub fn price_url(&self, pair: &str) -> String {
        let symbol: String = form_urlencoded::byte_serialize(pair.as_bytes()).collect();
        let query = match self.query_style {
            QueryStyle::SymbolOnly => format!("symbol={}", symbol),
            QueryStyle::CategoryThenSymbol { category } => {
                format!("category={}&symbol={}", category, symbol)
            }
        };
        format!("{}/{}?{}", self.base_url, self.price_path, query)
    }
}

/// The active set of exchanges for this process
#[derive(Debug, Clone)]
pub struct ExchangeDirectory {
    exchanges: Vec<Exchange>,
}

impl ExchangeDirectory {
    /// All supported exchanges on their public endpoints
    pub fn standard() -> Self {
        Self {
            exchanges: ExchangeId::ALL.into_iter().map(Exchange::new).collect(),
        }
    }

    pub fn from_exchanges(exchanges: Vec<Exchange>) -> Self {
        Self { exchanges }
    }

    /// Builds the directory from the `[exchanges]` config section, keeping the
    /// configured order.
    pub fn from_config(config: &ExchangesConfig) -> Result<Self, ConfigError> {
        let overrides = config.base_url_overrides()?;
        let exchanges = config
            .enabled
            .iter()
            .map(|id| match overrides.get(id) {
                Some(url) => Exchange::with_base_url(*id, url.as_str()),
                None => Exchange::new(*id),
            })
            .collect();

        Ok(Self { exchanges })
    }

    pub fn resolve(&self, id: ExchangeId) -> Option<&Exchange> {
        self.exchanges.iter().find(|exchange| exchange.id == id)
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn ids(&self) -> Vec<ExchangeId> {
        self.exchanges.iter().map(|exchange| exchange.id).collect()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

impl Default for ExchangeDirectory {
    fn default() -> Self {
        Self::standard()
    }
}

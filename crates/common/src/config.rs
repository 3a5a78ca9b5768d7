use crate::error::ConfigError;
use crate::exchange::ExchangeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Top-level node configuration, loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub server: ServerConfig,
    pub race: RaceConfig,
    pub exchanges: ExchangesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Upper bound for a whole inbound request
    pub handler_timeout_secs: u64,
    /// Heading of the landing page
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            handler_timeout_secs: 10,
            title: "Spot Oracle API".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("listen_addr {:?}: {}", self.listen_addr, e)))
    }

    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Deadline shared by every exchange call of one race
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
            user_agent: "spot-oracle/0.1".to_string(),
        }
    }
}

impl RaceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangesConfig {
    pub enabled: Vec<ExchangeId>,
    /// Keyed by exchange name
    pub base_urls: BTreeMap<String, String>,
}

impl Default for ExchangesConfig {
    fn default() -> Self {
        Self {
            enabled: ExchangeId::ALL.to_vec(),
            base_urls: BTreeMap::new(),
        }
    }
}

impl ExchangesConfig {
    pub fn base_url_overrides(&self) -> Result<HashMap<ExchangeId, String>, ConfigError> {
        let mut overrides = HashMap::with_capacity(self.base_urls.len());
        for (name, url) in &self.base_urls {
            overrides.insert(name.parse::<ExchangeId>()?, url.clone());
        }
        Ok(overrides)
    }
}

impl NodeConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;

        if self.server.handler_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.handler_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.race.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "race.request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.race.request_timeout() >= self.server.handler_timeout() {
            return Err(ConfigError::Invalid(format!(
                "race.request_timeout_ms ({}) must be shorter than server.handler_timeout_secs ({}s)",
                self.race.request_timeout_ms, self.server.handler_timeout_secs
            )));
        }
        if self.exchanges.enabled.is_empty() {
            return Err(ConfigError::Invalid(
                "exchanges.enabled must name at least one exchange".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for id in &self.exchanges.enabled {
            if !seen.insert(id) {
                return Err(ConfigError::Invalid(format!(
                    "exchange {} is enabled more than once",
                    id
                )));
            }
        }

        for (id, url) in self.exchanges.base_url_overrides()? {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "base url for {} must start with http:// or https://, got {:?}",
                    id, url
                )));
            }
        }

        Ok(())
    }
}

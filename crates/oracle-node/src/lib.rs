pub mod binance;
pub mod bitget;
pub mod bybit;
pub mod presenter;
pub mod price_provider;
pub mod race;
pub mod server;
pub mod transport;

pub use price_provider::{PriceProvider, SourceAdapter};
pub use race::PriceRace;
pub use server::SpotServer;
pub use transport::{HttpTransport, RawResponse, ReqwestTransport};

use spot_oracle_common::{ExchangeDirectory, NodeConfig};
use std::sync::Arc;

/// Wires the exchange directory, reqwest transport and race coordinator from config.
pub fn build_race(config: &NodeConfig) -> anyhow::Result<PriceRace> {
    let directory = ExchangeDirectory::from_config(&config.exchanges)?;
    let transport = ReqwestTransport::new(config.race.request_timeout(), &config.race.user_agent)?;
    let adapter = SourceAdapter::new(Arc::new(transport));

    Ok(PriceRace::new(
        &directory,
        Arc::new(adapter),
        config.race.request_timeout(),
    ))
}

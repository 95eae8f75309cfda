//! Contract between the route search and whatever supplies market records.
//!
//! Implementations hand back records that are already filtered to available
//! entries (and, for terminals, to commodity terminals). The search treats
//! every answer as authoritative for the duration of one pass.

use async_trait::async_trait;
use thiserror::Error;

use super::entities::{
    CommodityId, CommodityOffer, Planet, PlanetId, StarSystem, SystemId, Terminal, TerminalId,
    TradeCandidate,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("api error: {0}")]
    Api(String),
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn list_systems(&self) -> Result<Vec<StarSystem>, FetchError>;

    async fn list_planets(
        &self,
        system_id: Option<SystemId>,
        planet_id: Option<PlanetId>,
    ) -> Result<Vec<Planet>, FetchError>;

    async fn list_terminals(
        &self,
        system_id: Option<SystemId>,
        planet_id: Option<PlanetId>,
        terminal_id: Option<TerminalId>,
    ) -> Result<Vec<Terminal>, FetchError>;

    /// All commodities traded at one terminal.
    async fn list_buy_offers(
        &self,
        terminal_id: TerminalId,
    ) -> Result<Vec<CommodityOffer>, FetchError>;

    /// Every terminal trading one commodity.
    async fn list_sell_offers_for_commodity(
        &self,
        commodity_id: CommodityId,
    ) -> Result<Vec<CommodityOffer>, FetchError>;

    /// Pre-joined origin/destination rows.
    async fn list_routes(
        &self,
        origin_planet_id: PlanetId,
        destination_planet_id: Option<PlanetId>,
    ) -> Result<Vec<TradeCandidate>, FetchError>;
}

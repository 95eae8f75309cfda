//! In-memory record source backed by a JSON snapshot of the market.
//!
//! Answers the same queries as the UEX client, with the same availability
//! filtering, so searches can run offline and tests can script failures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    CommodityId, CommodityOffer, FetchError, Planet, PlanetId, RecordSource, StarSystem,
    SystemId, Terminal, TerminalId, TradeCandidate,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub systems: Vec<StarSystem>,
    #[serde(default)]
    pub planets: Vec<Planet>,
    #[serde(default)]
    pub terminals: Vec<Terminal>,
    #[serde(default)]
    pub offers: Vec<CommodityOffer>,
    #[serde(default)]
    pub routes: Vec<TradeCandidate>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// A query as seen by the source, used to script failures and inspect calls.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Query {
    Systems,
    Planets,
    Terminals,
    BuyOffers(TerminalId),
    SellOffers(CommodityId),
    Routes(PlanetId),
}

#[derive(Debug, Default)]
pub struct InMemorySource {
    snapshot: Snapshot,
    failing: HashSet<Query>,
    calls: Mutex<Vec<Query>>,
}

impl InMemorySource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn from_snapshot(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let content = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        Ok(Self::new(snapshot))
    }

    /// Make `query` fail with a transport error.
    pub fn failing_on(mut self, query: Query) -> Self {
        self.failing.insert(query);
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Queries answered so far, in order.
    pub fn calls(&self) -> Vec<Query> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, query: Query) -> Result<(), FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(query.clone());
        }
        if self.failing.contains(&query) {
            return Err(FetchError::Transport(format!("scripted failure for {query:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn list_systems(&self) -> Result<Vec<StarSystem>, FetchError> {
        self.record(Query::Systems)?;
        Ok(self
            .snapshot
            .systems
            .iter()
            .filter(|system| system.is_available)
            .cloned()
            .collect())
    }

    async fn list_planets(
        &self,
        system_id: Option<SystemId>,
        planet_id: Option<PlanetId>,
    ) -> Result<Vec<Planet>, FetchError> {
        self.record(Query::Planets)?;
        Ok(self
            .snapshot
            .planets
            .iter()
            .filter(|planet| planet.is_available)
            .filter(|planet| system_id.map_or(true, |id| planet.system_id == id))
            .filter(|planet| planet_id.map_or(true, |id| planet.id == id))
            .cloned()
            .collect())
    }

    async fn list_terminals(
        &self,
        system_id: Option<SystemId>,
        planet_id: Option<PlanetId>,
        terminal_id: Option<TerminalId>,
    ) -> Result<Vec<Terminal>, FetchError> {
        self.record(Query::Terminals)?;
        Ok(self
            .snapshot
            .terminals
            .iter()
            .filter(|terminal| terminal.is_available && terminal.is_commodity())
            .filter(|terminal| system_id.map_or(true, |id| terminal.system_id == id))
            .filter(|terminal| planet_id.map_or(true, |id| terminal.planet_id == Some(id)))
            .filter(|terminal| terminal_id.map_or(true, |id| terminal.id == id))
            .cloned()
            .collect())
    }

    async fn list_buy_offers(
        &self,
        terminal_id: TerminalId,
    ) -> Result<Vec<CommodityOffer>, FetchError> {
        self.record(Query::BuyOffers(terminal_id))?;
        Ok(self
            .snapshot
            .offers
            .iter()
            .filter(|offer| offer.is_available && offer.terminal_id == terminal_id)
            .cloned()
            .collect())
    }

    async fn list_sell_offers_for_commodity(
        &self,
        commodity_id: CommodityId,
    ) -> Result<Vec<CommodityOffer>, FetchError> {
        self.record(Query::SellOffers(commodity_id))?;
        Ok(self
            .snapshot
            .offers
            .iter()
            .filter(|offer| offer.is_available && offer.commodity_id == commodity_id)
            .cloned()
            .collect())
    }

    async fn list_routes(
        &self,
        origin_planet_id: PlanetId,
        destination_planet_id: Option<PlanetId>,
    ) -> Result<Vec<TradeCandidate>, FetchError> {
        self.record(Query::Routes(origin_planet_id))?;
        Ok(self
            .snapshot
            .routes
            .iter()
            .filter(|route| route.buy.planet_id == Some(origin_planet_id))
            .filter(|route| {
                destination_planet_id.map_or(true, |id| route.sell.planet_id == Some(id))
            })
            .cloned()
            .collect())
    }
}

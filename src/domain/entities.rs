use serde::{Deserialize, Serialize};

/// Identifiers returned by the UEX API.
pub type SystemId = i32;
pub type PlanetId = i32;
pub type TerminalId = i32;
pub type CommodityId = i32;

/// Star system as listed by the `star_systems` endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarSystem {
    pub id: SystemId,
    pub name: String,
    #[serde(default = "available")]
    pub is_available: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub id: PlanetId,
    pub name: String,
    pub system_id: SystemId,
    #[serde(default = "available")]
    pub is_available: bool,
}

/// Terminal information from UEX API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub id: TerminalId,
    pub name: String,
    pub system_id: SystemId,
    pub planet_id: Option<PlanetId>,
    /// Terminal type; only `"commodity"` terminals take part in trading.
    pub kind: String,
    #[serde(default = "available")]
    pub is_available: bool,
    #[serde(default)]
    pub is_city_terminal: bool,
    #[serde(default)]
    pub is_space_station_terminal: bool,
    /// Largest cargo container the terminal accepts, shown with results.
    #[serde(default)]
    pub max_container_size: Option<u32>,
}

impl Terminal {
    pub const COMMODITY_KIND: &'static str = "commodity";

    pub fn is_commodity(&self) -> bool {
        self.kind == Self::COMMODITY_KIND
    }

    /// Public hangars are everything that is neither a city nor a station.
    pub fn has_private_hangar(&self) -> bool {
        self.is_city_terminal || self.is_space_station_terminal
    }
}

/// One commodity's tradeable state at one terminal.
///
/// API terminology (from the player's perspective):
/// - `buy_price` = what you pay at this terminal
/// - `sell_price` = what you receive at this terminal
/// - `buy_stock_scu` = stock you can buy
/// - `sell_stock_scu - sell_reserved_scu` = demand left for you
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommodityOffer {
    pub commodity_id: CommodityId,
    pub commodity_name: String,
    pub terminal_id: TerminalId,
    pub terminal_name: String,
    pub system_id: Option<SystemId>,
    pub planet_id: Option<PlanetId>,
    #[serde(default = "available")]
    pub is_available: bool,
    #[serde(default)]
    pub buy_price: Option<f64>,
    #[serde(default)]
    pub sell_price: Option<f64>,
    #[serde(default)]
    pub buy_stock_scu: i64,
    #[serde(default)]
    pub sell_stock_scu: i64,
    #[serde(default)]
    pub sell_reserved_scu: i64,
    #[serde(default)]
    pub is_city_terminal: bool,
    #[serde(default)]
    pub is_space_station_terminal: bool,
}

impl CommodityOffer {
    pub fn is_buyable(&self) -> bool {
        self.buy_price.is_some_and(|price| price > 0.0)
    }

    pub fn is_sellable(&self) -> bool {
        self.sell_price.is_some_and(|price| price > 0.0)
    }

    /// Demand not yet claimed by other users. May be negative.
    pub fn available_demand_scu(&self) -> i64 {
        self.sell_stock_scu.saturating_sub(self.sell_reserved_scu)
    }

    /// Fill in location data the price row left out from the terminal record.
    pub fn located_at(mut self, terminal: &Terminal) -> Self {
        self.system_id = self.system_id.or(Some(terminal.system_id));
        self.planet_id = self.planet_id.or(terminal.planet_id);
        self.is_city_terminal |= terminal.is_city_terminal;
        self.is_space_station_terminal |= terminal.is_space_station_terminal;
        self
    }
}

/// A buy leg and a sell leg for the same commodity at different terminals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    pub buy: CommodityOffer,
    pub sell: CommodityOffer,
}

impl TradeCandidate {
    pub fn new(buy: CommodityOffer, sell: CommodityOffer) -> Self {
        Self { buy, sell }
    }

    pub fn commodity_id(&self) -> CommodityId {
        self.buy.commodity_id
    }

    pub fn is_same_terminal(&self) -> bool {
        self.buy.terminal_id == self.sell.terminal_id
    }
}

fn available() -> bool {
    true
}

//! Trade route evaluation and ranking.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::entities::{CommodityId, PlanetId, SystemId, Terminal, TerminalId, TradeCandidate};
use super::policy::{PageSize, SearchPolicy};

/// An evaluated opportunity: buy at the departure terminal, sell at the arrival terminal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeRoute {
    // Commodity info
    pub commodity_id: CommodityId,
    pub commodity_name: String,

    // Departure (where we purchase)
    pub departure_system_id: Option<SystemId>,
    pub departure_planet_id: Option<PlanetId>,
    pub departure_terminal_id: TerminalId,
    pub departure_terminal_name: String,

    // Arrival (where we offload)
    pub arrival_system_id: Option<SystemId>,
    pub arrival_planet_id: Option<PlanetId>,
    pub arrival_terminal_id: TerminalId,
    pub arrival_terminal_name: String,
    pub arrival_max_container_size: Option<u32>,

    // Bounded by policy, stock and demand
    pub quantity_scu: i64,
    pub buy_price: f64,
    pub sell_price: f64,
    pub investment: f64,
    pub unit_margin: f64,
    pub total_margin: f64,
    pub profit_pct: i64,

    // Uncapped figures as reported by the terminals
    pub departure_scu_available: i64,
    pub arrival_demand_scu: i64,
}

impl TradeRoute {
    pub fn attach_arrival_terminal(&mut self, terminal: &Terminal) {
        self.arrival_max_container_size = terminal.max_container_size;
    }

    pub fn is_loss_making(&self) -> bool {
        self.unit_margin < 0.0
    }

    pub fn quantity_label(&self) -> String {
        format!("{} SCU", self.quantity_scu)
    }

    pub fn buy_price_label(&self) -> String {
        uec(self.buy_price)
    }

    pub fn sell_price_label(&self) -> String {
        uec(self.sell_price)
    }

    pub fn investment_label(&self) -> String {
        uec(self.investment)
    }

    pub fn unit_margin_label(&self) -> String {
        uec(self.unit_margin)
    }

    pub fn total_margin_label(&self) -> String {
        uec(self.total_margin)
    }

    pub fn profit_label(&self) -> String {
        format!("{}%", self.profit_pct)
    }

    pub fn departure_stock_label(&self) -> String {
        format!("{} SCU", self.departure_scu_available)
    }

    pub fn arrival_demand_label(&self) -> String {
        format!("{} SCU", self.arrival_demand_scu)
    }
}

fn uec(amount: f64) -> String {
    format!("{amount} UEC")
}

/// Why a candidate did not become a route. Not an error: rejected
/// candidates are simply left out of the results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    NotBuyable,
    NotSellable,
    NoStock,
    NoDemand,
    ZeroQuantity,
}

impl Rejection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotBuyable => "no buy price",
            Self::NotSellable => "no sell price",
            Self::NoStock => "no stock",
            Self::NoDemand => "no demand",
            Self::ZeroQuantity => "nothing affordable",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bound the tradeable quantity and compute margins for one candidate.
///
/// Loss-making pairs are kept: only missing prices, missing stock/demand
/// and a non-positive quantity reject a candidate.
pub fn evaluate_candidate(
    candidate: &TradeCandidate,
    policy: &SearchPolicy,
) -> Result<TradeRoute, Rejection> {
    let buy = &candidate.buy;
    let sell = &candidate.sell;
    let scu_cap = policy.scu_cap();

    let buy_price = buy
        .buy_price
        .filter(|price| *price > 0.0)
        .ok_or(Rejection::NotBuyable)?;
    let sell_price = sell
        .sell_price
        .filter(|price| *price > 0.0)
        .ok_or(Rejection::NotSellable)?;

    let available_scu = if policy.ignore_stock {
        scu_cap
    } else {
        buy.buy_stock_scu
    };
    let demand_scu = if policy.ignore_demand {
        scu_cap
    } else {
        sell.available_demand_scu()
    };
    if available_scu <= 0 {
        return Err(Rejection::NoStock);
    }
    if demand_scu <= 0 {
        return Err(Rejection::NoDemand);
    }

    // `as` saturates: an unbounded budget becomes i64::MAX.
    let affordable = (policy.investment_cap() / buy_price).floor() as i64;
    let quantity = scu_cap.min(available_scu).min(affordable).min(demand_scu);
    if quantity <= 0 {
        return Err(Rejection::ZeroQuantity);
    }

    let investment = buy_price * quantity as f64;
    let unit_margin = sell_price - buy_price;
    let total_margin = unit_margin * quantity as f64;
    let profit_pct = (unit_margin / buy_price * 100.0).round_ties_even() as i64;

    Ok(TradeRoute {
        commodity_id: buy.commodity_id,
        commodity_name: buy.commodity_name.clone(),
        departure_system_id: buy.system_id,
        departure_planet_id: buy.planet_id,
        departure_terminal_id: buy.terminal_id,
        departure_terminal_name: buy.terminal_name.clone(),
        arrival_system_id: sell.system_id,
        arrival_planet_id: sell.planet_id,
        arrival_terminal_id: sell.terminal_id,
        arrival_terminal_name: sell.terminal_name.clone(),
        arrival_max_container_size: None,
        quantity_scu: quantity,
        buy_price,
        sell_price,
        investment,
        unit_margin,
        total_margin,
        profit_pct,
        departure_scu_available: buy.buy_stock_scu,
        arrival_demand_scu: sell.available_demand_scu(),
    })
}

/// Accepted routes of one search, kept in enumeration order until sorted.
///
/// Sorting is stable, so routes with equal margins stay in the order they
/// were found no matter how often the ranking is refreshed.
#[derive(Clone, Debug, Default)]
pub struct RouteRanking {
    routes: Vec<TradeRoute>,
    evaluated: usize,
    rejected: usize,
}

impl RouteRanking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate a candidate and keep it when feasible.
    pub fn consider(
        &mut self,
        candidate: &TradeCandidate,
        policy: &SearchPolicy,
    ) -> Result<&mut TradeRoute, Rejection> {
        self.evaluated += 1;
        match evaluate_candidate(candidate, policy) {
            Ok(route) => {
                self.routes.push(route);
                let last = self.routes.len() - 1;
                Ok(&mut self.routes[last])
            }
            Err(rejection) => {
                self.rejected += 1;
                Err(rejection)
            }
        }
    }

    pub fn push(&mut self, route: TradeRoute) {
        self.evaluated += 1;
        self.routes.push(route);
    }

    /// Sort by total margin, highest first.
    pub fn sort(&mut self) {
        self.routes.sort_by(by_total_margin_desc);
    }

    pub fn top(&self, page_size: PageSize) -> &[TradeRoute] {
        let end = self.routes.len().min(page_size.get());
        &self.routes[..end]
    }

    pub fn into_ranked(mut self, page_size: PageSize) -> Vec<TradeRoute> {
        self.sort();
        self.routes.truncate(page_size.get());
        self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

fn by_total_margin_desc(a: &TradeRoute, b: &TradeRoute) -> Ordering {
    b.total_margin.total_cmp(&a.total_margin)
}

//! Buy and sell declarations reported back to UEX.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{CommodityId, CommodityOffer, Terminal, TerminalId};
use super::source::{FetchError, RecordSource};
use super::trade_route::TradeRoute;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Buy,
    Sell,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeInputError {
    #[error("a trade needs at least one SCU")]
    ZeroScu,
    #[error("price must be a non-negative amount, got {0}")]
    InvalidPrice(f64),
    #[error("route quantity {0} SCU does not fit a single declaration")]
    QuantityOutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeTargetError {
    #[error("terminal {0} is not an available commodity terminal")]
    UnknownTerminal(TerminalId),
    #[error("commodity {commodity_id} is not traded at {terminal}")]
    UnknownCommodity {
        commodity_id: CommodityId,
        terminal: String,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Payload of `user_trades_add`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TradeDeclaration {
    #[serde(rename = "id_terminal")]
    pub terminal_id: TerminalId,
    #[serde(rename = "id_commodity")]
    pub commodity_id: CommodityId,
    pub operation: Operation,
    pub scu: u32,
    pub price: f64,
}

impl TradeDeclaration {
    pub fn new(
        terminal_id: TerminalId,
        commodity_id: CommodityId,
        operation: Operation,
        scu: u32,
        price: f64,
    ) -> Result<Self, TradeInputError> {
        if scu == 0 {
            return Err(TradeInputError::ZeroScu);
        }
        if !price.is_finite() || price < 0.0 {
            return Err(TradeInputError::InvalidPrice(price));
        }
        Ok(Self {
            terminal_id,
            commodity_id,
            operation,
            scu,
            price,
        })
    }

    /// Pre-fill a declaration from a ranked route: buying happens at the
    /// departure terminal, selling at the arrival terminal.
    pub fn from_route(route: &TradeRoute, operation: Operation) -> Result<Self, TradeInputError> {
        let scu = u32::try_from(route.quantity_scu)
            .map_err(|_| TradeInputError::QuantityOutOfRange(route.quantity_scu))?;
        let (terminal_id, price) = match operation {
            Operation::Buy => (route.departure_terminal_id, route.buy_price),
            Operation::Sell => (route.arrival_terminal_id, route.sell_price),
        };
        Self::new(terminal_id, route.commodity_id, operation, scu, price)
    }
}

/// Look up the terminal and the commodity a declaration points at, so a
/// typo is caught before anything is reported to UEX.
pub async fn confirm_trade_target(
    source: &dyn RecordSource,
    declaration: &TradeDeclaration,
) -> Result<(Terminal, CommodityOffer), TradeTargetError> {
    let terminal = source
        .list_terminals(None, None, Some(declaration.terminal_id))
        .await?
        .into_iter()
        .find(|terminal| terminal.id == declaration.terminal_id)
        .ok_or(TradeTargetError::UnknownTerminal(declaration.terminal_id))?;

    let offer = source
        .list_buy_offers(terminal.id)
        .await?
        .into_iter()
        .find(|offer| offer.commodity_id == declaration.commodity_id)
        .ok_or_else(|| TradeTargetError::UnknownCommodity {
            commodity_id: declaration.commodity_id,
            terminal: terminal.name.clone(),
        })?;

    Ok((terminal, offer))
}

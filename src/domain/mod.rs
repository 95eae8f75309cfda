//! Trade route search logic. Nothing in here talks HTTP; market data comes
//! in through [`RecordSource`].

pub mod entities;
pub mod policy;
pub mod search;
pub mod source;
pub mod trade;
pub mod trade_route;

pub use entities::{
    CommodityId, CommodityOffer, Planet, PlanetId, StarSystem, SystemId, Terminal, TerminalId,
    TradeCandidate,
};
pub use policy::{PageSize, PolicyError, Scope, SearchMode, SearchPolicy};
pub use search::{
    search_trade_routes, ProgressSink, SearchError, SearchOutcome, SearchProgress,
};
pub use source::{FetchError, RecordSource};
pub use trade::{
    confirm_trade_target, Operation, TradeDeclaration, TradeInputError, TradeTargetError,
};
pub use trade_route::{evaluate_candidate, Rejection, RouteRanking, TradeRoute};

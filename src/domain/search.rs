//! Trade route search: resolve terminals, enumerate candidate pairs,
//! evaluate them and keep a ranked list that is refreshed as the search
//! moves along.
//!
//! The search runs as a single task issuing one fetch at a time. After each
//! outer unit (a departure terminal, or a departure planet in routes mode)
//! the running top-N is handed to a [`ProgressSink`] and the task yields so
//! a host event loop can redraw.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

use super::entities::{
    CommodityId, CommodityOffer, PlanetId, Terminal, TerminalId, TradeCandidate,
};
use super::policy::{PolicyError, SearchMode, SearchPolicy};
use super::source::{FetchError, RecordSource};
use super::trade_route::{RouteRanking, TradeRoute};

/// Where the search stands after an outer unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchProgress {
    pub units_done: usize,
    pub units_total: usize,
    pub candidates_evaluated: usize,
    pub routes_accepted: usize,
}

/// Receives the running ranking while a search is in progress.
pub trait ProgressSink: Send {
    fn on_progress(&mut self, progress: &SearchProgress, top: &[TradeRoute]);
}

impl<F> ProgressSink for F
where
    F: FnMut(&SearchProgress, &[TradeRoute]) + Send,
{
    fn on_progress(&mut self, progress: &SearchProgress, top: &[TradeRoute]) {
        self(progress, top)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    /// Top routes by total margin, at most `page_size` of them.
    pub routes: Vec<TradeRoute>,
    pub total_accepted: usize,
    pub candidates_evaluated: usize,
    pub rejected: usize,
    /// Pairs dropped by the structural filters before evaluation.
    pub excluded: usize,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search: {0}")]
    InvalidPolicy(#[from] PolicyError),
    /// The search was aborted. `partial` holds the ranking built so far and
    /// is incomplete.
    #[error("search aborted: {source}")]
    Fetch {
        #[source]
        source: FetchError,
        partial: Vec<TradeRoute>,
    },
}

impl SearchError {
    pub fn partial_routes(&self) -> &[TradeRoute] {
        match self {
            Self::Fetch { partial, .. } => partial,
            Self::InvalidPolicy(_) => &[],
        }
    }
}

/// Run one exhaustive search for `policy` against `source`.
pub async fn search_trade_routes(
    source: &dyn RecordSource,
    policy: &SearchPolicy,
    sink: &mut dyn ProgressSink,
) -> Result<SearchOutcome, SearchError> {
    policy.validate()?;

    let span = info_span!("trade_route_search", mode = policy.mode.label());
    async move {
        info!(
            departure = ?policy.departure,
            destination = ?policy.destination,
            "Searching for trade routes"
        );
        let mut search = RouteSearch::new(source, policy);
        let result = search.run(sink).await;
        match result {
            Ok(()) => {
                let outcome = search.finish();
                info!(
                    accepted = outcome.total_accepted,
                    evaluated = outcome.candidates_evaluated,
                    "Finished calculating trade routes"
                );
                Ok(outcome)
            }
            Err(error) => {
                warn!(%error, "Trade route search aborted");
                Err(SearchError::Fetch {
                    source: error,
                    partial: search.ranking.into_ranked(policy.page_size),
                })
            }
        }
    }
    .instrument(span)
    .await
}

struct RouteSearch<'a> {
    source: &'a dyn RecordSource,
    policy: &'a SearchPolicy,
    ranking: RouteRanking,
    excluded: usize,
    sell_offers: HashMap<CommodityId, Vec<CommodityOffer>>,
}

impl<'a> RouteSearch<'a> {
    fn new(source: &'a dyn RecordSource, policy: &'a SearchPolicy) -> Self {
        Self {
            source,
            policy,
            ranking: RouteRanking::new(),
            excluded: 0,
            sell_offers: HashMap::new(),
        }
    }

    async fn run(&mut self, sink: &mut dyn ProgressSink) -> Result<(), FetchError> {
        let departures = self.departure_terminals().await?;
        let destinations = self.destination_terminals().await?;
        debug!(
            departures = departures.len(),
            destinations = destinations.len(),
            "Resolved terminals"
        );

        match self.policy.mode {
            SearchMode::Offers => self.scan_offers(&departures, &destinations, sink).await,
            SearchMode::Routes => self.scan_routes(&departures, &destinations, sink).await,
        }
    }

    fn finish(self) -> SearchOutcome {
        let total_accepted = self.ranking.len();
        let candidates_evaluated = self.ranking.evaluated();
        let rejected = self.ranking.rejected();
        SearchOutcome {
            routes: self.ranking.into_ranked(self.policy.page_size),
            total_accepted,
            candidates_evaluated,
            rejected,
            excluded: self.excluded,
        }
    }

    async fn departure_terminals(&self) -> Result<Vec<Terminal>, FetchError> {
        let scope = self.policy.departure;
        let terminals = self
            .source
            .list_terminals(scope.system_id, scope.planet_id, scope.terminal_id)
            .await?;

        let mut seen = HashSet::new();
        Ok(terminals
            .into_iter()
            .filter(|terminal| seen.insert(terminal.id))
            .collect())
    }

    async fn destination_terminals(&self) -> Result<HashMap<TerminalId, Terminal>, FetchError> {
        let scope = self.policy.destination;
        let terminals = if scope.is_unbounded() {
            // TODO: narrow to systems within `max_bounce` jumps once the API exposes jump points.
            warn!(
                max_bounce = self.policy.max_bounce,
                "No jump-point data available; searching destinations in all systems"
            );
            let mut all = Vec::new();
            for system in self.source.list_systems().await? {
                all.extend(
                    self.source
                        .list_terminals(Some(system.id), None, None)
                        .await?,
                );
            }
            all
        } else {
            self.source
                .list_terminals(scope.system_id, scope.planet_id, scope.terminal_id)
                .await?
        };

        let mut by_id = HashMap::with_capacity(terminals.len());
        for terminal in terminals {
            by_id.entry(terminal.id).or_insert(terminal);
        }
        Ok(by_id)
    }

    async fn scan_offers(
        &mut self,
        departures: &[Terminal],
        destinations: &HashMap<TerminalId, Terminal>,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), FetchError> {
        let source = self.source;
        let policy = self.policy;

        for (index, departure) in departures.iter().enumerate() {
            let offers = source.list_buy_offers(departure.id).await?;
            debug!(
                terminal = %departure.name,
                commodities = offers.len(),
                "Iterating through commodities at departure terminal"
            );

            for buy in offers.into_iter().filter(CommodityOffer::is_buyable) {
                let buy = buy.located_at(departure);

                if !self.sell_offers.contains_key(&buy.commodity_id) {
                    let fetched = source
                        .list_sell_offers_for_commodity(buy.commodity_id)
                        .await?;
                    debug!(
                        commodity = %buy.commodity_name,
                        terminals = fetched.len(),
                        "Found terminals that might buy the commodity"
                    );
                    self.sell_offers.insert(buy.commodity_id, fetched);
                }
                let Some(sells) = self.sell_offers.get(&buy.commodity_id) else {
                    continue;
                };

                for sell in sells {
                    let candidate = TradeCandidate::new(buy.clone(), sell.clone());
                    if !consider_pair(
                        &mut self.ranking,
                        policy,
                        departure,
                        candidate,
                        destinations,
                    ) {
                        self.excluded += 1;
                    }
                }
            }

            self.report(index + 1, departures.len(), sink);
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    async fn scan_routes(
        &mut self,
        departures: &[Terminal],
        destinations: &HashMap<TerminalId, Terminal>,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), FetchError> {
        let source = self.source;
        let policy = self.policy;
        let planets = self.departure_planets(departures).await?;
        let departures_by_id: HashMap<TerminalId, &Terminal> = departures
            .iter()
            .map(|terminal| (terminal.id, terminal))
            .collect();

        for (index, planet_id) in planets.iter().enumerate() {
            let routes = source
                .list_routes(*planet_id, policy.destination.planet_id)
                .await?;
            debug!(planet = *planet_id, routes = routes.len(), "Scanning user routes");

            for candidate in routes {
                let Some(departure) = departures_by_id.get(&candidate.buy.terminal_id) else {
                    self.excluded += 1;
                    continue;
                };
                let candidate = TradeCandidate::new(
                    candidate.buy.located_at(departure),
                    candidate.sell,
                );
                if !consider_pair(
                    &mut self.ranking,
                    policy,
                    departure,
                    candidate,
                    destinations,
                ) {
                    self.excluded += 1;
                }
            }

            self.report(index + 1, planets.len(), sink);
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    async fn departure_planets(&self, departures: &[Terminal]) -> Result<Vec<PlanetId>, FetchError> {
        let scope = self.policy.departure;
        if let Some(planet_id) = scope.planet_id {
            return Ok(vec![planet_id]);
        }
        if scope.terminal_id.is_none() {
            if let Some(system_id) = scope.system_id {
                let planets = self.source.list_planets(Some(system_id), None).await?;
                return Ok(planets.into_iter().map(|planet| planet.id).collect());
            }
        }

        let mut planets = Vec::new();
        for planet_id in departures.iter().filter_map(|terminal| terminal.planet_id) {
            if !planets.contains(&planet_id) {
                planets.push(planet_id);
            }
        }
        Ok(planets)
    }

    fn report(&mut self, units_done: usize, units_total: usize, sink: &mut dyn ProgressSink) {
        self.ranking.sort();
        let progress = SearchProgress {
            units_done,
            units_total,
            candidates_evaluated: self.ranking.evaluated(),
            routes_accepted: self.ranking.len(),
        };
        sink.on_progress(&progress, self.ranking.top(self.policy.page_size));
    }
}

/// Apply the structural filters to a pair and evaluate it when it passes.
/// Returns `false` when the pair was excluded before evaluation.
fn consider_pair(
    ranking: &mut RouteRanking,
    policy: &SearchPolicy,
    departure: &Terminal,
    candidate: TradeCandidate,
    destinations: &HashMap<TerminalId, Terminal>,
) -> bool {
    if candidate.commodity_id() != candidate.sell.commodity_id
        || candidate.is_same_terminal()
        || !candidate.sell.is_available
    {
        return false;
    }
    let TradeCandidate { buy, sell } = candidate;
    let Some(arrival) = destinations.get(&sell.terminal_id) else {
        return false;
    };
    if policy.exclude_public_hangars
        && !(departure.has_private_hangar() && arrival.has_private_hangar())
    {
        return false;
    }
    if policy.space_station_only
        && !(departure.is_space_station_terminal && arrival.is_space_station_terminal)
    {
        return false;
    }

    let candidate = TradeCandidate::new(buy, sell.located_at(arrival));
    if let Ok(route) = ranking.consider(&candidate, policy) {
        route.attach_arrival_terminal(arrival);
    }
    true
}

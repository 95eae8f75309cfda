//! Parameters for a single trade route search.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{PlanetId, SystemId, TerminalId};

/// Where a route may start or end. `None` everywhere means "all".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub system_id: Option<SystemId>,
    pub planet_id: Option<PlanetId>,
    pub terminal_id: Option<TerminalId>,
}

impl Scope {
    pub fn system(system_id: SystemId) -> Self {
        Self {
            system_id: Some(system_id),
            ..Self::default()
        }
    }

    pub fn terminal(system_id: SystemId, terminal_id: TerminalId) -> Self {
        Self {
            system_id: Some(system_id),
            planet_id: None,
            terminal_id: Some(terminal_id),
        }
    }

    pub fn with_planet(mut self, planet_id: PlanetId) -> Self {
        self.planet_id = Some(planet_id);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.system_id.is_none() && self.planet_id.is_none() && self.terminal_id.is_none()
    }
}

/// Which data the enumerator pairs up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Buy offers at departure terminals against sell offers of the same commodity.
    #[default]
    Offers,
    /// Pre-joined origin/destination rows built from user trades.
    Routes,
}

impl SearchMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Offers => "offers",
            Self::Routes => "routes",
        }
    }
}

/// Number of ranked routes handed to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    #[default]
    Ten,
    Twenty,
    Fifty,
    Hundred,
    FiveHundred,
    Thousand,
}

impl PageSize {
    pub const ALL: [PageSize; 6] = [
        Self::Ten,
        Self::Twenty,
        Self::Fifty,
        Self::Hundred,
        Self::FiveHundred,
        Self::Thousand,
    ];

    pub fn get(self) -> usize {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Fifty => 50,
            Self::Hundred => 100,
            Self::FiveHundred => 500,
            Self::Thousand => 1000,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = PolicyError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|size| size.get() == value)
            .ok_or(PolicyError::InvalidPageSize(value))
    }
}

impl From<PageSize> for usize {
    fn from(value: PageSize) -> Self {
        value.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("select a departure system, planet or terminal")]
    MissingDeparture,
    #[error("max investment must be a non-negative amount, got {0}")]
    InvalidInvestment(f64),
    #[error("max SCU must be greater than zero")]
    InvalidScu,
    #[error("page size must be one of 10, 20, 50, 100, 500, 1000 (got {0})")]
    InvalidPageSize(usize),
}

/// Immutable parameter bundle for one search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchPolicy {
    pub max_scu: Option<u64>,
    pub max_investment: Option<f64>,
    pub ignore_stock: bool,
    pub ignore_demand: bool,
    pub exclude_public_hangars: bool,
    pub space_station_only: bool,
    pub departure: Scope,
    pub destination: Scope,
    pub mode: SearchMode,
    /// Requested hop limit for "all systems" destinations. The data has no
    /// jump-point graph, so this is recorded but cannot narrow the search.
    pub max_bounce: u8,
    pub page_size: PageSize,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            max_scu: None,
            max_investment: None,
            ignore_stock: false,
            ignore_demand: false,
            exclude_public_hangars: false,
            space_station_only: false,
            departure: Scope::default(),
            destination: Scope::default(),
            mode: SearchMode::Offers,
            max_bounce: 2,
            page_size: PageSize::Ten,
        }
    }
}

impl SearchPolicy {
    pub fn from_departure(departure: Scope) -> Self {
        Self {
            departure,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.departure.is_unbounded() {
            return Err(PolicyError::MissingDeparture);
        }
        if let Some(investment) = self.max_investment {
            if investment.is_nan() || investment < 0.0 {
                return Err(PolicyError::InvalidInvestment(investment));
            }
        }
        if self.max_scu == Some(0) {
            return Err(PolicyError::InvalidScu);
        }
        Ok(())
    }

    /// Upper bound on SCU used in arithmetic; unbounded saturates to `i64::MAX`.
    pub fn scu_cap(&self) -> i64 {
        self.max_scu
            .map(|scu| i64::try_from(scu).unwrap_or(i64::MAX))
            .unwrap_or(i64::MAX)
    }

    pub fn investment_cap(&self) -> f64 {
        self.max_investment.unwrap_or(f64::INFINITY)
    }
}

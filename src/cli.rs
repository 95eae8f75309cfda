use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand, ValueEnum};

use uex_trader::domain::{Operation, PageSize, PolicyError, Scope, SearchMode, SearchPolicy};
use uex_trader::util::persistence::Settings;

#[derive(Clone, Debug, Parser)]
#[command(name = "uex-trader", version, about = "Find profitable commodity trade routes from UEX market data", long_about = None)]
pub struct Cli {
    /// enables debug logging
    #[arg(long, global = true)]
    pub debug: bool,
    #[arg(long, global = true, env("UEX_API_KEY"), hide_env_values = true)]
    pub api_key: Option<String>,
    #[arg(long, global = true, env("UEX_SECRET_KEY"), hide_env_values = true)]
    pub secret_key: Option<String>,
    #[arg(long, global = true, env("UEX_BASE_URL"))]
    pub base_url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// lists star systems
    Systems,
    /// lists planets
    Planets {
        #[arg(long)]
        system: Option<i32>,
    },
    /// lists commodity terminals
    Terminals {
        #[arg(long)]
        system: Option<i32>,
        #[arg(long)]
        planet: Option<i32>,
    },
    /// lists commodity prices at one terminal
    Prices {
        #[arg(long)]
        terminal: i32,
    },
    /// searches and ranks trade routes
    Search(SearchArgs),
    /// reports a buy or sell to UEX
    Trade(TradeArgs),
    /// shows or changes saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Debug, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub departure_system: Option<i32>,
    #[arg(long)]
    pub departure_planet: Option<i32>,
    #[arg(long)]
    pub departure_terminal: Option<i32>,
    /// leave empty to search all systems
    #[arg(long)]
    pub destination_system: Option<i32>,
    #[arg(long)]
    pub destination_planet: Option<i32>,
    #[arg(long)]
    pub destination_terminal: Option<i32>,
    #[arg(long)]
    pub max_scu: Option<u64>,
    /// budget in UEC
    #[arg(long)]
    pub max_investment: Option<f64>,
    #[arg(long)]
    pub ignore_stock: bool,
    #[arg(long)]
    pub ignore_demand: bool,
    #[arg(long)]
    pub exclude_public_hangars: bool,
    #[arg(long)]
    pub space_station_only: bool,
    #[arg(long, value_enum, default_value_t = ModeArg::Offers)]
    pub mode: ModeArg,
    #[arg(long, default_value_t = 2)]
    pub max_bounce: u8,
    /// one of 10, 20, 50, 100, 500, 1000 (defaults to the saved setting)
    #[arg(long)]
    pub page_size: Option<usize>,
    /// search a JSON market snapshot instead of the live API
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,
    /// prints the ranked routes as JSON
    #[arg(long)]
    pub json: bool,
    /// prints buy and sell declarations for the route at this rank
    #[arg(long, value_name = "RANK")]
    pub select: Option<usize>,
}

impl SearchArgs {
    pub fn policy(&self, default_page_size: PageSize) -> Result<SearchPolicy, PolicyError> {
        let page_size = match self.page_size {
            Some(size) => PageSize::try_from(size)?,
            None => default_page_size,
        };
        let policy = SearchPolicy {
            max_scu: self.max_scu,
            max_investment: self.max_investment,
            ignore_stock: self.ignore_stock,
            ignore_demand: self.ignore_demand,
            exclude_public_hangars: self.exclude_public_hangars,
            space_station_only: self.space_station_only,
            departure: Scope {
                system_id: self.departure_system,
                planet_id: self.departure_planet,
                terminal_id: self.departure_terminal,
            },
            destination: Scope {
                system_id: self.destination_system,
                planet_id: self.destination_planet,
                terminal_id: self.destination_terminal,
            },
            mode: self.mode.into(),
            max_bounce: self.max_bounce,
            page_size,
        };
        policy.validate()?;
        Ok(policy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Offers,
    Routes,
}

impl From<ModeArg> for SearchMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Offers => SearchMode::Offers,
            ModeArg::Routes => SearchMode::Routes,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct TradeArgs {
    #[arg(value_enum)]
    pub operation: OperationArg,
    #[arg(long)]
    pub terminal: i32,
    #[arg(long)]
    pub commodity: i32,
    #[arg(long)]
    pub scu: u32,
    /// price per SCU in UEC
    #[arg(long)]
    pub price: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OperationArg {
    Buy,
    Sell,
}

impl From<OperationArg> for Operation {
    fn from(value: OperationArg) -> Self {
        match value {
            OperationArg::Buy => Operation::Buy,
            OperationArg::Sell => Operation::Sell,
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum ConfigAction {
    /// prints the saved settings
    Show,
    /// saves one setting
    Set {
        #[arg(value_parser = PossibleValuesParser::new(Settings::KEYS))]
        key: String,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("uex-trader").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn search_flags_build_a_policy() {
        let cli = parse(&[
            "search",
            "--departure-system",
            "68",
            "--destination-system",
            "68",
            "--max-investment",
            "50000",
            "--space-station-only",
            "--mode",
            "routes",
            "--page-size",
            "50",
        ]);
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        let policy = args.policy(PageSize::Ten).unwrap();
        assert_eq!(policy.departure, Scope::system(68));
        assert_eq!(policy.destination, Scope::system(68));
        assert_eq!(policy.max_investment, Some(50000.0));
        assert!(policy.space_station_only);
        assert_eq!(policy.mode, SearchMode::Routes);
        assert_eq!(policy.page_size, PageSize::Fifty);
    }

    #[test]
    fn search_without_departure_is_rejected() {
        let cli = parse(&["search", "--max-scu", "100"]);
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(
            args.policy(PageSize::Ten),
            Err(PolicyError::MissingDeparture)
        );
    }

    #[test]
    fn unknown_setting_is_refused_by_the_parser() {
        let result = Cli::try_parse_from(["uex-trader", "config", "set", "theme", "dark"]);
        assert!(result.is_err());
    }

    #[test]
    fn prices_needs_a_terminal() {
        let cli = parse(&["prices", "--terminal", "101"]);
        assert!(matches!(cli.command, Commands::Prices { terminal: 101 }));
        assert!(Cli::try_parse_from(["uex-trader", "prices"]).is_err());
    }

    #[test]
    fn trade_takes_operation_and_leg() {
        let cli = parse(&[
            "trade", "sell", "--terminal", "12", "--commodity", "4", "--scu", "32", "--price", "7.25",
        ]);
        let Commands::Trade(args) = cli.command else {
            panic!("expected trade");
        };
        assert_eq!(Operation::from(args.operation), Operation::Sell);
        assert_eq!(args.scu, 32);
    }
}

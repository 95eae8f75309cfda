use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use uex_trader::domain::{
    confirm_trade_target, search_trade_routes, Operation, RecordSource, SearchProgress,
    TradeDeclaration, TradeRoute,
};
use uex_trader::infra::{InMemorySource, UexClient};
use uex_trader::ui::route_table::{progress_line, render_offers, render_routes, render_table};
use uex_trader::util::persistence::{save_settings, settings_path, Settings};
use uex_trader::util::version::banner;

use crate::cli::{Cli, Commands, ConfigAction, SearchArgs, TradeArgs};

pub async fn run(cli: Cli, persisted: Settings) -> Result<()> {
    info!("{}", banner());
    let settings = with_overrides(persisted.clone(), &cli);

    match cli.command {
        Commands::Systems => {
            let systems = client(&settings)?.list_systems().await?;
            let rows: Vec<Vec<String>> = systems
                .into_iter()
                .map(|system| vec![system.id.to_string(), system.name])
                .collect();
            print!("{}", render_table(&["Id", "Name"], &rows));
        }
        Commands::Planets { system } => {
            let planets = client(&settings)?.list_planets(system, None).await?;
            let rows: Vec<Vec<String>> = planets
                .into_iter()
                .map(|planet| {
                    vec![
                        planet.id.to_string(),
                        planet.name,
                        planet.system_id.to_string(),
                    ]
                })
                .collect();
            print!("{}", render_table(&["Id", "Name", "System"], &rows));
        }
        Commands::Terminals { system, planet } => {
            let terminals = client(&settings)?
                .list_terminals(system, planet, None)
                .await?;
            let rows: Vec<Vec<String>> = terminals
                .into_iter()
                .map(|terminal| {
                    let hangar = if terminal.is_space_station_terminal {
                        "station"
                    } else if terminal.is_city_terminal {
                        "city"
                    } else {
                        "public"
                    };
                    vec![
                        terminal.id.to_string(),
                        terminal.name,
                        hangar.to_string(),
                        terminal
                            .max_container_size
                            .map(|mcs| mcs.to_string())
                            .unwrap_or_default(),
                    ]
                })
                .collect();
            print!(
                "{}",
                render_table(&["Id", "Name", "Hangar", "Max Container"], &rows)
            );
        }
        Commands::Prices { terminal } => {
            let offers = client(&settings)?.list_buy_offers(terminal).await?;
            print!("{}", render_offers(&offers));
        }
        Commands::Search(args) => search(args, &settings).await?,
        Commands::Trade(args) => trade(args, &settings).await?,
        Commands::Config { action } => config(action, persisted)?,
    }
    Ok(())
}

fn with_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if cli.api_key.is_some() {
        settings.api_key = cli.api_key.clone();
    }
    if cli.secret_key.is_some() {
        settings.secret_key = cli.secret_key.clone();
    }
    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    settings.debug |= cli.debug;
    settings
}

fn client(settings: &Settings) -> Result<UexClient> {
    let client = UexClient::with_base_url(&settings.base_url)
        .with_context(|| format!("cannot use base URL {}", settings.base_url))?
        .with_ttl(settings.cache_ttl())
        .with_api_key(settings.api_key.clone());
    Ok(client)
}

/// Logs each batch of results as the search moves through departure terminals.
fn log_progress(progress: &SearchProgress, top: &[TradeRoute]) {
    match top.first() {
        Some(best) => info!(
            best = %best.total_margin_label(),
            commodity = %best.commodity_name,
            "{}",
            progress_line(progress)
        ),
        None => info!("{}", progress_line(progress)),
    }
}

async fn search(args: SearchArgs, settings: &Settings) -> Result<()> {
    let policy = args.policy(settings.page_size)?;
    let source: Box<dyn RecordSource> = match &args.snapshot {
        Some(path) => Box::new(
            InMemorySource::from_snapshot(path)
                .with_context(|| format!("cannot load snapshot {}", path.display()))?,
        ),
        None => Box::new(client(settings)?),
    };

    let outcome = match search_trade_routes(source.as_ref(), &policy, &mut log_progress).await {
        Ok(outcome) => outcome,
        Err(error) => {
            let partial = error.partial_routes();
            if !partial.is_empty() {
                warn!(routes = partial.len(), "Showing incomplete results");
                print!("{}", render_routes(partial));
            }
            return Err(error).context("trade route search failed");
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.routes)?);
    } else {
        print!("{}", render_routes(&outcome.routes));
        println!(
            "{} of {} routes shown ({} candidates evaluated, {} rejected, {} out of scope)",
            outcome.routes.len(),
            outcome.total_accepted,
            outcome.candidates_evaluated,
            outcome.rejected,
            outcome.excluded
        );
    }

    if let Some(rank) = args.select {
        let Some(route) = rank.checked_sub(1).and_then(|index| outcome.routes.get(index)) else {
            bail!("no route at rank {rank}");
        };
        for operation in [Operation::Buy, Operation::Sell] {
            let declaration = TradeDeclaration::from_route(route, operation)?;
            println!(
                "uex-trader trade {} --terminal {} --commodity {} --scu {} --price {}",
                operation.label(),
                declaration.terminal_id,
                declaration.commodity_id,
                declaration.scu,
                declaration.price
            );
        }
    }
    Ok(())
}

async fn trade(args: TradeArgs, settings: &Settings) -> Result<()> {
    let declaration = TradeDeclaration::new(
        args.terminal,
        args.commodity,
        args.operation.into(),
        args.scu,
        args.price,
    )?;
    let secret_key = settings.secret_key.as_deref().unwrap_or_default();
    let client = client(settings)?;
    let (terminal, offer) = confirm_trade_target(&client, &declaration)
        .await
        .context("cannot declare this trade")?;
    info!(
        terminal = %terminal.name,
        commodity = %offer.commodity_name,
        "Trade target confirmed"
    );
    let trade_id = client
        .submit_trade(&declaration, secret_key)
        .await
        .context("failed to submit trade")?;
    println!("Trade recorded with id {trade_id}");
    Ok(())
}

fn config(action: ConfigAction, mut settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            if let Some(path) = settings_path() {
                println!("Settings file: {}", path.display());
            }
            let rows: Vec<Vec<String>> = settings
                .describe()
                .into_iter()
                .map(|(key, value)| vec![key.to_string(), value])
                .collect();
            print!("{}", render_table(&["Key", "Value"], &rows));
        }
        ConfigAction::Set { key, value } => {
            settings.set(&key, &value)?;
            save_settings(&settings).context("failed to save settings")?;
            println!("Saved {key}");
        }
    }
    Ok(())
}

mod app;
mod cli;

use anyhow::Result;
use clap::Parser;

use uex_trader::util::{logging, persistence};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let settings = persistence::load_settings();
    logging::init(args.debug || settings.debug);

    app::run(args, settings).await
}

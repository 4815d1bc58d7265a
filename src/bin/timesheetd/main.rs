// SPDX-License-Identifier: MPL-2.0

use anyhow::{Context as _, Result};
use clap::Parser;
use timesheetd::{api, commands::Arguments, config::load_config, records::Database};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Arguments::parse();

    stderrlog::new()
        .quiet(args.quiet)
        .verbosity(args.verbose as usize + 2)
        .init()?;

    let mut config = load_config(args.config);
    if let Some(database_path) = args.database {
        config.database_path = database_path;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    let database = Database::open(&config.database_path, config.busy_timeout)
        .with_context(|| format!("could not open database {:?}", config.database_path))?;
    log::info!("Using database at {:?}", database.path());

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("could not listen on {}", config.bind))?;
    api::serve(listener, database).await
}

use std::time::Duration;

use free_games_api::config::Config;
use free_games_api::global::Global;
use free_games_api::{http, scraper};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .parse_lossy(&config.level),
        )
        .init();

    tracing::info!("starting free games api");

    let global = Global::init(config).await?;
    let sweep_interval = Duration::from_secs(global.config.cache.sweep_interval_secs);

    tracing::info!("all services initialized");

    tokio::select! {
        r = http::run(global.clone()) => {
            if let Err(e) = r {
                tracing::error!("http server error: {:#}", e);
            }
        }
        r = scraper::run(global.clone()) => {
            if let Err(e) = r {
                tracing::error!("scraper error: {:#}", e);
            }
        }
        _ = global.cache.sweep_every(sweep_interval) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

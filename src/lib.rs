pub mod cli;
pub mod core;
pub mod providers;
pub mod store;
pub mod swap;

use crate::core::config::SwapConfig;
use crate::core::rate::{CurrencyPair, ExchangeRateQuery};
use crate::store::{DiskStore, MemoryStore};
use crate::swap::{Dependencies, Swap};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Services,
    Latest { pair: String },
    Historical { pair: String, date: String },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("rateswap starting...");

    let config = match config_path {
        Some(path) => SwapConfig::load_from_path(path)?,
        None => SwapConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let swap = bootstrap(&config)?;
    match command {
        AppCommand::Services => Ok(cli::services::run(&config, &swap)?),
        AppCommand::Latest { pair } => {
            let pair = parse_pair(&pair)?;
            cli::rate::run(&swap, ExchangeRateQuery::latest(pair)).await
        }
        AppCommand::Historical { pair, date } => {
            let pair = parse_pair(&pair)?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date \"{date}\", expected YYYY-MM-DD"))?;
            cli::rate::run(&swap, ExchangeRateQuery::historical(pair, date)).await
        }
    }
}

/// Builds the resolver with the stores the CLI offers: `memory`, and `disk`
/// when the configuration asks for it.
pub fn bootstrap(config: &SwapConfig) -> Result<Swap> {
    let mut deps = Dependencies::new().with_cache_store("memory", Arc::new(MemoryStore::new()));

    let cache = config
        .cache_ref()
        .context("Failed to build exchange rate services")?;
    if cache.is_some_and(|cache| cache.store == "disk") {
        let path = config.default_data_path()?.join("cache");
        let default_ttl = config.options.disk_cache_ttl.map(Duration::from_secs);
        let store = DiskStore::open(&path, default_ttl)
            .with_context(|| format!("Failed to open disk cache at {}", path.display()))?;
        deps = deps.with_cache_store("disk", Arc::new(store));
    }

    swap::build(config, &deps).context("Failed to build exchange rate services")
}

fn parse_pair(pair: &str) -> Result<CurrencyPair> {
    pair.parse::<CurrencyPair>()
        .with_context(|| format!("Invalid currency pair \"{pair}\", expected BASE/QUOTE"))
}

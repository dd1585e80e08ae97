pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::convert::ConvertArgs;
use crate::cli::favorites::FavoritesAction;
use crate::cli::history::HistoryAction;
use crate::core::config::{AppConfig, StorageMode};
use crate::core::converter::{Converter, Settings, Stores};
use crate::core::currency::CurrencyRateProvider;
use crate::providers::{BackendClient, ExchangeRateApiProvider};
use crate::store::local::{LocalFavoritesStore, LocalHistoryStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert(ConvertArgs),
    History(HistoryAction),
    Favorites(FavoritesAction),
    Recent {
        from: Option<String>,
        to: Option<String>,
    },
    Currencies {
        search: Option<String>,
    },
    Interactive,
}

pub fn rate_provider(config: &AppConfig) -> Arc<dyn CurrencyRateProvider> {
    let exchange_rate = &config.providers.exchange_rate;
    Arc::new(ExchangeRateApiProvider::new(
        &exchange_rate.base_url,
        &exchange_rate.api_key,
    ))
}

/// Wires the stores selected by the config.
pub fn open_stores(config: &AppConfig) -> Result<Stores> {
    let storage = store::open_storage(config);

    let stores = match config.storage {
        StorageMode::Local => Stores {
            history: Arc::new(LocalHistoryStore::new(Arc::clone(&storage))),
            favorites: Arc::new(LocalFavoritesStore::new(Arc::clone(&storage))),
            storage,
        },
        StorageMode::Remote => {
            let backend = config
                .providers
                .backend
                .as_ref()
                .context("`storage: remote` needs providers.backend in the config")?;
            let client = Arc::new(BackendClient::new(
                &backend.base_url,
                backend.token.as_deref(),
            )?);
            Stores {
                history: client.clone(),
                favorites: client,
                storage,
            }
        }
    };
    Ok(stores)
}

pub async fn open_converter(config: &AppConfig) -> Result<Converter> {
    let stores = open_stores(config)?;
    Ok(Converter::load(stores, Settings::from_config(config)).await)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("xfx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = rate_provider(&config);

    match command {
        AppCommand::Currencies { search } => {
            cli::currencies::run(provider.as_ref(), &config.from_currency, search.as_deref()).await
        }
        AppCommand::Convert(args) => {
            let mut converter = open_converter(&config).await?;
            cli::convert::run(&mut converter, provider.as_ref(), args).await
        }
        AppCommand::History(action) => {
            let mut converter = open_converter(&config).await?;
            cli::history::run(&mut converter, action).await
        }
        AppCommand::Favorites(action) => {
            let mut converter = open_converter(&config).await?;
            cli::favorites::run(&mut converter, action).await
        }
        AppCommand::Recent { from, to } => {
            let mut converter = open_converter(&config).await?;
            cli::recent::run(&mut converter, from, to)
        }
        AppCommand::Interactive => {
            let mut converter = open_converter(&config).await?;
            cli::interactive::run(&mut converter, provider).await
        }
    }
}

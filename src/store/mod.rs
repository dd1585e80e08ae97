pub mod disk;
pub mod local;
pub mod memory;

use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use disk::DiskStorage;
use memory::MemoryStorage;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key for the conversion history snapshot.
pub const HISTORY_KEY: &str = "conversionHistory";
/// Storage key for recent amounts, grouped by pair.
pub const RECENT_AMOUNTS_KEY: &str = "recentAmounts";
/// Storage key for favorites when no backend is used.
pub const FAVORITES_KEY: &str = "favoritePairs";

/// String-keyed storage for JSON blobs.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Opens the on-disk storage under the configured data directory, falling back
/// to memory (nothing survives the process) when it cannot be opened.
pub fn open_storage(config: &AppConfig) -> Arc<dyn KeyValueStorage> {
    let opened = config
        .default_data_path()
        .and_then(|path| DiskStorage::open(&path.join("store")));

    match opened {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            warn!(error = %e, "Falling back to in-memory storage");
            Arc::new(MemoryStorage::new())
        }
    }
}

/// Reads a JSON value, degrading to the default when missing or unreadable.
pub fn load_json<T>(storage: &dyn KeyValueStorage, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("Nothing stored under {}", key);
            return T::default();
        }
        Err(e) => {
            warn!(error = %e, "Failed to read {}", key);
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Discarding unreadable data stored under {}", key);
            T::default()
        }
    }
}

pub fn save_json<T>(storage: &dyn KeyValueStorage, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value).with_context(|| format!("Failed to encode {key}"))?;
    storage
        .set(key, &raw)
        .with_context(|| format!("Failed to save {key}"))?;
    debug!("Saved {} ({} bytes)", key, raw.len());
    Ok(())
}

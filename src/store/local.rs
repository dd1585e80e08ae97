//! History and favorites kept in local key-value storage.

use crate::core::favorites::{FavoritePair, FavoritesStore};
use crate::core::history::{HistoryChange, HistoryEntry, HistoryStore};
use crate::core::ids::new_id;
use crate::store::{FAVORITES_KEY, HISTORY_KEY, KeyValueStorage, load_json, save_json};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Stores the whole history list under one key on every change.
pub struct LocalHistoryStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl LocalHistoryStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl HistoryStore for LocalHistoryStore {
    async fn load(&self) -> Result<Vec<HistoryEntry>> {
        Ok(load_json(self.storage.as_ref(), HISTORY_KEY))
    }

    async fn persist(&self, change: HistoryChange<'_>, snapshot: &[HistoryEntry]) -> Result<()> {
        debug!(?change, "Saving {} history entries", snapshot.len());
        save_json(self.storage.as_ref(), HISTORY_KEY, snapshot)
    }
}

pub struct LocalFavoritesStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl LocalFavoritesStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    fn read(&self) -> Vec<FavoritePair> {
        load_json(self.storage.as_ref(), FAVORITES_KEY)
    }
}

#[async_trait]
impl FavoritesStore for LocalFavoritesStore {
    async fn list(&self) -> Result<Vec<FavoritePair>> {
        Ok(self.read())
    }

    async fn add(&self, from_currency: &str, to_currency: &str) -> Result<FavoritePair> {
        let mut pairs = self.read();
        if let Some(existing) = pairs.iter().find(|p| p.is_pair(from_currency, to_currency)) {
            return Ok(existing.clone());
        }

        let pair = FavoritePair {
            id: new_id("fav"),
            from_currency: from_currency.to_string(),
            to_currency: to_currency.to_string(),
            created_at: Some(Utc::now()),
        };
        pairs.push(pair.clone());
        save_json(self.storage.as_ref(), FAVORITES_KEY, &pairs)?;
        Ok(pair)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let mut pairs = self.read();
        pairs.retain(|p| p.id != id);
        save_json(self.storage.as_ref(), FAVORITES_KEY, &pairs)
    }
}

//! Favorite currency pairs

use crate::core::ids::deserialize_id;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoritePair {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FavoritePair {
    pub fn is_pair(&self, from: &str, to: &str) -> bool {
        self.from_currency == from && self.to_currency == to
    }
}

#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// All favorites, oldest first.
    async fn list(&self) -> Result<Vec<FavoritePair>>;
    async fn add(&self, from_currency: &str, to_currency: &str) -> Result<FavoritePair>;
    async fn remove(&self, id: &str) -> Result<()>;
}

/// In-memory view of the favorites, unique per (from, to).
#[derive(Debug, Clone, Default)]
pub struct Favorites {
    pairs: Vec<FavoritePair>,
}

impl Favorites {
    pub fn new(pairs: Vec<FavoritePair>) -> Self {
        let mut favorites = Self::default();
        favorites.replace(pairs);
        favorites
    }

    /// Swaps in a fresh list, keeping the first occurrence of each pair.
    pub fn replace(&mut self, pairs: Vec<FavoritePair>) {
        self.pairs.clear();
        for pair in pairs {
            if self.find(&pair.from_currency, &pair.to_currency).is_none() {
                self.pairs.push(pair);
            }
        }
    }

    pub fn find(&self, from: &str, to: &str) -> Option<&FavoritePair> {
        self.pairs.iter().find(|p| p.is_pair(from, to))
    }

    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.find(from, to).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&FavoritePair> {
        self.pairs.iter().find(|p| p.id == id)
    }

    pub fn push(&mut self, pair: FavoritePair) {
        if !self.contains(&pair.from_currency, &pair.to_currency) {
            self.pairs.push(pair);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<FavoritePair> {
        let pos = self.pairs.iter().position(|p| p.id == id)?;
        Some(self.pairs.remove(pos))
    }

    pub fn first(&self) -> Option<&FavoritePair> {
        self.pairs.first()
    }

    pub fn pairs(&self) -> &[FavoritePair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

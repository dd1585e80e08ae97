//! Conversion history: a capped, most-recent-first list of committed
//! conversions.

use crate::core::ids::{deserialize_id, deserialize_number, new_id};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub from_amount: String,
    pub from_currency: String,
    pub to_amount: String,
    pub to_currency: String,
    #[serde(deserialize_with = "deserialize_number")]
    pub rate: f64,
    #[serde(default)]
    pub description: Option<String>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    pub fn new(
        from_amount: &str,
        from_currency: &str,
        to_amount: &str,
        to_currency: &str,
        rate: f64,
        description: Option<String>,
    ) -> Self {
        Self {
            id: new_id("local"),
            from_amount: from_amount.to_string(),
            from_currency: from_currency.to_string(),
            to_amount: to_amount.to_string(),
            to_currency: to_currency.to_string(),
            rate,
            description: description.filter(|d| !d.trim().is_empty()),
            timestamp: Some(Utc::now().timestamp_millis()),
            created_at: None,
        }
    }

    /// Two entries describe the same conversion when amounts and currencies
    /// match on both sides.
    pub fn same_conversion(&self, other: &HistoryEntry) -> bool {
        self.from_amount == other.from_amount
            && self.from_currency == other.from_currency
            && self.to_amount == other.to_amount
            && self.to_currency == other.to_currency
    }

    pub fn created_millis(&self) -> Option<i64> {
        self.timestamp
            .or_else(|| self.created_at.map(|at| at.timestamp_millis()))
    }
}

/// Entries dropped by an insertion.
#[derive(Debug, Default)]
pub struct Recorded {
    pub replaced: Option<HistoryEntry>,
    pub evicted: Vec<HistoryEntry>,
}

impl Recorded {
    pub fn removed(&self) -> Vec<HistoryEntry> {
        self.replaced
            .iter()
            .chain(self.evicted.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Restores a stored snapshot, keeping only the newest `limit` entries.
    pub fn from_entries(mut entries: Vec<HistoryEntry>, limit: usize) -> Self {
        entries.truncate(limit);
        Self { entries, limit }
    }

    /// Inserts at the front, replacing an identical conversion and evicting
    /// whatever falls past the limit.
    pub fn record(&mut self, entry: HistoryEntry) -> Recorded {
        let mut recorded = Recorded::default();

        if let Some(pos) = self.entries.iter().position(|e| e.same_conversion(&entry)) {
            recorded.replaced = Some(self.entries.remove(pos));
        }
        self.entries.insert(0, entry);

        if self.entries.len() > self.limit {
            recorded.evicted = self.entries.split_off(self.limit);
        }
        recorded
    }

    pub fn update_description(&mut self, id: &str, description: &str) -> Option<&HistoryEntry> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        entry.description = Some(description.trim().to_string()).filter(|d| !d.is_empty());
        Some(entry)
    }

    pub fn remove(&mut self, id: &str) -> Option<HistoryEntry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    pub fn clear(&mut self) -> Vec<HistoryEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The `n` most recent entries.
    pub fn recent(&self, n: usize) -> &[HistoryEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What changed in the history, alongside the full snapshot. Snapshot stores
/// rewrite everything, row stores apply the change.
#[derive(Debug, Clone, Copy)]
pub enum HistoryChange<'a> {
    Added {
        entry: &'a HistoryEntry,
        removed: &'a [HistoryEntry],
    },
    Updated(&'a HistoryEntry),
    Removed(&'a [HistoryEntry]),
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn load(&self) -> Result<Vec<HistoryEntry>>;
    async fn persist(&self, change: HistoryChange<'_>, snapshot: &[HistoryEntry]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(amount: &str) -> HistoryEntry {
        HistoryEntry::new(amount, "USD", &format!("{amount}0"), "EUR", 0.9, None)
    }

    #[test]
    fn test_record_keeps_most_recent_first() {
        let mut history = History::default();
        history.record(entry("1"));
        history.record(entry("2"));

        let amounts: Vec<&str> = history
            .entries()
            .iter()
            .map(|e| e.from_amount.as_str())
            .collect();
        assert_eq!(amounts, vec!["2", "1"]);
    }

    #[test]
    fn test_21st_entry_evicts_oldest() {
        let mut history = History::default();
        for i in 1..=20 {
            let recorded = history.record(entry(&i.to_string()));
            assert!(recorded.evicted.is_empty());
        }

        let recorded = history.record(entry("21"));
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(recorded.evicted.len(), 1);
        assert_eq!(recorded.evicted[0].from_amount, "1");
        assert_eq!(history.entries()[0].from_amount, "21");
        assert_eq!(history.entries()[19].from_amount, "2");
    }

    #[test]
    fn test_duplicate_replaces_instead_of_growing() {
        let mut history = History::default();
        let first = entry("100");
        let first_id = first.id.clone();
        history.record(first);
        history.record(entry("5"));

        let recorded = history.record(entry("100"));
        assert_eq!(history.len(), 2);
        assert_eq!(recorded.replaced.map(|e| e.id), Some(first_id.clone()));
        assert_eq!(history.entries()[0].from_amount, "100");
        assert_ne!(history.entries()[0].id, first_id);
        assert_eq!(history.entries()[1].from_amount, "5");
    }

    #[test]
    fn test_same_amount_other_currency_is_not_duplicate() {
        let mut history = History::default();
        history.record(entry("100"));
        history.record(HistoryEntry::new("100", "USD", "1000", "GBP", 0.9, None));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_update_remove_clear() {
        let mut history = History::default();
        let e = entry("7");
        let id = e.id.clone();
        history.record(e);
        history.record(entry("8"));

        let updated = history.update_description(&id, "  lunch ").unwrap();
        assert_eq!(updated.description.as_deref(), Some("lunch"));
        assert!(history.update_description("missing", "x").is_none());

        assert_eq!(history.recent(1).len(), 1);
        assert_eq!(history.recent(10).len(), 2);

        assert!(history.remove(&id).is_some());
        assert!(history.get(&id).is_none());
        assert_eq!(history.clear().len(), 1);
        assert!(history.is_empty());
    }

    #[test]
    fn test_from_entries_truncates() {
        let entries: Vec<HistoryEntry> = (0..30).map(|i| entry(&i.to_string())).collect();
        let history = History::from_entries(entries, HISTORY_LIMIT);
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0].from_amount, "0");
    }

    #[test]
    fn test_blank_description_is_none() {
        let e = HistoryEntry::new("1", "USD", "2", "EUR", 2.0, Some("   ".to_string()));
        assert!(e.description.is_none());
    }

    #[test]
    fn test_deserializes_backend_row() {
        let row = r#"{
            "id": 17,
            "from_amount": "100",
            "from_currency": "USD",
            "to_amount": "90",
            "to_currency": "EUR",
            "rate": 0.9,
            "description": null,
            "created_at": "2025-01-02T03:04:05Z"
        }"#;
        let entry: HistoryEntry = serde_json::from_str(row).unwrap();
        assert_eq!(entry.id, "17");
        assert!(entry.timestamp.is_none());
        assert_eq!(entry.created_millis(), Some(1_735_787_045_000));
    }
}

//! Recently used amounts, grouped by currency pair.
//!
//! Each pair keeps five visible entries. An entry pushed past the limit stays
//! in its bucket flagged as fading until the caller evicts it, so the screen
//! can animate it out.

use crate::core::ids::new_id;
use crate::core::state::EditDirection;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAmountEntry {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub last_edited: EditDirection,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing)]
    pub fading_out: bool,
}

impl RecentAmountEntry {
    /// Same conversion in the same direction, or the mirror image left behind
    /// by a currency swap.
    fn is_equivalent(&self, from: &str, to: &str, direction: EditDirection) -> bool {
        (self.from == from && self.to == to && self.last_edited == direction)
            || (self.from == to && self.to == from && self.last_edited == direction.flipped())
    }

    /// Whether this entry was typed into the same field with the same value.
    fn same_input(&self, from: &str, to: &str, direction: EditDirection) -> bool {
        self.last_edited == direction
            && match direction {
                EditDirection::From => self.from == from,
                EditDirection::To => self.to == to,
            }
    }
}

pub fn pair_key(from_currency: &str, to_currency: &str) -> String {
    format!("{from_currency}_{to_currency}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecentOutcome {
    /// An equivalent entry exists in this pair or its reverse.
    Duplicate,
    Inserted { key: String, fading: bool },
}

#[derive(Debug, Clone)]
pub struct RecentAmounts {
    buckets: BTreeMap<String, Vec<RecentAmountEntry>>,
    limit: usize,
}

impl Default for RecentAmounts {
    fn default() -> Self {
        Self::new(RECENT_LIMIT)
    }
}

impl RecentAmounts {
    pub fn new(limit: usize) -> Self {
        Self {
            buckets: BTreeMap::new(),
            limit,
        }
    }

    /// Restores stored buckets. Older records without a direction or id get
    /// defaults, and nothing restored is left fading.
    pub fn from_snapshot(snapshot: BTreeMap<String, Vec<RecentAmountEntry>>, limit: usize) -> Self {
        let now = Utc::now().timestamp_millis();
        let buckets = snapshot
            .into_iter()
            .map(|(key, entries)| {
                let entries: Vec<RecentAmountEntry> = entries
                    .into_iter()
                    .take(limit)
                    .enumerate()
                    .map(|(idx, mut entry)| {
                        if entry.id.is_empty() {
                            entry.id = format!("{key}-{idx}-{now}");
                        }
                        entry.fading_out = false;
                        entry
                    })
                    .collect();
                (key, entries)
            })
            .collect();

        Self { buckets, limit }
    }

    pub fn snapshot(&self) -> &BTreeMap<String, Vec<RecentAmountEntry>> {
        &self.buckets
    }

    fn bucket(&self, key: &str) -> &[RecentAmountEntry] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn record(
        &mut self,
        from_currency: &str,
        to_currency: &str,
        from: &str,
        to: &str,
        direction: EditDirection,
    ) -> RecentOutcome {
        let key = pair_key(from_currency, to_currency);
        let reverse = pair_key(to_currency, from_currency);

        let exists = self
            .bucket(&key)
            .iter()
            .chain(self.bucket(&reverse))
            .any(|e| e.is_equivalent(from, to, direction));
        if exists {
            return RecentOutcome::Duplicate;
        }

        let limit = self.limit;
        let bucket = self.buckets.entry(key.clone()).or_default();
        bucket.retain(|e| !e.same_input(from, to, direction));
        bucket.insert(
            0,
            RecentAmountEntry {
                from: from.to_string(),
                to: to.to_string(),
                last_edited: direction,
                id: new_id(&key),
                fading_out: false,
            },
        );

        let fading = bucket.len() > limit;
        if fading {
            bucket[limit].fading_out = true;
            bucket.truncate(limit + 1);
        }
        RecentOutcome::Inserted { key, fading }
    }

    /// Drops fading entries from a bucket. Returns true if anything changed.
    pub fn evict_faded(&mut self, key: &str) -> bool {
        let limit = self.limit;
        match self.buckets.get_mut(key) {
            Some(bucket) => {
                let before = bucket.len();
                bucket.retain(|e| !e.fading_out);
                bucket.truncate(limit);
                bucket.len() != before
            }
            None => false,
        }
    }

    /// Entries for a pair, including one that is fading out.
    pub fn entries(&self, from_currency: &str, to_currency: &str) -> &[RecentAmountEntry] {
        self.bucket(&pair_key(from_currency, to_currency))
    }

    /// Entries for a pair that are not on their way out.
    pub fn visible(&self, from_currency: &str, to_currency: &str) -> Vec<&RecentAmountEntry> {
        self.entries(from_currency, to_currency)
            .iter()
            .filter(|e| !e.fading_out)
            .collect()
    }
}

//! The converter screen's controller.
//!
//! `Converter` owns the conversion state, the history, the recent amounts,
//! the favorites and the timers that decide when a recent amount is recorded
//! or faded out. Callers feed it inputs and clock ticks and execute the rate
//! requests it hands back.

use crate::core::config::AppConfig;
use crate::core::favorites::{FavoritePair, Favorites, FavoritesStore};
use crate::core::format::Amount;
use crate::core::history::{History, HistoryChange, HistoryEntry, HistoryStore, HISTORY_LIMIT};
use crate::core::recent::{RecentAmountEntry, RecentAmounts, RecentOutcome, RECENT_LIMIT};
use crate::core::state::{ConverterState, EditDirection, Input, RateRequest};
use crate::core::timer::Timer;
use crate::store::{KeyValueStorage, RECENT_AMOUNTS_KEY, load_json, save_json};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Settings {
    pub default_from: String,
    pub default_to: String,
    /// Quiet period before a conversion is remembered as a recent amount.
    pub debounce: Duration,
    /// How long an entry pushed out of the recent list lingers.
    pub fade: Duration,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Self {
        Settings {
            default_from: config.from_currency.clone(),
            default_to: config.to_currency.clone(),
            debounce: config.tracking.debounce(),
            fade: config.tracking.fade(),
        }
    }
}

pub struct Stores {
    pub storage: Arc<dyn KeyValueStorage>,
    pub history: Arc<dyn HistoryStore>,
    pub favorites: Arc<dyn FavoritesStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    fn success(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

/// Fields whose change restarts the recent amount debounce.
#[derive(PartialEq)]
struct Tracked {
    amount: Amount,
    to_amount: Amount,
    from_currency: String,
    to_currency: String,
    direction: EditDirection,
    rate: Option<f64>,
}

pub struct Converter {
    state: ConverterState,
    history: History,
    recent: RecentAmounts,
    favorites: Favorites,
    recent_timer: Timer,
    fade_timers: HashMap<String, Timer>,
    stores: Stores,
    settings: Settings,
}

impl Converter {
    /// Builds a converter on the default pair with everything the stores hold.
    /// Unreadable stores start empty.
    pub async fn load(stores: Stores, settings: Settings) -> Self {
        let history = match stores.history.load().await {
            Ok(entries) => History::from_entries(entries, HISTORY_LIMIT),
            Err(e) => {
                warn!(error = %e, "Failed to load history");
                History::default()
            }
        };

        let favorites = match stores.favorites.list().await {
            Ok(pairs) => Favorites::new(pairs),
            Err(e) => {
                warn!(error = %e, "Failed to load favorites");
                Favorites::default()
            }
        };

        let snapshot: BTreeMap<String, Vec<RecentAmountEntry>> =
            load_json(stores.storage.as_ref(), RECENT_AMOUNTS_KEY);
        let recent = RecentAmounts::from_snapshot(snapshot, RECENT_LIMIT);

        debug!(
            "Loaded {} history entries, {} favorites",
            history.len(),
            favorites.pairs().len()
        );

        Converter {
            state: ConverterState::new(&settings.default_from, &settings.default_to),
            history,
            recent,
            favorites,
            recent_timer: Timer::new(),
            fade_timers: HashMap::new(),
            stores,
            settings,
        }
    }

    pub fn state(&self) -> &ConverterState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn is_favorite(&self) -> bool {
        self.favorites
            .contains(&self.state.from_currency, &self.state.to_currency)
    }

    /// Recent amounts for the current pair, including one fading out.
    pub fn recent_amounts(&self) -> &[RecentAmountEntry] {
        self.recent
            .entries(&self.state.from_currency, &self.state.to_currency)
    }

    pub fn visible_recent_amounts(&self) -> Vec<&RecentAmountEntry> {
        self.recent
            .visible(&self.state.from_currency, &self.state.to_currency)
    }

    /// Fetch for the current base currency, used at startup.
    pub fn request_rates(&mut self) -> RateRequest {
        self.state.request_rates()
    }

    fn tracked(&self) -> Tracked {
        Tracked {
            amount: self.state.amount.clone(),
            to_amount: self.state.to_amount.clone(),
            from_currency: self.state.from_currency.clone(),
            to_currency: self.state.to_currency.clone(),
            direction: self.state.last_edited,
            rate: self.state.current_rate(),
        }
    }

    /// Both amounts are nonzero and were computed with the current pair's rate.
    fn recordable(&self) -> bool {
        self.state.current_rate().is_some()
            && self.state.amount.is_nonzero()
            && self.state.to_amount.is_nonzero()
    }

    /// Applies an input and restarts or cancels the recent amount debounce
    /// when a tracked field changed. After a base change the debounce waits
    /// for the new rate table.
    pub fn apply(&mut self, input: Input, now: Instant) -> Option<RateRequest> {
        let before = self.tracked();
        let request = self.state.apply(input);

        if self.tracked() != before {
            if self.recordable() {
                self.recent_timer.schedule(now, self.settings.debounce);
            } else {
                self.recent_timer.cancel();
            }
        }
        request
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.fade_timers
            .values()
            .filter_map(Timer::deadline)
            .chain(self.recent_timer.deadline())
            .min()
    }

    /// Fires due timers. Returns true when the recent amounts changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        let due: Vec<String> = self
            .fade_timers
            .iter_mut()
            .filter_map(|(key, timer)| timer.fire(now).then(|| key.clone()))
            .collect();
        for key in due {
            self.fade_timers.remove(&key);
            if self.recent.evict_faded(&key) {
                debug!("Evicted faded recent amount for {}", key);
                self.persist_recent();
                changed = true;
            }
        }

        if self.recent_timer.fire(now) {
            changed |= self.record_recent(now);
        }
        changed
    }

    /// Runs every pending timer to completion, as if the user had waited.
    /// One-shot commands use this before exiting.
    pub fn settle(&mut self) -> bool {
        let mut changed = false;
        while let Some(deadline) = self.next_deadline() {
            changed |= self.tick(deadline);
        }
        changed
    }

    fn record_recent(&mut self, now: Instant) -> bool {
        if !self.recordable() {
            return false;
        }
        let (Some(from), Some(to)) = (self.state.amount.value(), self.state.to_amount.value())
        else {
            return false;
        };

        // "0100" and "100." are the same amount as "100".
        let outcome = self.recent.record(
            &self.state.from_currency,
            &self.state.to_currency,
            Amount::from_value(from).as_str(),
            Amount::from_value(to).as_str(),
            self.state.last_edited,
        );
        match outcome {
            RecentOutcome::Duplicate => {
                debug!("Recent amount already tracked");
                false
            }
            RecentOutcome::Inserted { key, fading } => {
                if fading {
                    self.fade_timers
                        .entry(key)
                        .or_default()
                        .schedule(now, self.settings.fade);
                }
                self.persist_recent();
                true
            }
        }
    }

    fn persist_recent(&self) {
        if let Err(e) = save_json(
            self.stores.storage.as_ref(),
            RECENT_AMOUNTS_KEY,
            self.recent.snapshot(),
        ) {
            warn!(error = %e, "Failed to save recent amounts");
        }
    }

    /// History entry for the current conversion, if it can be computed.
    fn current_entry(&self, description: Option<String>) -> Option<HistoryEntry> {
        let rate = self.state.current_rate()?;
        let value = self
            .state
            .amount
            .value()
            .filter(|_| self.state.amount.is_nonzero())?;

        Some(HistoryEntry::new(
            Amount::from_value(value).as_str(),
            &self.state.from_currency,
            Amount::from_value(value * rate).as_str(),
            &self.state.to_currency,
            rate,
            description,
        ))
    }

    async fn record_history(&mut self, entry: HistoryEntry) -> anyhow::Result<()> {
        let removed = self.history.record(entry).removed();
        let entries = self.history.entries();
        let change = HistoryChange::Added {
            entry: &entries[0],
            removed: &removed,
        };
        self.stores.history.persist(change, entries).await?;

        // Stores may assign their own ids, read them back.
        match self.stores.history.load().await {
            Ok(entries) => self.history = History::from_entries(entries, HISTORY_LIMIT),
            Err(e) => warn!(error = %e, "Failed to reload history"),
        }
        Ok(())
    }

    /// Records the current conversion in the history. Does nothing without a
    /// rate or a nonzero amount.
    pub async fn commit(&mut self) -> Option<HistoryEntry> {
        let entry = self.current_entry(None)?;
        if let Err(e) = self.record_history(entry.clone()).await {
            warn!(error = %e, "Failed to save history");
        }
        Some(entry)
    }

    /// Like `commit`, with a description and a notification for the user.
    pub async fn save(&mut self, description: Option<String>) -> Notification {
        if self.state.current_rate().is_none() {
            return Notification::error("No exchange rate available");
        }
        let Some(entry) = self.current_entry(description) else {
            return Notification::error("Enter an amount to save");
        };

        match self.record_history(entry).await {
            Ok(()) => Notification::success("Conversion saved successfully!"),
            Err(e) => {
                warn!(error = %e, "Failed to save history");
                Notification::error(format!("Error: {e}"))
            }
        }
    }

    pub async fn update_history_description(&mut self, id: &str, description: &str) -> bool {
        let Some(entry) = self.history.update_description(id, description).cloned() else {
            return false;
        };
        if let Err(e) = self
            .stores
            .history
            .persist(HistoryChange::Updated(&entry), self.history.entries())
            .await
        {
            warn!(error = %e, "Failed to update history description");
        }
        true
    }

    pub async fn remove_history(&mut self, id: &str) -> bool {
        let Some(entry) = self.history.remove(id) else {
            return false;
        };
        let removed = [entry];
        if let Err(e) = self
            .stores
            .history
            .persist(HistoryChange::Removed(&removed), self.history.entries())
            .await
        {
            warn!(error = %e, "Failed to remove history entry");
        }
        true
    }

    /// Empties the history and starts over on the first favorite, or the
    /// default pair.
    pub async fn clear_history(&mut self, now: Instant) -> Option<RateRequest> {
        let removed = self.history.clear();
        if let Err(e) = self
            .stores
            .history
            .persist(HistoryChange::Removed(&removed), &[])
            .await
        {
            warn!(error = %e, "Failed to clear history");
        }

        let (from, to) = match self.favorites.first() {
            Some(pair) => (pair.from_currency.clone(), pair.to_currency.clone()),
            None => (
                self.settings.default_from.clone(),
                self.settings.default_to.clone(),
            ),
        };
        self.apply(Input::Reset { from, to }, now)
    }

    /// Restores a history entry's amount and pair.
    pub fn load_history_entry(&mut self, id: &str, now: Instant) -> Option<RateRequest> {
        let entry = self.history.get(id)?.clone();
        let request = self.apply(
            Input::SetPair {
                from: entry.from_currency,
                to: entry.to_currency,
            },
            now,
        );
        self.apply(
            Input::LoadAmounts {
                from: Amount::from_text(entry.from_amount),
                to: Amount::from_text(entry.to_amount),
                direction: EditDirection::From,
            },
            now,
        );
        request
    }

    /// Restores the visible recent amount at `index` for the current pair.
    pub fn load_recent(&mut self, index: usize, now: Instant) -> bool {
        let Some(entry) = self.visible_recent_amounts().get(index).map(|e| (*e).clone()) else {
            return false;
        };
        self.apply(
            Input::LoadAmounts {
                from: Amount::from_text(entry.from),
                to: Amount::from_text(entry.to),
                direction: entry.last_edited,
            },
            now,
        );
        true
    }

    pub fn load_favorite(&mut self, id: &str, now: Instant) -> Option<RateRequest> {
        let pair = self.favorites.get(id)?.clone();
        self.apply(
            Input::SetPair {
                from: pair.from_currency,
                to: pair.to_currency,
            },
            now,
        )
    }

    async fn refresh_favorites(&mut self) {
        match self.stores.favorites.list().await {
            Ok(pairs) => self.favorites.replace(pairs),
            Err(e) => warn!(error = %e, "Failed to reload favorites"),
        }
    }

    /// Adds the current pair to the favorites, or removes it when already
    /// there. Returns whether the pair is a favorite afterwards.
    pub async fn toggle_favorite(&mut self) -> bool {
        let from = self.state.from_currency.clone();
        let to = self.state.to_currency.clone();

        if let Some(id) = self.favorites.find(&from, &to).map(|p| p.id.clone()) {
            self.remove_favorite(&id).await;
        } else {
            match self.stores.favorites.add(&from, &to).await {
                Ok(pair) => {
                    self.favorites.push(pair);
                    self.refresh_favorites().await;
                }
                Err(e) => warn!(error = %e, "Failed to add favorite {}/{}", from, to),
            }
        }
        self.is_favorite()
    }

    pub async fn remove_favorite(&mut self, id: &str) -> Option<FavoritePair> {
        let removed = self.favorites.remove(id)?;
        match self.stores.favorites.remove(id).await {
            Ok(()) => self.refresh_favorites().await,
            Err(e) => warn!(error = %e, "Failed to remove favorite {}", id),
        }
        Some(removed)
    }
}

//! Core business logic abstractions

pub mod catalog;
pub mod config;
pub mod converter;
pub mod currency;
pub mod favorites;
pub mod format;
pub mod history;
pub mod ids;
pub mod log;
pub mod recent;
pub mod state;
pub mod timer;

// Re-export main types for cleaner imports
pub use converter::{Converter, Notification, NotificationKind, Settings, Stores};
pub use currency::{CurrencyRateProvider, RateTable};
pub use favorites::FavoritesStore;
pub use history::HistoryStore;

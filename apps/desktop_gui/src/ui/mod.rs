//! UI layer for the desktop GUI: app shell and card painting.

pub mod app;
pub mod fan;

pub use app::{PersistedPreferences, TarotApp, SETTINGS_STORAGE_KEY};

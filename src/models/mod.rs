//! Data models for the CareFinder application.
//!
//! This module contains all the core data structures used throughout the app:
//! - [`AppState`]: The central state container (location, search, results, banner)
//! - [`UserConfig`] / [`AppSettings`]: Settings loaded from `CareFinder Settings.yaml`
//! - [`Location`], [`ProviderRecord`]: Search domain types and wire shapes
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Serializable**: config structs derive `Serialize`/`Deserialize` for YAML,
//!   wire types derive `Deserialize` for the backend's JSON
//! - **Cloneable**: `AppState` is wrapped in `Arc<RwLock<>>` by
//!   [`StateManager`](crate::state::StateManager) for thread-safe access
//! - **Passive**: all mutations go through `StateManager::update()` so the UI
//!   hears about them

pub mod app_state;
pub mod config;
pub mod provider;

pub use app_state::AppState;
pub use config::{AppSettings, UserConfig};
pub use provider::{
    CONTACT_UNAVAILABLE, FeedbackResponse, Location, ProviderRecord, ProviderTypesResponse,
    SearchResponse,
};

// CareFinder - Healthcare Provider Locator
//
// This is the library crate containing the state, map, and service logic.
// The binary crate (main.rs) provides the GUI entry point.

pub mod config;
pub mod logging;
pub mod map;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AppSettings, AppState, UserConfig};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

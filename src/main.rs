//! CareFinder - Healthcare Provider Locator
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend for CareFinder. It
//! initializes:
//! - Logging infrastructure (daily file rotation + console output)
//! - Tokio async runtime (worker threads for HTTP requests and timers)
//! - State management ([`StateManager`])
//! - Configuration loading ([`ConfigManager`])
//! - GUI controller ([`GuiController`] - bridges the Slint UI with state,
//!   map, and backend services)
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: Runs the Slint event loop (blocking, synchronous)
//! - **Tokio workers**: Handle async operations (backend requests,
//!   geolocation, banner auto-hide timers)
//! - **State listener**: Background std::thread for reactive UI updates
//!
//! # Configuration
//!
//! `CareFinder Data/CareFinder Settings.yaml` carries the backend URL, map
//! defaults, and the provider-type menu. A missing file falls back to
//! built-in defaults.

use anyhow::Result;
use carefinder::ui::GuiController;
use carefinder::{APP_NAME, ConfigManager, StateManager, VERSION};
use std::sync::Arc;

fn main() -> Result<()> {
    // Configuration decides the log level, but logging should be alive while
    // configuration loads; read the config first, then log its outcome
    let config_manager = ConfigManager::new("CareFinder Data")?;
    let user_config = config_manager.load_user_config()?;
    let settings = Arc::new(user_config.settings.clone());

    let _log_guard =
        carefinder::logging::setup_logging("logs", "carefinder", settings.debug_mode, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!(
        "Loaded settings - backend: {}, provider types: {}",
        settings.backend_url,
        settings.provider_types.len()
    );

    // Tokio runtime for backend requests and timers
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("carefinder-worker")
        .build()?;

    tracing::info!("Tokio runtime initialized with {} worker threads", 4);

    let state_manager = Arc::new(StateManager::new());
    tracing::info!("State manager initialized");

    // Wire the Slint UI to state management and the tokio runtime
    let gui_controller =
        GuiController::new(state_manager.clone(), settings, runtime.handle().clone())?;

    tracing::info!("GUI controller initialized, launching window");

    // Run the GUI (blocks until window is closed); the tokio runtime stays
    // alive in the background to serve in-flight requests
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}

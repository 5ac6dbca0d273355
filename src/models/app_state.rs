use crate::models::provider::{Location, ProviderRecord};

/// Single source of truth for all application state.
///
/// Everything the UI renders lives here: the current user location, the
/// in-flight search token, the authoritative provider list, and the error
/// banner. The original browser version scattered this across module-level
/// globals; here it is one struct owned by [`crate::state::StateManager`].
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by
/// [`crate::state::StateManager`]. Never access it directly - use
/// [`read()`](crate::state::StateManager::read) and
/// [`update()`](crate::state::StateManager::update) so change events fire.
#[derive(Clone, Debug)]
pub struct AppState {
    // Location state
    /// Set by exactly one of: device geolocation, map click. Replaced whole.
    pub location: Option<Location>,
    /// Device location request in flight (the trigger button is busy).
    pub is_locating: bool,

    // Search state
    pub is_searching: bool,
    /// Monotonically increasing token; one per search invocation. A response
    /// carrying an older token is stale and must be discarded.
    pub search_seq: u64,
    pub provider_type_index: usize,

    // Results (authoritative, replaced whole on every completed search)
    pub providers: Vec<ProviderRecord>,
    pub result_count: usize,
    /// Results panel visible (a search has completed since the last reset).
    pub has_results: bool,

    // Error banner
    pub error_banner: Option<String>,
    /// Bumped on every show/hide; an auto-hide timer only fires if its
    /// captured epoch is still current.
    pub error_epoch: u64,

    // Feedback modal
    pub feedback_target: Option<String>,
    pub feedback_open: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            location: None,
            is_locating: false,

            is_searching: false,
            search_seq: 0,
            provider_type_index: 0,

            providers: Vec::new(),
            result_count: 0,
            has_results: false,

            error_banner: None,
            error_epoch: 0,

            feedback_target: None,
            feedback_open: false,
        }
    }
}

impl AppState {
    /// Whether a search may be issued.
    pub fn location_known(&self) -> bool {
        self.location.is_some()
    }

    /// Drop the current result set. Called when a new search begins so stale
    /// cards never coexist with a fresh request.
    pub fn clear_results(&mut self) {
        self.providers.clear();
        self.result_count = 0;
        self.has_results = false;
    }

    /// Replace the result set wholesale with a completed response.
    pub fn apply_results(&mut self, providers: Vec<ProviderRecord>, count: usize) {
        self.providers = providers;
        self.result_count = count;
        self.has_results = true;
    }

    /// Coordinates panel text, or empty when no location is set.
    pub fn location_label(&self) -> String {
        self.location.map(|l| l.display()).unwrap_or_default()
    }
}

// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe
// access using Arc<RwLock<T>> and emits change events for GUI updates.

use crate::models::provider::{Location, ProviderRecord};
use crate::models::AppState;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events notify interested parties (primarily the GUI) about state
/// changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The user location was set (geolocation or map click)
    LocationSet {
        location: Location,
    },

    /// Device location request started or finished
    LocatingChanged {
        active: bool,
    },

    /// A search request was issued; `seq` is its request token
    SearchStarted {
        seq: u64,
    },

    /// The current search completed and the result set was replaced
    SearchFinished {
        count: usize,
    },

    /// The current search failed; no result set exists
    SearchFailed,

    /// Result cards and provider markers were dropped
    ResultsCleared,

    /// The error banner became visible with a new message
    ErrorShown {
        message: String,
        epoch: u64,
    },

    /// The error banner was hidden
    ErrorHidden,

    /// The feedback modal opened bound to a provider name
    FeedbackOpened {
        provider: String,
    },

    /// The feedback modal closed
    FeedbackClosed,

    /// The provider-type filter selection changed
    ProviderTypeChanged {
        index: usize,
    },
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Enforces the latest-request-wins rule for overlapping searches
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// Always use `StateManager` instead of accessing [`AppState`] directly:
/// - [`read()`](Self::read) for reading state without holding locks
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`StateChange`]: Event types emitted on state mutations
/// - [`crate::ui::controller::GuiController`]: Primary consumer of state events
pub struct StateManager {
    /// The application state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    ///
    /// This clones the entire state, so it's safe to use without holding locks.
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let known = state_manager.read(|state| state.location_known());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It:
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    /// Multiple subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.location != new.location {
            if let Some(location) = new.location {
                changes.push(StateChange::LocationSet { location });
            }
        }

        if old.is_locating != new.is_locating {
            changes.push(StateChange::LocatingChanged {
                active: new.is_locating,
            });
        }

        // A bumped token means a new request, even if a previous one never
        // cleared is_searching (overlap). A completed search always carries
        // has_results; a cleared busy flag without results is a failure.
        if new.search_seq > old.search_seq {
            changes.push(StateChange::SearchStarted {
                seq: new.search_seq,
            });
        } else if old.is_searching && !new.is_searching {
            if new.has_results {
                changes.push(StateChange::SearchFinished {
                    count: new.result_count,
                });
            } else {
                changes.push(StateChange::SearchFailed);
            }
        }

        if old.has_results && !new.has_results {
            changes.push(StateChange::ResultsCleared);
        }

        // Keyed on the epoch, not the text: re-showing the same message is a
        // new event and must re-arm the auto-hide timer
        if new.error_epoch != old.error_epoch {
            match &new.error_banner {
                Some(message) => changes.push(StateChange::ErrorShown {
                    message: message.clone(),
                    epoch: new.error_epoch,
                }),
                None => {
                    if old.error_banner.is_some() {
                        changes.push(StateChange::ErrorHidden);
                    }
                }
            }
        }

        if !old.feedback_open && new.feedback_open {
            changes.push(StateChange::FeedbackOpened {
                provider: new.feedback_target.clone().unwrap_or_default(),
            });
        } else if old.feedback_open && !new.feedback_open {
            changes.push(StateChange::FeedbackClosed);
        }

        if old.provider_type_index != new.provider_type_index {
            changes.push(StateChange::ProviderTypeChanged {
                index: new.provider_type_index,
            });
        }

        changes
    }

    // Convenience methods for common state updates

    /// Set the user location (whole-value replacement)
    ///
    /// Both entry paths - geolocation success and map click - funnel through
    /// here. Any visible error is cleared and a pending device request is
    /// marked finished.
    pub fn set_location(&self, location: Location) -> Vec<StateChange> {
        self.update(|state| {
            state.location = Some(location);
            state.is_locating = false;
            if state.error_banner.is_some() {
                state.error_banner = None;
                state.error_epoch += 1;
            }
        })
    }

    /// Mark the device location request in flight (or finished)
    pub fn set_locating(&self, active: bool) -> Vec<StateChange> {
        self.update(|state| {
            state.is_locating = active;
        })
    }

    /// Record the selected provider-type filter position
    pub fn set_provider_type(&self, index: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.provider_type_index = index;
        })
    }

    /// Begin a search invocation
    ///
    /// Takes the next request token, marks the search in flight, and drops
    /// the previous result set so stale cards never coexist with a fresh
    /// request.
    ///
    /// # Returns
    /// The request token for this invocation; pass it to
    /// [`finish_search`](Self::finish_search) / [`fail_search`](Self::fail_search).
    pub fn begin_search(&self) -> u64 {
        let mut seq = 0;
        self.update(|state| {
            state.search_seq += 1;
            state.is_searching = true;
            state.clear_results();
            seq = state.search_seq;
        });
        seq
    }

    /// Complete a search invocation with its results
    ///
    /// Latest-request-wins: if `seq` is no longer the current token the
    /// response is stale and the state is left untouched.
    ///
    /// # Returns
    /// `true` if the results were applied, `false` if discarded as stale.
    pub fn finish_search(
        &self,
        seq: u64,
        providers: Vec<ProviderRecord>,
        count: usize,
    ) -> bool {
        let mut applied = false;
        self.update(|state| {
            if state.search_seq == seq {
                state.apply_results(providers, count);
                state.is_searching = false;
                applied = true;
            }
        });
        if !applied {
            tracing::debug!("Discarding stale search response (token {})", seq);
        }
        applied
    }

    /// Mark a search invocation as failed
    ///
    /// Only the current token may clear the busy state; a stale failure is
    /// ignored entirely.
    ///
    /// # Returns
    /// `true` if this was the current invocation.
    pub fn fail_search(&self, seq: u64) -> bool {
        let mut current = false;
        self.update(|state| {
            if state.search_seq == seq {
                state.is_searching = false;
                current = true;
            }
        });
        current
    }

    /// Show the error banner with a new message
    ///
    /// Each call bumps the error epoch, so a previously scheduled auto-hide
    /// timer becomes a no-op: the last message shown wins.
    ///
    /// # Returns
    /// The epoch for this message; pass it to
    /// [`hide_error_if_current`](Self::hide_error_if_current) from the timer.
    pub fn show_error(&self, message: impl Into<String>) -> u64 {
        let message = message.into();
        let mut epoch = 0;
        self.update(|state| {
            state.error_banner = Some(message);
            state.error_epoch += 1;
            epoch = state.error_epoch;
        });
        epoch
    }

    /// Hide the error banner immediately and invalidate pending timers
    pub fn hide_error(&self) -> Vec<StateChange> {
        self.update(|state| {
            if state.error_banner.is_some() {
                state.error_banner = None;
                state.error_epoch += 1;
            }
        })
    }

    /// Hide the banner only if `epoch` is still the current message
    ///
    /// Called by the auto-hide timer. A later `show_error` (or an explicit
    /// dismissal) bumps the epoch, making this a no-op.
    ///
    /// # Returns
    /// `true` if the banner was hidden by this call.
    pub fn hide_error_if_current(&self, epoch: u64) -> bool {
        let mut hidden = false;
        self.update(|state| {
            if state.error_epoch == epoch && state.error_banner.is_some() {
                state.error_banner = None;
                state.error_epoch += 1;
                hidden = true;
            }
        });
        hidden
    }

    /// Bind a provider name as the feedback target and open the modal
    ///
    /// The name is carried verbatim - it is a plain-text binding, not markup.
    pub fn open_feedback(&self, provider: impl Into<String>) -> Vec<StateChange> {
        let provider = provider.into();
        self.update(|state| {
            state.feedback_target = Some(provider);
            state.feedback_open = true;
        })
    }

    /// Close the feedback modal, keeping no target bound
    pub fn close_feedback(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.feedback_open = false;
            state.feedback_target = None;
        })
    }

    /// Get an Arc reference to the state for use in worker tasks
    pub fn state_arc(&self) -> Arc<RwLock<AppState>> {
        Arc::clone(&self.state)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str) -> ProviderRecord {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "full_address": format!("{name}, 1 Test Way"),
            "type": "Hospital",
            "latitude": 40.0,
            "longitude": -98.0
        }))
        .unwrap()
    }

    #[test]
    fn test_new_state_manager() {
        let manager = StateManager::new();
        let state = manager.snapshot();

        assert!(!state.location_known());
        assert!(!state.is_searching);
        assert_eq!(state.search_seq, 0);
    }

    #[test]
    fn test_set_location_emits_event_and_clears_error() {
        let manager = StateManager::new();
        manager.show_error("Please set your location first.");

        let changes = manager.set_location(Location::new(40.0, -98.0));

        assert!(changes
            .iter()
            .any(|c| matches!(c, StateChange::LocationSet { .. })));
        assert!(changes.iter().any(|c| matches!(c, StateChange::ErrorHidden)));

        let state = manager.snapshot();
        assert!(state.location_known());
        assert!(state.error_banner.is_none());
    }

    #[test]
    fn test_location_paths_converge() {
        // Geolocation and map click both go through set_location; the
        // resulting state must be identical for identical coordinates.
        let via_device = StateManager::new();
        via_device.set_locating(true);
        via_device.set_location(Location::new(41.5, -87.3));

        let via_click = StateManager::new();
        via_click.set_location(Location::new(41.5, -87.3));

        let a = via_device.snapshot();
        let b = via_click.snapshot();
        assert_eq!(a.location, b.location);
        assert_eq!(a.is_locating, b.is_locating);
        assert_eq!(a.location_label(), b.location_label());
    }

    #[test]
    fn test_begin_search_clears_results_and_bumps_token() {
        let manager = StateManager::new();
        manager.finish_search(0, vec![provider("Old")], 1);

        let mut rx = manager.subscribe();
        let seq = manager.begin_search();

        assert_eq!(seq, 1);
        let state = manager.snapshot();
        assert!(state.is_searching);
        assert!(state.providers.is_empty());
        assert!(!state.has_results);

        let event = rx.try_recv().unwrap();
        assert_eq!(event, StateChange::SearchStarted { seq: 1 });
    }

    #[test]
    fn test_finish_search_applies_current_token() {
        let manager = StateManager::new();
        let seq = manager.begin_search();

        assert!(manager.finish_search(seq, vec![provider("A"), provider("B")], 2));

        let state = manager.snapshot();
        assert!(!state.is_searching);
        assert_eq!(state.providers.len(), 2);
        assert_eq!(state.result_count, 2);
        assert!(state.has_results);
    }

    #[test]
    fn test_stale_response_discarded() {
        let manager = StateManager::new();
        let first = manager.begin_search();
        let second = manager.begin_search();

        // The newer request resolves first
        assert!(manager.finish_search(second, vec![provider("New")], 1));
        // The older response arrives late and must not overwrite anything
        assert!(!manager.finish_search(first, vec![provider("Old")], 1));

        let state = manager.snapshot();
        assert_eq!(state.providers[0].name, "New");
        assert!(!state.is_searching);
    }

    #[test]
    fn test_fail_search_emits_failed_not_finished() {
        let manager = StateManager::new();
        let seq = manager.begin_search();
        let mut rx = manager.subscribe();

        assert!(manager.fail_search(seq));

        let event = rx.try_recv().unwrap();
        assert_eq!(event, StateChange::SearchFailed);
        assert!(!manager.snapshot().is_searching);
    }

    #[test]
    fn test_stale_failure_does_not_clear_busy() {
        let manager = StateManager::new();
        let first = manager.begin_search();
        let _second = manager.begin_search();

        assert!(!manager.fail_search(first));
        assert!(manager.snapshot().is_searching);
    }

    #[test]
    fn test_error_epoch_last_message_wins() {
        let manager = StateManager::new();

        let first = manager.show_error("first");
        let second = manager.show_error("second");
        assert!(second > first);

        // The first message's timer fires late and must not hide "second"
        assert!(!manager.hide_error_if_current(first));
        assert_eq!(manager.snapshot().error_banner.as_deref(), Some("second"));

        // The second message's timer is still valid
        assert!(manager.hide_error_if_current(second));
        assert!(manager.snapshot().error_banner.is_none());
    }

    #[test]
    fn test_repeated_message_rearms_timer() {
        // Clicking Search twice with no location shows the same text twice;
        // the second show must emit a fresh event so a new timer is armed.
        let manager = StateManager::new();
        let first = manager.show_error("Please set your location first.");

        let mut rx = manager.subscribe();
        let second = manager.show_error("Please set your location first.");
        assert!(second > first);

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            StateChange::ErrorShown {
                message: "Please set your location first.".to_string(),
                epoch: second,
            }
        );

        // The first timer is stale, the second one still hides the banner
        assert!(!manager.hide_error_if_current(first));
        assert!(manager.hide_error_if_current(second));
        assert!(manager.snapshot().error_banner.is_none());
    }

    #[test]
    fn test_hide_error_invalidates_timer() {
        let manager = StateManager::new();
        let epoch = manager.show_error("transient");
        manager.hide_error();

        assert!(!manager.hide_error_if_current(epoch));
        assert!(manager.snapshot().error_banner.is_none());
    }

    #[test]
    fn test_feedback_binding() {
        let manager = StateManager::new();
        let changes = manager.open_feedback("Mercy General");

        assert!(changes.iter().any(|c| matches!(
            c,
            StateChange::FeedbackOpened { provider } if provider == "Mercy General"
        )));
        assert!(manager.snapshot().feedback_open);

        manager.close_feedback();
        let state = manager.snapshot();
        assert!(!state.feedback_open);
        assert!(state.feedback_target.is_none());
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.set_provider_type(2);

        let event = rx.try_recv();
        assert_eq!(event.unwrap(), StateChange::ProviderTypeChanged { index: 2 });
    }

    #[test]
    fn test_clone_state_manager() {
        let manager1 = StateManager::new();
        let manager2 = manager1.clone();

        manager1.set_location(Location::new(1.0, 2.0));

        assert!(manager2.snapshot().location_known());
    }
}

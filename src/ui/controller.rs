// GUI Controller - wires the Slint UI to state, services, and the map.
//
// Coordinates between:
// - Slint UI (MainWindow)
// - StateManager (application state + change events)
// - SearchClient / FeedbackClient / Geolocator (backend and platform services)
// - MapView (viewport and marker math)
// - EventLoopBridge (async/GUI coordination)
//
// Callbacks mutate state and invoke services; the state subscription thread
// is the single place that turns state changes into UI updates. Search
// results and the error banner therefore render consistently no matter which
// code path touched them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::map::MapView;
use crate::models::AppSettings;
use crate::services::feedback::{FeedbackClient, FeedbackError};
use crate::services::geolocate::{Geolocator, PositionOptions, SystemGeolocator};
use crate::services::search::SearchClient;
use crate::state::{StateChange, StateManager};
use crate::ui::bridge::EventLoopBridge;
use crate::ui::cards::{
    self, build_cards, directions_url, empty_state_message, results_count_label, tel_uri,
};

// Include the generated Slint code
slint::include_modules!();

/// Prompt shown when a search or directions request has no location to work
/// from.
const NO_LOCATION_MESSAGE: &str = "Please set your location first.";

/// Provider-type menu: (display label, wire value) pairs in menu order.
///
/// Seeded from configuration and optionally narrowed to what the backend
/// reports at startup. The dropdown index always refers into this list.
type TypeMenu = Arc<Mutex<Vec<(String, String)>>>;

/// GUI controller wiring the Slint UI to application state and services.
pub struct GuiController {
    ui: MainWindow,
    _bridge: EventLoopBridge<MainWindow>,
}

impl GuiController {
    /// Build the window, wire all callbacks, and start the state
    /// subscription.
    pub fn new(
        state_manager: Arc<StateManager>,
        settings: Arc<AppSettings>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;
        let bridge = EventLoopBridge::new(&ui, tokio_handle);

        let map = Arc::new(Mutex::new(MapView::new(&settings)));
        let type_menu: TypeMenu = Arc::new(Mutex::new(settings.provider_type_pairs()));
        let search_client = SearchClient::new(settings.backend_url.clone());
        let feedback_client = FeedbackClient::new(settings.backend_url.clone());
        let geolocator: Arc<dyn Geolocator> = Arc::new(SystemGeolocator::new());

        Self::sync_ui_with_state(&ui, &settings, &type_menu);
        Self::setup_callbacks(
            &ui,
            &bridge,
            &state_manager,
            &settings,
            &map,
            &type_menu,
            &search_client,
            &feedback_client,
            &geolocator,
        );
        Self::setup_state_subscription(&bridge, &state_manager, &settings, &map);
        Self::refresh_provider_types(&bridge, &state_manager, &type_menu, &search_client);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
        })
    }

    /// Run the GUI (blocks until the window is closed).
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        self.ui.run()
    }

    /// Initialize static UI content before the first state event arrives.
    fn sync_ui_with_state(ui: &MainWindow, settings: &AppSettings, type_menu: &TypeMenu) {
        ui.set_provider_type_labels(Self::label_models(type_menu));
        ui.set_provider_type_index(0);

        ui.set_location_known(false);
        ui.set_location_label("".into());
        ui.set_is_locating(false);
        ui.set_is_searching(false);
        ui.set_has_results(false);
        ui.set_show_empty_state(false);
        ui.set_show_error(false);
        ui.set_show_feedback(false);
        ui.set_empty_state_text(empty_state_message(settings.search_radius_km).into());

        tracing::debug!("UI synchronized with initial state");
    }

    #[allow(clippy::too_many_arguments)]
    fn setup_callbacks(
        ui: &MainWindow,
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        settings: &Arc<AppSettings>,
        map: &Arc<Mutex<MapView>>,
        type_menu: &TypeMenu,
        search_client: &SearchClient,
        feedback_client: &FeedbackClient,
        geolocator: &Arc<dyn Geolocator>,
    ) {
        // Use-my-location button
        let state = Arc::clone(state_manager);
        let settings_clone = Arc::clone(settings);
        let locator = Arc::clone(geolocator);
        let bridge_clone = bridge.clone();
        ui.on_use_my_location(move || {
            tracing::info!("Use-my-location clicked");

            let state = Arc::clone(&state);
            let settings = Arc::clone(&settings_clone);
            let locator = Arc::clone(&locator);

            state.set_locating(true);
            bridge_clone.spawn_async(move || async move {
                let options = PositionOptions {
                    high_accuracy: true,
                    timeout: Duration::from_secs(settings.geolocation_timeout_secs),
                    max_cache_age: Duration::from_secs(settings.geolocation_cache_secs),
                };

                match locator.current_position(options).await {
                    Ok(location) => {
                        tracing::info!(
                            latitude = location.latitude,
                            longitude = location.longitude,
                            "Device position acquired"
                        );
                        state.set_location(location);
                    }
                    Err(err) => {
                        tracing::warn!("Geolocation failed: {err}");
                        state.set_locating(false);
                        state.show_error(err.banner_message());
                    }
                }
            });
        });

        // Map click sets the location directly
        let state = Arc::clone(state_manager);
        let map_clone = Arc::clone(map);
        ui.on_map_clicked(move |x_frac, y_frac| {
            let location = {
                let map = map_clone.lock().unwrap_or_else(|e| e.into_inner());
                map.click_to_location(f64::from(x_frac), f64::from(y_frac))
            };
            tracing::info!(
                latitude = location.latitude,
                longitude = location.longitude,
                "Location set from map click"
            );
            state.set_location(location);
        });

        // Map widget resized; projections must track the rendered size
        let map_clone = Arc::clone(map);
        ui.on_map_resized(move |width, height| {
            let mut map = map_clone.lock().unwrap_or_else(|e| e.into_inner());
            map.set_viewport_size(f64::from(width), f64::from(height));
        });

        // Search button
        let state = Arc::clone(state_manager);
        let menu = Arc::clone(type_menu);
        let client = search_client.clone();
        let bridge_clone = bridge.clone();
        ui.on_search_requested(move || {
            tracing::info!("Search requested");
            Self::spawn_search(&bridge_clone, &state, &menu, &client);
        });

        // Changing the provider type re-runs the search
        let state = Arc::clone(state_manager);
        let menu = Arc::clone(type_menu);
        let client = search_client.clone();
        let bridge_clone = bridge.clone();
        ui.on_provider_type_changed(move |index| {
            let index = index.max(0) as usize;
            tracing::debug!(index, "Provider type changed");
            state.set_provider_type(index);
            Self::spawn_search(&bridge_clone, &state, &menu, &client);
        });

        // Feedback modal open/close
        let state = Arc::clone(state_manager);
        ui.on_open_feedback(move |provider_name| {
            state.open_feedback(provider_name.to_string());
        });

        let state = Arc::clone(state_manager);
        ui.on_feedback_cancelled(move || {
            state.close_feedback();
        });

        // Feedback send
        let state = Arc::clone(state_manager);
        let client = feedback_client.clone();
        let bridge_clone = bridge.clone();
        ui.on_send_feedback(move |message| {
            let state = Arc::clone(&state);
            let client = client.clone();
            let bridge = bridge_clone.clone();
            let message = message.to_string();

            bridge_clone.spawn_async(move || async move {
                let provider = state.read(|s| s.feedback_target.clone()).unwrap_or_default();

                match client.send(&provider, &message).await {
                    Ok(()) => {
                        tracing::info!(provider = %provider, "Feedback sent");
                        state.close_feedback();
                        bridge.update_ui(|ui| {
                            ui.set_message_text("Feedback sent successfully!".into());
                            ui.set_show_message_dialog(true);
                        });
                    }
                    Err(err) => {
                        // Validation and server failures both render inside
                        // the modal, which stays open for a retry
                        let text = err.user_message();
                        if matches!(err, FeedbackError::EmptyMessage) {
                            tracing::debug!("Feedback rejected locally: empty message");
                        } else {
                            tracing::warn!("Feedback submission failed: {err}");
                        }
                        bridge.update_ui(move |ui| {
                            ui.set_feedback_error(text.into());
                        });
                    }
                }
            });
        });

        // Error banner dismissed by hand
        let state = Arc::clone(state_manager);
        ui.on_dismiss_error(move || {
            state.hide_error();
        });

        // Confirmation dialog dismissed
        let ui_weak = ui.as_weak();
        ui.on_message_dismissed(move || {
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_message_dialog(false);
            }
        });

        // Directions opens Google Maps routed from the user location
        let state = Arc::clone(state_manager);
        let bridge_clone = bridge.clone();
        ui.on_get_directions(move |latitude, longitude| {
            let Some(user) = state.read(|s| s.location) else {
                state.show_error(NO_LOCATION_MESSAGE);
                return;
            };
            let url = directions_url(user, f64::from(latitude), f64::from(longitude));
            Self::open_external(&bridge_clone, url);
        });

        // Call button hands the number to the platform dialer
        let state = Arc::clone(state_manager);
        let bridge_clone = bridge.clone();
        ui.on_call_provider(move |contact| match tel_uri(&contact) {
            Some(uri) => Self::open_external(&bridge_clone, uri),
            None => {
                state.show_error(cards::CONTACT_UNAVAILABLE_MESSAGE);
            }
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Subscribe to state changes and update the UI accordingly.
    ///
    /// Runs on a background thread; every mutation is marshaled to the Slint
    /// event loop through the bridge.
    fn setup_state_subscription(
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        settings: &Arc<AppSettings>,
        map: &Arc<Mutex<MapView>>,
    ) {
        let bridge_handle = bridge.clone();
        let state_manager_clone = Arc::clone(state_manager);
        let settings = Arc::clone(settings);
        let map = Arc::clone(map);
        let mut rx = state_manager.subscribe();

        std::thread::spawn(move || {
            tracing::debug!("State subscription thread started");

            loop {
                match rx.blocking_recv() {
                    Ok(change) => {
                        tracing::trace!("State change received: {:?}", change);

                        match change {
                            StateChange::LocationSet { location } => {
                                let pins = {
                                    let mut map = map.lock().unwrap_or_else(|e| e.into_inner());
                                    map.place_user_marker(location);
                                    map.set_view(location, settings.focus_zoom);
                                    Self::pin_models(&map)
                                };
                                let label: slint::SharedString = location.display().into();
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_location_known(true);
                                    ui.set_location_label(label.clone());
                                    ui.set_is_locating(false);
                                    ui.set_map_pins(slint::ModelRc::new(
                                        slint::VecModel::from(pins.clone()),
                                    ));
                                });
                            }

                            StateChange::LocatingChanged { active } => {
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_is_locating(active);
                                });
                            }

                            StateChange::SearchStarted { seq } => {
                                tracing::debug!(seq, "Search started");
                                let pins = {
                                    let mut map = map.lock().unwrap_or_else(|e| e.into_inner());
                                    map.clear_provider_markers();
                                    Self::pin_models(&map)
                                };
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_is_searching(true);
                                    ui.set_has_results(false);
                                    ui.set_show_empty_state(false);
                                    ui.set_selected_pin(-1);
                                    ui.set_map_pins(slint::ModelRc::new(
                                        slint::VecModel::from(pins.clone()),
                                    ));
                                });
                            }

                            StateChange::SearchFinished { count } => {
                                let providers =
                                    state_manager_clone.read(|s| s.providers.clone());
                                tracing::info!(count, "Search finished");

                                let pins = {
                                    let mut map = map.lock().unwrap_or_else(|e| e.into_inner());
                                    map.replace_provider_markers(&providers);
                                    map.fit_to_markers();
                                    Self::pin_models(&map)
                                };
                                let cards = Self::card_models(&build_cards(&providers));
                                let count_label: slint::SharedString =
                                    results_count_label(count).into();
                                let show_empty = providers.is_empty();

                                bridge_handle.update_ui(move |ui| {
                                    ui.set_is_searching(false);
                                    ui.set_has_results(true);
                                    ui.set_show_empty_state(show_empty);
                                    ui.set_results_count(count_label.clone());
                                    ui.set_provider_cards(slint::ModelRc::new(
                                        slint::VecModel::from(cards.clone()),
                                    ));
                                    ui.set_selected_pin(-1);
                                    ui.set_map_pins(slint::ModelRc::new(
                                        slint::VecModel::from(pins.clone()),
                                    ));
                                });
                            }

                            StateChange::SearchFailed => {
                                bridge_handle.update_ui(|ui| {
                                    ui.set_is_searching(false);
                                });
                            }

                            StateChange::ResultsCleared => {
                                bridge_handle.update_ui(|ui| {
                                    ui.set_has_results(false);
                                    ui.set_show_empty_state(false);
                                    ui.set_provider_cards(slint::ModelRc::new(
                                        slint::VecModel::from(Vec::<ProviderCard>::new()),
                                    ));
                                });
                            }

                            StateChange::ErrorShown { message, epoch } => {
                                let text: slint::SharedString = message.into();
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_error_text(text.clone());
                                    ui.set_show_error(true);
                                });

                                // Auto-hide, unless a newer banner replaced
                                // this one in the meantime
                                let state = Arc::clone(&state_manager_clone);
                                let autohide =
                                    Duration::from_secs(settings.error_autohide_secs);
                                bridge_handle.spawn_async(move || async move {
                                    tokio::time::sleep(autohide).await;
                                    if state.hide_error_if_current(epoch) {
                                        tracing::debug!(epoch, "Error banner auto-hidden");
                                    }
                                });
                            }

                            StateChange::ErrorHidden => {
                                bridge_handle.update_ui(|ui| {
                                    ui.set_show_error(false);
                                });
                            }

                            StateChange::FeedbackOpened { provider } => {
                                let provider: slint::SharedString = provider.into();
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_feedback_provider(provider.clone());
                                    ui.set_feedback_error("".into());
                                    ui.set_feedback_message("".into());
                                    ui.set_show_feedback(true);
                                });
                            }

                            StateChange::FeedbackClosed => {
                                bridge_handle.update_ui(|ui| {
                                    ui.set_show_feedback(false);
                                });
                            }

                            StateChange::ProviderTypeChanged { index } => {
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_provider_type_index(index as i32);
                                });
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        tracing::info!(
                            "State broadcast channel closed - shutting down subscription thread"
                        );
                        break;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "State subscription lagged - {} events were skipped",
                            skipped
                        );
                    }
                }
            }

            tracing::debug!("State subscription thread terminated gracefully");
        });
    }

    /// Kick off a search for the current location and provider type.
    ///
    /// Requires a location; without one the no-location prompt shows instead.
    /// The result is applied through the request token, so an overlapping
    /// newer search wins over this one.
    fn spawn_search(
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        type_menu: &TypeMenu,
        client: &SearchClient,
    ) {
        let state = Arc::clone(state_manager);
        let menu = Arc::clone(type_menu);
        let client = client.clone();

        bridge.spawn_async(move || async move {
            let Some(location) = state.read(|s| s.location) else {
                state.show_error(NO_LOCATION_MESSAGE);
                return;
            };

            let kind = {
                let index = state.read(|s| s.provider_type_index);
                let menu = menu.lock().unwrap_or_else(|e| e.into_inner());
                menu.get(index)
                    .or_else(|| menu.first())
                    .map(|(_, value)| value.clone())
                    .unwrap_or_default()
            };

            let seq = state.begin_search();

            match client.search(location, &kind).await {
                Ok((providers, count)) => {
                    // finish_search refuses the response if a newer search
                    // started while this one was in flight
                    state.finish_search(seq, providers, count);
                }
                Err(err) => {
                    if state.fail_search(seq) {
                        state.show_error(err.user_message());
                    }
                }
            }
        });
    }

    /// Refresh the provider-type menu from the backend at startup.
    ///
    /// The configured menu is narrowed to the types the backend reports.
    /// Fetch failure, an empty list, or zero overlap all keep the configured
    /// menu in place.
    fn refresh_provider_types(
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        type_menu: &TypeMenu,
        client: &SearchClient,
    ) {
        let state = Arc::clone(state_manager);
        let menu = Arc::clone(type_menu);
        let client = client.clone();
        let bridge_clone = bridge.clone();

        bridge.spawn_async(move || async move {
            let backend_types = match client.provider_types().await {
                Ok(types) if !types.is_empty() => types,
                Ok(_) => {
                    tracing::debug!("Backend returned no provider types");
                    return;
                }
                Err(err) => {
                    tracing::warn!("Provider type fetch failed, using configured menu: {err}");
                    return;
                }
            };

            let narrowed = {
                let mut menu = menu.lock().unwrap_or_else(|e| e.into_inner());
                let filtered: Vec<(String, String)> = menu
                    .iter()
                    .filter(|(_, value)| {
                        backend_types.iter().any(|t| t.eq_ignore_ascii_case(value))
                    })
                    .cloned()
                    .collect();
                if filtered.is_empty() || filtered.len() == menu.len() {
                    None
                } else {
                    *menu = filtered.clone();
                    Some(filtered)
                }
            };

            if let Some(narrowed) = narrowed {
                tracing::info!(count = narrowed.len(), "Provider-type menu narrowed by backend");
                // Selection index may now point past the end; reset it
                state.set_provider_type(0);
                let labels: Vec<slint::SharedString> =
                    narrowed.into_iter().map(|(label, _)| label.into()).collect();
                bridge_clone.update_ui(move |ui| {
                    ui.set_provider_type_labels(slint::ModelRc::new(slint::VecModel::from(
                        labels.clone(),
                    )));
                    ui.set_provider_type_index(0);
                });
            }
        });
    }

    /// Open a URL or URI with the platform handler.
    fn open_external(bridge: &EventLoopBridge<MainWindow>, target: String) {
        bridge.spawn_async(move || async move {
            tracing::info!(url = %target, "Opening external target");
            if let Err(err) = Self::launch_opener(&target).await {
                tracing::warn!("Failed to open external target: {err}");
            }
        });
    }

    async fn launch_opener(target: &str) -> std::io::Result<()> {
        #[cfg(target_os = "windows")]
        let mut command = {
            let mut c = tokio::process::Command::new("cmd");
            c.args(["/C", "start", "", target]);
            c
        };
        #[cfg(target_os = "macos")]
        let mut command = {
            let mut c = tokio::process::Command::new("open");
            c.arg(target);
            c
        };
        #[cfg(all(unix, not(target_os = "macos")))]
        let mut command = {
            let mut c = tokio::process::Command::new("xdg-open");
            c.arg(target);
            c
        };

        command.spawn().map(|_| ())
    }

    fn label_models(type_menu: &TypeMenu) -> slint::ModelRc<slint::SharedString> {
        let labels: Vec<slint::SharedString> = type_menu
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(label, _)| label.clone().into())
            .collect();
        slint::ModelRc::new(slint::VecModel::from(labels))
    }

    /// Project the map markers into Slint pin models.
    fn pin_models(map: &MapView) -> Vec<MapPin> {
        let pins: Vec<MapPin> = map
            .marker_positions()
            .into_iter()
            .map(|p| {
                let popup = p.popup.unwrap_or(crate::map::MarkerPopup {
                    name: String::new(),
                    kind: String::new(),
                    rating_label: String::new(),
                });
                MapPin {
                    x_frac: p.x_frac as f32,
                    y_frac: p.y_frac as f32,
                    label: p.label.into(),
                    is_user: p.is_user,
                    latitude: p.position.latitude as f32,
                    longitude: p.position.longitude as f32,
                    name: popup.name.into(),
                    kind: popup.kind.into(),
                    rating_label: popup.rating_label.into(),
                }
            })
            .collect();
        pins
    }

    /// Convert formatted card views into Slint card models.
    fn card_models(views: &[cards::ProviderCardView]) -> Vec<ProviderCard> {
        let cards: Vec<ProviderCard> = views
            .iter()
            .map(|v| ProviderCard {
                rank: v.rank as i32,
                name: v.name.clone().into(),
                address: v.address.clone().into(),
                kind: v.kind.clone().into(),
                rating_label: v.rating_label.clone().into(),
                rating_tier: i32::from(v.rating_tier),
                cost: v.cost_label.clone().into(),
                availability: v.availability_label.clone().into(),
                distance: v.distance_label.clone().into(),
                contact: v.contact.clone().into(),
                has_contact: v.has_contact(),
                latitude: v.latitude as f32,
                longitude: v.longitude as f32,
                reveal_delay_ms: v.reveal_delay_ms as i32,
            })
            .collect();
        cards
    }
}

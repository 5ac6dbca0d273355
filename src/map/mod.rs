//! Map view-model: viewport, user marker, and provider markers.
//!
//! This is the Map Adapter. The Slint layer renders a tile image plus marker
//! overlays; everything positional - where a click landed in coordinates,
//! where a marker sits on screen, what viewport fits the current marker set -
//! is computed here with standard Web-Mercator math. The widget itself stays
//! dumb.
//!
//! Ownership rules:
//! - the user marker is singular: placing a new one always replaces the old
//! - provider markers are replaced wholesale on every search, never diffed

use crate::models::provider::{Location, ProviderRecord};
use crate::models::AppSettings;

/// Tile edge in pixels at every zoom level.
const TILE_SIZE: f64 = 256.0;

/// Mercator latitude limit; beyond this the projection blows up.
const MAX_LATITUDE: f64 = 85.051_128_78;

pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 18.0;

/// Padding factor applied around the fitted marker bounds.
const FIT_PADDING: f64 = 0.1;

/// Popup content bound to a provider marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPopup {
    pub name: String,
    pub kind: String,
    pub rating_label: String,
}

/// A map pin: either the user location or one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Location,
    /// 1-based rank label for provider markers; empty for the user marker.
    pub label: String,
    pub popup: Option<MarkerPopup>,
}

/// A marker projected into the current viewport, as fractions of its size.
///
/// Fractions may fall outside 0..1 when the marker is off-screen; the
/// renderer clips. Popup content rides along so the renderer can show it on
/// pin click without a second lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerScreenPosition {
    pub x_frac: f64,
    pub y_frac: f64,
    pub label: String,
    pub is_user: bool,
    pub position: Location,
    pub popup: Option<MarkerPopup>,
}

/// Geographic bounding box, grown point by point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    pub fn of(point: Location) -> Self {
        Self {
            south: point.latitude,
            west: point.longitude,
            north: point.latitude,
            east: point.longitude,
        }
    }

    pub fn extend(&mut self, point: Location) {
        self.south = self.south.min(point.latitude);
        self.north = self.north.max(point.latitude);
        self.west = self.west.min(point.longitude);
        self.east = self.east.max(point.longitude);
    }

    /// Grow the box by `factor` of its span on every side, matching the
    /// padding the original applied before fitting.
    pub fn pad(&self, factor: f64) -> Self {
        let lat_pad = (self.north - self.south) * factor;
        let lng_pad = (self.east - self.west) * factor;
        Self {
            south: self.south - lat_pad,
            west: self.west - lng_pad,
            north: self.north + lat_pad,
            east: self.east + lng_pad,
        }
    }

    pub fn center(&self) -> Location {
        Location::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

/// World-pixel projection of a point at a given zoom.
fn project(point: Location, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat = point.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (point.longitude + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * scale;
    (x, y)
}

/// Inverse of [`project`].
fn unproject(x: f64, y: f64, zoom: f64) -> Location {
    let scale = TILE_SIZE * 2f64.powf(zoom);

    let longitude = x / scale * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * y / scale);
    let latitude = n.sinh().atan().to_degrees();
    Location::new(latitude, longitude)
}

/// The map state owned by the UI controller.
///
/// All mutation goes through the owning adapter methods; nothing else touches
/// the viewport or marker collections.
#[derive(Debug, Clone)]
pub struct MapView {
    center: Location,
    zoom: f64,
    /// Rendered widget size; updated by the UI on resize.
    width_px: f64,
    height_px: f64,

    user_marker: Option<Marker>,
    provider_markers: Vec<Marker>,
}

impl MapView {
    /// Create a map centered on the configured continental overview.
    pub fn new(settings: &AppSettings) -> Self {
        Self {
            center: Location::new(settings.default_latitude, settings.default_longitude),
            zoom: settings.default_zoom,
            width_px: 800.0,
            height_px: 500.0,
            user_marker: None,
            provider_markers: Vec::new(),
        }
    }

    pub fn center(&self) -> Location {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn user_marker(&self) -> Option<&Marker> {
        self.user_marker.as_ref()
    }

    pub fn provider_markers(&self) -> &[Marker] {
        &self.provider_markers
    }

    /// Record the rendered widget size so projections match the screen.
    pub fn set_viewport_size(&mut self, width_px: f64, height_px: f64) {
        if width_px > 0.0 && height_px > 0.0 {
            self.width_px = width_px;
            self.height_px = height_px;
        }
    }

    /// Recenter the viewport.
    pub fn set_view(&mut self, center: Location, zoom: f64) {
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Place the user-location marker, replacing any existing one.
    pub fn place_user_marker(&mut self, location: Location) {
        self.user_marker = Some(Marker {
            position: location,
            label: String::new(),
            popup: None,
        });
    }

    /// Replace the provider marker set with one marker per record.
    ///
    /// Old markers are dropped first so stale pins never coexist with new
    /// results. Labels are the 1-based response rank.
    pub fn replace_provider_markers(&mut self, providers: &[ProviderRecord]) {
        self.provider_markers.clear();
        for (index, record) in providers.iter().enumerate() {
            self.provider_markers.push(Marker {
                position: Location::new(record.latitude, record.longitude),
                label: (index + 1).to_string(),
                popup: Some(MarkerPopup {
                    name: record.name.clone(),
                    kind: record.kind.clone(),
                    rating_label: format!("Rating: {}/5", record.cms_rating),
                }),
            });
        }
    }

    pub fn clear_provider_markers(&mut self) {
        self.provider_markers.clear();
    }

    /// Fit the viewport to the user marker plus all provider markers.
    ///
    /// Skipped entirely when there are no provider markers. The bounds are
    /// padded by 10% and the largest integer zoom that still contains them is
    /// chosen.
    ///
    /// # Returns
    /// The padded bounds that were fitted, or `None` when skipped.
    pub fn fit_to_markers(&mut self) -> Option<LatLngBounds> {
        if self.provider_markers.is_empty() {
            return None;
        }

        let mut points = self
            .provider_markers
            .iter()
            .map(|m| m.position)
            .collect::<Vec<_>>();
        if let Some(user) = &self.user_marker {
            points.push(user.position);
        }

        let mut bounds = LatLngBounds::of(points[0]);
        for point in &points[1..] {
            bounds.extend(*point);
        }
        let bounds = bounds.pad(FIT_PADDING);

        self.center = bounds.center();
        self.zoom = self.zoom_for_bounds(&bounds);
        Some(bounds)
    }

    /// Largest whole zoom at which `bounds` fits inside the viewport.
    fn zoom_for_bounds(&self, bounds: &LatLngBounds) -> f64 {
        let mut zoom = MAX_ZOOM;
        while zoom > MIN_ZOOM {
            let (west_x, north_y) = project(Location::new(bounds.north, bounds.west), zoom);
            let (east_x, south_y) = project(Location::new(bounds.south, bounds.east), zoom);
            if (east_x - west_x) <= self.width_px && (south_y - north_y) <= self.height_px {
                return zoom;
            }
            zoom -= 1.0;
        }
        MIN_ZOOM
    }

    /// Translate a click at viewport fractions into coordinates.
    pub fn click_to_location(&self, x_frac: f64, y_frac: f64) -> Location {
        let (center_x, center_y) = project(self.center, self.zoom);
        let x = center_x + (x_frac - 0.5) * self.width_px;
        let y = center_y + (y_frac - 0.5) * self.height_px;
        unproject(x, y, self.zoom)
    }

    /// Project every marker into viewport fractions for the renderer.
    ///
    /// The user marker, when present, comes first.
    pub fn marker_positions(&self) -> Vec<MarkerScreenPosition> {
        let (center_x, center_y) = project(self.center, self.zoom);

        let to_screen = |marker: &Marker, is_user: bool| {
            let (x, y) = project(marker.position, self.zoom);
            MarkerScreenPosition {
                x_frac: (x - center_x) / self.width_px + 0.5,
                y_frac: (y - center_y) / self.height_px + 0.5,
                label: marker.label.clone(),
                is_user,
                position: marker.position,
                popup: marker.popup.clone(),
            }
        };

        let mut positions = Vec::with_capacity(self.provider_markers.len() + 1);
        if let Some(user) = &self.user_marker {
            positions.push(to_screen(user, true));
        }
        for marker in &self.provider_markers {
            positions.push(to_screen(marker, false));
        }
        positions
    }
}

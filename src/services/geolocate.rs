//! Device location acquisition.
//!
//! Desktop platforms expose no uniform positioning API, so acquisition sits
//! behind the [`Geolocator`] trait. The production [`SystemGeolocator`] keeps
//! a short-lived cached fix and otherwise reports the platform as
//! unsupported, which routes the user to the map-click fallback. Tests mock
//! the trait.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::models::provider::Location;

/// Tuning for a position request.
#[derive(Debug, Clone, Copy)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Give up if no fix arrives within this window.
    pub timeout: Duration,
    /// A previous fix younger than this is returned without a new lookup.
    pub max_cache_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            max_cache_age: Duration::from_secs(60),
        }
    }
}

/// Why a position request failed. Each variant maps to a distinct banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocateError {
    #[error("location access denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("position request timed out")]
    Timeout,

    /// No positioning service exists on this platform.
    #[error("geolocation not supported")]
    Unsupported,

    #[error("unknown geolocation failure")]
    Unknown,
}

impl GeolocateError {
    /// Banner text shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocateError::PermissionDenied => "Location access denied by user.",
            GeolocateError::PositionUnavailable => "Location information unavailable.",
            GeolocateError::Timeout => "Location request timed out.",
            GeolocateError::Unsupported => {
                "Geolocation is not supported on this device. \
                 Please click on the map to set your location."
            }
            GeolocateError::Unknown => "An unknown error occurred.",
        }
    }

    /// Full banner line for a failed device request.
    ///
    /// Lookup failures carry the location-error prefix; the unsupported
    /// message already stands on its own.
    pub fn banner_message(&self) -> String {
        match self {
            GeolocateError::Unsupported => self.user_message().to_string(),
            _ => format!("Error getting your location: {}", self.user_message()),
        }
    }
}

/// Source of device position fixes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Resolve the device position, honoring the timeout and cache window in
    /// `options`.
    async fn current_position(&self, options: PositionOptions) -> Result<Location, GeolocateError>;
}

struct CachedFix {
    location: Location,
    acquired_at: Instant,
}

/// Platform geolocator.
///
/// Serves a cached fix while it is younger than `max_cache_age`; with no
/// fresh fix and no platform positioning backend it reports
/// [`GeolocateError::Unsupported`] so the UI offers the map-click path.
#[derive(Default)]
pub struct SystemGeolocator {
    cache: Mutex<Option<CachedFix>>,
}

impl SystemGeolocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with a known-good fix.
    pub fn record_fix(&self, location: Location) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        *cache = Some(CachedFix {
            location,
            acquired_at: Instant::now(),
        });
    }

    fn cached(&self, max_age: Duration) -> Option<Location> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .as_ref()
            .filter(|fix| fix.acquired_at.elapsed() <= max_age)
            .map(|fix| fix.location)
    }
}

#[async_trait]
impl Geolocator for SystemGeolocator {
    async fn current_position(&self, options: PositionOptions) -> Result<Location, GeolocateError> {
        if let Some(location) = self.cached(options.max_cache_age) {
            debug!(
                latitude = location.latitude,
                longitude = location.longitude,
                "Serving cached position fix"
            );
            return Ok(location);
        }

        // No positioning backend on desktop; the map-click path covers it.
        Err(GeolocateError::Unsupported)
    }
}

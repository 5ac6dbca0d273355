use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// User configuration from `CareFinder Settings.yaml`.
///
/// Contains the backend endpoint, map defaults, and UI timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "CareFinder_Settings")]
    pub settings: AppSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Base URL of the provider-search backend.
    #[serde(rename = "Backend URL", default = "default_backend_url")]
    pub backend_url: String,

    /// Initial map center (continental overview).
    #[serde(rename = "Default Latitude", default = "default_latitude")]
    pub default_latitude: f64,

    #[serde(rename = "Default Longitude", default = "default_longitude")]
    pub default_longitude: f64,

    #[serde(rename = "Default Zoom", default = "default_zoom")]
    pub default_zoom: f64,

    /// Zoom applied when the user location is set.
    #[serde(rename = "Focus Zoom", default = "default_focus_zoom")]
    pub focus_zoom: f64,

    /// Server-side search radius, shown in the empty-state message.
    #[serde(rename = "Search Radius KM", default = "default_search_radius_km")]
    pub search_radius_km: u32,

    /// Provider type filter: display label -> wire value, in menu order.
    #[serde(rename = "Provider Types", default = "default_provider_types")]
    pub provider_types: IndexMap<String, String>,

    /// Seconds before the error banner dismisses itself.
    #[serde(rename = "Error Autohide Seconds", default = "default_error_autohide")]
    pub error_autohide_secs: u64,

    /// Device geolocation request timeout.
    #[serde(rename = "Geolocation Timeout Seconds", default = "default_geo_timeout")]
    pub geolocation_timeout_secs: u64,

    /// How old a cached device fix may be before it is refused.
    #[serde(rename = "Geolocation Cache Seconds", default = "default_geo_cache")]
    pub geolocation_cache_secs: u64,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_latitude() -> f64 {
    39.8283
}

fn default_longitude() -> f64 {
    -98.5795
}

fn default_zoom() -> f64 {
    4.0
}

fn default_focus_zoom() -> f64 {
    12.0
}

fn default_search_radius_km() -> u32 {
    15
}

fn default_provider_types() -> IndexMap<String, String> {
    let mut types = IndexMap::new();
    types.insert("Hospital".to_string(), "hospital".to_string());
    types.insert("Nursing Home".to_string(), "nursing home".to_string());
    types.insert("Scan Center".to_string(), "scan center".to_string());
    types.insert("Supplier".to_string(), "supplier".to_string());
    types
}

fn default_error_autohide() -> u64 {
    10
}

fn default_geo_timeout() -> u64 {
    10
}

fn default_geo_cache() -> u64 {
    60
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
            default_zoom: default_zoom(),
            focus_zoom: default_focus_zoom(),
            search_radius_km: default_search_radius_km(),
            provider_types: default_provider_types(),
            error_autohide_secs: default_error_autohide(),
            geolocation_timeout_secs: default_geo_timeout(),
            geolocation_cache_secs: default_geo_cache(),
            debug_mode: false,
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            settings: AppSettings::default(),
        }
    }
}

impl AppSettings {
    /// The full menu as (label, wire value) pairs in declaration order.
    pub fn provider_type_pairs(&self) -> Vec<(String, String)> {
        self.provider_types
            .iter()
            .map(|(label, value)| (label.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.default_zoom, 4.0);
        assert_eq!(settings.focus_zoom, 12.0);
        assert_eq!(settings.error_autohide_secs, 10);
        assert_eq!(settings.geolocation_timeout_secs, 10);
        assert_eq!(settings.geolocation_cache_secs, 60);
        assert_eq!(settings.provider_types.len(), 4);
        assert!(!settings.debug_mode);
    }

    #[test]
    fn test_provider_type_pairs_keep_declaration_order() {
        let settings = AppSettings::default();
        let pairs = settings.provider_type_pairs();
        assert_eq!(pairs[0], ("Hospital".to_string(), "hospital".to_string()));
        assert_eq!(
            pairs[1],
            ("Nursing Home".to_string(), "nursing home".to_string())
        );
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_partial_yaml_uses_field_defaults() {
        let yaml = "CareFinder_Settings:\n  Backend URL: \"https://finder.example.com\"\n";
        let config: UserConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.settings.backend_url, "https://finder.example.com");
        assert_eq!(config.settings.search_radius_km, 15);
        assert_eq!(config.settings.provider_types.len(), 4);
    }
}

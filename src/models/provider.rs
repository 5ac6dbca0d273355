use serde::{Deserialize, Deserializer, Serialize};

/// A user location as a whole value.
///
/// Set from exactly one of two paths (device geolocation or a map click) and
/// always replaced as a pair, never partially updated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Coordinates formatted for the location-confirmed panel.
    pub fn display(&self) -> String {
        format!("Lat: {:.6}, Lon: {:.6}", self.latitude, self.longitude)
    }
}

/// One healthcare facility entry as returned by the search endpoint.
///
/// The record is read-only to this application; the server computes distance
/// and ordering. Response order defines both the displayed rank and the
/// numeric marker label (index + 1).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderRecord {
    pub name: String,
    pub full_address: String,

    #[serde(rename = "type")]
    pub kind: String,

    /// CMS star rating, 0-5. Absent or null means unrated (0).
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub cms_rating: f64,

    #[serde(default)]
    pub cost: f64,

    /// Enum-like availability value; the backend has sent both strings and
    /// bare numbers here, so accept either.
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub availability: String,

    /// Distance from the user location in kilometers, server-computed.
    #[serde(default)]
    pub distance: f64,

    pub latitude: f64,
    pub longitude: f64,

    /// Phone string, or the sentinel "N/A" when unknown.
    #[serde(default = "contact_unavailable")]
    pub contact: String,
}

/// Sentinel used by the backend when no phone number is on file.
pub const CONTACT_UNAVAILABLE: &str = "N/A";

fn contact_unavailable() -> String {
    CONTACT_UNAVAILABLE.to_string()
}

fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or(0.0))
}

fn deserialize_loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Wire shape of `POST /search_providers`.
///
/// Success carries `providers` and `count`; failure carries `error`. One
/// struct covers both so a single decode handles either shape.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub success: bool,

    #[serde(default)]
    pub providers: Vec<ProviderRecord>,

    #[serde(default)]
    pub count: usize,

    #[serde(default)]
    pub error: Option<String>,
}

/// Wire shape of `POST /send_feedback`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,

    #[serde(default)]
    pub error: Option<String>,
}

/// Wire shape of `GET /get_provider_types`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTypesResponse {
    pub success: bool,

    #[serde(default)]
    pub types: Vec<String>,
}

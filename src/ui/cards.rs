//! Result-card presentation.
//!
//! Everything here produces plain text for the UI layer to bind. Provider
//! fields flow into typed view-model fields, never into markup, so hostile
//! strings in backend data render as literal text.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::provider::{Location, ProviderRecord, CONTACT_UNAVAILABLE};

/// Milliseconds between successive card reveals.
const REVEAL_STEP_MS: u64 = 100;

/// One rendered result card, fully formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCardView {
    /// 1-based rank, matching the numbered map marker.
    pub rank: usize,
    pub name: String,
    pub address: String,
    /// Type badge text.
    pub kind: String,
    /// "4.5/5"
    pub rating_label: String,
    /// Floored rating, 0-5, selecting the badge color tier.
    pub rating_tier: u8,
    /// "$120"
    pub cost_label: String,
    /// "High availability"
    pub availability_label: String,
    /// "2.41 km"
    pub distance_label: String,
    /// Phone string or the "N/A" sentinel.
    pub contact: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Staggered entrance delay: rank index times 100ms.
    pub reveal_delay_ms: u64,
}

impl ProviderCardView {
    pub fn from_record(index: usize, record: &ProviderRecord) -> Self {
        Self {
            rank: index + 1,
            name: record.name.clone(),
            address: record.full_address.clone(),
            kind: record.kind.clone(),
            rating_label: format!("{}/5", record.cms_rating),
            rating_tier: record.cms_rating.floor().clamp(0.0, 5.0) as u8,
            cost_label: format!("${}", record.cost),
            availability_label: format!("{} availability", record.availability),
            distance_label: format!("{} km", record.distance),
            contact: record.contact.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            reveal_delay_ms: index as u64 * REVEAL_STEP_MS,
        }
    }

    /// Whether the call action is enabled for this card.
    pub fn has_contact(&self) -> bool {
        !self.contact.is_empty() && self.contact != CONTACT_UNAVAILABLE
    }
}

/// Build the full card list from a completed result set.
pub fn build_cards(providers: &[ProviderRecord]) -> Vec<ProviderCardView> {
    providers
        .iter()
        .enumerate()
        .map(|(index, record)| ProviderCardView::from_record(index, record))
        .collect()
}

/// Results header, with plural agreement.
pub fn results_count_label(count: usize) -> String {
    if count == 1 {
        "1 provider found".to_string()
    } else {
        format!("{count} providers found")
    }
}

/// Body text of the empty-results state.
pub fn empty_state_message(radius_km: u32) -> String {
    format!("No healthcare providers found within {radius_km}km of your location.")
}

/// Google Maps directions URL from the user location to a provider.
pub fn directions_url(user: Location, provider_lat: f64, provider_lon: f64) -> String {
    format!(
        "https://www.google.com/maps/dir/{},{}/{},{}/@{},{},15z",
        user.latitude, user.longitude, provider_lat, provider_lon, provider_lat, provider_lon
    )
}

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9()\-\s.]*$").unwrap());

/// Build a `tel:` URI for a contact string.
///
/// Returns `None` for the "N/A" sentinel or anything that does not look like
/// a phone number; the caller shows the not-available banner instead.
pub fn tel_uri(contact: &str) -> Option<String> {
    let contact = contact.trim();
    if contact.is_empty() || contact == CONTACT_UNAVAILABLE || !PHONE_RE.is_match(contact) {
        return None;
    }
    Some(format!("tel:{contact}"))
}

/// Banner shown when the call action has no usable number.
pub const CONTACT_UNAVAILABLE_MESSAGE: &str = "Phone number not available for this provider.";

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> ProviderRecord {
        serde_json::from_value(json).unwrap()
    }

    fn sample() -> ProviderRecord {
        record(serde_json::json!({
            "name": "Mercy General",
            "full_address": "Mercy General, 100 Main St, Springfield",
            "type": "Hospital",
            "cms_rating": 4.5,
            "cost": 120.0,
            "availability": "High",
            "distance": 2.41,
            "latitude": 39.9,
            "longitude": -98.6,
            "contact": "555-0100"
        }))
    }

    #[test]
    fn test_card_formatting() {
        let card = ProviderCardView::from_record(0, &sample());
        assert_eq!(card.rank, 1);
        assert_eq!(card.rating_label, "4.5/5");
        assert_eq!(card.rating_tier, 4);
        assert_eq!(card.cost_label, "$120");
        assert_eq!(card.availability_label, "High availability");
        assert_eq!(card.distance_label, "2.41 km");
        assert!(card.has_contact());
        assert_eq!(card.reveal_delay_ms, 0);
    }

    #[test]
    fn test_reveal_delay_staggers_by_rank() {
        let cards = build_cards(&[sample(), sample(), sample()]);
        assert_eq!(cards[0].reveal_delay_ms, 0);
        assert_eq!(cards[1].reveal_delay_ms, 100);
        assert_eq!(cards[2].reveal_delay_ms, 200);
        assert_eq!(cards[2].rank, 3);
    }

    #[test]
    fn test_unrated_provider_gets_zero_tier() {
        let unrated = record(serde_json::json!({
            "name": "X",
            "full_address": "X",
            "type": "Supplier",
            "cms_rating": null,
            "latitude": 0.0,
            "longitude": 0.0
        }));
        let card = ProviderCardView::from_record(0, &unrated);
        assert_eq!(card.rating_label, "0/5");
        assert_eq!(card.rating_tier, 0);
        assert!(!card.has_contact());
    }

    #[test]
    fn test_hostile_name_stays_literal() {
        let hostile = record(serde_json::json!({
            "name": "<script>alert(1)</script>",
            "full_address": "<img src=x>",
            "type": "Hospital",
            "latitude": 0.0,
            "longitude": 0.0
        }));
        let card = ProviderCardView::from_record(0, &hostile);
        // The view model carries the raw text; nothing interprets it
        assert_eq!(card.name, "<script>alert(1)</script>");
        assert_eq!(card.address, "<img src=x>");
    }

    #[test]
    fn test_count_label_plural_agreement() {
        assert_eq!(results_count_label(0), "0 providers found");
        assert_eq!(results_count_label(1), "1 provider found");
        assert_eq!(results_count_label(7), "7 providers found");
    }

    #[test]
    fn test_empty_state_names_radius() {
        assert_eq!(
            empty_state_message(15),
            "No healthcare providers found within 15km of your location."
        );
    }

    #[test]
    fn test_directions_url_shape() {
        let url = directions_url(Location::new(40.0, -98.0), 39.9, -98.6);
        assert_eq!(
            url,
            "https://www.google.com/maps/dir/40,-98/39.9,-98.6/@39.9,-98.6,15z"
        );
    }

    #[test]
    fn test_tel_uri_validation() {
        assert_eq!(tel_uri("555-0100"), Some("tel:555-0100".to_string()));
        assert_eq!(tel_uri("+1 (555) 010-0000"), Some("tel:+1 (555) 010-0000".to_string()));
        assert_eq!(tel_uri("N/A"), None);
        assert_eq!(tel_uri(""), None);
        assert_eq!(tel_uri("call me maybe"), None);
    }
}

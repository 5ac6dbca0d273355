//! Provider search against the backend.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::provider::{Location, ProviderRecord, ProviderTypesResponse, SearchResponse};

/// Errors from the search endpoints.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The backend answered but declined the search (`success: false`).
    #[error("search rejected by server: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    /// The request never completed or the body did not decode.
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SearchError {
    /// Banner text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Rejected(Some(reason)) => format!("Search failed: {reason}"),
            SearchError::Rejected(None) => "Search failed: Unknown error".to_string(),
            SearchError::Transport(err) => format!("Network error: {err}"),
        }
    }
}

/// HTTP client for `/search_providers` and `/get_provider_types`.
///
/// Cheap to clone; the inner `reqwest::Client` is an `Arc` around its pool.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    base_url: String,
}

impl SearchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// Search for providers of `kind` near `location`.
    ///
    /// The backend computes distances, filters by its radius, and returns the
    /// records pre-sorted; response order is authoritative. `kind` is the
    /// lowercase wire value, not the display label.
    pub async fn search(
        &self,
        location: Location,
        kind: &str,
    ) -> Result<(Vec<ProviderRecord>, usize), SearchError> {
        debug!(
            latitude = location.latitude,
            longitude = location.longitude,
            kind,
            "Searching providers"
        );

        let form = [
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("provider_type", kind.to_string()),
        ];

        let response: SearchResponse = self
            .client
            .post(format!("{}/search_providers", self.base_url))
            .form(&form)
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            warn!(error = ?response.error, "Search rejected by backend");
            return Err(SearchError::Rejected(response.error));
        }

        debug!(count = response.count, "Search completed");
        Ok((response.providers, response.count))
    }

    /// Fetch the provider type list from the backend.
    ///
    /// Used to refresh the dropdown at startup; the caller keeps its
    /// configured list when this fails or comes back empty.
    pub async fn provider_types(&self) -> Result<Vec<String>, SearchError> {
        let response: ProviderTypesResponse = self
            .client
            .get(format!("{}/get_provider_types", self.base_url))
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            return Err(SearchError::Rejected(None));
        }
        Ok(response.types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_with_reason() {
        let err = SearchError::Rejected(Some("bad coordinates".to_string()));
        assert_eq!(err.user_message(), "Search failed: bad coordinates");
    }

    #[test]
    fn test_rejected_message_without_reason() {
        let err = SearchError::Rejected(None);
        assert_eq!(err.user_message(), "Search failed: Unknown error");
    }
}

//! Feedback submission against the backend.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::provider::FeedbackResponse;

/// Errors from feedback submission.
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// The message was empty after trimming; no request was made.
    #[error("feedback message is empty")]
    EmptyMessage,

    /// The backend answered but declined the submission.
    #[error("feedback rejected by server: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    #[error("feedback request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FeedbackError {
    /// Modal text shown to the user for this failure.
    ///
    /// A reason reported by the server is surfaced verbatim; transport
    /// failures get one generic message.
    pub fn user_message(&self) -> String {
        match self {
            FeedbackError::EmptyMessage => "Please type a message before sending.".to_string(),
            FeedbackError::Rejected(Some(reason)) => format!("Error: {reason}"),
            FeedbackError::Rejected(None) | FeedbackError::Transport(_) => {
                "Server error. Try again later.".to_string()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct FeedbackPayload<'a> {
    provider: &'a str,
    feedback: &'a str,
}

/// HTTP client for `POST /send_feedback`.
#[derive(Debug, Clone)]
pub struct FeedbackClient {
    client: Client,
    base_url: String,
}

impl FeedbackClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// Submit feedback about `provider`.
    ///
    /// The message is trimmed first; a whitespace-only message fails with
    /// [`FeedbackError::EmptyMessage`] before any request goes out.
    pub async fn send(&self, provider: &str, message: &str) -> Result<(), FeedbackError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(FeedbackError::EmptyMessage);
        }

        debug!(provider, "Sending feedback");

        let response: FeedbackResponse = self
            .client
            .post(format!("{}/send_feedback", self.base_url))
            .json(&FeedbackPayload {
                provider,
                feedback: message,
            })
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            warn!(error = ?response.error, "Feedback rejected by backend");
            return Err(FeedbackError::Rejected(response.error));
        }
        Ok(())
    }
}

//! Error types surfaced by the card pipeline.
//!
//! Every failure eventually becomes an error card, so each variant carries a
//! primary message (the card headline) and optionally a secondary line with a
//! hint for the viewer.

use thiserror::Error;

/// Failure while talking to the GitHub API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Could not fetch user")]
    UserNotFound { username: String },
    #[error("Please try again later")]
    RateLimited,
    #[error("Could not reach GitHub")]
    Network(#[from] reqwest::Error),
    #[error("GitHub API returned HTTP {status}")]
    Upstream { status: u16, detail: String },
    #[error("Unexpected GitHub API response")]
    Malformed(String),
}

impl FetchError {
    pub fn secondary_message(&self) -> Option<String> {
        match self {
            FetchError::UserNotFound { username } => Some(format!(
                "Make sure \"{username}\" is a user account, not an organization"
            )),
            FetchError::RateLimited => {
                Some("GitHub API rate limit was exhausted".to_string())
            }
            FetchError::Network(e) => Some(e.to_string()),
            FetchError::Upstream { detail, .. } => Some(detail.clone()),
            FetchError::Malformed(detail) => Some(detail.clone()),
        }
    }
}

/// Failure anywhere between parameter validation and card rendering.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("Missing \"username\" parameter")]
    MissingUsername,
    #[error("{0}")]
    Fetch(#[from] FetchError),
}

impl CardError {
    /// Secondary line shown under the headline on the error card.
    pub fn secondary_message(&self) -> Option<String> {
        match self {
            CardError::MissingUsername => {
                Some("Pass it in the URL, e.g. ?username=torvalds".to_string())
            }
            CardError::Fetch(e) => e.secondary_message(),
        }
    }
}

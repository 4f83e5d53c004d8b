use thiserror::Error;

use super::models::ApiMessage;

#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("zone identifier is not configured (set edge.zone_id)")]
    MissingZone,
    #[error("edge credentials are not configured (set edge.api_token or edge.api_email + edge.api_key)")]
    MissingCredentials,
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid zone setting name {0:?} (expected [a-z0-9_]+)")]
    InvalidSetting(String),
    #[error("invalid credential header: {0}")]
    InvalidHeader(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("edge API returned status {status}: {}", describe(.errors, .body))]
    Status {
        status: u16,
        errors: Vec<ApiMessage>,
        body: String,
    },
    #[error("edge API rejected the request: {}", describe(.errors, ""))]
    Rejected { errors: Vec<ApiMessage> },
    #[error("failed to parse edge API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl EdgeError {
    /// Upstream status code, when the failure came with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

fn describe(errors: &[ApiMessage], body: &str) -> String {
    if errors.is_empty() {
        if body.is_empty() {
            return "no error details".to_string();
        }
        return body.to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

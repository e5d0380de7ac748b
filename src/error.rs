use actix_web::{
    body::BoxBody, http::header::ContentType, http::StatusCode, HttpResponse, ResponseError,
};
use thiserror::Error;
use tracing::error;

use crate::constants::GENERIC_ERROR_BODY;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Fetching messages failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Mail-capture API answered with status {0}")]
    UpstreamStatus(u16),

    #[error("Mail-capture API response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Message {0} could not be parsed as MIME")]
    Parse(usize),

    #[error("Message {0} not found")]
    MessageNotFound(usize),

    #[error("Attachment {part} not found in message {message}")]
    AttachmentNotFound { message: usize, part: String },

    #[error("Message {0} has no raw data")]
    NoRawPayload(usize),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Failure of one relay submission. Never surfaces to HTTP callers.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Invalid envelope: {0}")]
    Envelope(String),

    #[error("SMTP submission failed: {0}")]
    Smtp(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoRawPayload(_) => StatusCode::BAD_REQUEST,
            AppError::MessageNotFound(_) | AppError::AttachmentNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let status = self.status_code();
        error!(error = %self, status = status.as_u16(), "Request failed");

        let body = match status {
            StatusCode::BAD_REQUEST => "Email does not contain raw data".to_string(),
            StatusCode::NOT_FOUND => self.to_string(),
            _ => GENERIC_ERROR_BODY.to_string(),
        };

        HttpResponse::build(status)
            .content_type(ContentType::plaintext())
            .body(body)
    }
}

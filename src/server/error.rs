use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::feed::{ExtractError, FetchError, RssError};

/// Body returned when `url` or `selector` is missing.
pub const MISSING_PARAMS_MESSAGE: &str = "required params: url and selector";

/// Everything that can end a `/feed` request early.
#[derive(Debug, Error)]
pub enum AppError {
    /// `url` or `selector` missing or empty
    #[error("{}", MISSING_PARAMS_MESSAGE)]
    MissingParams,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Render(#[from] RssError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingParams => StatusCode::BAD_REQUEST,
            AppError::Fetch(_) | AppError::Extract(_) | AppError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short description of the failure kind, used when details are hidden.
    fn generic_message(&self) -> &'static str {
        match self {
            AppError::MissingParams => MISSING_PARAMS_MESSAGE,
            AppError::Fetch(_) => "fetch failed",
            AppError::Extract(_) => "invalid selector",
            AppError::Render(_) => "render failed",
        }
    }

    /// Builds the plain-text response for this error.
    ///
    /// Client errors always carry their message. Server errors read
    /// `Error: <message>`, where the message is the underlying error text
    /// if `expose_details` is set and a generic description otherwise.
    pub fn to_response(&self, expose_details: bool) -> Response {
        let status = self.status();
        let body = if status.is_client_error() {
            self.to_string()
        } else {
            tracing::error!(error = %self, "Feed generation failed");
            if expose_details {
                format!("Error: {self}")
            } else {
                format!("Error: {}", self.generic_message())
            }
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_response(true)
    }
}

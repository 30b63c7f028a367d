//! HTTP error responses.
//!
//! Every failure leaves the API as `application/problem+json` with the body
//! `{"title", "detail", "errorCode"}`.

use crate::error::Error;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const INTERNAL_DETAIL: &str = "An unexpected error occurred";

/// API HTTP error.
#[derive(Error, Debug)]
pub struct ApiError {
    pub http_code: StatusCode,
    pub body: ErrorBody,
}

/// Error body serialized in JSON responses.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Short error title
    #[serde(default)]
    pub title: String,
    /// Detailed error description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    /// HTTP status code repeated for clients that only see the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.body.detail.is_empty() {
            write!(f, "{}: {}", self.body.title, self.body.detail)
        } else {
            write!(f, "{}", self.body.title)
        }
    }
}

impl ApiError {
    /// Create new error with HTTP status code.
    pub fn new(http_code: StatusCode) -> Self {
        Self {
            http_code,
            body: ErrorBody::default(),
        }
        .error_code(http_code.as_u16())
    }

    /// Build Bad Request (400) error.
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST).title("Bad Request")
    }

    /// Build Not Found (404) error.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND).title("Not Found")
    }

    /// Build Conflict (409) error.
    pub fn conflict() -> Self {
        Self::new(StatusCode::CONFLICT).title("Conflict")
    }

    /// Build Internal Server Error (500). The cause is logged, not returned.
    pub fn internal(cause: impl fmt::Display) -> Self {
        error!("Internal error: {}", cause);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
            .title("Internal Server Error")
            .detail(INTERNAL_DETAIL)
    }

    /// Set error title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.body.title = title.into();
        self
    }

    /// Set error detail.
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.body.detail = detail.into();
        self
    }

    /// Set error code.
    pub fn error_code(mut self, code: u16) -> Self {
        self.body.error_code = Some(code);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::to_vec(&self.body).unwrap_or_default();

        let mut response = (self.http_code, body).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if !err.is_client_error() {
            return ApiError::internal(err);
        }
        match err {
            Error::NotFound(msg) => ApiError::not_found().detail(msg),
            Error::EmailInUse(msg) => ApiError::conflict().detail(msg),
            Error::ValidationError(msg) => ApiError::bad_request().detail(msg),
            other => ApiError::internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request().detail(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request().detail(rejection.body_text())
    }
}

/// Type alias for handler results.
pub type Result<T> = std::result::Result<T, ApiError>;

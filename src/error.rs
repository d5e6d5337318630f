use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error response structure sent to clients
///
/// Every failed request serializes to this shape:
/// ```json
/// {
///   "status": "fail",
///   "message": "Book not found",
///   "details": "..."
/// }
/// ```
///
/// `details` carries optional inner context (e.g. the database error text on
/// a concurrency conflict) and is omitted from the JSON when absent.
///
/// Why separate from HttpError?
/// - ErrorResponse: external format for API responses (what clients see)
/// - HttpError: internal error type carrying the status code (what handlers use)
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Enumeration of reusable error messages
///
/// Type-safe variants for error conditions that appear in more than one
/// place, so the wording lives in exactly one spot. One-off messages are
/// written inline at the call site instead.
///
/// PartialEq allows comparing variants in tests.
#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    // Password hashing errors
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,

    // Authentication errors
    InvalidToken,
    TokenNotProvided,

    // Else
    ServerError,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::EmptyPassword => "Password cannot be empty".to_string(),
            ErrorMessage::HashingError => "Error while hashing password".to_string(),
            ErrorMessage::InvalidHashFormat => "Invalid password hash format".to_string(),
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                format!("Password must not be more than {} characters", max_length)
            }
            ErrorMessage::InvalidToken => "Token is invalid or expired".to_string(),
            ErrorMessage::TokenNotProvided => {
                "You are not logged in, please provide a token".to_string()
            }
            ErrorMessage::ServerError => "Internal server error".to_string(),
        };
        write!(f, "{}", message)
    }
}

/// Internal HTTP error type used throughout the application
///
/// Handlers return `Result<T, HttpError>`; axum converts the error variant to
/// a JSON response via IntoResponse, so the status code and message can never
/// drift apart.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub details: Option<String>,
    pub status: StatusCode,
}

impl HttpError {
    /// 500 Internal Server Error: database failures, unexpected errors
    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            details: None,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 500 with inner error context carried in `details`
    ///
    /// Used where the contract exposes the store's own failure text, e.g. a
    /// concurrency conflict on update or a restricted role deletion.
    pub fn server_error_with_details(
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        HttpError {
            message: message.into(),
            details: Some(details.into()),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 400 Bad Request: invalid input, id mismatches, validation failures
    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            details: None,
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// 401 Unauthorized: missing or invalid bearer token
    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            details: None,
            status: StatusCode::UNAUTHORIZED,
        }
    }

    /// 404 Not Found: the requested record does not exist
    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            details: None,
            status: StatusCode::NOT_FOUND,
        }
    }

    /// Convert HttpError into an axum HTTP response
    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            status: "fail".to_string(),
            message: self.message.clone(),
            details: self.details.clone(),
        });

        (self.status, json_response).into_response()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

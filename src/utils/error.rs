use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {field}")]
    MissingConfigError { field: String },

    #[error("Step '{step}' is incomplete: {message}")]
    StepValidationError { step: String, message: String },

    #[error("Itinerary error: {message}")]
    ItineraryError { message: String },

    #[error("Seat {seat}: {message}")]
    SeatError { seat: String, message: String },

    #[error("Backend responded with {status}: {message}")]
    BackendError { status: u16, message: String },

    #[error("Invalid request: {message}")]
    InvalidRequestError { status: u16, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Input,
    Internal,
}

impl MarketError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MarketError::HttpError(_) | MarketError::BackendError { .. } => ErrorCategory::Network,
            MarketError::ConfigValidationError { .. }
            | MarketError::InvalidConfigValueError { .. }
            | MarketError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MarketError::StepValidationError { .. }
            | MarketError::ItineraryError { .. }
            | MarketError::SeatError { .. }
            | MarketError::InvalidRequestError { .. } => ErrorCategory::Input,
            MarketError::IoError(_) | MarketError::SerializationError(_) => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the marketplace backend ({})", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => self.to_string(),
            ErrorCategory::Internal => format!("Unexpected internal error: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MarketError::HttpError(_) => "Check that BACKEND_URL points at a running backend",
            MarketError::BackendError { .. } => "Inspect the backend logs for the failing request",
            MarketError::ConfigValidationError { .. }
            | MarketError::InvalidConfigValueError { .. }
            | MarketError::MissingConfigError { .. } => "Fix the named field in the config file",
            MarketError::StepValidationError { .. } => "Fill in the missing fields and try again",
            MarketError::ItineraryError { .. } => "Use YYYY-MM-DD dates and HH:MM times",
            MarketError::SeatError { .. } => "Pick another seat",
            MarketError::InvalidRequestError { .. } => "Check the request path and JSON body",
            MarketError::IoError(_) => "Check file paths and permissions",
            MarketError::SerializationError(_) => "Check the JSON payload shape",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            MarketError::BackendError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            MarketError::HttpError(_) => StatusCode::BAD_GATEWAY,
            MarketError::InvalidRequestError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
            }
            MarketError::SerializationError(_)
            | MarketError::StepValidationError { .. }
            | MarketError::ItineraryError { .. }
            | MarketError::SeatError { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for MarketError {
    fn from(rejection: JsonRejection) -> Self {
        MarketError::InvalidRequestError {
            status: rejection.status().as_u16(),
            message: rejection.body_text(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = MarketError::MissingConfigError {
            field: "backend.url".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let err = MarketError::SeatError {
            seat: "A1".to_string(),
            message: "already booked".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.to_string(), "Seat A1: already booked");
    }

    #[test]
    fn test_backend_error_keeps_status() {
        let err = MarketError::BackendError {
            status: 404,
            message: "not found".to_string(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_request_keeps_status_and_envelope() {
        let err = MarketError::InvalidRequestError {
            status: 422,
            message: "missing field `amount`".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_step_error_is_bad_request() {
        let err = MarketError::StepValidationError {
            step: "pricing".to_string(),
            message: "price must be positive".to_string(),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}

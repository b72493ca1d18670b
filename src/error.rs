//! Error types for the Book Club server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::Rejection;

/// Error dictionary: every error a client can receive, with its numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    ParameterMissing = 100,
    ParameterInvalid = 101,
    ResourceOutdated = 200,
    ResourceNotFound = 201,
    ResourceDuplicate = 202,
    ResourceForbidden = 203,
    RentRequestDuplicate = 301,
    RentReturnMissingUser = 302,
    RentCancelMissingUser = 303,
    UserNotFound = 401,
    UserNotRegistered = 402,
    UserCredentials = 403,
    UserDuplicate = 404,
    ServiceFailure = 500,
}

impl ErrorCode {
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Message template; `{name}` placeholders are filled by [`format_message`]
    pub fn template(self) -> &'static str {
        match self {
            ErrorCode::ParameterMissing => "The '{request}' request is missing the parameter '{parameter}'",
            ErrorCode::ParameterInvalid => "The request is invalid: {reason}",
            ErrorCode::ResourceOutdated => "The provided resource is outdated",
            ErrorCode::ResourceNotFound => "The resource {resource} was not found",
            ErrorCode::ResourceDuplicate => "The resource conflicts with an existing one: {reason}",
            ErrorCode::ResourceForbidden => "The user {userId} may not modify the resource {resource}",
            ErrorCode::RentRequestDuplicate => "The user {userId} already has a rent request for book {bookId}",
            ErrorCode::RentReturnMissingUser => "The user {userId} is not the current renter of book {bookId}",
            ErrorCode::RentCancelMissingUser => "The user {userId} has not requested to rent the book {bookId}",
            ErrorCode::UserNotFound => "No authenticated user was found",
            ErrorCode::UserNotRegistered => "No user is registered with the email {email}",
            ErrorCode::UserCredentials => "The credentials provided for user {userId} are invalid",
            ErrorCode::UserDuplicate => "A user is already registered with the email {email}",
            ErrorCode::ServiceFailure => "The service failed to complete the request",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ParameterMissing | ErrorCode::ParameterInvalid => StatusCode::BAD_REQUEST,
            ErrorCode::ResourceOutdated => StatusCode::PRECONDITION_FAILED,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ResourceForbidden => StatusCode::FORBIDDEN,
            ErrorCode::ResourceDuplicate
            | ErrorCode::RentRequestDuplicate
            | ErrorCode::RentReturnMissingUser
            | ErrorCode::RentCancelMissingUser
            | ErrorCode::UserDuplicate => StatusCode::CONFLICT,
            ErrorCode::UserNotFound | ErrorCode::UserNotRegistered | ErrorCode::UserCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ErrorCode::ServiceFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build the client-facing error value with the template parameters filled in
    pub fn with_params(self, params: &[(&str, &str)]) -> ServiceError {
        ServiceError {
            code: self.code(),
            message: format_message(self.template(), params),
        }
    }
}

/// Substitute `{name}` placeholders in `template` by their named values.
///
/// Placeholders without a matching parameter are left untouched.
pub fn format_message(template: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(template.to_string(), |message, (name, value)| {
        message.replace(&format!("{{{}}}", name), value)
    })
}

/// Error value as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ServiceError {
    pub code: u32,
    pub message: String,
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: ServiceError,
    /// Current state of the resource, sent with version conflicts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<serde_json::Value>,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("The '{request}' request is missing the parameter '{parameter}'")]
    MissingParameter {
        request: String,
        parameter: &'static str,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource is outdated")]
    Outdated { resource: serde_json::Value },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("User {user_id} may not modify {resource}")]
    Forbidden { user_id: Uuid, resource: String },

    #[error(transparent)]
    Rental(#[from] Rejection),

    #[error("No authenticated user")]
    Unauthenticated,

    #[error("No user registered with email {0}")]
    NotRegistered(String),

    #[error("Invalid credentials for user {0}")]
    Credentials(Uuid),

    #[error("Email already registered: {0}")]
    UserDuplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Version conflict carrying the current state of the resource
    pub fn outdated<T: Serialize>(current: &T) -> Self {
        AppError::Outdated {
            resource: serde_json::to_value(current).unwrap_or(serde_json::Value::Null),
        }
    }

    /// The dictionary entry this error is reported as
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::MissingParameter { .. } => ErrorCode::ParameterMissing,
            AppError::Validation(_) => ErrorCode::ParameterInvalid,
            AppError::Outdated { .. } => ErrorCode::ResourceOutdated,
            AppError::NotFound(_) => ErrorCode::ResourceNotFound,
            AppError::Duplicate(_) => ErrorCode::ResourceDuplicate,
            AppError::Forbidden { .. } => ErrorCode::ResourceForbidden,
            AppError::Rental(rejection) => rejection.code(),
            AppError::Unauthenticated => ErrorCode::UserNotFound,
            AppError::NotRegistered(_) => ErrorCode::UserNotRegistered,
            AppError::Credentials(_) => ErrorCode::UserCredentials,
            AppError::UserDuplicate(_) => ErrorCode::UserDuplicate,
            AppError::Database(_) | AppError::Internal(_) => ErrorCode::ServiceFailure,
        }
    }

    fn service_error(&self) -> ServiceError {
        let code = self.code();
        match self {
            AppError::MissingParameter { request, parameter } => {
                code.with_params(&[("request", request.as_str()), ("parameter", *parameter)])
            }
            AppError::Validation(reason) | AppError::Duplicate(reason) => {
                code.with_params(&[("reason", reason.as_str())])
            }
            AppError::NotFound(resource) => code.with_params(&[("resource", resource.as_str())]),
            AppError::Forbidden { user_id, resource } => {
                let user_id = user_id.to_string();
                code.with_params(&[("userId", user_id.as_str()), ("resource", resource.as_str())])
            }
            AppError::Rental(rejection) => {
                let (book_id, user_id) = rejection.subject();
                let (book_id, user_id) = (book_id.to_string(), user_id.to_string());
                code.with_params(&[("bookId", book_id.as_str()), ("userId", user_id.as_str())])
            }
            AppError::NotRegistered(email) | AppError::UserDuplicate(email) => {
                code.with_params(&[("email", email.as_str())])
            }
            AppError::Credentials(user_id) => {
                let user_id = user_id.to_string();
                code.with_params(&[("userId", user_id.as_str())])
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                code.with_params(&[])
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                code.with_params(&[])
            }
            AppError::Outdated { .. } | AppError::Unauthenticated => code.with_params(&[]),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.code().status();
        let error = self.service_error();
        let resource = match self {
            AppError::Outdated { resource } => Some(resource),
            _ => None,
        };

        (status, Json(ErrorResponse { error, resource })).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

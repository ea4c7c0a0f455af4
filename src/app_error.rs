//! Normalized application error.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::status::HttpStatus;

/// Error shape every failure is normalized into before it leaves a service.
///
/// An *operational* error is an expected failure (bad input, missing
/// record, permission denied) that is safe to report to a client. A
/// non-operational error is a fault; its details stay on the server side.
///
/// # Examples
///
/// ```
/// use ferrous_kit::{AppError, HttpStatus};
///
/// let err = AppError::not_found("user 42 does not exist");
/// assert_eq!(err.status(), HttpStatus::NotFound);
/// assert!(err.is_operational());
/// assert_eq!(err.to_string(), "user 42 does not exist");
///
/// let fault = AppError::internal("pool exhausted");
/// assert_eq!(fault.status(), HttpStatus::InternalServerError);
/// assert!(!fault.is_operational());
/// ```
#[derive(Clone)]
pub struct AppError {
    message: String,
    status: HttpStatus,
    operational: bool,
    cause: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl AppError {
    /// Operational error with the given status.
    pub fn new(message: impl Into<String>, status: HttpStatus) -> Self {
        Self {
            message: message.into(),
            status,
            operational: true,
            cause: None,
        }
    }

    /// Non-operational 500.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            operational: false,
            ..Self::new(message, HttpStatus::InternalServerError)
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, HttpStatus::BadRequest)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, HttpStatus::Unauthorized)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, HttpStatus::Forbidden)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, HttpStatus::NotFound)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(message, HttpStatus::Conflict)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(message, HttpStatus::UnprocessableEntity)
    }

    /// Overrides the operational flag.
    pub fn with_operational(mut self, operational: bool) -> Self {
        self.operational = operational;
        self
    }

    /// Attaches the underlying error, exposed through `source()`.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub(crate) fn with_shared_cause(mut self, cause: Arc<dyn StdError + Send + Sync + 'static>) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> HttpStatus {
        self.status
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    /// JSON-ready response body.
    #[cfg(feature = "serde")]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            status: self.status,
            error: self.status.reason_phrase().to_string(),
            message: self.message.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// `source()` yields the cause itself, not its `Arc`, so `downcast_ref`
// reaches the original type.
impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("message", &self.message)
            .field("status", &self.status.as_u16())
            .field("operational", &self.operational)
            .field("cause", &self.cause.as_ref().map(|c| c.to_string()))
            .finish()
    }
}

/// Serialized form of an [`AppError`] for HTTP responses.
///
/// ```
/// use ferrous_kit::AppError;
///
/// let body = serde_json::to_value(AppError::conflict("email taken").to_body()).unwrap();
/// assert_eq!(body, serde_json::json!({
///     "status": 409,
///     "error": "Conflict",
///     "message": "email taken",
/// }));
/// ```
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub status: HttpStatus,
    pub error: String,
    pub message: String,
}

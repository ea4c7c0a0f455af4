//! Central error normalization and notification.
//!
//! An [`ErrorHandler`] turns arbitrary errors and caught panics into
//! [`AppError`]s and tells every subscribed [`ErrorListener`] about them.
//! There is no process-wide instance: build one at startup and pass it (or
//! an `Arc` of it) to whatever needs it.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::app_error::AppError;
use crate::config::ConfigProvider;
use crate::error::{BoxError, KitResult};

const DEFAULT_INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Tunables for [`ErrorHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ErrorHandlerSettings {
    /// Put the text of unexpected errors into the normalized message.
    /// Leave off in production; faults may carry internals.
    pub expose_internal_messages: bool,
    /// Message used for unexpected errors when they are not exposed.
    pub internal_message: String,
}

impl Default for ErrorHandlerSettings {
    fn default() -> Self {
        Self {
            expose_internal_messages: false,
            internal_message: DEFAULT_INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl ErrorHandlerSettings {
    /// Reads `expose_internal_messages` and `internal_message`, falling
    /// back to the defaults for absent keys.
    pub fn from_config(config: &ConfigProvider) -> KitResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            expose_internal_messages: config
                .get_bool_opt("expose_internal_messages")?
                .unwrap_or(defaults.expose_internal_messages),
            internal_message: config
                .get_string_opt("internal_message")
                .unwrap_or(defaults.internal_message),
        })
    }
}

/// Receives every error passed through [`ErrorHandler::handle`].
pub trait ErrorListener: Send + Sync {
    fn on_error(&self, error: &AppError);
}

impl<F> ErrorListener for F
where
    F: Fn(&AppError) + Send + Sync,
{
    fn on_error(&self, error: &AppError) {
        self(error)
    }
}

/// Handle returned by [`ErrorHandler::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Normalizes errors into [`AppError`] and notifies listeners.
///
/// # Examples
///
/// ```
/// use ferrous_kit::{AppError, ErrorHandler, HttpStatus};
/// use std::sync::{Arc, Mutex};
///
/// let handler = ErrorHandler::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// handler.subscribe_fn(move |err: &AppError| sink.lock().unwrap().push(err.status()));
///
/// // Application errors pass through unchanged
/// let err = handler.handle(AppError::not_found("no such order"));
/// assert_eq!(err.message(), "no such order");
///
/// // Anything else becomes an opaque, non-operational 500
/// let err = handler.handle(std::io::Error::new(std::io::ErrorKind::Other, "socket reset"));
/// assert_eq!(err.status(), HttpStatus::InternalServerError);
/// assert_eq!(err.message(), "Internal Server Error");
/// assert!(!err.is_operational());
///
/// assert_eq!(*seen.lock().unwrap(), vec![HttpStatus::NotFound, HttpStatus::InternalServerError]);
/// ```
pub struct ErrorHandler {
    settings: ErrorHandlerSettings,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn ErrorListener>)>>,
    next_id: AtomicU64,
}

impl ErrorHandler {
    pub fn new() -> Self {
        Self::with_settings(ErrorHandlerSettings::default())
    }

    pub fn with_settings(settings: ErrorHandlerSettings) -> Self {
        Self {
            settings,
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &ConfigProvider) -> KitResult<Self> {
        Ok(Self::with_settings(ErrorHandlerSettings::from_config(config)?))
    }

    pub fn settings(&self) -> &ErrorHandlerSettings {
        &self.settings
    }

    /// Adds a listener. Listeners are notified in subscription order.
    pub fn subscribe(&self, listener: Arc<dyn ErrorListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().unwrap().push((id, listener));
        id
    }

    pub fn subscribe_fn<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AppError) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(listener))
    }

    /// Removes a listener; returns whether it was subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap().len()
    }

    /// Maps an error to its [`AppError`] form without notifying anyone.
    ///
    /// The first `AppError` found on the `source()` chain is returned as
    /// is. Anything else is treated as an unexpected fault.
    pub fn normalize(&self, error: &(dyn StdError + 'static)) -> AppError {
        match find_app_error(error) {
            Some(app_error) => app_error.clone(),
            None => self.fault(&error.to_string()),
        }
    }

    /// Normalizes `error`, notifies every listener, and returns the result.
    ///
    /// For unexpected errors the original is kept as the normalized
    /// error's `source()`.
    pub fn handle<E>(&self, error: E) -> AppError
    where
        E: Into<BoxError>,
    {
        let error: Arc<dyn StdError + Send + Sync + 'static> = Arc::from(error.into());
        let normalized = match find_app_error(&*error) {
            Some(app_error) => app_error.clone(),
            None => self.fault(&error.to_string()).with_shared_cause(error.clone()),
        };
        self.notify(&normalized);
        normalized
    }

    /// Normalizes a panic payload caught with `catch_unwind` and notifies
    /// listeners. A payload that is itself an `AppError` is kept as is.
    pub fn handle_panic(&self, payload: Box<dyn Any + Send>) -> AppError {
        let normalized = match payload.downcast::<AppError>() {
            Ok(app_error) => *app_error,
            Err(payload) => self.fault(&format!("panic: {}", panic_message(payload.as_ref()))),
        };
        self.notify(&normalized);
        normalized
    }

    /// Runs `f`, routing both its error and any panic through the handler.
    ///
    /// ```
    /// use ferrous_kit::{AppError, ErrorHandler};
    ///
    /// let handler = ErrorHandler::new();
    /// let result: Result<u32, AppError> = handler.catch(|| "12".parse::<u32>());
    /// assert_eq!(result.unwrap(), 12);
    ///
    /// let result: Result<u32, AppError> = handler.catch(|| -> Result<u32, AppError> {
    ///     Err(AppError::bad_request("missing id"))
    /// });
    /// assert_eq!(result.unwrap_err().message(), "missing id");
    /// ```
    pub fn catch<T, E, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<BoxError>,
    {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(self.handle(error)),
            Err(payload) => Err(self.handle_panic(payload)),
        }
    }

    /// Whether the error is an expected, operational failure.
    pub fn is_trusted(&self, error: &(dyn StdError + 'static)) -> bool {
        find_app_error(error).is_some_and(AppError::is_operational)
    }

    fn fault(&self, detail: &str) -> AppError {
        if self.settings.expose_internal_messages {
            AppError::internal(detail)
        } else {
            AppError::internal(self.settings.internal_message.clone())
        }
    }

    fn notify(&self, error: &AppError) {
        // Snapshot so listeners may (un)subscribe without deadlocking
        let listeners: Vec<Arc<dyn ErrorListener>> = self
            .listeners
            .read()
            .unwrap()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener.on_error(error);
        }
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("settings", &self.settings)
            .field("listeners", &format!("{} listeners", self.listener_count()))
            .finish()
    }
}

fn find_app_error<'a>(error: &'a (dyn StdError + 'static)) -> Option<&'a AppError> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(app_error) = err.downcast_ref::<AppError>() {
            return Some(app_error);
        }
        current = err.source();
    }
    None
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Listener that logs handled errors through `tracing`.
///
/// Server errors are logged at `error`, everything else at `warn`. When a
/// [`RequestContext`](crate::RequestContext) is active the event carries
/// its request id.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl ErrorListener for LoggingListener {
    fn on_error(&self, error: &AppError) {
        let request_id = current_request_id().unwrap_or_else(|| "-".to_string());
        let status = error.status().as_u16();
        if error.status().is_server_error() {
            tracing::error!(status, operational = error.is_operational(), %request_id, "{}", error);
        } else {
            tracing::warn!(status, operational = error.is_operational(), %request_id, "{}", error);
        }
    }
}

#[cfg(feature = "context")]
fn current_request_id() -> Option<String> {
    crate::context::RequestContext::current().map(|ctx| ctx.request_id().to_string())
}

#[cfg(not(feature = "context"))]
fn current_request_id() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::HttpStatus;

    #[derive(Debug, thiserror::Error)]
    #[error("repository failed")]
    struct RepoError {
        #[source]
        inner: AppError,
    }

    #[test]
    fn test_app_error_found_in_source_chain() {
        let handler = ErrorHandler::new();
        let err = RepoError {
            inner: AppError::conflict("duplicate key"),
        };
        let normalized = handler.normalize(&err);
        assert_eq!(normalized.status(), HttpStatus::Conflict);
        assert!(handler.is_trusted(&err));
    }

    #[test]
    fn test_exposed_internal_messages() {
        let handler = ErrorHandler::with_settings(ErrorHandlerSettings {
            expose_internal_messages: true,
            ..Default::default()
        });
        let err = handler.handle("connection refused");
        assert_eq!(err.message(), "connection refused");
        assert!(!handler.is_trusted(&err));
    }

    #[test]
    fn test_panic_message_extraction() {
        let handler = ErrorHandler::with_settings(ErrorHandlerSettings {
            expose_internal_messages: true,
            ..Default::default()
        });
        let err = handler.handle_panic(Box::new("index out of bounds"));
        assert_eq!(err.message(), "panic: index out of bounds");
        let err = handler.handle_panic(Box::new(String::from("owned")));
        assert_eq!(err.message(), "panic: owned");
        let err = handler.handle_panic(Box::new(7u8));
        assert_eq!(err.message(), "panic: unknown panic");
    }

    #[test]
    fn test_unsubscribe() {
        let handler = ErrorHandler::new();
        let id = handler.subscribe_fn(|_: &AppError| {});
        assert_eq!(handler.listener_count(), 1);
        assert!(handler.unsubscribe(id));
        assert!(!handler.unsubscribe(id));
        assert_eq!(handler.listener_count(), 0);
    }
}

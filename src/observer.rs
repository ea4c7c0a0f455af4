//! Lifecycle observers for dependency containers.
//!
//! Observers receive synchronous callbacks as a [`Dependency`](crate::Dependency)
//! builds, overrides and releases its service. They are the hook for
//! tracing, metrics or test assertions; the container itself does no logging
//! beyond reporting release failures it cannot return to a caller.

use std::error::Error as StdError;
use std::time::Duration;

/// Observer trait for container lifecycle events.
///
/// Every method has an empty default, so implementors only override what
/// they care about. Calls are made inline; keep them cheap.
///
/// # Examples
///
/// ```
/// use ferrous_kit::{Dependency, DependencyObserver};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct BuildCounter {
///     builds: Mutex<u32>,
/// }
///
/// impl DependencyObserver for BuildCounter {
///     fn constructed(&self, _service: &'static str, _duration: Duration) {
///         *self.builds.lock().unwrap() += 1;
///     }
/// }
///
/// let counter = Arc::new(BuildCounter::default());
/// let dep = Dependency::transient(|n: u32| n * 2, 21).with_observer(counter.clone());
///
/// dep.resolve().unwrap();
/// dep.resolve().unwrap();
/// assert_eq!(*counter.builds.lock().unwrap(), 2);
/// ```
pub trait DependencyObserver {
    /// The recipe produced a new instance.
    fn constructed(&self, _service: &'static str, _duration: Duration) {}

    /// The recipe's factory failed.
    fn construction_failed(&self, _service: &'static str, _error: &(dyn StdError + 'static)) {}

    /// An override was placed in the injected slot.
    fn injected(&self, _service: &'static str) {}

    /// The injected slot was emptied.
    fn cleared(&self, _service: &'static str) {}

    /// An injected disposable was released.
    fn disposed(&self, _service: &'static str) {}

    /// An injected disposable's release operation failed.
    fn dispose_failed(&self, _service: &'static str, _error: &(dyn StdError + 'static)) {}
}

/// Observer that forwards lifecycle events to `tracing`.
///
/// Successful events are emitted at `debug`, failures at `warn`.
///
/// # Examples
///
/// ```
/// use ferrous_kit::{Dependency, LoggingObserver};
/// use std::sync::Arc;
///
/// let dep = Dependency::new(|name: String| name, "svc".to_string())
///     .with_observer(Arc::new(LoggingObserver::with_prefix("billing")));
/// assert_eq!(*dep.resolve().unwrap(), "svc");
/// ```
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a new logging observer with default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "ferrous-kit".to_string(),
        }
    }

    /// Creates a new logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyObserver for LoggingObserver {
    fn constructed(&self, service: &'static str, duration: Duration) {
        tracing::debug!(prefix = %self.prefix, service, ?duration, "constructed service");
    }

    fn construction_failed(&self, service: &'static str, error: &(dyn StdError + 'static)) {
        tracing::warn!(prefix = %self.prefix, service, error = %error, "service construction failed");
    }

    fn injected(&self, service: &'static str) {
        tracing::debug!(prefix = %self.prefix, service, "injected override");
    }

    fn cleared(&self, service: &'static str) {
        tracing::debug!(prefix = %self.prefix, service, "cleared override");
    }

    fn disposed(&self, service: &'static str) {
        tracing::debug!(prefix = %self.prefix, service, "disposed injected override");
    }

    fn dispose_failed(&self, service: &'static str, error: &(dyn StdError + 'static)) {
        tracing::warn!(prefix = %self.prefix, service, error = %error, "failed to dispose injected override");
    }
}

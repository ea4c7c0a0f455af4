//! # ferrous-kit
//!
//! Small, independent building blocks for backend services.
//!
//! ## Contents
//!
//! - **[`Dependency`]**: one lazily built service slot with optional caching,
//!   test/request overrides and deterministic release of those overrides
//! - **[`Either`]**: two-branch union for success/alternate outcomes
//! - **[`AppError`] / [`ErrorHandler`]**: normalize any error or panic into
//!   one application error shape and fan it out to listeners
//! - **[`RequestContext`]**: request-scoped values that follow a request
//!   across `.await` points (feature `context`)
//! - **[`HttpStatus`]**: numeric HTTP status codes
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_kit::{Dependency, Dispose};
//! use ferrous_kit::error::BoxError;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! struct Mailer {
//!     endpoint: String,
//!     closed: AtomicBool,
//! }
//!
//! impl Mailer {
//!     fn new(endpoint: String) -> Self {
//!         Self { endpoint, closed: AtomicBool::new(false) }
//!     }
//! }
//!
//! impl Dispose for Mailer {
//!     fn dispose(&self) -> Result<(), BoxError> {
//!         self.closed.store(true, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! let mut mailer = Dependency::new(Mailer::new, "smtp://prod".to_string());
//!
//! // Production path: built once, then cached
//! let prod = mailer.resolve().unwrap();
//! assert_eq!(prod.endpoint, "smtp://prod");
//!
//! // Test path: override inside a scope, released when the scope ends
//! let fake = Arc::new(Mailer::new("memory://".to_string()));
//! mailer.scoped(|mailer| {
//!     mailer.inject_disposable(fake.clone()).unwrap();
//!     assert_eq!(mailer.resolve().unwrap().endpoint, "memory://");
//! }).unwrap();
//!
//! assert!(fake.closed.load(Ordering::SeqCst));
//! assert!(!prod.closed.load(Ordering::SeqCst));
//! assert!(Arc::ptr_eq(&mailer.resolve().unwrap(), &prod));
//! ```
//!
//! ## Feature Flags
//!
//! - `context` (default): [`RequestContext`], backed by `tokio` task-locals
//! - `serde` (default): serialization for [`HttpStatus`], [`Either`],
//!   error bodies and settings

// Module declarations
pub mod app_error;
pub mod config;
pub mod dependency;
pub mod either;
pub mod error;
pub mod error_handler;
pub mod lifetime;
pub mod observer;
pub mod recipe;
pub mod status;
pub mod traits;

#[cfg(feature = "context")]
pub mod context;

// Re-export core types
pub use app_error::AppError;
#[cfg(feature = "serde")]
pub use app_error::ErrorBody;
pub use config::{ConfigProvider, ConfigSource, ConfigValue};
pub use dependency::{Dependency, InjectionScope};
pub use either::Either;
pub use error::{DependencyError, KitError, KitResult};
pub use error_handler::{ErrorHandler, ErrorHandlerSettings, ErrorListener, ListenerId, LoggingListener};
pub use lifetime::Lifetime;
pub use observer::{DependencyObserver, LoggingObserver};
pub use recipe::Recipe;
pub use status::HttpStatus;
pub use traits::Dispose;

#[cfg(feature = "context")]
pub use context::RequestContext;

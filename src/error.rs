//! Error types shared across the crate.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error used at the seams where user code plugs in (factories,
/// disposers, handled errors).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Crate-level errors
///
/// Raised by the utility modules (status codes, configuration, request
/// context). The dependency container has its own [`DependencyError`].
///
/// # Examples
///
/// ```rust
/// use ferrous_kit::{HttpStatus, KitError};
///
/// let err = HttpStatus::try_from(799u16).unwrap_err();
/// assert!(matches!(err, KitError::UnknownStatus(799)));
/// assert_eq!(err.to_string(), "Unknown HTTP status code: 799");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KitError {
    /// Numeric code with no `HttpStatus` variant
    #[error("Unknown HTTP status code: {0}")]
    UnknownStatus(u16),
    /// Required configuration key absent from every source
    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
    /// Configuration value present but of the wrong shape
    #[error("Configuration key {key} is not a {expected}")]
    ConfigType {
        key: String,
        expected: &'static str,
    },
    /// Request context accessed outside of a context scope
    #[error("No request context is active on this task")]
    NoActiveContext,
}

/// Result type for crate operations
pub type KitResult<T> = Result<T, KitError>;

/// Errors surfaced by [`Dependency`](crate::Dependency).
///
/// The container's own bookkeeping never fails; both variants carry an
/// error raised by a collaborator. The original error is kept intact as
/// the [`source`](std::error::Error::source) and can be taken back with
/// [`into_source`](DependencyError::into_source).
///
/// # Examples
///
/// ```rust
/// use ferrous_kit::{Dependency, DependencyError, Lifetime, Recipe};
///
/// let dep: Dependency<u16> = Dependency::from_recipe(
///     Recipe::try_new(|raw: &'static str| raw.parse::<u16>(), "not-a-port"),
///     Lifetime::Singleton,
/// );
///
/// match dep.resolve() {
///     Err(DependencyError::Construction { service, source }) => {
///         assert_eq!(service, "u16");
///         assert!(source.is::<std::num::ParseIntError>());
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Error)]
pub enum DependencyError {
    /// The recipe's factory failed
    #[error("Failed to construct {service}: {source}")]
    Construction {
        service: &'static str,
        #[source]
        source: BoxError,
    },
    /// The injected value's release operation failed
    #[error("Failed to dispose injected {service}: {source}")]
    Disposal {
        service: &'static str,
        #[source]
        source: BoxError,
    },
}

impl DependencyError {
    /// Type name of the service the error belongs to.
    pub fn service(&self) -> &'static str {
        match self {
            DependencyError::Construction { service, .. }
            | DependencyError::Disposal { service, .. } => service,
        }
    }

    /// Returns the collaborator's error unchanged.
    pub fn into_source(self) -> BoxError {
        match self {
            DependencyError::Construction { source, .. }
            | DependencyError::Disposal { source, .. } => source,
        }
    }
}

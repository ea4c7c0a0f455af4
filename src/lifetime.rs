//! Service lifetime definitions.

/// Caching policy of a [`Dependency`](crate::Dependency)
///
/// Fixed when the container is created. Injected overrides bypass the
/// lifetime entirely.
///
/// # Examples
///
/// ```rust
/// use ferrous_kit::{Dependency, Lifetime};
/// use std::sync::Arc;
///
/// struct RequestModel { id: u32 }
///
/// let cached = Dependency::new(|id: u32| RequestModel { id }, 7);
/// assert_eq!(cached.lifetime(), Lifetime::Singleton);
/// assert!(Arc::ptr_eq(&cached.resolve().unwrap(), &cached.resolve().unwrap()));
///
/// let fresh = Dependency::transient(|id: u32| RequestModel { id }, 7);
/// assert!(!Arc::ptr_eq(&fresh.resolve().unwrap(), &fresh.resolve().unwrap()));
/// assert_eq!(fresh.resolve().unwrap().id, 7);
///
/// // The boolean "cacheable" flag maps onto the enum
/// assert_eq!(Lifetime::from(false), Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Built on first resolution, then reused
    ///
    /// The instance stays in the container's cache slot until the cache is
    /// invalidated or the container is dropped. Every resolution without an
    /// intervening invalidation returns the same `Arc`.
    #[default]
    Singleton,
    /// Built fresh on every resolution, never cached
    Transient,
}

impl Lifetime {
    /// Whether constructed instances are memoized.
    pub fn is_cacheable(self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

impl From<bool> for Lifetime {
    fn from(cacheable: bool) -> Self {
        if cacheable {
            Lifetime::Singleton
        } else {
            Lifetime::Transient
        }
    }
}

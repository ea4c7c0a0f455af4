//! Disposal trait for resource cleanup.

use crate::error::BoxError;

/// Trait for synchronous resource release.
///
/// Implement this for services that hold something needing explicit
/// teardown (connections, file handles, temp directories). A value injected
/// with [`Dependency::inject_disposable`](crate::Dependency::inject_disposable)
/// is released exactly once when the override is cleared, replaced, or its
/// scope ends. Instances built by the container's own recipe are never
/// released by the container.
///
/// A failing release is returned to whoever triggered it. Report failures
/// through the `Result`; `dispose` must not panic, since it may run from
/// `Drop` while a panic is already unwinding, which aborts the process.
///
/// # Examples
///
/// ```
/// use ferrous_kit::{Dependency, Dispose};
/// use ferrous_kit::error::BoxError;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Database {
///     url: String,
///     closed: AtomicBool,
/// }
///
/// impl Dispose for Database {
///     fn dispose(&self) -> Result<(), BoxError> {
///         self.closed.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let mut db = Dependency::new(
///     |url: String| Database { url, closed: AtomicBool::new(false) },
///     "postgres://prod".to_string(),
/// );
///
/// let test_db = Arc::new(Database { url: "test".into(), closed: AtomicBool::new(false) });
/// db.inject_disposable(test_db.clone()).unwrap();
/// assert_eq!(db.resolve().unwrap().url, "test");
///
/// db.clear_injected().unwrap();
/// assert!(test_db.closed.load(Ordering::SeqCst));
/// assert_eq!(db.resolve().unwrap().url, "postgres://prod");
/// ```
pub trait Dispose {
    /// Release the resources held by this value.
    fn dispose(&self) -> Result<(), BoxError>;
}

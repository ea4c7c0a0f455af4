//! Single-slot dependency container with scoped overrides.
//!
//! A [`Dependency`] owns the recipe for one service and hands out `Arc`s to
//! it. Resolution prefers, in order: an injected override, the cached
//! instance (singleton lifetime only), and finally a freshly built instance.
//! Only the injected override is ever released by the container; instances
//! built from the recipe are considered long-lived.
//!
//! Services are wired by hand: resolve one container and pass the result
//! into another's arguments.
//!
//! ```
//! use ferrous_kit::Dependency;
//! use std::sync::Arc;
//!
//! struct Database { url: String }
//! struct UserRepository { db: Arc<Database> }
//!
//! let db = Dependency::new(|url: String| Database { url }, "postgres://prod".to_string());
//! let repo = Dependency::new(|db: Arc<Database>| UserRepository { db }, db.resolve().unwrap());
//!
//! assert_eq!(repo.resolve().unwrap().db.url, "postgres://prod");
//! ```

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{BoxError, DependencyError};
use crate::lifetime::Lifetime;
use crate::observer::DependencyObserver;
use crate::recipe::Recipe;
use crate::traits::Dispose;

type Disposer = Box<dyn FnOnce() -> Result<(), BoxError>>;

struct Injected<T: ?Sized> {
    service: Arc<T>,
    // Present only for overrides injected with the Dispose capability
    disposer: Option<Disposer>,
}

/// Lazily built, optionally cached, overridable service slot.
///
/// The container is meant for a single owner (one test, one request, one
/// component). `resolve` takes `&self` and memoizes through a `RefCell`,
/// and recipes are plain boxed closures, so the type is neither `Send` nor
/// `Sync`. Keep one per thread or task.
///
/// Dropping the container releases the currently injected disposable, the
/// same as [`dispose`](Dependency::dispose). Errors from a release that
/// happens inside `Drop` cannot be returned; they are reported to the
/// observer and logged. Use [`dispose`](Dependency::dispose),
/// [`scoped`](Dependency::scoped) or [`InjectionScope::close`] to receive
/// them.
///
/// # Examples
///
/// ```
/// use ferrous_kit::Dependency;
/// use std::sync::{Arc, Mutex};
///
/// struct User { name: Mutex<String> }
///
/// let mut user = Dependency::new(
///     |name: String| User { name: Mutex::new(name) },
///     "John".to_string(),
/// );
///
/// // Cached: mutations are visible through later resolutions
/// *user.resolve().unwrap().name.lock().unwrap() = "Jane".to_string();
/// assert_eq!(*user.resolve().unwrap().name.lock().unwrap(), "Jane");
///
/// // Overrides take priority until cleared
/// user.inject(Arc::new(User { name: Mutex::new("Mock".into()) })).unwrap();
/// assert_eq!(*user.resolve().unwrap().name.lock().unwrap(), "Mock");
///
/// user.clear_injected().unwrap();
/// assert_eq!(*user.resolve().unwrap().name.lock().unwrap(), "Jane");
/// ```
pub struct Dependency<T: ?Sized + 'static> {
    recipe: Recipe<T>,
    lifetime: Lifetime,
    injected: Option<Injected<T>>,
    cache: RefCell<Option<Arc<T>>>,
    observer: Option<Arc<dyn DependencyObserver>>,
}

impl<T: 'static> Dependency<T> {
    /// Creates a caching container from a factory and its arguments.
    ///
    /// Nothing is built until the first [`resolve`](Self::resolve).
    pub fn new<A, F>(factory: F, args: A) -> Self
    where
        F: Fn(A) -> T + 'static,
        A: Clone + 'static,
    {
        Self::from_recipe(Recipe::new(factory, args), Lifetime::Singleton)
    }

    /// Creates a container that builds a new instance on every resolution.
    pub fn transient<A, F>(factory: F, args: A) -> Self
    where
        F: Fn(A) -> T + 'static,
        A: Clone + 'static,
    {
        Self::from_recipe(Recipe::new(factory, args), Lifetime::Transient)
    }
}

impl<T: ?Sized + 'static> Dependency<T> {
    /// Creates a container from an existing recipe and lifetime.
    pub fn from_recipe(recipe: Recipe<T>, lifetime: Lifetime) -> Self {
        Self {
            recipe,
            lifetime,
            injected: None,
            cache: RefCell::new(None),
            observer: None,
        }
    }

    /// Attaches a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn DependencyObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Overrides the service with `service`.
    ///
    /// If a disposable override was already injected, it is released before
    /// being replaced. The new override is installed even when that release
    /// fails; the release error is then returned.
    pub fn inject(&mut self, service: Arc<T>) -> Result<&mut Self, DependencyError> {
        self.replace_injected(Injected {
            service,
            disposer: None,
        })
    }

    /// Overrides the service with a value that must be released when the
    /// override ends.
    ///
    /// The release runs exactly once: on [`clear_injected`](Self::clear_injected),
    /// on the next injection, or when the owning scope ends.
    pub fn inject_disposable(&mut self, service: Arc<T>) -> Result<&mut Self, DependencyError>
    where
        T: Dispose,
    {
        let handle = Arc::clone(&service);
        self.replace_injected(Injected {
            service,
            disposer: Some(Box::new(move || handle.dispose())),
        })
    }

    /// Releases the injected override (if disposable) and empties the slot.
    ///
    /// A no-op when nothing is injected. The slot is emptied even if the
    /// release fails.
    pub fn clear_injected(&mut self) -> Result<&mut Self, DependencyError> {
        self.release_injected()?;
        Ok(self)
    }

    /// Resolves the service.
    ///
    /// Returns the injected override if there is one, else the cached
    /// instance, else builds a new instance from the recipe (caching it for
    /// singleton lifetimes). Factory failures come back as
    /// [`DependencyError::Construction`].
    pub fn resolve(&self) -> Result<Arc<T>, DependencyError> {
        if let Some(injected) = &self.injected {
            return Ok(Arc::clone(&injected.service));
        }

        let cached = self.cache.borrow().clone();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let instance = self.construct()?;
        if self.lifetime.is_cacheable() {
            *self.cache.borrow_mut() = Some(Arc::clone(&instance));
        }
        Ok(instance)
    }

    /// Resolves the service, panicking if it cannot be built.
    pub fn resolve_required(&self) -> Arc<T> {
        match self.resolve() {
            Ok(service) => service,
            Err(err) => panic!("{}", err),
        }
    }

    /// Drops the cached instance so the next resolution rebuilds it.
    ///
    /// Does not release the instance and does not touch the injected slot.
    pub fn invalidate_cache(&self) {
        self.cache.borrow_mut().take();
    }

    /// Performs scoped disposal now: same as
    /// [`clear_injected`](Self::clear_injected).
    pub fn dispose(&mut self) -> Result<(), DependencyError> {
        self.release_injected()
    }

    /// Opens a disposal scope over this container.
    ///
    /// The returned guard dereferences to the container. When it goes out
    /// of scope, by normal exit, early return or panic, the injected
    /// override is released and cleared.
    ///
    /// ```
    /// use ferrous_kit::{Dependency, Dispose};
    /// use ferrous_kit::error::BoxError;
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    ///
    /// #[derive(Default)]
    /// struct Db { closed: AtomicBool }
    /// impl Dispose for Db {
    ///     fn dispose(&self) -> Result<(), BoxError> {
    ///         self.closed.store(true, Ordering::SeqCst);
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let mut db = Dependency::from_recipe(ferrous_kit::Recipe::from_fn(Db::default), Default::default());
    /// let fake = Arc::new(Db::default());
    /// {
    ///     let mut scope = db.scope();
    ///     scope.inject_disposable(fake.clone()).unwrap();
    ///     assert!(Arc::ptr_eq(&scope.resolve().unwrap(), &fake));
    /// }
    /// assert!(fake.closed.load(Ordering::SeqCst));
    /// assert!(!db.is_injected());
    /// ```
    pub fn scope(&mut self) -> InjectionScope<'_, T> {
        InjectionScope {
            dependency: self,
            closed: false,
        }
    }

    /// Runs `f` inside a disposal scope and returns its output.
    ///
    /// The injected override is released when `f` returns; a release error
    /// replaces the output. If `f` panics the release still happens during
    /// unwinding.
    pub fn scoped<R, F>(&mut self, f: F) -> Result<R, DependencyError>
    where
        F: FnOnce(&mut Self) -> R,
    {
        let mut scope = self.scope();
        let output = f(&mut *scope);
        scope.close()?;
        Ok(output)
    }

    pub fn is_injected(&self) -> bool {
        self.injected.is_some()
    }

    pub fn is_cached(&self) -> bool {
        self.cache.borrow().is_some()
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Type name of the managed service.
    pub fn service_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn construct(&self) -> Result<Arc<T>, DependencyError> {
        let service = self.service_name();
        let started = Instant::now();
        match self.recipe.build() {
            Ok(instance) => {
                self.notify(|o| o.constructed(service, started.elapsed()));
                Ok(instance)
            }
            Err(source) => {
                self.notify(|o| o.construction_failed(service, &*source));
                Err(DependencyError::Construction { service, source })
            }
        }
    }

    fn replace_injected(&mut self, next: Injected<T>) -> Result<&mut Self, DependencyError> {
        let released = self.release_injected();
        self.injected = Some(next);
        let service = self.service_name();
        self.notify(|o| o.injected(service));
        released?;
        Ok(self)
    }

    fn release_injected(&mut self) -> Result<(), DependencyError> {
        let Some(previous) = self.injected.take() else {
            return Ok(());
        };
        let service = self.service_name();
        self.notify(|o| o.cleared(service));

        let Some(disposer) = previous.disposer else {
            return Ok(());
        };
        match disposer() {
            Ok(()) => {
                self.notify(|o| o.disposed(service));
                Ok(())
            }
            Err(source) => {
                self.notify(|o| o.dispose_failed(service, &*source));
                Err(DependencyError::Disposal { service, source })
            }
        }
    }

    fn release_on_drop(&mut self) {
        if let Err(err) = self.release_injected() {
            tracing::warn!(
                service = err.service(),
                error = %err,
                "injected override failed to dispose at end of scope"
            );
        }
    }

    fn notify(&self, event: impl FnOnce(&dyn DependencyObserver)) {
        if let Some(observer) = &self.observer {
            event(observer.as_ref());
        }
    }
}

impl<T: ?Sized + 'static> Drop for Dependency<T> {
    fn drop(&mut self) {
        self.release_on_drop();
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Dependency<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("service", &self.service_name())
            .field("lifetime", &self.lifetime)
            .field("injected", &self.is_injected())
            .field("cached", &self.is_cached())
            .finish()
    }
}

/// Disposal scope over a [`Dependency`], created by [`Dependency::scope`].
///
/// Dereferences to the container. On drop it releases and clears the
/// injected override; errors at that point are logged. Call
/// [`close`](InjectionScope::close) to end the scope and get the release
/// error back instead.
pub struct InjectionScope<'a, T: ?Sized + 'static> {
    dependency: &'a mut Dependency<T>,
    closed: bool,
}

impl<T: ?Sized + 'static> InjectionScope<'_, T> {
    /// Ends the scope, returning the injected override's release error.
    pub fn close(mut self) -> Result<(), DependencyError> {
        self.closed = true;
        self.dependency.release_injected()
    }
}

impl<T: ?Sized + 'static> Deref for InjectionScope<'_, T> {
    type Target = Dependency<T>;

    fn deref(&self) -> &Self::Target {
        self.dependency
    }
}

impl<T: ?Sized + 'static> DerefMut for InjectionScope<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.dependency
    }
}

impl<T: ?Sized + 'static> Drop for InjectionScope<'_, T> {
    fn drop(&mut self) {
        if !self.closed {
            self.dependency.release_on_drop();
        }
    }
}

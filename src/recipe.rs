//! Construction recipes for container-managed services.

use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;

type BuildFn<T> = dyn Fn() -> Result<Arc<T>, BoxError>;

/// Immutable `(factory, arguments)` pair used to build a service on demand.
///
/// The argument list is whatever value the factory takes: a single value,
/// a tuple for several parameters, or nothing at all via
/// [`from_fn`](Recipe::from_fn). Arity and types are checked by the
/// compiler. Arguments are cloned into every construction, so a transient
/// container can call the factory any number of times.
///
/// # Examples
///
/// ```
/// use ferrous_kit::Recipe;
///
/// struct Server { host: String, port: u16 }
///
/// let recipe = Recipe::new(
///     |(host, port): (String, u16)| Server { host, port },
///     ("localhost".to_string(), 8080),
/// );
/// # let _ = recipe;
/// ```
pub struct Recipe<T: ?Sized> {
    build: Box<BuildFn<T>>,
}

impl<T: 'static> Recipe<T> {
    /// Recipe for an infallible factory.
    pub fn new<A, F>(factory: F, args: A) -> Self
    where
        F: Fn(A) -> T + 'static,
        A: Clone + 'static,
    {
        Self {
            build: Box::new(move || Ok(Arc::new(factory(args.clone())))),
        }
    }

    /// Recipe for a factory that can fail. The factory's error is handed
    /// back from [`Dependency::resolve`](crate::Dependency::resolve).
    pub fn try_new<A, F, E>(factory: F, args: A) -> Self
    where
        F: Fn(A) -> Result<T, E> + 'static,
        A: Clone + 'static,
        E: Into<BoxError>,
    {
        Self {
            build: Box::new(move || factory(args.clone()).map(Arc::new).map_err(Into::into)),
        }
    }

    /// Recipe for a factory that takes no arguments.
    pub fn from_fn<F>(factory: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self {
            build: Box::new(move || Ok(Arc::new(factory()))),
        }
    }
}

impl<T: ?Sized + 'static> Recipe<T> {
    /// Recipe for a factory that hands out its own `Arc`, which is how
    /// trait-object services (`Recipe<dyn Repository>`) are built.
    ///
    /// ```
    /// use ferrous_kit::Recipe;
    /// use std::sync::Arc;
    ///
    /// trait Greeter { fn greet(&self) -> String; }
    /// struct English;
    /// impl Greeter for English { fn greet(&self) -> String { "hello".into() } }
    ///
    /// let recipe: Recipe<dyn Greeter> = Recipe::shared(|_: ()| Arc::new(English) as Arc<dyn Greeter>, ());
    /// # let _ = recipe;
    /// ```
    pub fn shared<A, F>(factory: F, args: A) -> Self
    where
        F: Fn(A) -> Arc<T> + 'static,
        A: Clone + 'static,
    {
        Self {
            build: Box::new(move || Ok(factory(args.clone()))),
        }
    }

    pub(crate) fn build(&self) -> Result<Arc<T>, BoxError> {
        (self.build)()
    }
}

impl<T: ?Sized> fmt::Debug for Recipe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipe")
            .field("service", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

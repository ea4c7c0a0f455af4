//! Request-scoped context that follows a request across `.await` points.
//!
//! A [`RequestContext`] is installed for the duration of a future with
//! [`RequestContext::scope`]; any code running inside that future (however
//! deeply nested, and whichever worker thread polls it) can reach it through
//! [`RequestContext::current`]. Tasks started with `tokio::spawn` do not
//! inherit it; use [`RequestContext::spawn`] for that.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::error::{KitError, KitResult};

tokio::task_local! {
    static CURRENT: RequestContext;
}

type Value = Arc<dyn Any + Send + Sync>;

struct ContextInner {
    request_id: String,
    started_at: Instant,
    values: RwLock<HashMap<String, Value>>,
}

/// Per-request key/value store plus request id.
///
/// Cloning is cheap and every clone sees the same values.
///
/// # Examples
///
/// ```
/// use ferrous_kit::RequestContext;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// #[derive(Debug, PartialEq)]
/// struct UserId(u64);
///
/// async fn load_orders() -> u64 {
///     let ctx = RequestContext::current().expect("inside a request");
///     ctx.get::<UserId>("user").map(|id| id.0).unwrap_or_default()
/// }
///
/// let ctx = RequestContext::with_request_id("req-1");
/// ctx.insert("user", UserId(42));
///
/// let user = ctx.scope(async { load_orders().await }).await;
/// assert_eq!(user, 42);
/// assert!(RequestContext::current().is_none());
/// # }
/// ```
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

impl RequestContext {
    /// New context with a random (UUID v4) request id.
    pub fn new() -> Self {
        Self::with_request_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                request_id: request_id.into(),
                started_at: Instant::now(),
                values: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.inner.request_id
    }

    /// Time since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert<V>(&self, key: impl Into<String>, value: V)
    where
        V: Any + Send + Sync,
    {
        self.inner
            .values
            .write()
            .unwrap()
            .insert(key.into(), Arc::new(value));
    }

    /// Fetches the value under `key` if it exists and has type `V`.
    pub fn get<V>(&self, key: &str) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        let value = self.inner.values.read().unwrap().get(key).cloned()?;
        value.downcast::<V>().ok()
    }

    pub fn remove(&self, key: &str) -> bool {
        self.inner.values.write().unwrap().remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.values.read().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.values.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `future` with this context installed as current.
    ///
    /// Nested scopes shadow the outer context until they finish.
    pub async fn scope<F>(self, future: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(self, future).await
    }

    /// Runs `f` with this context installed as current.
    pub fn sync_scope<R, F>(self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT.sync_scope(self, f)
    }

    /// The context of the enclosing scope, if any.
    pub fn current() -> Option<RequestContext> {
        CURRENT.try_with(RequestContext::clone).ok()
    }

    /// Like [`current`](Self::current) but an error outside a scope.
    pub fn try_current() -> KitResult<RequestContext> {
        Self::current().ok_or(KitError::NoActiveContext)
    }

    /// Spawns `future` on the tokio runtime, carrying the current context
    /// (if any) into the new task.
    pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match Self::current() {
            Some(ctx) => tokio::spawn(CURRENT.scope(ctx, future)),
            None => tokio::spawn(future),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.inner.request_id)
            .field("values", &self.len())
            .finish()
    }
}

//! Request context types.
//!
//! [`RequestContext`] is an immutable snapshot of request-scoped values. Adding
//! a value produces a new context and leaves the original untouched, so a
//! context handed to a template can never be changed behind its back.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// # Example
///
/// ```
/// use vibefeeder_core::RequestId;
///
/// let id = RequestId::new();
/// assert_ne!(id, RequestId::new());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Returned when work is attempted on a cancelled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request context cancelled")]
pub struct Cancelled;

type Values = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Immutable per-request key/value snapshot with a cancellation signal.
///
/// Values are keyed by type. Crates that want a private slot define a
/// private newtype and only expose accessor functions, which keeps their
/// keys from colliding with anyone else's.
///
/// # Example
///
/// ```
/// use vibefeeder_core::RequestContext;
///
/// #[derive(Debug, PartialEq)]
/// struct Locale(&'static str);
///
/// let base = RequestContext::new();
/// let ctx = base.with_value(Locale("en"));
///
/// assert_eq!(ctx.value::<Locale>(), Some(&Locale("en")));
/// assert!(base.value::<Locale>().is_none());
/// ```
#[derive(Clone)]
pub struct RequestContext {
    request_id: RequestId,
    values: Arc<Values>,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Creates an empty context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates an empty context for the given request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            values: Arc::new(HashMap::new()),
            cancellation: CancellationToken::new(),
        }
    }

    /// Returns a copy of this context driven by `token` for cancellation.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            request_id: self.request_id,
            values: Arc::clone(&self.values),
            cancellation: token,
        }
    }

    /// Returns a new context carrying `value` in the slot for its type.
    #[must_use]
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        let mut values = (*self.values).clone();
        values.insert(TypeId::of::<T>(), Arc::new(value));
        Self {
            request_id: self.request_id,
            values: Arc::new(values),
            cancellation: self.cancellation.clone(),
        }
    }

    /// Returns the value stored for type `T`.
    #[must_use]
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the cancellation token.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once the request has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fails with [`Cancelled`] if the request has been cancelled.
    pub fn ensure_active(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
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
            .field("request_id", &self.request_id)
            .field("values", &self.values.len())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

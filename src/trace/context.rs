//! Request-scoped processing context.
//!
//! The trace middleware computes a [`Context`] once per request and makes it
//! visible two ways: as a request extension (for extractors) and as a task
//! local for the lifetime of the request future (for log calls that do not
//! have the request at hand, e.g. `tracing` events).

use std::convert::Infallible;
use std::fmt;
use std::future::Future;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio::task::futures::TaskLocalFuture;

use crate::trace::ProjectId;

tokio::task_local! {
    static CURRENT: Context;
}

/// Fully-qualified trace resource name, `projects/<project>/traces/<trace>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CloudTrace(String);

impl CloudTrace {
    pub fn new(project: &ProjectId, trace_id: &str) -> Self {
        Self(format!("projects/{}/traces/{}", project.as_str(), trace_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CloudTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Values scoped to the request currently being processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    trace: Option<CloudTrace>,
}

impl Context {
    /// A context with nothing attached.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_trace(trace: Option<CloudTrace>) -> Self {
        Self { trace }
    }

    /// Trace resource name for this request, if one was resolved.
    pub fn trace(&self) -> Option<&CloudTrace> {
        self.trace.as_ref()
    }

    /// Context of the request running on the current task, or an empty one.
    pub fn current() -> Self {
        CURRENT.try_with(Clone::clone).unwrap_or_default()
    }

    /// Run `fut` with this context as the current one.
    pub fn scope<F: Future>(self, fut: F) -> TaskLocalFuture<Context, F> {
        CURRENT.scope(self, fut)
    }

    /// Run `f` synchronously with this context as the current one.
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(self, f)
    }
}

impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Context>()
            .cloned()
            .unwrap_or_else(Context::current))
    }
}

//! Cloud Trace context middleware.
//!
//! Reads `X-Cloud-Trace-Context`, derives the trace resource name for the
//! configured project and makes it the request's [`Context`]: inserted into
//! the request extensions and set as the task-local context while the inner
//! service runs. Responses pass through untouched.

use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use axum::http::Request;
use tokio::task::futures::TaskLocalFuture;
use tower::{Layer, Service};

use crate::trace::{CloudTrace, Context, ProjectId};

/// Layer that attaches the request's trace to its [`Context`].
#[derive(Debug, Clone)]
pub struct CloudTraceLayer {
    project: Arc<ProjectId>,
}

impl CloudTraceLayer {
    pub fn new(project: ProjectId) -> Self {
        Self {
            project: Arc::new(project),
        }
    }
}

impl<S> Layer<S> for CloudTraceLayer {
    type Service = CloudTraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CloudTraceService {
            inner,
            project: Arc::clone(&self.project),
        }
    }
}

/// Service produced by [`CloudTraceLayer`].
#[derive(Debug, Clone)]
pub struct CloudTraceService<S> {
    inner: S,
    project: Arc<ProjectId>,
}

impl<S, B> Service<Request<B>> for CloudTraceService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = TaskLocalFuture<Context, S::Future>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let ctx = Context::with_trace(CloudTrace::from_headers(&self.project, req.headers()));
        req.extensions_mut().insert(ctx.clone());

        let inner = &mut self.inner;
        let fut = ctx.clone().sync_scope(|| inner.call(req));
        ctx.scope(fut)
    }
}

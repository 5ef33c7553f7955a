//! `X-Cloud-Trace-Context` header parsing.
//!
//! The header is formatted as `TRACE_ID/SPAN_ID;o=OPTIONS`. Only the trace id
//! is used for log correlation.

use axum::http::HeaderMap;

use crate::trace::{CloudTrace, ProjectId};

/// Header set by the platform load balancer on every inbound request.
pub const X_CLOUD_TRACE_CONTEXT: &str = "x-cloud-trace-context";

/// Leading trace id of a header value, if it is non-empty.
///
/// A value starting with `/` yields `None` even when later segments exist.
pub fn trace_id_from_header(value: &str) -> Option<&str> {
    value.split('/').next().filter(|id| !id.is_empty())
}

impl CloudTrace {
    /// Resolve the trace resource name for a request's headers.
    ///
    /// Header bytes that are not visible ASCII are kept; invalid UTF-8 is
    /// replaced with `U+FFFD`.
    pub fn from_headers(project: &ProjectId, headers: &HeaderMap) -> Option<Self> {
        let value = String::from_utf8_lossy(headers.get(X_CLOUD_TRACE_CONTEXT)?.as_bytes());
        trace_id_from_header(&value).map(|id| CloudTrace::new(project, id))
    }
}

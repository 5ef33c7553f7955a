//! Trace correlation subsystem.
//!
//! # Data Flow
//! ```text
//! startup:
//!     config / GOOGLE_CLOUD_PROJECT / metadata server
//!     → project.rs (ProjectId, resolved once, fatal on failure)
//!
//! per request:
//!     X-Cloud-Trace-Context: <trace-id>/<span-id>;o=1
//!     → header.rs (leading segment → CloudTrace)
//!     → context.rs (Context in request extensions + task local)
//!     → logging handlers read Context::current()
//! ```
//!
//! # Design Decisions
//! - The trace value is request-scoped; nothing about it is shared between
//!   requests
//! - A missing or malformed header is not an error, it just yields no trace

pub mod context;
pub mod header;
pub mod project;

pub use context::{CloudTrace, Context};
pub use header::{trace_id_from_header, X_CLOUD_TRACE_CONTEXT};
pub use project::{ProjectError, ProjectId};

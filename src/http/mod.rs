//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup)
//!     → middleware/cloud_trace.rs (X-Cloud-Trace-Context → Context)
//!     → tower-http TraceLayer (request/response events, trace-correlated)
//!     → route handler (logs against the request Context)
//! ```

pub mod middleware;
pub mod server;

pub use middleware::CloudTraceLayer;
pub use server::HttpServer;

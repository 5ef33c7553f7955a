//! Request middleware.

pub mod cloud_trace;

pub use cloud_trace::{CloudTraceLayer, CloudTraceService};

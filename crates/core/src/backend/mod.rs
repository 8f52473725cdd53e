//! Conversion backend abstraction.
//!
//! This module provides a `ConversionBackend` trait for the remote service
//! that accepts conversion requests and reports per-task status.

mod http;
mod types;

pub use http::HttpBackend;
pub use types::*;

//! Maintenance-request intake service core.
//!
//! The `maintenance` module carries the interesting behavior: an AI-backed
//! classification pipeline that tags incoming requests with a category,
//! priority, and recommended vendor, records every decision in a bounded
//! audit log, and persists the result through repository traits the hosting
//! service implements.

pub mod config;
pub mod error;
pub mod maintenance;
pub mod telemetry;

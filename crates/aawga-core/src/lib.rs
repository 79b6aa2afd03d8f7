//! # aawga-core
//!
//! Shared plumbing for the artifact generation workspace.
//!
//! - **Logging**: [`logging::init_subscriber`] / [`logging::init_json_subscriber`]
//!   install the global `tracing` subscriber once at startup.
//! - **Log capture**: [`logging::capture_logs`] records events in memory so
//!   tests can assert on diagnostic records (parse failures, degraded
//!   retrieval) without scraping stderr.

#![deny(unsafe_code)]

pub mod logging;

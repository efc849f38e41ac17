#![deny(unsafe_code)]

//! Shared test utilities for the jobgate workspace.
//!
//! Provides config builders, spy handlers, request helpers, log capture and
//! tracing setup so that individual crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! jobgate-test-utils = { workspace = true }
//! ```
//!
//! Only integration tests (`tests/`) should use it; unit tests inside
//! `jobgate-core` would see a second copy of that crate's types.

pub mod config;
pub mod handlers;
pub mod http;
pub mod log_capture;
pub mod server;
pub mod tracing_setup;

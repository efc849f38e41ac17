//! HTTP surface: named route table, feature registrar and response types.
//!
//! ```text
//! startup:  FeatureRegistrar::register(&mut RouteTable, settings)
//!               └─ enabled? ─ no ──▶ nothing mounted, /feature is a plain 404
//!                          └─ yes ─▶ GET  /feature  feature:listDaemons  [gate]
//!                                    POST /feature  feature:scheduleJob  [gate]
//!
//! request:  gate.authenticate ─▶ factory.build ─▶ dispatcher.dispatch ─▶ JSON
//!               401                  400                 500
//! ```

pub mod feature;
pub mod routes;
pub mod types;

pub use feature::{FeatureRegistrar, MAX_BODY_BYTES, Registration};
pub use routes::{RouteEntry, RouteError, RouteTable};
pub use types::*;

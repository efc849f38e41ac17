//! Build metadata embedded by the build script, surfaced on `GET /health`.

/// Short git commit hash at build time, or `"unknown"` outside a checkout.
pub const GIT_HASH: &str = env!("JOBGATE_GIT_HASH");

/// Cargo profile the crate was built with.
pub const BUILD_PROFILE: &str = env!("JOBGATE_BUILD_PROFILE");

/// The crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `"0.1.0 (abc1234, debug)"`
pub fn version_string() -> String {
    format!("{VERSION} ({GIT_HASH}, {BUILD_PROFILE})")
}

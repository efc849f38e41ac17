//! Tracing initialisation for tests.
//!
//! [`init_test_tracing`] installs a process-wide fmt subscriber writing to the
//! test harness, at most once per process. Tests that need to assert on log
//! output should use [`crate::log_capture`] instead, which scopes a
//! subscriber to the current thread.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_TEST_FILTER: &str = "jobgate_core=debug,info";

/// Install a fmt subscriber honouring `RUST_LOG`, falling back to
/// [`DEFAULT_TEST_FILTER`]. Later calls are ignored.
///
/// ```ignore
/// #[tokio::test]
/// async fn my_test() {
///     jobgate_test_utils::tracing_setup::init_test_tracing();
///     tracing::debug!("visible with --nocapture");
/// }
/// ```
pub fn init_test_tracing() {
    init_test_tracing_with(DEFAULT_TEST_FILTER);
}

/// Like [`init_test_tracing`] with an explicit fallback filter.
pub fn init_test_tracing_with(fallback: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_test_writer()
        .try_init();
}

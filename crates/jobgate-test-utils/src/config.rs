//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use jobgate_config::{AppConfig, FeatureSettings, RosterEntryConfig};

/// Credential pair used by [`TestConfigBuilder::with_feature`].
pub const TEST_USER: &str = "scheduler";
pub const TEST_PASS: &str = "s3cret";

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .feature("svc", "pw")
///     .daemon("feature-1", "idle")
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Enable the feature endpoints guarded by `user` / `pass`.
    pub fn feature(mut self, user: &str, pass: &str) -> Self {
        self.config.daemons.feature = true;
        self.config.feature.user = user.to_string();
        self.config.feature.pass = pass.to_string().into();
        self
    }

    /// Enable the feature endpoints with [`TEST_USER`] / [`TEST_PASS`].
    pub fn with_feature(self) -> Self {
        self.feature(TEST_USER, TEST_PASS)
    }

    /// Append a roster entry.
    pub fn daemon(mut self, identifier: &str, status: &str) -> Self {
        self.config.daemons.roster.push(RosterEntryConfig {
            identifier: identifier.to_string(),
            status: status.to_string(),
        });
        self
    }

    pub fn listen_addr(mut self, addr: &str) -> Self {
        self.config.server.listen_addr = addr.to_string();
        self
    }

    pub fn listen_port(mut self, port: u16) -> Self {
        self.config.server.listen_port = port;
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.config.daemons.bus_capacity = capacity;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }

    /// Shorthand for `build().feature_settings()`.
    pub fn settings(self) -> Option<FeatureSettings> {
        self.config.feature_settings()
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

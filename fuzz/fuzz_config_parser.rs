//! Fuzz target for the TOML configuration parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser
//!
//! Feeds arbitrary text to `AppConfig::parse()`. A config that parses must
//! also yield feature settings consistent with `daemons.feature`.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(config) = jobgate_config::AppConfig::parse(s)
    {
        assert_eq!(config.feature_settings().is_some(), config.daemons.feature);
    }
});

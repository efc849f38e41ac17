//! Fuzz target for the `Authorization: Basic` parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_basic_auth
//!
//! Parsing must never panic, and anything it accepts must survive a
//! render/parse round trip.

#![no_main]

use jobgate_core::Credentials;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some(credentials) = Credentials::parse_authorization(data) {
        let rendered = credentials.to_authorization();
        let reparsed = Credentials::parse_authorization(rendered.as_bytes())
            .expect("rendered credentials parse");
        assert_eq!(reparsed.username, credentials.username);
        assert_eq!(reparsed.password(), credentials.password());
    }
});

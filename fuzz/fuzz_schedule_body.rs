//! Fuzz target for the `scheduleJob` body parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_schedule_body
//!
//! Arbitrary bodies either fail validation or produce a command whose
//! version passes the version grammar.

#![no_main]

use jobgate_core::{CommandFactory, FeatureCommandFactory, FeatureEndpoint, JobRequest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(command) = FeatureCommandFactory.build(FeatureEndpoint::ScheduleJob, data) {
        let request = JobRequest::from_payload(command.payload()).expect("factory output parses");
        assert!(!request.daemon_target.is_empty());
        assert!(jobgate_core::is_valid_optional_version(request.version.as_deref()));
    }
});

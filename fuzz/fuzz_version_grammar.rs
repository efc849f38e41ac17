//! Fuzz target for the optional version grammar.
//!
//! Run with: cargo +nightly fuzz run fuzz_version_grammar
//!
//! Every accepted string has at most three dot-separated components, all
//! decimal digits except a trailing `*`.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    if !jobgate_core::is_valid_optional_version(Some(s)) || s.is_empty() {
        return;
    }

    let parts: Vec<&str> = s.split('.').collect();
    assert!(parts.len() <= 3, "{s:?}");
    let (last, leading) = parts.split_last().expect("split yields at least one part");
    for part in leading {
        assert!(!part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()), "{s:?}");
    }
    assert!(
        *last == "*" || (!last.is_empty() && last.bytes().all(|b| b.is_ascii_digit())),
        "{s:?}"
    );
});

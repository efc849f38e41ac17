//! Optional version-string grammar.
//!
//! A version is zero, one or two numeric components each followed by `.`,
//! then either a numeric component or a literal `*`:
//!
//! ```text
//! ""        valid (absent)
//! "3"       valid
//! "1.2"     valid
//! "1.2.3"   valid
//! "1.*"     valid
//! "v1.2"    invalid
//! "1.2.3.4" invalid
//! ```

use std::sync::LazyLock;

use regex::Regex;

/// ASCII digits only; `\d` would also admit other Unicode decimal digits.
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9]+\.)?(?:[0-9]+\.)?(?:\*|[0-9]+)$").expect("version pattern compiles")
});

/// Whether `value` is an acceptable optional version.
///
/// Absent and empty values are valid. Callers raise their own domain error
/// when this returns `false`.
pub fn is_valid_optional_version(value: Option<&str>) -> bool {
    match value {
        None | Some("") => true,
        Some(v) => VERSION_PATTERN.is_match(v),
    }
}

//! Fuzz target for resource export parsing.
//!
//! Goal: The loader should **never panic** on any input.
//! It may return errors, but panics are unacceptable.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_resource_loader
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = guardrails_sources::fuzz::parse_resource_export(text);
    }
});

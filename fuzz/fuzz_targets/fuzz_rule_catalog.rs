//! Fuzz target for rule catalog and exemption list parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_rule_catalog
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Catalogs and exemption lists are TOML, so only UTF-8 is interesting.
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = guardrails_sources::fuzz::parse_rule_catalog(text);
        let _ = guardrails_sources::fuzz::parse_exemption_list(text);
    }
});

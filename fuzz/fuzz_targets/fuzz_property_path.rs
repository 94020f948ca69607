//! Fuzz target for property path parsing.
//!
//! Builds dotted paths out of structured segments so the fuzzer spends its time on
//! segment shapes (`name`, `name[3]`, `[*]`) instead of random bytes.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_property_path
//! ```

#![no_main]

use arbitrary::Arbitrary;
use guardrails_types::PropertyPath;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Segment {
    Name(String),
    Indexed(String, u16),
    Wildcard,
    Raw(String),
}

fuzz_target!(|segments: Vec<Segment>| {
    let raw = segments
        .iter()
        .map(|s| match s {
            Segment::Name(n) => n.clone(),
            Segment::Indexed(n, i) => format!("{n}[{i}]"),
            Segment::Wildcard => "[*]".to_string(),
            Segment::Raw(r) => r.clone(),
        })
        .collect::<Vec<_>>()
        .join(".");

    if let Ok(path) = PropertyPath::new(&raw) {
        for seg in path.segments() {
            assert!(!seg.is_empty(), "accepted path {raw:?} has an empty segment");
            let _ = PropertyPath::parse_segment(seg);
        }
    }
});

//! Pure guardrail evaluation (no IO).
//!
//! Input: canonical resources, a validated rule catalog and an exemption set, all
//! constructed elsewhere.
//! Output: ordered verdicts and the aggregated compliance report.

#![forbid(unsafe_code)]

pub mod catalog;
pub mod condition;
pub mod error;
pub mod exemption;
pub mod model;
pub mod policy;
pub mod report;

mod engine;
mod fingerprint;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use engine::{evaluate, CancelToken, Evaluation, Verdict};
pub use error::GuardrailError;
pub use fingerprint::fingerprint_for_verdict;

//! Command handlers for the graftc CLI.

mod apply;
mod explain;

pub use apply::{apply_bundle, apply_file, parse_apply_options, ApplyOptions, ApplyOutcome};
pub use explain::{explain, explain_error};

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;

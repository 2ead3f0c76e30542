//! Graft command-line driver.
//!
//! Loads a JSON bundle of classes and overlay declarations, runs one merge
//! session over every class in parallel, and writes the transformed classes
//! back out as JSON.
//!
//! ```text
//! bundle.json ──► Bundle ──► MergeSession ──► par_iter(process_class)
//!                                                  │
//!                       out.json ◄── classes ◄─────┤
//!                       stderr   ◄── diagnostics ◄─┘
//! ```

pub mod bundle;
pub mod commands;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call more than once. Nothing is installed unless `RUST_LOG` is
/// set, e.g. `RUST_LOG=graft_mixin=debug`. Setting `GRAFT_LOG_TREE` swaps the
/// flat formatter for an indented span tree.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }

        let filter = EnvFilter::from_default_env();
        if std::env::var_os("GRAFT_LOG_TREE").is_some() {
            tracing_subscriber::registry()
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}

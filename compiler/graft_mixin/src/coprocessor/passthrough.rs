//! Hand-written classes nested in overlays.
//!
//! They belong to the overlay, not to any target, and are loaded as they
//! are: no overlay is ever merged into them.

use graft_ir::ClassNode;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use super::{Coprocessor, CoprocessorResult};
use crate::OverlayDecl;

#[derive(Debug, Default)]
pub struct PassthroughCoprocessor {
    classes: RwLock<FxHashSet<String>>,
}

impl PassthroughCoprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, class: &str) -> bool {
        self.classes.read().contains(class)
    }
}

impl Coprocessor for PassthroughCoprocessor {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn on_prepare(&self, overlay: &OverlayDecl) {
        let mut classes = self.classes.write();
        for inner in overlay.inner_classes() {
            tracing::trace!(overlay = overlay.name(), inner, "registered nested class");
            classes.insert(inner.to_owned());
        }
    }

    fn pre_process(&self, class: &str, _tree: &mut ClassNode) -> CoprocessorResult {
        if self.is_registered(class) {
            CoprocessorResult::PassthroughNone
        } else {
            CoprocessorResult::None
        }
    }
}

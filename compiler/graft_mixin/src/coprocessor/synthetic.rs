//! Compiler-generated classes nested in overlays.
//!
//! Once an overlay's code lives in its target, the synthetic classes it uses
//! (switch maps, anonymous classes) are reached from another package member
//! than the one that declared them. This pass makes them, and their
//! constructors, public.

use graft_ir::{ClassNode, Visibility};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use super::{Coprocessor, CoprocessorResult};
use crate::OverlayDecl;

#[derive(Debug, Default)]
pub struct SyntheticInnerCoprocessor {
    classes: RwLock<FxHashSet<String>>,
}

impl SyntheticInnerCoprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, class: &str) -> bool {
        self.classes.read().contains(class)
    }
}

impl Coprocessor for SyntheticInnerCoprocessor {
    fn name(&self) -> &'static str {
        "synthetic-inner"
    }

    fn on_init(&self, overlay: &OverlayDecl) {
        let mut classes = self.classes.write();
        for inner in overlay.synthetic_inner_classes() {
            tracing::trace!(overlay = overlay.name(), inner, "registered synthetic class");
            classes.insert(inner.to_owned());
        }
    }

    fn pre_process(&self, class: &str, tree: &mut ClassNode) -> CoprocessorResult {
        if !self.is_registered(class) {
            return CoprocessorResult::None;
        }

        let before = tree.access;
        tree.access = tree.access.widened_to(Visibility::Public);
        let mut transformed = tree.access != before;

        for ctor in tree.methods.iter_mut().filter(|m| m.name == graft_ir::CONSTRUCTOR) {
            let widened = ctor.access.widened_to(Visibility::Public);
            if widened != ctor.access {
                ctor.access = widened;
                transformed = true;
            }
        }

        // The class's own entry in its inner class table carries access too
        for inner in tree.inner_classes.iter_mut().filter(|i| i.name == class) {
            let widened = inner.access.widened_to(Visibility::Public);
            if widened != inner.access {
                inner.access = widened;
                transformed = true;
            }
        }

        CoprocessorResult::new(transformed, true)
    }
}

//! Coprocessor chain.
//!
//! Passes that run on every class the session sees, merge target or not.
//! Before the merge the chain decides routing (`CoprocessorResult`); after it
//! the chain finishes structural rewrites the merge leaves behind.
//!
//! Passes must commute: each only touches members in its own scope, and a
//! visibility change only ever widens.

mod accessor;
mod passthrough;
mod synthetic;

use std::fmt;
use std::ops::BitOr;

use graft_ir::ClassNode;

pub use accessor::AccessorCoprocessor;
pub use passthrough::PassthroughCoprocessor;
pub use synthetic::SyntheticInnerCoprocessor;

use crate::{MixinConfig, OverlayDecl};

/// Outcome of a pre pass: bytes changed × skip the merge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CoprocessorResult {
    #[default]
    None,
    Transformed,
    PassthroughNone,
    PassthroughTransformed,
}

impl CoprocessorResult {
    pub fn new(transformed: bool, passthrough: bool) -> Self {
        match (transformed, passthrough) {
            (false, false) => CoprocessorResult::None,
            (true, false) => CoprocessorResult::Transformed,
            (false, true) => CoprocessorResult::PassthroughNone,
            (true, true) => CoprocessorResult::PassthroughTransformed,
        }
    }

    pub fn is_transformed(self) -> bool {
        matches!(
            self,
            CoprocessorResult::Transformed | CoprocessorResult::PassthroughTransformed
        )
    }

    pub fn is_passthrough(self) -> bool {
        matches!(
            self,
            CoprocessorResult::PassthroughNone | CoprocessorResult::PassthroughTransformed
        )
    }

    /// Passthrough if either is, transformed if either is.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        CoprocessorResult::new(
            self.is_transformed() || other.is_transformed(),
            self.is_passthrough() || other.is_passthrough(),
        )
    }
}

impl BitOr for CoprocessorResult {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.combine(rhs)
    }
}

impl fmt::Display for CoprocessorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoprocessorResult::None => write!(f, "none"),
            CoprocessorResult::Transformed => write!(f, "transformed"),
            CoprocessorResult::PassthroughNone => write!(f, "passthrough"),
            CoprocessorResult::PassthroughTransformed => write!(f, "passthrough (transformed)"),
        }
    }
}

/// One pass of the chain.
///
/// Lifecycle hooks run once per overlay: `on_prepare` when it is discovered,
/// `on_init` when the declaration set is finalised. Passes keep their own
/// registries and must be safe to call from several threads.
pub trait Coprocessor: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_prepare(&self, _overlay: &OverlayDecl) {}

    fn on_init(&self, _overlay: &OverlayDecl) {}

    fn pre_process(&self, _class: &str, _tree: &mut ClassNode) -> CoprocessorResult {
        CoprocessorResult::None
    }

    /// Returns whether the tree changed.
    fn post_process(&self, _class: &str, _tree: &mut ClassNode) -> bool {
        false
    }
}

/// Ordered list of passes.
#[derive(Default)]
pub struct CoprocessorChain {
    passes: Vec<Box<dyn Coprocessor>>,
}

impl CoprocessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard passes, in order, minus any the config turns off.
    pub fn with_defaults(config: &MixinConfig) -> Self {
        let mut chain = CoprocessorChain::new().with(PassthroughCoprocessor::new());
        if config.widen_synthetic_inner {
            chain = chain.with(SyntheticInnerCoprocessor::new());
        }
        if config.synthesize_accessors {
            chain = chain.with(AccessorCoprocessor::new());
        }
        chain
    }

    #[must_use]
    pub fn with(mut self, pass: impl Coprocessor + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn on_prepare(&self, overlay: &OverlayDecl) {
        for pass in &self.passes {
            pass.on_prepare(overlay);
        }
    }

    pub fn on_init(&self, overlay: &OverlayDecl) {
        for pass in &self.passes {
            pass.on_init(overlay);
        }
    }

    /// Run every pass and combine their results.
    ///
    /// Every pass runs even after one has asked for passthrough.
    #[tracing::instrument(level = "debug", skip(self, tree))]
    pub fn pre_process(&self, class: &str, tree: &mut ClassNode) -> CoprocessorResult {
        self.passes.iter().fold(CoprocessorResult::None, |acc, pass| {
            let result = pass.pre_process(class, tree);
            if result != CoprocessorResult::None {
                tracing::trace!(pass = pass.name(), %result, "pre pass");
            }
            acc | result
        })
    }

    #[tracing::instrument(level = "debug", skip(self, tree))]
    pub fn post_process(&self, class: &str, tree: &mut ClassNode) -> bool {
        let mut transformed = false;
        for pass in &self.passes {
            if pass.post_process(class, tree) {
                tracing::trace!(pass = pass.name(), "post pass transformed");
                transformed = true;
            }
        }
        transformed
    }
}

impl fmt::Debug for CoprocessorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

//! Graft mixin engine.
//!
//! Merges overlay classes into target classes.
//!
//! # Architecture
//!
//! ```text
//! MergeSession
//!   ├── CoprocessorChain      pre pass (routing), post pass (stub bodies)
//!   ├── OverlayIndex          declarations by target, discovery order
//!   ├── preprocess()          OverlayDecl + target → OverlayDefinition
//!   │     ├── ClassModel          target shape, interface method sets
//!   │     └── IdentifierRegistry  collision-free synthesized names
//!   └── TargetContext         ordered, transactional graft onto one tree
//! ```
//!
//! # Error Handling
//!
//! Errors are contained to the smallest unit they affect:
//! - an invalid overlay is skipped for that target
//! - a merge conflict rolls back that target
//! - identifier exhaustion stops the session
//!
//! Warnings and errors are also reported to the session's `DiagnosticSink`.

mod config;
mod coprocessor;
mod error;
mod overlay;
mod preprocess;
mod remap;
mod session;
mod target;
pub mod uid;

pub use config::{MixinConfig, DEFAULT_PRIORITY};
pub use coprocessor::{
    AccessorCoprocessor, Coprocessor, CoprocessorChain, CoprocessorResult, PassthroughCoprocessor,
    SyntheticInnerCoprocessor,
};
pub use error::{
    IdentifierExhaustionError, InvalidOverlayError, MergeConflictError, OverlayError, SessionError,
};
pub use overlay::{
    HookHandle, InterfaceBinding, MemberKind, MemberTag, OverlayDecl, OverlayDefinition,
    OverlayHooks, PlannedField, PlannedMethod, RenameOp,
};
pub use preprocess::{preprocess, PreprocessContext, PreprocessPolicy, SHADOW_PREFIX};
pub use session::{
    ClassReport, MergeSession, OverlayFailure, OverlayIndex, RegisteredOverlay, TransformResult,
};
pub use target::{MergeOutcome, TargetContext, TargetHandle, TargetMethod};
pub use uid::{IdentifierRegistry, SharedRegistry};

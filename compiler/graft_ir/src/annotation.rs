//! Overlay member annotations.
//!
//! Overlay classes tag their members to say how each one is merged. The tags
//! are a closed set checked at compile time rather than free-form strings.

use serde::{Deserialize, Serialize};

/// Kind of injector a handler method belongs to.
///
/// The kind decides the prefix of the handler's synthesized name.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum InjectorKind {
    Inject,
    Redirect,
    ModifyArg,
    ModifyArgs,
    ModifyVariable,
    ModifyConstant,
}

impl InjectorKind {
    /// Prefix used when synthesizing handler names.
    pub fn prefix(self) -> &'static str {
        match self {
            InjectorKind::Inject => "handler",
            InjectorKind::Redirect => "redirect",
            InjectorKind::ModifyArg => "modify",
            InjectorKind::ModifyArgs => "args",
            InjectorKind::ModifyVariable => "localvar",
            InjectorKind::ModifyConstant => "constant",
        }
    }
}

/// A tag attached to an overlay field or method.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum MemberAnnotation {
    /// Refers to a member that already exists in the target.
    Shadow,
    /// Replaces the body of an existing target method.
    Overwrite,
    /// Must never clash with a target member; renamed on conflict.
    Unique,
    /// Handler method relocated into the target under a synthesized name.
    Injector(InjectorKind),
    /// Already renamed for `target` by an earlier preprocessing pass.
    Renamed {
        target: String,
        original: String,
        name: String,
    },
    /// Accessor stub for a target field.
    Accessor { field: String },
    /// Invoker stub for a target method.
    Invoker { method: String },
    /// Placed on target members grafted from an overlay.
    Merged { overlay: String, priority: i32 },
}

impl MemberAnnotation {
    pub fn injector_kind(&self) -> Option<InjectorKind> {
        match self {
            MemberAnnotation::Injector(kind) => Some(*kind),
            _ => None,
        }
    }
}

//! Overlay declarations and validated definitions.
//!
//! An `OverlayDecl` is what the declaration loader hands the session: the
//! overlay class tree plus its targets and priority. Preprocessing turns one
//! declaration and one target into an `OverlayDefinition`, a merge plan that
//! the target context applies without looking back at the declaration.

use std::fmt;
use std::sync::Arc;

use graft_ir::{ClassNode, FieldNode, MemberAnnotation, MemberSignature, MethodNode};
use serde::{Deserialize, Serialize};

use crate::PreprocessPolicy;

/// Field or method.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => write!(f, "field"),
            MemberKind::Method => write!(f, "method"),
        }
    }
}

/// A soft-implemented interface: overlay methods named `{prefix}{name}`
/// implement `name` of `interface` in the target.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceBinding {
    pub interface: String,
    pub prefix: String,
}

impl InterfaceBinding {
    pub fn new(interface: impl Into<String>, prefix: impl Into<String>) -> Self {
        InterfaceBinding {
            interface: interface.into(),
            prefix: prefix.into(),
        }
    }

    /// `name` without this binding's prefix, when it carries it.
    pub fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.prefix.as_str())
            .filter(|rest| !rest.is_empty())
    }
}

/// Callbacks run around one overlay's graft.
///
/// Both hooks see the target tree as it stands at that moment. They observe
/// only; the merge does not consult them for control flow.
pub trait OverlayHooks: Send + Sync {
    fn pre_merge(&self, _target: &ClassNode, _overlay: &OverlayDefinition) {}

    fn post_merge(&self, _target: &ClassNode, _overlay: &OverlayDefinition) {}
}

/// Shared handle to an overlay's hooks.
#[derive(Clone)]
pub struct HookHandle(Arc<dyn OverlayHooks>);

impl HookHandle {
    pub fn new(hooks: impl OverlayHooks + 'static) -> Self {
        HookHandle(Arc::new(hooks))
    }
}

impl std::ops::Deref for HookHandle {
    type Target = dyn OverlayHooks;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HookHandle(..)")
    }
}

/// An overlay as declared, before validation against any target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverlayDecl {
    pub class: ClassNode,
    pub targets: Vec<String>,
    /// Lower applies first. `None` takes the configured default.
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub bindings: Vec<InterfaceBinding>,
    #[serde(skip)]
    pub hooks: Option<HookHandle>,
}

impl OverlayDecl {
    pub fn new(class: ClassNode) -> Self {
        OverlayDecl {
            class,
            targets: Vec::new(),
            priority: None,
            bindings: Vec::new(),
            hooks: None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_binding(mut self, binding: InterfaceBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: impl OverlayHooks + 'static) -> Self {
        self.hooks = Some(HookHandle::new(hooks));
        self
    }

    pub fn name(&self) -> &str {
        &self.class.name
    }

    pub fn targets_class(&self, class: &str) -> bool {
        self.targets.iter().any(|t| t == class)
    }

    pub fn is_interface(&self) -> bool {
        self.class.is_interface()
    }

    /// Interface overlay made of accessor and invoker stubs.
    pub fn is_accessor(&self) -> bool {
        self.is_interface()
            && self.class.methods.iter().any(|m| {
                m.annotations.iter().any(|a| {
                    matches!(
                        a,
                        MemberAnnotation::Accessor { .. } | MemberAnnotation::Invoker { .. }
                    )
                })
            })
    }

    /// Names of classes nested in this overlay, split by the synthetic flag.
    fn nested(&self, synthetic: bool) -> impl Iterator<Item = &str> + '_ {
        let prefix = format!("{}$", self.class.name);
        self.class
            .inner_classes
            .iter()
            .filter(move |inner| {
                inner.name.starts_with(&prefix) && inner.access.is_synthetic() == synthetic
            })
            .map(|inner| inner.name.as_str())
    }

    /// Nested classes the compiler generated (switch maps, lambdas, ...).
    pub fn synthetic_inner_classes(&self) -> impl Iterator<Item = &str> + '_ {
        self.nested(true)
    }

    /// Nested classes written by hand.
    pub fn inner_classes(&self) -> impl Iterator<Item = &str> + '_ {
        self.nested(false)
    }
}

/// How a planned member is merged.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberTag {
    /// Alias for an existing target member; contributes no code.
    Shadow,
    /// Appended under its declared name.
    New,
    /// Replaces the body of an existing target method.
    Overwrite,
    /// Appended under a synthesized name.
    Renamed,
    /// Appended under its declared name, checked not to clash.
    Unique,
}

impl MemberTag {
    /// Whether the member adds a new declaration to the target.
    pub fn is_added(self) -> bool {
        matches!(self, MemberTag::New | MemberTag::Renamed | MemberTag::Unique)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedField {
    pub tag: MemberTag,
    /// Signature as declared in the overlay.
    pub source: MemberSignature,
    /// Field as it will appear in the target.
    pub node: FieldNode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedMethod {
    pub tag: MemberTag,
    /// Signature as declared in the overlay.
    pub source: MemberSignature,
    /// Method as it will appear in the target, references already redirected.
    pub node: MethodNode,
}

impl PlannedMethod {
    pub fn signature(&self) -> MemberSignature {
        self.node.signature()
    }
}

/// A rename resolved during preprocessing.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RenameOp {
    pub kind: MemberKind,
    /// Overlay-side signature.
    pub from: MemberSignature,
    /// Name in the target.
    pub to: String,
}

/// One overlay validated against one target.
///
/// Immutable once built. Retained by the session after the merge for
/// diagnostics.
#[derive(Clone, Debug)]
pub struct OverlayDefinition {
    pub name: String,
    pub target: String,
    pub priority: i32,
    /// Discovery order; breaks priority ties.
    pub order: usize,
    pub policy: PreprocessPolicy,
    /// Interfaces the target gains.
    pub interfaces: Vec<String>,
    pub fields: Vec<PlannedField>,
    pub methods: Vec<PlannedMethod>,
    pub renames: Vec<RenameOp>,
    pub hooks: Option<HookHandle>,
}

impl OverlayDefinition {
    /// Final target name for an overlay member, if it was renamed.
    pub fn renamed(&self, kind: MemberKind, from: &MemberSignature) -> Option<&str> {
        self.renames
            .iter()
            .find(|op| op.kind == kind && op.from == *from)
            .map(|op| op.to.as_str())
    }

    pub fn method(&self, source: &MemberSignature) -> Option<&PlannedMethod> {
        self.methods.iter().find(|m| m.source == *source)
    }

    pub fn field(&self, source: &MemberSignature) -> Option<&PlannedField> {
        self.fields.iter().find(|f| f.source == *source)
    }
}

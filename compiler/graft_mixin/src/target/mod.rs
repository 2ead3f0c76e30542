//! Target merge context.
//!
//! Owns one target tree for the duration of one merge. Validated overlays are
//! queued with [`TargetContext::add`] and grafted by [`TargetContext::apply`],
//! lowest priority first, ties in discovery order.
//!
//! The merge is all or nothing per target: a [`MergeConflictError`] restores
//! the tree to what it was before the first overlay was applied.

use graft_diagnostic::{Diagnostic, DiagnosticSink, ErrorCode};
use graft_ir::{descriptor, Access, ClassNode, MemberAnnotation, MemberSignature};
use rustc_hash::FxHashMap;

use crate::{MemberKind, MemberTag, MergeConflictError, OverlayDefinition, PlannedField, PlannedMethod};

/// Identity of one target method within one merge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetHandle(usize);

impl TargetHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Bookkeeping for a target method touched by the merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetMethod {
    pub handle: TargetHandle,
    pub signature: MemberSignature,
    /// Overlays that added, replaced or aliased the method, in merge order.
    pub touched_by: Vec<String>,
}

/// Result of a successful merge.
#[derive(Debug)]
pub struct MergeOutcome {
    /// Definitions in the order they were applied.
    pub applied: Vec<OverlayDefinition>,
    /// Every target method touched, in handle order.
    pub targets: Vec<TargetMethod>,
    /// Whether the tree differs from before the merge.
    pub modified: bool,
}

/// Per-target merge state. Never shared across threads.
pub struct TargetContext<'a> {
    tree: &'a mut ClassNode,
    pending: Vec<OverlayDefinition>,
    handles: FxHashMap<MemberSignature, TargetHandle>,
    methods: Vec<TargetMethod>,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> TargetContext<'a> {
    pub fn new(tree: &'a mut ClassNode, sink: &'a dyn DiagnosticSink) -> Self {
        TargetContext {
            tree,
            pending: Vec::new(),
            handles: FxHashMap::default(),
            methods: Vec::new(),
            sink,
        }
    }

    /// Queue a validated overlay.
    pub fn add(&mut self, definition: OverlayDefinition) {
        debug_assert_eq!(definition.target, self.tree.name);
        self.pending.push(definition);
    }

    /// Handle for a target method, issued once per signature.
    pub fn target_method(&mut self, sig: &MemberSignature) -> TargetHandle {
        if let Some(&handle) = self.handles.get(sig) {
            return handle;
        }
        let handle = TargetHandle(self.methods.len());
        self.methods.push(TargetMethod {
            handle,
            signature: sig.clone(),
            touched_by: Vec::new(),
        });
        self.handles.insert(sig.clone(), handle);
        handle
    }

    pub fn method(&self, handle: TargetHandle) -> Option<&TargetMethod> {
        self.methods.get(handle.0)
    }

    /// Apply every queued overlay.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(target = %self.tree.name, overlays = self.pending.len())
    )]
    pub fn apply(mut self) -> Result<MergeOutcome, MergeConflictError> {
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by_key(|def| (def.priority, def.order));

        let snapshot = ClassNode::clone(self.tree);
        let mut applied = Vec::with_capacity(pending.len());
        for def in pending {
            if let Err(conflict) = self.apply_overlay(&def) {
                tracing::debug!(overlay = %def.name, "merge conflict, restoring target");
                *self.tree = snapshot;
                return Err(conflict);
            }
            applied.push(def);
        }

        let modified = *self.tree != snapshot;
        Ok(MergeOutcome {
            applied,
            targets: self.methods,
            modified,
        })
    }

    fn apply_overlay(&mut self, def: &OverlayDefinition) -> Result<(), MergeConflictError> {
        tracing::debug!(overlay = %def.name, priority = def.priority, "applying overlay");
        if let Some(hooks) = &def.hooks {
            hooks.pre_merge(self.tree, def);
        }

        for interface in &def.interfaces {
            if self.tree.add_interface(interface) {
                tracing::trace!(interface, "interface added");
            }
        }

        for field in def.fields.iter().filter(|f| f.tag != MemberTag::Shadow) {
            self.merge_field(def, field)?;
        }

        for method in &def.methods {
            match method.tag {
                MemberTag::Shadow => self.touch(&method.signature(), &def.name),
                MemberTag::Overwrite => self.overwrite_method(def, method),
                MemberTag::New | MemberTag::Renamed | MemberTag::Unique => {
                    self.merge_method(def, method)?;
                }
            }
        }

        if let Some(hooks) = &def.hooks {
            hooks.post_merge(self.tree, def);
        }
        Ok(())
    }

    fn touch(&mut self, sig: &MemberSignature, overlay: &str) {
        let handle = self.target_method(sig);
        self.methods[handle.0].touched_by.push(overlay.to_owned());
    }

    fn warn(&self, code: ErrorCode, def: &OverlayDefinition, member: &MemberSignature, message: String) {
        self.sink.report(
            Diagnostic::warning(code)
                .with_message(message)
                .with_class(self.tree.name.clone())
                .with_overlay(def.name.clone())
                .with_member(member),
        );
    }

    fn merge_field(&mut self, def: &OverlayDefinition, planned: &PlannedField) -> Result<(), MergeConflictError> {
        let mut node = planned.node.clone();
        node.annotations = grafted_annotations(&node.annotations, def);

        let Some(existing) = self.tree.field_named(&node.name) else {
            tracing::trace!(field = %node.signature(), "field added");
            self.tree.fields.push(node);
            return Ok(());
        };

        let first = merged_by(&existing.annotations).map(str::to_owned);
        if existing.desc != node.desc {
            return Err(MergeConflictError {
                target: self.tree.name.clone(),
                kind: MemberKind::Field,
                name: node.name,
                first: first.unwrap_or_else(|| self.tree.name.clone()),
                first_desc: existing.desc.clone(),
                second: def.name.clone(),
                second_desc: planned.node.desc.clone(),
            });
        }
        if let Some(first) = first.filter(|first| *first != def.name) {
            self.warn(
                ErrorCode::W2002,
                def,
                &node.signature(),
                format!("field `{}` was already added by `{first}`; keeping the first", node.name),
            );
        }
        Ok(())
    }

    fn merge_method(&mut self, def: &OverlayDefinition, planned: &PlannedMethod) -> Result<(), MergeConflictError> {
        let mut node = planned.node.clone();
        node.annotations = grafted_annotations(&node.annotations, def);
        if is_stub(&node.annotations) {
            node.access.remove(Access::ABSTRACT);
        }
        let sig = node.signature();

        if let Some(index) = self.position(&sig) {
            match merged_by(&self.tree.methods[index].annotations) {
                Some(first) if first != def.name => {
                    let message = format!("method `{sig}` was already added by `{first}`; `{}` replaces it", def.name);
                    self.warn(ErrorCode::W2001, def, &sig, message);
                }
                Some(_) => {}
                None => tracing::warn!(method = %sig, "target already declares method, replacing"),
            }
            self.tree.methods[index] = node;
        } else {
            let rival = self
                .tree
                .methods_named(&sig.name)
                .filter(|m| differs_only_in_return(&m.desc, &sig.desc))
                .find_map(|m| {
                    merged_by(&m.annotations)
                        .filter(|overlay| *overlay != def.name)
                        .map(|overlay| (overlay.to_owned(), m.desc.clone()))
                });
            if let Some((first, first_desc)) = rival {
                return Err(MergeConflictError {
                    target: self.tree.name.clone(),
                    kind: MemberKind::Method,
                    name: sig.name,
                    first,
                    first_desc,
                    second: def.name.clone(),
                    second_desc: sig.desc,
                });
            }
            tracing::trace!(method = %sig, "method added");
            self.tree.methods.push(node);
        }

        self.touch(&sig, &def.name);
        Ok(())
    }

    /// Replace a target method's body, keeping its descriptor and access.
    fn overwrite_method(&mut self, def: &OverlayDefinition, planned: &PlannedMethod) {
        let sig = planned.signature();
        let Some(index) = self.position(&sig) else {
            tracing::warn!(method = %sig, "overwrite target vanished before merge, skipping");
            return;
        };
        let existing = &mut self.tree.methods[index];
        existing.body.clone_from(&planned.node.body);
        existing
            .annotations
            .retain(|a| !matches!(a, MemberAnnotation::Merged { .. }));
        existing.annotations.push(MemberAnnotation::Merged {
            overlay: def.name.clone(),
            priority: def.priority,
        });
        tracing::trace!(method = %sig, "method overwritten");
        self.touch(&sig, &def.name);
    }

    fn position(&self, sig: &MemberSignature) -> Option<usize> {
        self.tree
            .methods
            .iter()
            .position(|m| m.name == sig.name && m.desc == sig.desc)
    }
}

/// Overlay that grafted a member, from its `Merged` tag.
fn merged_by(annotations: &[MemberAnnotation]) -> Option<&str> {
    annotations.iter().find_map(|a| match a {
        MemberAnnotation::Merged { overlay, .. } => Some(overlay.as_str()),
        _ => None,
    })
}

/// Same parameter list, different return type. Other overloads coexist.
fn differs_only_in_return(a: &str, b: &str) -> bool {
    match (descriptor::split_method(a), descriptor::split_method(b)) {
        (Some((a_params, a_ret)), Some((b_params, b_ret))) => a_params == b_params && a_ret != b_ret,
        _ => false,
    }
}

fn is_stub(annotations: &[MemberAnnotation]) -> bool {
    annotations.iter().any(|a| {
        matches!(
            a,
            MemberAnnotation::Accessor { .. } | MemberAnnotation::Invoker { .. }
        )
    })
}

/// Overlay tags dropped, origin recorded. Stub tags stay for the accessor pass.
fn grafted_annotations(annotations: &[MemberAnnotation], def: &OverlayDefinition) -> Vec<MemberAnnotation> {
    annotations
        .iter()
        .filter(|a| {
            matches!(
                a,
                MemberAnnotation::Accessor { .. } | MemberAnnotation::Invoker { .. }
            )
        })
        .cloned()
        .chain(std::iter::once(MemberAnnotation::Merged {
            overlay: def.name.clone(),
            priority: def.priority,
        }))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;

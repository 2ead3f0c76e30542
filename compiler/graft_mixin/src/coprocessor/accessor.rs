//! Accessor and invoker bodies.
//!
//! Accessor overlays declare abstract stubs tagged `Accessor { field }` or
//! `Invoker { method }`. The merge grafts the stubs into the target; the post
//! pass here writes their bodies against the target's real members and drops
//! the tag. An accessor overlay loaded as a class in its own right is passed
//! through, with its static stubs made to throw.

use graft_ir::{
    descriptor, ClassNode, FieldOp, Insn, InvokeKind, MemberAnnotation, MemberRef, MethodNode,
};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use super::{Coprocessor, CoprocessorResult};
use crate::OverlayDecl;

const UNSUPPORTED: &str = "java/lang/UnsupportedOperationException";

#[derive(Debug, Default)]
pub struct AccessorCoprocessor {
    overlays: RwLock<FxHashSet<String>>,
}

impl AccessorCoprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, class: &str) -> bool {
        self.overlays.read().contains(class)
    }
}

impl Coprocessor for AccessorCoprocessor {
    fn name(&self) -> &'static str {
        "accessor"
    }

    fn on_prepare(&self, overlay: &OverlayDecl) {
        if overlay.is_accessor() {
            self.overlays.write().insert(overlay.name().to_owned());
        }
    }

    fn pre_process(&self, class: &str, tree: &mut ClassNode) -> CoprocessorResult {
        if !self.is_registered(class) {
            return CoprocessorResult::None;
        }

        let mut transformed = false;
        for method in tree
            .methods
            .iter_mut()
            .filter(|m| m.access.is_static() && stub_target(m).is_some() && m.body.is_empty())
        {
            method.body = throwing_body(class, &method.name);
            transformed = true;
        }
        CoprocessorResult::new(transformed, true)
    }

    fn post_process(&self, class: &str, tree: &mut ClassNode) -> bool {
        let mut bodies = Vec::new();
        for (index, method) in tree.methods.iter().enumerate() {
            let Some(target) = stub_target(method) else {
                continue;
            };
            match synthesize(tree, method, target) {
                Some(body) => bodies.push((index, body)),
                None => tracing::warn!(
                    class,
                    method = %method.signature(),
                    "stub target not found in class, left unimplemented"
                ),
            }
        }

        let transformed = !bodies.is_empty();
        for (index, body) in bodies {
            let method = &mut tree.methods[index];
            tracing::trace!(class, method = %method.signature(), "stub body synthesized");
            method.body = body;
            method.annotations.retain(|a| stub_target_of(a).is_none());
        }
        transformed
    }
}

/// What a stub reaches into.
#[derive(Clone, Copy)]
enum StubTarget<'a> {
    Field(&'a str),
    Method(&'a str),
}

fn stub_target_of(annotation: &MemberAnnotation) -> Option<StubTarget<'_>> {
    match annotation {
        MemberAnnotation::Accessor { field } => Some(StubTarget::Field(field)),
        MemberAnnotation::Invoker { method } => Some(StubTarget::Method(method)),
        _ => None,
    }
}

fn stub_target(method: &MethodNode) -> Option<StubTarget<'_>> {
    method.annotations.iter().find_map(stub_target_of)
}

fn throwing_body(class: &str, method: &str) -> Vec<Insn> {
    vec![
        Insn::New(UNSUPPORTED.to_owned()),
        Insn::Dup,
        Insn::Ldc(format!("{class}.{method} is only callable on a merged target")),
        Insn::Invoke {
            kind: InvokeKind::Special,
            target: MemberRef::new(
                UNSUPPORTED,
                graft_ir::CONSTRUCTOR,
                descriptor::method(&["Ljava/lang/String;"], "V"),
            ),
        },
        Insn::Throw,
    ]
}

fn return_insn(desc: &str) -> Insn {
    if desc == "V" {
        Insn::Return
    } else {
        Insn::ReturnValue(desc.to_owned())
    }
}

/// Body for one stub, or `None` when the tree lacks what it points at.
fn synthesize(tree: &ClassNode, stub: &MethodNode, target: StubTarget<'_>) -> Option<Vec<Insn>> {
    let (params, ret) = descriptor::split_method(&stub.desc)?;
    let is_static = stub.access.is_static();
    let this = Insn::Load {
        slot: 0,
        desc: format!("L{};", tree.name),
    };
    let mut body = Vec::new();

    match target {
        StubTarget::Field(name) => {
            let field = tree.field_named(name)?;
            let target = MemberRef::new(tree.name.clone(), name, field.desc.clone());
            if !is_static {
                body.push(this);
            }
            if params.is_empty() {
                let op = if is_static { FieldOp::GetStatic } else { FieldOp::Get };
                body.push(Insn::Field { op, target });
                body.push(return_insn(&field.desc));
            } else {
                body.push(Insn::Load {
                    slot: u16::from(!is_static),
                    desc: field.desc.clone(),
                });
                let op = if is_static { FieldOp::PutStatic } else { FieldOp::Put };
                body.push(Insn::Field { op, target });
                body.push(Insn::Return);
            }
        }
        StubTarget::Method(name) => {
            let method = tree.methods_named(name).find(|m| m.desc == stub.desc)?;
            let mut slot = 0;
            if !is_static {
                body.push(this);
                slot = 1;
            }
            for param in params {
                body.push(Insn::Load {
                    slot,
                    desc: param.to_owned(),
                });
                slot += descriptor::slot_size(param);
            }
            let kind = if is_static {
                InvokeKind::Static
            } else if method.access.visibility() == graft_ir::Visibility::Private {
                InvokeKind::Special
            } else {
                InvokeKind::Virtual
            };
            body.push(Insn::Invoke {
                kind,
                target: MemberRef::new(tree.name.clone(), name, stub.desc.clone()),
            });
            body.push(return_insn(ret));
        }
    }
    Some(body)
}

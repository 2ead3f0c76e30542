//! Reference redirection for grafted members.
//!
//! Overlay code refers to the overlay class and to overlay member names. Once
//! grafted, those references must point at the target and at the final
//! member names.

use graft_ir::{Insn, MemberRef, MemberSignature, MethodNode};
use rustc_hash::FxHashMap;

use crate::{MemberKind, RenameOp};

pub(crate) struct Remapper {
    overlay: String,
    target: String,
    overlay_type: String,
    target_type: String,
    fields: FxHashMap<MemberSignature, String>,
    methods: FxHashMap<MemberSignature, String>,
}

impl Remapper {
    pub(crate) fn new(overlay: &str, target: &str) -> Self {
        Remapper {
            overlay: overlay.to_owned(),
            target: target.to_owned(),
            overlay_type: format!("L{overlay};"),
            target_type: format!("L{target};"),
            fields: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }

    pub(crate) fn add(&mut self, op: &RenameOp) {
        let table = match op.kind {
            MemberKind::Field => &mut self.fields,
            MemberKind::Method => &mut self.methods,
        };
        table.insert(op.from.clone(), op.to.clone());
    }

    /// Descriptor with overlay self-references replaced by the target.
    pub(crate) fn desc(&self, desc: &str) -> String {
        desc.replace(&self.overlay_type, &self.target_type)
    }

    fn member(&self, kind: MemberKind, target: &mut MemberRef) {
        if target.owner != self.overlay {
            target.desc = self.desc(&target.desc);
            return;
        }
        let table = match kind {
            MemberKind::Field => &self.fields,
            MemberKind::Method => &self.methods,
        };
        if let Some(name) = table.get(&target.signature()) {
            target.name.clone_from(name);
        }
        target.owner.clone_from(&self.target);
        target.desc = self.desc(&target.desc);
    }

    /// Rewrite a method's descriptor and every reference in its body.
    pub(crate) fn method(&self, method: &mut MethodNode) {
        method.desc = self.desc(&method.desc);
        for insn in &mut method.body {
            match insn {
                Insn::Field { target, .. } => self.member(MemberKind::Field, target),
                Insn::Invoke { target, .. } => self.member(MemberKind::Method, target),
                Insn::Load { desc, .. } | Insn::Store { desc, .. } | Insn::ReturnValue(desc) => {
                    *desc = self.desc(desc);
                }
                Insn::New(class) => {
                    if *class == self.overlay {
                        class.clone_from(&self.target);
                    }
                }
                Insn::Push(_)
                | Insn::Ldc(_)
                | Insn::Dup
                | Insn::Return
                | Insn::Throw
                | Insn::Opaque(_) => {}
            }
        }
    }
}

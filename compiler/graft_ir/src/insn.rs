//! Method body instructions.
//!
//! Only the instruction shapes that carry member references are modelled in
//! detail; everything else is kept as an opaque opcode so bodies survive a
//! merge untouched.

use serde::{Deserialize, Serialize};

use crate::MemberSignature;

/// Symbolic reference to a member of some class.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub desc: String,
}

impl MemberRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, desc: impl Into<String>) -> Self {
        MemberRef {
            owner: owner.into(),
            name: name.into(),
            desc: desc.into(),
        }
    }

    pub fn signature(&self) -> MemberSignature {
        MemberSignature::new(self.name.clone(), self.desc.clone())
    }
}

/// Field access opcode.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum FieldOp {
    Get,
    Put,
    GetStatic,
    PutStatic,
}

impl FieldOp {
    pub fn is_static(self) -> bool {
        matches!(self, FieldOp::GetStatic | FieldOp::PutStatic)
    }
}

/// Invocation opcode.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

/// A single instruction.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Insn {
    /// Field read or write.
    Field { op: FieldOp, target: MemberRef },
    /// Method invocation.
    Invoke { kind: InvokeKind, target: MemberRef },
    /// Load a local variable slot, with the descriptor of the value loaded.
    Load { slot: u16, desc: String },
    /// Store into a local variable slot.
    Store { slot: u16, desc: String },
    /// Push an integer constant.
    Push(i64),
    /// Push a string constant.
    Ldc(String),
    /// Allocate an instance of a class.
    New(String),
    Dup,
    /// Return from a `void` method.
    Return,
    /// Return the value on top of the stack, with its descriptor.
    ReturnValue(String),
    Throw,
    /// Any other opcode, carried through verbatim.
    Opaque(u8),
}

impl Insn {
    /// The member this instruction references, if any.
    pub fn member_ref(&self) -> Option<&MemberRef> {
        match self {
            Insn::Field { target, .. } | Insn::Invoke { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Mutable access to the referenced member, if any.
    pub fn member_ref_mut(&mut self) -> Option<&mut MemberRef> {
        match self {
            Insn::Field { target, .. } | Insn::Invoke { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Class name this instruction references by type, if any.
    pub fn type_ref_mut(&mut self) -> Option<&mut String> {
        match self {
            Insn::New(class) => Some(class),
            _ => None,
        }
    }
}

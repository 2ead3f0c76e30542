//! Graft IR - editable class trees.
//!
//! This crate contains the in-memory representation that every other graft
//! phase reads and mutates:
//! - `ClassNode`, `FieldNode`, `MethodNode` for the class body
//! - `Insn` for method bodies, with symbolic member references
//! - `Access` flags and `Visibility` ordering
//! - `MemberSignature`, the unit of identity for collision detection
//! - `MemberAnnotation`, the overlay member tags
//! - `ClassCodec` for turning bytes into trees and back
//!
//! # Design Philosophy
//!
//! - **Symbolic references**: instructions refer to members by
//!   `(owner, name, descriptor)` so that renames are plain rewrites.
//! - **Exact identity**: signatures compare by exact name and descriptor;
//!   there is no overload resolution.

mod access;
mod annotation;
mod codec;
pub mod descriptor;
mod insn;
mod node;
mod signature;

pub use access::{Access, Visibility};
pub use annotation::{InjectorKind, MemberAnnotation};
pub use codec::{BincodeCodec, ClassCodec, CodecError};
pub use insn::{FieldOp, Insn, InvokeKind, MemberRef};
pub use node::{ClassNode, FieldNode, InnerClassNode, MethodNode};
pub use signature::MemberSignature;

/// Name of instance initializer methods.
pub const CONSTRUCTOR: &str = "<init>";

/// Name of the static initializer method.
pub const CLASS_INITIALIZER: &str = "<clinit>";

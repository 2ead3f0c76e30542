//! Class model.
//!
//! A read-only index over class shapes, built once per class name and shared
//! by every later phase.
//!
//! # Architecture
//!
//! ```text
//! ClassSource (collaborator: locate + parse)
//!     │
//!     ▼
//! ClassModel::describe() ──► Arc<ClassDescriptor>   (cached, compute-once)
//!     │
//!     ▼
//! ClassModel::transitive_interface_methods() ──► FxHashSet<MemberSignature>
//! ```
//!
//! Failures are `ResolutionError`s. They are cached like successes so a
//! missing class is reported once per session, not once per lookup.

mod descriptor;
mod model;
mod source;

pub use descriptor::{ClassDescriptor, FieldDescriptor, MemberOrigin, MethodDescriptor};
pub use model::ClassModel;
pub use source::{ClassSource, MapClassSource, ResolutionError, SourceError};

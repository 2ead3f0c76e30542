//! Access flags for classes and members.
//!
//! Flag values follow the class file format so that trees produced by a real
//! class parser can be stored without translation.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Access and property flags of a class, field or method.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
    pub struct Access: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        /// `ACC_SYNCHRONIZED` on methods, `ACC_SUPER` on classes.
        const SYNCHRONIZED = 0x0020;
        /// `ACC_BRIDGE` on methods, `ACC_VOLATILE` on fields.
        const BRIDGE = 0x0040;
        /// `ACC_VARARGS` on methods, `ACC_TRANSIENT` on fields.
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        /// Compiler-generated member or class.
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;

        /// Mask covering the three visibility bits.
        const VISIBILITY_MASK = Self::PUBLIC.bits() | Self::PRIVATE.bits() | Self::PROTECTED.bits();
    }
}

/// Visibility level, ordered from most to least restrictive.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Visibility {
    Private,
    Package,
    Protected,
    Public,
}

impl Visibility {
    /// The access bit that encodes this level (empty for package access).
    pub fn flag(self) -> Access {
        match self {
            Visibility::Private => Access::PRIVATE,
            Visibility::Package => Access::empty(),
            Visibility::Protected => Access::PROTECTED,
            Visibility::Public => Access::PUBLIC,
        }
    }
}

impl Access {
    /// Visibility encoded in these flags.
    ///
    /// Malformed combinations resolve to the most permissive bit present.
    pub fn visibility(self) -> Visibility {
        if self.contains(Access::PUBLIC) {
            Visibility::Public
        } else if self.contains(Access::PROTECTED) {
            Visibility::Protected
        } else if self.contains(Access::PRIVATE) {
            Visibility::Private
        } else {
            Visibility::Package
        }
    }

    /// Replace the visibility bits, keeping every other flag.
    #[must_use]
    pub fn with_visibility(self, visibility: Visibility) -> Access {
        (self - Access::VISIBILITY_MASK) | visibility.flag()
    }

    /// Raise visibility to at least `minimum`. Never lowers it.
    #[must_use]
    pub fn widened_to(self, minimum: Visibility) -> Access {
        if self.visibility() >= minimum {
            self
        } else {
            self.with_visibility(minimum)
        }
    }

    #[inline]
    pub fn is_static(self) -> bool {
        self.contains(Access::STATIC)
    }

    #[inline]
    pub fn is_synthetic(self) -> bool {
        self.contains(Access::SYNTHETIC)
    }

    #[inline]
    pub fn is_abstract(self) -> bool {
        self.contains(Access::ABSTRACT)
    }

    #[inline]
    pub fn is_interface(self) -> bool {
        self.contains(Access::INTERFACE)
    }
}

#[cfg(test)]
mod tests;

//! Member signatures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(name, descriptor)` pair identifying a field or method within a class.
///
/// Equality is exact. Two methods that differ only in return type are
/// different signatures.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct MemberSignature {
    pub name: String,
    pub desc: String,
}

impl MemberSignature {
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        MemberSignature {
            name: name.into(),
            desc: desc.into(),
        }
    }

    /// Same descriptor, different name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        MemberSignature {
            name: name.into(),
            desc: self.desc.clone(),
        }
    }

    /// Whether this is a method signature (descriptor starts with `(`).
    pub fn is_method(&self) -> bool {
        crate::descriptor::is_method(&self.desc)
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_method() {
            write!(f, "{}{}", self.name, self.desc)
        } else {
            write!(f, "{}:{}", self.name, self.desc)
        }
    }
}

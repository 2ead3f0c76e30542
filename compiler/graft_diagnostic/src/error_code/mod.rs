//! Error codes for all merge diagnostics.
//!
//! Each error code is a unique identifier (e.g., `G1001`) with the first digit
//! indicating the phase. Used for `graftc explain` lookups.

use std::fmt;

/// Error codes for all merge diagnostics.
///
/// Format: G#### where first digit indicates phase:
/// - G0xxx: Class resolution errors
/// - G1xxx: Overlay validation errors
/// - G2xxx: Merge errors
/// - G3xxx: Identifier registry errors
/// - G4xxx: Codec and driver errors
/// - W1xxx: Validation warnings
/// - W2xxx: Merge warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Resolution Errors (G0xxx)
    /// Referenced class could not be located
    G0001,
    /// Referenced class could not be parsed
    G0002,

    // Validation Errors (G1xxx)
    /// Interface overlay declares a non-public, non-synthetic method
    G1001,
    /// Interface overlay declares an instance field
    G1002,
    /// Shadow member has no counterpart in the target
    G1003,
    /// Shadow member descriptor differs from the target's
    G1004,
    /// New member collides with an existing target member
    G1005,
    /// Prefixed method does not exist in the bound interface
    G1006,
    /// Overwrite target is missing (strict mode)
    G1007,
    /// Accessor or invoker target is missing
    G1008,
    /// Accessor or invoker descriptor does not match its target
    G1009,
    /// Public unique member collides with a target member
    G1010,
    /// Overlay does not declare the class as a target
    G1011,
    /// Field tagged overwrite
    G1012,

    // Merge Errors (G2xxx)
    /// Two overlays add same-named methods with incompatible descriptors
    G2001,
    /// Two overlays add same-named fields with incompatible descriptors
    G2002,

    // Registry Errors (G3xxx)
    /// Identifier space exhausted
    G3001,

    // Codec Errors (G4xxx)
    /// Class bytes could not be parsed or written
    G4001,

    // Warnings
    /// Handler also tagged unique
    W1001,
    /// Overwrite target missing, member appended instead
    W1002,
    /// Unique member renamed to avoid a collision
    W1003,
    /// Later overlay redefines a method added by an earlier one
    W2001,
    /// Later overlay adds a field already added by an earlier one
    W2002,
}

impl ErrorCode {
    /// All codes, in declaration order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::G0001,
        ErrorCode::G0002,
        ErrorCode::G1001,
        ErrorCode::G1002,
        ErrorCode::G1003,
        ErrorCode::G1004,
        ErrorCode::G1005,
        ErrorCode::G1006,
        ErrorCode::G1007,
        ErrorCode::G1008,
        ErrorCode::G1009,
        ErrorCode::G1010,
        ErrorCode::G1011,
        ErrorCode::G1012,
        ErrorCode::G2001,
        ErrorCode::G2002,
        ErrorCode::G3001,
        ErrorCode::G4001,
        ErrorCode::W1001,
        ErrorCode::W1002,
        ErrorCode::W1003,
        ErrorCode::W2001,
        ErrorCode::W2002,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::G0001 => "G0001",
            ErrorCode::G0002 => "G0002",
            ErrorCode::G1001 => "G1001",
            ErrorCode::G1002 => "G1002",
            ErrorCode::G1003 => "G1003",
            ErrorCode::G1004 => "G1004",
            ErrorCode::G1005 => "G1005",
            ErrorCode::G1006 => "G1006",
            ErrorCode::G1007 => "G1007",
            ErrorCode::G1008 => "G1008",
            ErrorCode::G1009 => "G1009",
            ErrorCode::G1010 => "G1010",
            ErrorCode::G1011 => "G1011",
            ErrorCode::G1012 => "G1012",
            ErrorCode::G2001 => "G2001",
            ErrorCode::G2002 => "G2002",
            ErrorCode::G3001 => "G3001",
            ErrorCode::G4001 => "G4001",
            ErrorCode::W1001 => "W1001",
            ErrorCode::W1002 => "W1002",
            ErrorCode::W1003 => "W1003",
            ErrorCode::W2001 => "W2001",
            ErrorCode::W2002 => "W2002",
        }
    }

    /// One-paragraph explanation shown by `graftc explain`.
    pub fn explanation(&self) -> &'static str {
        match self {
            ErrorCode::G0001 => "A class or interface referenced by an overlay could not be found. The overlay that needed it is skipped; other overlays still apply.",
            ErrorCode::G0002 => "A referenced class was found but its bytes could not be parsed. The overlay that needed it is skipped.",
            ErrorCode::G1001 => "Interface overlays may only declare public or synthetic methods. Make the method public or move it to a class overlay.",
            ErrorCode::G1002 => "Interface overlays may only declare static fields. An instance field has no legal home in an interface target.",
            ErrorCode::G1003 => "A shadow member must name a member that already exists in the target. Check the name, or drop the shadow tag to add a new member.",
            ErrorCode::G1004 => "A shadow member exists in the target under the same name but with a different descriptor.",
            ErrorCode::G1005 => "A new member has the same signature as an existing target member. Tag it overwrite to replace the target's body, or unique to rename it.",
            ErrorCode::G1006 => "A method using an interface prefix must, after the prefix is stripped, match a method declared by that interface or one of its super-interfaces.",
            ErrorCode::G1007 => "An overwrite member names a target method that does not exist, and strict overwrite checking is enabled.",
            ErrorCode::G1008 => "An accessor or invoker names a field or method the target does not declare.",
            ErrorCode::G1009 => "An accessor or invoker descriptor does not fit the target member it names.",
            ErrorCode::G1010 => "A public unique member collides with a target member. Public members cannot be renamed safely.",
            ErrorCode::G1011 => "The overlay was applied to a class it does not declare as a target.",
            ErrorCode::G1012 => "Fields cannot be tagged overwrite; only method bodies can be replaced.",
            ErrorCode::G2001 => "Two overlays add methods with the same name and parameters but different return types to one target. Overloads with different parameters are fine. The whole target is left unmodified.",
            ErrorCode::G2002 => "Two overlays add fields with the same name and incompatible descriptors to one target. The whole target is left unmodified.",
            ErrorCode::G3001 => "The identifier registry ran out of fixed-width tokens. The session stops because uniqueness can no longer be guaranteed.",
            ErrorCode::G4001 => "Class bytes could not be parsed or serialized.",
            ErrorCode::W1001 => "A handler method is also tagged unique. Handler renaming already guarantees uniqueness, so the tag is redundant.",
            ErrorCode::W1002 => "An overwrite member names a target method that does not exist; the member was added as a new method instead.",
            ErrorCode::W1003 => "A unique member collided with a target member and was renamed.",
            ErrorCode::W2001 => "A later overlay redefined a method added by an earlier overlay. The later body wins.",
            ErrorCode::W2002 => "A later overlay added a field that an earlier overlay already added. The first declaration is kept.",
        }
    }

    pub fn is_warning(&self) -> bool {
        self.as_str().starts_with('W')
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == upper)
            .ok_or(())
    }
}

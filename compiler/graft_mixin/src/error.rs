//! Error taxonomy for the merge engine.
//!
//! - `ResolutionError` (from `graft_model`): a referenced class is missing;
//!   aborts the dependent validation step.
//! - `InvalidOverlayError`: an overlay breaks a structural rule; aborts that
//!   overlay only.
//! - `MergeConflictError`: two overlays collide on one target; aborts that
//!   target's merge and restores its tree.
//! - `IdentifierExhaustionError`: the registry ran out of tokens; fatal to
//!   the session.

use graft_diagnostic::{Diagnostic, ErrorCode};
use graft_ir::{CodecError, MemberSignature};
use graft_model::ResolutionError;

use crate::MemberKind;

/// An overlay violates a structural rule.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidOverlayError {
    #[error("interface overlay `{overlay}` declares non-public method `{member}`")]
    NonPublicInterfaceMethod {
        overlay: String,
        member: MemberSignature,
    },
    #[error("interface overlay `{overlay}` declares instance field `{member}`")]
    InstanceFieldInInterface {
        overlay: String,
        member: MemberSignature,
    },
    #[error("shadow member `{member}` of `{overlay}` not found in target `{target}`")]
    ShadowNotFound {
        overlay: String,
        target: String,
        member: MemberSignature,
    },
    #[error("shadow member `{member}` of `{overlay}` does not match `{target}`, which declares `{found}`")]
    ShadowDescriptorMismatch {
        overlay: String,
        target: String,
        member: MemberSignature,
        found: String,
    },
    #[error("member `{member}` of `{overlay}` collides with an existing member of `{target}`")]
    MemberCollision {
        overlay: String,
        target: String,
        member: MemberSignature,
    },
    #[error("method `{member}` of `{overlay}` is not declared by interface `{interface}` or its super-interfaces")]
    UnknownInterfaceMethod {
        overlay: String,
        interface: String,
        member: MemberSignature,
    },
    #[error("overwrite target `{member}` of `{overlay}` not found in `{target}`")]
    OverwriteTargetMissing {
        overlay: String,
        target: String,
        member: MemberSignature,
    },
    #[error("`{member}` of `{overlay}` refers to `{wanted}`, which `{target}` does not declare")]
    AccessorTargetMissing {
        overlay: String,
        target: String,
        member: MemberSignature,
        wanted: String,
    },
    #[error("`{member}` of `{overlay}` does not fit `{wanted}` in `{target}`: {reason}")]
    AccessorDescriptorMismatch {
        overlay: String,
        target: String,
        member: MemberSignature,
        wanted: String,
        reason: String,
    },
    #[error("public unique member `{member}` of `{overlay}` collides with a member of `{target}`")]
    PublicUniqueCollision {
        overlay: String,
        target: String,
        member: MemberSignature,
    },
    #[error("overlay `{overlay}` does not declare `{target}` as a target")]
    NotATarget { overlay: String, target: String },
    #[error("field `{member}` of `{overlay}` is tagged overwrite")]
    OverwriteField {
        overlay: String,
        member: MemberSignature,
    },
}

impl InvalidOverlayError {
    pub fn overlay(&self) -> &str {
        match self {
            InvalidOverlayError::NonPublicInterfaceMethod { overlay, .. }
            | InvalidOverlayError::InstanceFieldInInterface { overlay, .. }
            | InvalidOverlayError::ShadowNotFound { overlay, .. }
            | InvalidOverlayError::ShadowDescriptorMismatch { overlay, .. }
            | InvalidOverlayError::MemberCollision { overlay, .. }
            | InvalidOverlayError::UnknownInterfaceMethod { overlay, .. }
            | InvalidOverlayError::OverwriteTargetMissing { overlay, .. }
            | InvalidOverlayError::AccessorTargetMissing { overlay, .. }
            | InvalidOverlayError::AccessorDescriptorMismatch { overlay, .. }
            | InvalidOverlayError::PublicUniqueCollision { overlay, .. }
            | InvalidOverlayError::NotATarget { overlay, .. }
            | InvalidOverlayError::OverwriteField { overlay, .. } => overlay,
        }
    }

    pub fn member(&self) -> Option<&MemberSignature> {
        match self {
            InvalidOverlayError::NonPublicInterfaceMethod { member, .. }
            | InvalidOverlayError::InstanceFieldInInterface { member, .. }
            | InvalidOverlayError::ShadowNotFound { member, .. }
            | InvalidOverlayError::ShadowDescriptorMismatch { member, .. }
            | InvalidOverlayError::MemberCollision { member, .. }
            | InvalidOverlayError::UnknownInterfaceMethod { member, .. }
            | InvalidOverlayError::OverwriteTargetMissing { member, .. }
            | InvalidOverlayError::AccessorTargetMissing { member, .. }
            | InvalidOverlayError::AccessorDescriptorMismatch { member, .. }
            | InvalidOverlayError::PublicUniqueCollision { member, .. }
            | InvalidOverlayError::OverwriteField { member, .. } => Some(member),
            InvalidOverlayError::NotATarget { .. } => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            InvalidOverlayError::NonPublicInterfaceMethod { .. } => ErrorCode::G1001,
            InvalidOverlayError::InstanceFieldInInterface { .. } => ErrorCode::G1002,
            InvalidOverlayError::ShadowNotFound { .. } => ErrorCode::G1003,
            InvalidOverlayError::ShadowDescriptorMismatch { .. } => ErrorCode::G1004,
            InvalidOverlayError::MemberCollision { .. } => ErrorCode::G1005,
            InvalidOverlayError::UnknownInterfaceMethod { .. } => ErrorCode::G1006,
            InvalidOverlayError::OverwriteTargetMissing { .. } => ErrorCode::G1007,
            InvalidOverlayError::AccessorTargetMissing { .. } => ErrorCode::G1008,
            InvalidOverlayError::AccessorDescriptorMismatch { .. } => ErrorCode::G1009,
            InvalidOverlayError::PublicUniqueCollision { .. } => ErrorCode::G1010,
            InvalidOverlayError::NotATarget { .. } => ErrorCode::G1011,
            InvalidOverlayError::OverwriteField { .. } => ErrorCode::G1012,
        }
    }
}

/// Two overlays claim the same final name on one target with incompatible
/// descriptors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("overlays `{first}` and `{second}` both add {kind} `{name}` to `{target}` with descriptors `{first_desc}` and `{second_desc}`")]
pub struct MergeConflictError {
    pub target: String,
    pub kind: MemberKind,
    pub name: String,
    pub first: String,
    pub first_desc: String,
    pub second: String,
    pub second_desc: String,
}

impl MergeConflictError {
    pub fn code(&self) -> ErrorCode {
        match self.kind {
            MemberKind::Method => ErrorCode::G2001,
            MemberKind::Field => ErrorCode::G2002,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_class(self.target.clone())
            .with_overlay(self.second.clone())
            .with_note("the target was left unmodified")
            .with_suggestion(format!("rename the {} in one of the two overlays", self.kind))
    }
}

/// The registry cannot issue another fixed-width token.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierExhaustionError {
    #[error("class identifier space exhausted after {issued} classes")]
    Classes { issued: usize },
    #[error("member identifier space exhausted for `{key}` after {issued} names")]
    Members { key: String, issued: u32 },
}

impl IdentifierExhaustionError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(ErrorCode::G3001).with_message(self.to_string())
    }
}

/// Why one overlay could not be applied to one target.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OverlayError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Invalid(#[from] InvalidOverlayError),
    #[error(transparent)]
    Exhausted(#[from] IdentifierExhaustionError),
}

impl OverlayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            OverlayError::Resolution(err) => err.code(),
            OverlayError::Invalid(err) => err.code(),
            OverlayError::Exhausted(_) => ErrorCode::G3001,
        }
    }

    /// Diagnostic attributed to `overlay` merging into `target`.
    pub fn to_diagnostic(&self, overlay: &str, target: &str) -> Diagnostic {
        let diag = Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_class(target)
            .with_overlay(overlay);
        match self {
            OverlayError::Invalid(err) => match err.member() {
                Some(member) => diag.with_member(member),
                None => diag,
            },
            OverlayError::Resolution(err) => {
                diag.with_note(format!("`{}` is required to validate this overlay", err.class()))
            }
            OverlayError::Exhausted(_) => diag,
        }
    }
}

/// Errors that stop a session, or the byte-level entry point.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Exhausted(#[from] IdentifierExhaustionError),
    #[error("class `{class}`: {source}")]
    Codec {
        class: String,
        #[source]
        source: CodecError,
    },
}

impl SessionError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SessionError::Exhausted(err) => err.to_diagnostic(),
            SessionError::Codec { class, .. } => Diagnostic::error(ErrorCode::G4001)
                .with_message(self.to_string())
                .with_class(class.clone()),
        }
    }
}

//! Parse/serialize collaborator.
//!
//! The merge engine never touches bytes; callers hand it a `ClassNode` and
//! get one back. `ClassCodec` is the seam where a real class file reader and
//! writer plug in. `BincodeCodec` is the bundled implementation, storing the
//! tree behind a four byte magic header.

use crate::ClassNode;

/// Error from parsing or serializing a class body.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("class bytes do not start with the expected header")]
    BadMagic,
    #[error("malformed class body: {0}")]
    Malformed(String),
    #[error("failed to serialize class `{class}`: {reason}")]
    Serialize { class: String, reason: String },
}

/// Turns class bytes into an editable tree and back.
pub trait ClassCodec: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<ClassNode, CodecError>;

    fn serialize(&self, class: &ClassNode) -> Result<Vec<u8>, CodecError>;
}

/// Codec storing `ClassNode` trees with `bincode`.
#[derive(Copy, Clone, Debug, Default)]
pub struct BincodeCodec;

impl BincodeCodec {
    pub const MAGIC: [u8; 4] = *b"GRFT";
}

impl ClassCodec for BincodeCodec {
    fn parse(&self, bytes: &[u8]) -> Result<ClassNode, CodecError> {
        let body = bytes
            .strip_prefix(Self::MAGIC.as_slice())
            .ok_or(CodecError::BadMagic)?;
        bincode::deserialize(body).map_err(|e| CodecError::Malformed(e.to_string()))
    }

    fn serialize(&self, class: &ClassNode) -> Result<Vec<u8>, CodecError> {
        let body = bincode::serialize(class).map_err(|e| CodecError::Serialize {
            class: class.name.clone(),
            reason: e.to_string(),
        })?;
        let mut out = Vec::with_capacity(Self::MAGIC.len() + body.len());
        out.extend_from_slice(&Self::MAGIC);
        out.extend_from_slice(&body);
        Ok(out)
    }
}

//! Process-wide identifier registry.
//!
//! Issues short tokens used to build collision-free synthetic member names:
//! - class tokens: three lowercase letters, one per class name (`aaa`, `aab`, ...)
//! - member tokens: three lowercase hex digits, a counter per `name + descriptor`
//!
//! Tokens are valid identifier fragments in class files and stable for a key
//! unless the caller asks for the counter to advance.
//!
//! # Thread Safety
//! Class lookups take a read lock on the fast path and upgrade to a write
//! lock with a double-check on first sight, the same shape as a sharded
//! string interner. Member counters are a read-modify-write under one mutex.

use std::sync::Arc;

use graft_ir::InjectorKind;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::IdentifierExhaustionError;

/// Width of a class token in letters.
pub const CLASS_TOKEN_WIDTH: usize = 3;

/// Number of distinct class tokens (26^3).
pub const MAX_CLASSES: usize = 26 * 26 * 26;

/// Largest member counter that fits three hex digits.
pub const MAX_MEMBER_COUNTER: u32 = 0xFFF;

/// Registry of class and member tokens.
///
/// Construct one per process and share it with every session through
/// [`SharedRegistry`]; two registries in one process can issue the same
/// names.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    /// Class name → dense index.
    classes: RwLock<FxHashMap<String, u32>>,
    /// `name + descriptor` → current counter.
    members: Mutex<FxHashMap<String, u32>>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a class, stable for the life of the registry.
    pub fn uid_for_class(&self, class: &str) -> Result<String, IdentifierExhaustionError> {
        // Fast path: already issued
        {
            let guard = self.classes.read();
            if let Some(&index) = guard.get(class) {
                return Ok(class_token(index));
            }
        }

        let mut guard = self.classes.write();

        // Double-check after acquiring write lock
        if let Some(&index) = guard.get(class) {
            return Ok(class_token(index));
        }

        let issued = guard.len();
        if issued >= MAX_CLASSES {
            return Err(IdentifierExhaustionError::Classes { issued });
        }
        let index = u32::try_from(issued).map_err(|_| IdentifierExhaustionError::Classes { issued })?;
        guard.insert(class.to_owned(), index);
        tracing::trace!(class, index, "issued class token");
        Ok(class_token(index))
    }

    /// Token for a member key.
    ///
    /// The first request for a key yields `000`. Later requests return the
    /// current counter, or advance it first when `increment` is set, so two
    /// otherwise identical requests can still get distinct tokens.
    pub fn uid_for_member(
        &self,
        name: &str,
        desc: &str,
        increment: bool,
    ) -> Result<String, IdentifierExhaustionError> {
        let key = format!("{name}{desc}");
        let mut members = self.members.lock();

        let counter = match members.get(&key) {
            None => 0,
            Some(&current) if increment => current + 1,
            Some(&current) => current,
        };
        if counter > MAX_MEMBER_COUNTER {
            return Err(IdentifierExhaustionError::Members {
                key,
                issued: counter,
            });
        }
        members.insert(key, counter);
        Ok(format!("{counter:03x}"))
    }

    /// Number of class tokens issued.
    pub fn class_count(&self) -> usize {
        self.classes.read().len()
    }
}

/// Base-26 rendering of a class index, most significant letter first.
fn class_token(index: u32) -> String {
    let mut letters = [b'a'; CLASS_TOKEN_WIDTH];
    let mut rest = index;
    for slot in letters.iter_mut().rev() {
        // rest % 26 < 26, always a valid ASCII letter offset
        #[expect(clippy::cast_possible_truncation, reason = "value is below 26")]
        let digit = (rest % 26) as u8;
        *slot = b'a' + digit;
        rest /= 26;
    }
    letters.iter().map(|&b| char::from(b)).collect()
}

/// Synthesized name for an injector handler.
///
/// Shape: `{kind prefix}${original}${class token}{member token}`.
pub fn handler_name(kind: InjectorKind, original: &str, class_token: &str, member_token: &str) -> String {
    format!("{}${original}${class_token}{member_token}", kind.prefix())
}

/// Synthesized name for a unique member that had to move out of the way.
pub fn unique_name(original: &str, class_token: &str, member_token: &str) -> String {
    format!("unique${original}${class_token}{member_token}")
}

/// Shared, reference-counted registry.
///
/// The registry outlives individual sessions so identifiers stay stable when
/// overlays are reloaded.
#[derive(Clone, Debug, Default)]
pub struct SharedRegistry(Arc<IdentifierRegistry>);

impl SharedRegistry {
    pub fn new() -> Self {
        SharedRegistry(Arc::new(IdentifierRegistry::new()))
    }
}

impl std::ops::Deref for SharedRegistry {
    type Target = IdentifierRegistry;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

//! Class lookup collaborator.

use std::sync::Arc;

use graft_diagnostic::{Diagnostic, ErrorCode};
use graft_ir::ClassNode;
use rustc_hash::FxHashMap;

/// Why a class source could not produce a class.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Malformed(String),
}

/// A referenced class or interface could not be located or parsed.
///
/// Fatal for the overlay being validated, never for the session.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("class `{class}` could not be found")]
    NotFound { class: String },
    #[error("class `{class}` could not be parsed: {reason}")]
    Malformed { class: String, reason: String },
}

impl ResolutionError {
    pub fn from_source(class: &str, err: SourceError) -> Self {
        match err {
            SourceError::NotFound => ResolutionError::NotFound {
                class: class.to_owned(),
            },
            SourceError::Malformed(reason) => ResolutionError::Malformed {
                class: class.to_owned(),
                reason,
            },
        }
    }

    pub fn class(&self) -> &str {
        match self {
            ResolutionError::NotFound { class } | ResolutionError::Malformed { class, .. } => class,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ResolutionError::NotFound { .. } => ErrorCode::G0001,
            ResolutionError::Malformed { .. } => ErrorCode::G0002,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code()).with_message(self.to_string())
    }
}

/// Locates and parses classes by internal name.
///
/// Implementations do their own I/O; the model only ever calls this once per
/// class name.
pub trait ClassSource: Send + Sync {
    fn load(&self, name: &str) -> Result<Arc<ClassNode>, SourceError>;
}

/// In-memory class source keyed by class name.
#[derive(Clone, Debug, Default)]
pub struct MapClassSource {
    classes: FxHashMap<String, Arc<ClassNode>>,
}

impl MapClassSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: ClassNode) {
        self.classes.insert(class.name.clone(), Arc::new(class));
    }

    #[must_use]
    pub fn with(mut self, class: ClassNode) -> Self {
        self.insert(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassNode> for MapClassSource {
    fn from_iter<I: IntoIterator<Item = ClassNode>>(iter: I) -> Self {
        let mut source = MapClassSource::new();
        for class in iter {
            source.insert(class);
        }
        source
    }
}

impl ClassSource for MapClassSource {
    fn load(&self, name: &str) -> Result<Arc<ClassNode>, SourceError> {
        self.classes.get(name).cloned().ok_or(SourceError::NotFound)
    }
}

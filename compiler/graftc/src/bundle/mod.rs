//! JSON bundles: the classes to transform plus the overlays to apply.

use std::path::{Path, PathBuf};

use graft_ir::ClassNode;
use graft_mixin::OverlayDecl;
use serde::{Deserialize, Serialize};

/// Input of `graftc apply`.
///
/// ```json
/// { "classes": [ ... ], "overlays": [ { "class": { ... }, "targets": ["demo/Foo"] } ] }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub classes: Vec<ClassNode>,
    #[serde(default)]
    pub overlays: Vec<OverlayDecl>,
}

/// Output of `graftc apply`: every input class, transformed or not, in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBundle {
    pub classes: Vec<ClassNode>,
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("cannot read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed bundle: {0}")]
    Json(#[from] serde_json::Error),
}

impl Bundle {
    pub fn from_json(text: &str) -> Result<Self, BundleError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let text = std::fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

impl ClassBundle {
    pub fn to_json(&self) -> Result<String, BundleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write to `path`, or to stdout when there is none.
    pub fn write(&self, path: Option<&Path>) -> Result<(), BundleError> {
        let json = self.to_json()?;
        match path {
            Some(path) => std::fs::write(path, json).map_err(|source| BundleError::Write {
                path: path.to_path_buf(),
                source,
            }),
            None => {
                println!("{json}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;

//! Session driver.
//!
//! Owns every component for one merge session and routes each incoming class:
//!
//! ```text
//! class tree
//!     │
//!     ▼
//! chain.pre_process ──► passthrough? ──yes──► done
//!     │ no
//!     ▼
//! overlays for class? ──► preprocess each ──► TargetContext::apply
//!     │                                            │
//!     ▼                                            ▼
//! chain.post_process ◄─────────────────────────────┘
//! ```
//!
//! Failures are contained: a rejected overlay is skipped, a conflicting
//! target is left unmodified, and both are recorded in the `ClassReport`.
//! Only identifier exhaustion stops the session.

use std::fmt;
use std::sync::Arc;

use graft_diagnostic::DiagnosticSink;
use graft_ir::{ClassCodec, ClassNode};
use graft_model::{ClassModel, ClassSource};
use parking_lot::{Mutex, MutexGuard, RwLock};
use rustc_hash::FxHashMap;

use crate::preprocess::{preprocess, PreprocessContext};
use crate::target::{TargetContext, TargetMethod};
use crate::uid::SharedRegistry;
use crate::{
    CoprocessorChain, MergeConflictError, MixinConfig, OverlayDecl, OverlayDefinition,
    OverlayError, SessionError,
};

/// An overlay known to the session.
pub struct RegisteredOverlay {
    name: String,
    order: usize,
    decl: Mutex<OverlayDecl>,
}

impl RegisteredOverlay {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Discovery order, used to break priority ties.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn decl(&self) -> MutexGuard<'_, OverlayDecl> {
        self.decl.lock()
    }
}

impl fmt::Debug for RegisteredOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredOverlay")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Registered overlays, indexed by target.
#[derive(Debug, Default)]
pub struct OverlayIndex {
    overlays: Vec<Arc<RegisteredOverlay>>,
    by_name: FxHashMap<String, usize>,
    by_target: FxHashMap<String, Vec<usize>>,
    finalized: bool,
}

impl OverlayIndex {
    /// Add a declaration. Re-registering a name replaces its declaration
    /// and keeps its discovery order.
    fn insert(&mut self, decl: OverlayDecl) -> Arc<RegisteredOverlay> {
        if let Some(&index) = self.by_name.get(decl.name()) {
            let existing = Arc::clone(&self.overlays[index]);
            for targets in self.by_target.values_mut() {
                targets.retain(|&i| i != index);
            }
            for target in &decl.targets {
                self.by_target.entry(target.clone()).or_default().push(index);
            }
            *existing.decl.lock() = decl;
            return existing;
        }

        let order = self.overlays.len();
        for target in &decl.targets {
            self.by_target.entry(target.clone()).or_default().push(order);
        }
        let registered = Arc::new(RegisteredOverlay {
            name: decl.name().to_owned(),
            order,
            decl: Mutex::new(decl),
        });
        self.by_name.insert(registered.name.clone(), order);
        self.overlays.push(Arc::clone(&registered));
        registered
    }

    /// Overlays declaring `class` as a target, in discovery order.
    pub fn overlays_for(&self, class: &str) -> Vec<Arc<RegisteredOverlay>> {
        let mut indices = self.by_target.get(class).cloned().unwrap_or_default();
        indices.sort_unstable();
        indices
            .into_iter()
            .map(|i| Arc::clone(&self.overlays[i]))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<RegisteredOverlay>> {
        self.by_name.get(name).map(|&i| Arc::clone(&self.overlays[i]))
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

/// What happened to one class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransformResult {
    Unchanged,
    Transformed,
    /// Changed by a coprocessor and exempt from merging.
    TransformedPassthrough,
}

impl TransformResult {
    pub fn is_transformed(self) -> bool {
        !matches!(self, TransformResult::Unchanged)
    }
}

/// An overlay that could not be applied to the class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayFailure {
    pub overlay: String,
    pub error: OverlayError,
}

/// Per-class outcome.
#[derive(Debug)]
pub struct ClassReport {
    pub class: String,
    pub result: TransformResult,
    /// A coprocessor exempted the class from merging.
    pub passthrough: bool,
    /// Overlays grafted, in application order.
    pub applied: Vec<String>,
    /// Target methods the merge touched.
    pub targets: Vec<TargetMethod>,
    pub rejected: Vec<OverlayFailure>,
    /// Set when the whole merge was rolled back.
    pub conflict: Option<MergeConflictError>,
}

impl ClassReport {
    fn new(class: &str) -> Self {
        ClassReport {
            class: class.to_owned(),
            result: TransformResult::Unchanged,
            passthrough: false,
            applied: Vec::new(),
            targets: Vec::new(),
            rejected: Vec::new(),
            conflict: None,
        }
    }

    /// No overlay was rejected and the merge did not conflict.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.conflict.is_none()
    }
}

/// One merge session.
///
/// Independent classes may be processed from several threads at once; the
/// registry, the class model and the overlay declarations are internally
/// synchronised.
pub struct MergeSession {
    config: MixinConfig,
    registry: SharedRegistry,
    model: ClassModel,
    chain: CoprocessorChain,
    index: RwLock<OverlayIndex>,
    sink: Arc<dyn DiagnosticSink>,
    definitions: Mutex<Vec<OverlayDefinition>>,
}

impl MergeSession {
    pub fn new(
        config: MixinConfig,
        registry: SharedRegistry,
        source: Arc<dyn ClassSource>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let chain = CoprocessorChain::with_defaults(&config);
        MergeSession {
            config,
            registry,
            model: ClassModel::new(source),
            chain,
            index: RwLock::new(OverlayIndex::default()),
            sink,
            definitions: Mutex::new(Vec::new()),
        }
    }

    /// Replace the default coprocessor chain. Call before registering overlays.
    #[must_use]
    pub fn with_chain(mut self, chain: CoprocessorChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn config(&self) -> &MixinConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn model(&self) -> &ClassModel {
        &self.model
    }

    /// Register a discovered overlay and return its discovery order.
    ///
    /// Runs the chain's `on_prepare` hooks; if the session is already
    /// finalised, `on_init` runs right away.
    pub fn register_overlay(&self, decl: OverlayDecl) -> usize {
        tracing::debug!(overlay = decl.name(), targets = ?decl.targets, "overlay registered");
        self.chain.on_prepare(&decl);
        let mut index = self.index.write();
        let registered = index.insert(decl);
        if index.finalized {
            self.chain.on_init(&registered.decl());
        }
        registered.order
    }

    /// Run `on_init` for every registered overlay. Idempotent.
    pub fn finalize(&self) {
        let mut index = self.index.write();
        if index.finalized {
            return;
        }
        for registered in &index.overlays {
            self.chain.on_init(&registered.decl());
        }
        index.finalized = true;
        tracing::debug!(overlays = index.overlays.len(), "overlay set finalized");
    }

    /// Names of the overlays targeting `class`, in discovery order.
    pub fn overlays_for(&self, class: &str) -> Vec<String> {
        self.index
            .read()
            .overlays_for(class)
            .iter()
            .map(|o| o.name.clone())
            .collect()
    }

    pub fn overlay(&self, name: &str) -> Option<Arc<RegisteredOverlay>> {
        self.index.read().get(name)
    }

    /// Definitions applied so far in this session.
    pub fn definitions(&self) -> Vec<OverlayDefinition> {
        self.definitions.lock().clone()
    }

    /// Route one class through the chain and the merge engine.
    #[tracing::instrument(level = "debug", skip(self, tree))]
    pub fn process_class(&self, name: &str, tree: &mut ClassNode) -> Result<ClassReport, SessionError> {
        if !self.index.read().finalized {
            self.finalize();
        }

        let mut report = ClassReport::new(name);
        let pre = self.chain.pre_process(name, tree);
        if pre.is_passthrough() {
            report.passthrough = true;
            if pre.is_transformed() {
                report.result = TransformResult::TransformedPassthrough;
            }
            tracing::debug!(%pre, "class passed through");
            return Ok(report);
        }

        let mut transformed = pre.is_transformed();
        let overlays = self.index.read().overlays_for(name);
        if !overlays.is_empty() {
            transformed |= self.merge(name, tree, &overlays, &mut report)?;
        }

        transformed |= self.chain.post_process(name, tree);
        if transformed {
            report.result = TransformResult::Transformed;
        }
        tracing::debug!(
            result = ?report.result,
            applied = report.applied.len(),
            rejected = report.rejected.len(),
            "class processed"
        );
        Ok(report)
    }

    /// Preprocess and apply every overlay for one target. Returns whether the
    /// tree changed.
    fn merge(
        &self,
        name: &str,
        tree: &mut ClassNode,
        overlays: &[Arc<RegisteredOverlay>],
        report: &mut ClassReport,
    ) -> Result<bool, SessionError> {
        let target = self.model.describe_node(tree);
        let cx = PreprocessContext {
            model: &self.model,
            registry: &self.registry,
            config: &self.config,
            sink: &*self.sink,
        };

        let mut context = TargetContext::new(tree, &*self.sink);
        for overlay in overlays {
            let mut decl = overlay.decl();
            match preprocess(&mut decl, &target, overlay.order, &cx) {
                Ok(definition) => context.add(definition),
                Err(OverlayError::Exhausted(err)) => return Err(err.into()),
                Err(error) => {
                    tracing::debug!(overlay = %overlay.name, code = %error.code(), "overlay rejected");
                    self.sink.report(error.to_diagnostic(&overlay.name, name));
                    report.rejected.push(OverlayFailure {
                        overlay: overlay.name.clone(),
                        error,
                    });
                }
            }
        }

        match context.apply() {
            Ok(outcome) => {
                report.applied = outcome.applied.iter().map(|d| d.name.clone()).collect();
                report.targets = outcome.targets;
                self.definitions.lock().extend(outcome.applied);
                Ok(outcome.modified)
            }
            Err(conflict) => {
                self.sink.report(conflict.to_diagnostic());
                report.conflict = Some(conflict);
                Ok(false)
            }
        }
    }

    /// Parse, process and serialise one class.
    ///
    /// Unchanged classes come back as the original bytes.
    pub fn transform_bytes(
        &self,
        name: &str,
        bytes: &[u8],
        codec: &dyn ClassCodec,
    ) -> Result<(Vec<u8>, ClassReport), SessionError> {
        let codec_error = |source| SessionError::Codec {
            class: name.to_owned(),
            source,
        };
        let mut tree = codec.parse(bytes).map_err(codec_error)?;
        let report = self.process_class(name, &mut tree)?;
        let out = if report.result.is_transformed() {
            codec.serialize(&tree).map_err(codec_error)?
        } else {
            bytes.to_vec()
        };
        Ok((out, report))
    }
}

impl fmt::Debug for MergeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeSession")
            .field("config", &self.config)
            .field("chain", &self.chain)
            .field("overlays", &self.index.read().len())
            .finish_non_exhaustive()
    }
}

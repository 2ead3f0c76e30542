//! Compute-once descriptor cache.

use std::sync::{Arc, OnceLock};

use graft_ir::{ClassNode, MemberSignature};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{ClassDescriptor, ClassSource, ResolutionError};

type DescriptorSlot = Arc<OnceLock<Result<Arc<ClassDescriptor>, ResolutionError>>>;

/// Session-wide class model.
///
/// # Thread Safety
/// The slot map is guarded by a short-lived lock; each slot is a `OnceLock`,
/// so concurrent first lookups of one class build its descriptor exactly
/// once while lookups of other classes proceed.
pub struct ClassModel {
    source: Arc<dyn ClassSource>,
    slots: Mutex<FxHashMap<String, DescriptorSlot>>,
}

impl ClassModel {
    pub fn new(source: Arc<dyn ClassSource>) -> Self {
        ClassModel {
            source,
            slots: Mutex::new(FxHashMap::default()),
        }
    }

    fn slot(&self, name: &str) -> DescriptorSlot {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(name) {
            return Arc::clone(slot);
        }
        let slot = DescriptorSlot::default();
        slots.insert(name.to_owned(), Arc::clone(&slot));
        slot
    }

    /// Describe a class, loading it from the source on first reference.
    pub fn describe(&self, name: &str) -> Result<Arc<ClassDescriptor>, ResolutionError> {
        self.slot(name)
            .get_or_init(|| {
                tracing::trace!(class = name, "building class descriptor");
                self.source
                    .load(name)
                    .map(|node| Arc::new(ClassDescriptor::from_node(&node)))
                    .map_err(|err| ResolutionError::from_source(name, err))
            })
            .clone()
    }

    /// Describe a class from a tree already in hand.
    ///
    /// Used for merge targets, whose bytes arrive from the caller rather than
    /// the class source. The result always reflects `node`; the cache is only
    /// seeded when the class has not been described yet.
    pub fn describe_node(&self, node: &ClassNode) -> Arc<ClassDescriptor> {
        let desc = Arc::new(ClassDescriptor::from_node(node));
        let _ = self.slot(&node.name).set(Ok(Arc::clone(&desc)));
        desc
    }

    /// Union of instance method signatures declared by `interface` and all of
    /// its super-interfaces.
    ///
    /// Cycles in the interface graph are tolerated. Any interface in the
    /// hierarchy that cannot be resolved fails the whole query.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn transitive_interface_methods(
        &self,
        interface: &str,
    ) -> Result<FxHashSet<MemberSignature>, ResolutionError> {
        let mut methods = FxHashSet::default();
        let mut visited = FxHashSet::default();
        let mut pending = vec![interface.to_owned()];

        while let Some(name) = pending.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let desc = self.describe(&name)?;
            methods.extend(
                desc.methods()
                    .iter()
                    .filter(|m| !m.access.is_static() && m.name != graft_ir::CLASS_INITIALIZER)
                    .map(|m| m.signature()),
            );
            pending.extend(desc.interfaces.iter().cloned());
        }

        tracing::trace!(interface, count = methods.len(), "resolved interface methods");
        Ok(methods)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;

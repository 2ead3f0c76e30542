use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::{MapClassSource, SourceError};
use graft_ir::{Access, MethodNode};

fn iface(name: &str) -> ClassNode {
    ClassNode::new(name, Access::PUBLIC | Access::INTERFACE | Access::ABSTRACT)
}

fn abstract_method(name: &str, desc: &str) -> MethodNode {
    MethodNode::new(Access::PUBLIC | Access::ABSTRACT, name, desc)
}

#[test]
fn transitive_methods_include_super_interfaces() {
    let source = MapClassSource::new()
        .with(iface("demo/I").with_interface("demo/J").with_method(abstract_method("i", "()V")))
        .with(iface("demo/J").with_method(abstract_method("m", "()V")));
    let model = ClassModel::new(Arc::new(source));

    let methods = model.transitive_interface_methods("demo/I").unwrap();

    assert!(methods.contains(&MemberSignature::new("m", "()V")));
    assert!(methods.contains(&MemberSignature::new("i", "()V")));
    assert_eq!(methods.len(), 2);
}

#[test]
fn transitive_methods_survive_cycles() {
    let source = MapClassSource::new()
        .with(iface("demo/A").with_interface("demo/B").with_method(abstract_method("a", "()V")))
        .with(iface("demo/B").with_interface("demo/A").with_method(abstract_method("b", "()I")));
    let model = ClassModel::new(Arc::new(source));

    let methods = model.transitive_interface_methods("demo/A").unwrap();
    assert_eq!(methods.len(), 2);
}

#[test]
fn static_interface_methods_are_excluded() {
    let source = MapClassSource::new().with(
        iface("demo/I")
            .with_method(abstract_method("run", "()V"))
            .with_method(MethodNode::new(Access::PUBLIC | Access::STATIC, "of", "()Ldemo/I;")),
    );
    let model = ClassModel::new(Arc::new(source));

    let methods = model.transitive_interface_methods("demo/I").unwrap();
    assert!(!methods.contains(&MemberSignature::new("of", "()Ldemo/I;")));
}

#[test]
fn missing_super_interface_is_a_resolution_error() {
    let source = MapClassSource::new().with(iface("demo/I").with_interface("demo/Missing"));
    let model = ClassModel::new(Arc::new(source));

    let err = model.transitive_interface_methods("demo/I").unwrap_err();
    assert_eq!(
        err,
        ResolutionError::NotFound {
            class: "demo/Missing".into()
        }
    );
}

struct CountingSource {
    loads: AtomicUsize,
}

impl ClassSource for CountingSource {
    fn load(&self, name: &str) -> Result<Arc<ClassNode>, SourceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if name == "demo/Broken" {
            return Err(SourceError::Malformed("truncated".into()));
        }
        Ok(Arc::new(ClassNode::new(name, Access::PUBLIC)))
    }
}

#[test]
fn descriptors_are_built_once() {
    let source = Arc::new(CountingSource {
        loads: AtomicUsize::new(0),
    });
    let model = ClassModel::new(Arc::clone(&source) as Arc<dyn ClassSource>);

    let first = model.describe("demo/Foo").unwrap();
    let second = model.describe("demo/Foo").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(source.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn failures_are_cached_too() {
    let source = Arc::new(CountingSource {
        loads: AtomicUsize::new(0),
    });
    let model = ClassModel::new(Arc::clone(&source) as Arc<dyn ClassSource>);

    for _ in 0..3 {
        let err = model.describe("demo/Broken").unwrap_err();
        assert!(matches!(err, ResolutionError::Malformed { .. }));
    }
    assert_eq!(source.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_first_access_builds_once() {
    let source = Arc::new(CountingSource {
        loads: AtomicUsize::new(0),
    });
    let model = Arc::new(ClassModel::new(Arc::clone(&source) as Arc<dyn ClassSource>));

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let model = Arc::clone(&model);
            scope.spawn(move || {
                model.describe("demo/Shared").unwrap();
            });
        }
    });

    assert_eq!(source.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn describe_node_seeds_the_cache() {
    let model = ClassModel::new(Arc::new(MapClassSource::new()));
    let node = ClassNode::new("demo/Target", Access::PUBLIC)
        .with_method(MethodNode::new(Access::PUBLIC, "run", "()V"));

    let desc = model.describe_node(&node);
    assert!(desc.has_method(&MemberSignature::new("run", "()V")));

    let again = model.describe("demo/Target").unwrap();
    assert!(Arc::ptr_eq(&desc, &again));
}

#[test]
fn describe_node_reflects_the_tree_in_hand() {
    let source = MapClassSource::new().with(
        ClassNode::new("demo/Target", Access::PUBLIC).with_method(MethodNode::new(Access::PUBLIC, "run", "()V")),
    );
    let model = ClassModel::new(Arc::new(source));
    let stale = model.describe("demo/Target").unwrap();

    let edited = ClassNode::new("demo/Target", Access::PUBLIC)
        .with_method(MethodNode::new(Access::PUBLIC, "run", "()V"))
        .with_method(MethodNode::new(Access::PUBLIC, "stop", "()V"));
    let fresh = model.describe_node(&edited);

    assert!(fresh.has_method(&MemberSignature::new("stop", "()V")));
    assert!(!stale.has_method(&MemberSignature::new("stop", "()V")));
    assert!(Arc::ptr_eq(&stale, &model.describe("demo/Target").unwrap()));
}

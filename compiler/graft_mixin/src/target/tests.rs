use std::sync::Arc;

use super::*;
use graft_diagnostic::DiagnosticQueue;
use graft_ir::{FieldNode, Insn, MethodNode};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use crate::{OverlayHooks, PreprocessPolicy};

fn target() -> ClassNode {
    ClassNode::new("demo/Foo", Access::PUBLIC)
        .with_method(MethodNode::new(Access::PUBLIC, "tick", "()V").with_body(vec![Insn::Return]))
}

fn definition(name: &str, priority: i32, order: usize) -> OverlayDefinition {
    OverlayDefinition {
        name: name.to_owned(),
        target: "demo/Foo".to_owned(),
        priority,
        order,
        policy: PreprocessPolicy::Standard,
        interfaces: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
        renames: Vec::new(),
        hooks: None,
    }
}

fn planned(tag: MemberTag, name: &str, desc: &str, body: Vec<Insn>) -> PlannedMethod {
    PlannedMethod {
        tag,
        source: MemberSignature::new(name, desc),
        node: MethodNode::new(Access::PUBLIC, name, desc).with_body(body),
    }
}

fn field(name: &str, desc: &str) -> PlannedField {
    PlannedField {
        tag: MemberTag::New,
        source: MemberSignature::new(name, desc),
        node: FieldNode::new(Access::PRIVATE, name, desc),
    }
}

fn tick_body(tree: &ClassNode) -> Vec<Insn> {
    tree.method(&MemberSignature::new("tick", "()V"))
        .map(|m| m.body.clone())
        .unwrap_or_default()
}

#[test]
fn new_members_are_appended_and_tagged() {
    let mut tree = target();
    let queue = DiagnosticQueue::new();
    let mut def = definition("demo/M", 0, 0);
    def.methods.push(planned(MemberTag::New, "bar", "()V", vec![Insn::Return]));
    def.fields.push(field("count", "I"));
    def.interfaces.push("demo/Tickable".into());

    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(def);
    let outcome = cx.apply().unwrap();

    assert!(outcome.modified);
    assert_eq!(outcome.applied.len(), 1);
    let bar = tree.method(&MemberSignature::new("bar", "()V")).unwrap();
    assert_eq!(
        bar.annotations,
        vec![MemberAnnotation::Merged { overlay: "demo/M".into(), priority: 0 }]
    );
    assert!(tree.field_named("count").is_some());
    assert_eq!(tree.interfaces, vec!["demo/Tickable".to_string()]);
}

#[test]
fn lower_priority_applies_first_and_last_overwrite_wins() {
    let mut tree = target();
    let queue = DiagnosticQueue::new();
    let mut a = definition("demo/A", 10, 0);
    a.methods.push(planned(MemberTag::Overwrite, "tick", "()V", vec![Insn::Push(10), Insn::Return]));
    let mut b = definition("demo/B", 5, 1);
    b.methods.push(planned(MemberTag::Overwrite, "tick", "()V", vec![Insn::Push(5), Insn::Return]));

    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(a);
    cx.add(b);
    let outcome = cx.apply().unwrap();

    let order: Vec<_> = outcome.applied.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(order, vec!["demo/B", "demo/A"]);
    assert_eq!(tick_body(&tree), vec![Insn::Push(10), Insn::Return]);
    assert_eq!(outcome.targets.len(), 1);
    assert_eq!(outcome.targets[0].touched_by, vec!["demo/B".to_string(), "demo/A".to_string()]);
}

#[test]
fn priority_ties_follow_discovery_order() {
    let mut tree = target();
    let queue = DiagnosticQueue::new();
    let mut late = definition("demo/Late", 0, 7);
    late.methods.push(planned(MemberTag::Overwrite, "tick", "()V", vec![Insn::Push(7)]));
    let mut early = definition("demo/Early", 0, 2);
    early.methods.push(planned(MemberTag::Overwrite, "tick", "()V", vec![Insn::Push(2)]));

    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(late);
    cx.add(early);
    cx.apply().unwrap();

    assert_eq!(tick_body(&tree), vec![Insn::Push(7)]);
}

#[test]
fn overwrite_keeps_target_access_and_descriptor() {
    let mut tree = target();
    tree.methods[0].access = Access::PROTECTED | Access::FINAL;
    let queue = DiagnosticQueue::new();
    let mut def = definition("demo/M", 0, 0);
    def.methods.push(planned(MemberTag::Overwrite, "tick", "()V", vec![Insn::Throw]));

    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(def);
    cx.apply().unwrap();

    assert_eq!(tree.methods[0].access, Access::PROTECTED | Access::FINAL);
    assert_eq!(tree.methods[0].body, vec![Insn::Throw]);
}

#[test]
fn handles_are_memoized_per_signature() {
    let mut tree = target();
    let queue = DiagnosticQueue::new();
    let mut cx = TargetContext::new(&mut tree, &queue);

    let sig = MemberSignature::new("tick", "()V");
    let first = cx.target_method(&sig);
    let again = cx.target_method(&sig);
    let other = cx.target_method(&MemberSignature::new("tock", "()V"));

    assert_eq!(first, again);
    assert_ne!(first, other);
    assert_eq!(cx.method(first).map(|m| m.signature.clone()), Some(sig));
}

#[test]
fn later_overlay_redefining_a_method_wins_with_warning() {
    let mut tree = target();
    let queue = DiagnosticQueue::new();
    let mut a = definition("demo/A", 0, 0);
    a.methods.push(planned(MemberTag::New, "bar", "()V", vec![Insn::Push(1)]));
    let mut b = definition("demo/B", 1, 1);
    b.methods.push(planned(MemberTag::New, "bar", "()V", vec![Insn::Push(2)]));

    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(a);
    cx.add(b);
    cx.apply().unwrap();

    let bar = tree.method(&MemberSignature::new("bar", "()V")).unwrap();
    assert_eq!(bar.body, vec![Insn::Push(2)]);
    assert_eq!(tree.methods.len(), 2);
    let codes: Vec<_> = queue.snapshot().iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![ErrorCode::W2001]);
}

#[test]
fn incompatible_methods_conflict_and_restore_the_tree() {
    let original = target();
    let mut tree = original.clone();
    let queue = DiagnosticQueue::new();
    let mut a = definition("demo/A", 0, 0);
    a.methods.push(planned(MemberTag::New, "bar", "()V", vec![]));
    let mut b = definition("demo/B", 1, 1);
    b.methods.push(planned(MemberTag::New, "bar", "()I", vec![]));

    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(a);
    cx.add(b);
    let err = cx.apply().unwrap_err();

    assert_eq!(err.code(), ErrorCode::G2001);
    assert_eq!(err.first, "demo/A");
    assert_eq!(err.second, "demo/B");
    assert_eq!(tree, original);

    let diag = err.to_diagnostic();
    assert_eq!(diag.overlay.as_deref(), Some("demo/B"));
    assert_eq!(diag.suggestions, vec!["rename the method in one of the two overlays".to_owned()]);
}

#[test]
fn overloads_from_different_overlays_both_land() {
    let mut tree = ClassNode::new("demo/Foo", Access::PUBLIC);
    let queue = DiagnosticQueue::new();
    let mut a = definition("demo/A", 0, 0);
    a.methods.push(planned(MemberTag::New, "foo", "()V", vec![Insn::Return]));
    let mut b = definition("demo/B", 1, 1);
    b.methods.push(planned(MemberTag::New, "foo", "(I)V", vec![Insn::Return]));

    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(a);
    cx.add(b);
    let outcome = cx.apply().unwrap();

    assert!(outcome.modified);
    let descs: Vec<_> = tree.methods_named("foo").map(|m| m.desc.as_str()).collect();
    assert_eq!(descs, vec!["()V", "(I)V"]);
    assert!(queue.snapshot().is_empty());
}

#[test]
fn duplicate_fields_keep_the_first_or_conflict() {
    let mut tree = target();
    let queue = DiagnosticQueue::new();
    let mut a = definition("demo/A", 0, 0);
    a.fields.push(field("cache", "I"));
    let mut b = definition("demo/B", 1, 1);
    b.fields.push(field("cache", "I"));

    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(a);
    cx.add(b);
    cx.apply().unwrap();
    assert_eq!(tree.fields.len(), 1);
    assert_eq!(queue.snapshot()[0].code, ErrorCode::W2002);

    let mut c = definition("demo/C", 2, 2);
    c.fields.push(field("cache", "J"));
    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(c);
    assert_eq!(cx.apply().unwrap_err().code(), ErrorCode::G2002);
}

#[test]
fn accessor_stubs_become_concrete() {
    let mut tree = target();
    let queue = DiagnosticQueue::new();
    let mut def = definition("demo/FooAccessor", 0, 0);
    let mut stub = planned(MemberTag::New, "getCount", "()I", vec![]);
    stub.node.access = Access::PUBLIC | Access::ABSTRACT;
    stub.node.annotations.push(MemberAnnotation::Accessor { field: "count".into() });
    def.methods.push(stub);

    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(def);
    cx.apply().unwrap();

    let method = tree.method(&MemberSignature::new("getCount", "()I")).unwrap();
    assert_eq!(method.access, Access::PUBLIC);
    assert!(method.has(&MemberAnnotation::Accessor { field: "count".into() }));
}

struct Recorder(Arc<Mutex<Vec<String>>>);

impl OverlayHooks for Recorder {
    fn pre_merge(&self, target: &ClassNode, overlay: &OverlayDefinition) {
        self.0.lock().push(format!("pre {} {}", overlay.name, target.methods.len()));
    }

    fn post_merge(&self, target: &ClassNode, overlay: &OverlayDefinition) {
        self.0.lock().push(format!("post {} {}", overlay.name, target.methods.len()));
    }
}

#[test]
fn hooks_wrap_each_overlay() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut tree = target();
    let queue = DiagnosticQueue::new();
    let mut def = definition("demo/M", 0, 0);
    def.methods.push(planned(MemberTag::New, "bar", "()V", vec![]));
    def.hooks = Some(crate::HookHandle::new(Recorder(Arc::clone(&log))));

    let mut cx = TargetContext::new(&mut tree, &queue);
    cx.add(def);
    cx.apply().unwrap();

    assert_eq!(*log.lock(), vec!["pre demo/M 1".to_string(), "post demo/M 2".to_string()]);
}

#[test]
fn empty_merge_is_unmodified() {
    let mut tree = target();
    let queue = DiagnosticQueue::new();
    let cx = TargetContext::new(&mut tree, &queue);

    let outcome = cx.apply().unwrap();
    assert!(!outcome.modified);
    assert!(outcome.applied.is_empty());
}

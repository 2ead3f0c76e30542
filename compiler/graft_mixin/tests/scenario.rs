//! End-to-end merge scenarios over in-memory classes.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::Arc;

use graft_diagnostic::{DiagnosticQueue, DiagnosticSink, ErrorCode};
use graft_ir::{
    Access, BincodeCodec, ClassCodec, ClassNode, FieldNode, FieldOp, InjectorKind, Insn,
    InvokeKind, MemberAnnotation, MemberRef, MemberSignature, MethodNode,
};
use graft_mixin::{
    InterfaceBinding, MergeSession, MixinConfig, OverlayDecl, SharedRegistry, TransformResult,
};
use graft_model::MapClassSource;
use pretty_assertions::assert_eq;

fn session(source: MapClassSource, registry: &SharedRegistry) -> (MergeSession, Arc<DiagnosticQueue>) {
    let queue = Arc::new(DiagnosticQueue::new());
    let session = MergeSession::new(
        MixinConfig::default(),
        registry.clone(),
        Arc::new(source),
        Arc::clone(&queue) as Arc<dyn DiagnosticSink>,
    );
    (session, queue)
}

fn overlay_m() -> OverlayDecl {
    let bar = MethodNode::new(Access::PUBLIC, "bar", "()V").with_body(vec![
        Insn::Load { slot: 0, desc: "Ldemo/M;".into() },
        Insn::Invoke {
            kind: InvokeKind::Special,
            target: MemberRef::new("demo/M", "onBar", "()V"),
        },
        Insn::Return,
    ]);
    let on_bar = MethodNode::new(Access::PRIVATE, "onBar", "()V")
        .with_annotation(MemberAnnotation::Injector(InjectorKind::Inject))
        .with_body(vec![Insn::Ldc("bar called".into()), Insn::Opaque(0x57), Insn::Return]);

    OverlayDecl::new(
        ClassNode::new("demo/M", Access::PUBLIC)
            .with_method(bar)
            .with_method(on_bar),
    )
    .with_target("demo/Foo")
    .with_priority(0)
}

#[test]
fn overlay_with_handler_merges_into_empty_target() {
    let registry = SharedRegistry::new();
    let (session, queue) = session(MapClassSource::new(), &registry);
    session.register_overlay(overlay_m());

    let mut foo = ClassNode::new("demo/Foo", Access::PUBLIC);
    let report = session.process_class("demo/Foo", &mut foo).unwrap();

    assert_eq!(report.result, TransformResult::Transformed);
    assert!(report.is_clean());
    assert!(queue.snapshot().is_empty());

    let names: Vec<_> = foo.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["bar", "handler$onBar$aaa000"]);

    let bar = foo.method(&MemberSignature::new("bar", "()V")).unwrap();
    assert_eq!(
        bar.body,
        vec![
            Insn::Load { slot: 0, desc: "Ldemo/Foo;".into() },
            Insn::Invoke {
                kind: InvokeKind::Special,
                target: MemberRef::new("demo/Foo", "handler$onBar$aaa000", "()V"),
            },
            Insn::Return,
        ]
    );
    let handler = foo.method(&MemberSignature::new("handler$onBar$aaa000", "()V")).unwrap();
    assert_eq!(handler.body, vec![Insn::Ldc("bar called".into()), Insn::Opaque(0x57), Insn::Return]);
}

#[test]
fn handler_names_are_reproducible_and_never_reused() {
    let registry = SharedRegistry::new();

    let (first, _) = session(MapClassSource::new(), &registry);
    first.register_overlay(overlay_m());
    let mut foo = ClassNode::new("demo/Foo", Access::PUBLIC);
    first.process_class("demo/Foo", &mut foo).unwrap();

    // Same process, fresh declarations: the registry moves on
    let (second, _) = session(MapClassSource::new(), &registry);
    second.register_overlay(overlay_m());
    let mut again = ClassNode::new("demo/Foo", Access::PUBLIC);
    second.process_class("demo/Foo", &mut again).unwrap();

    assert!(foo.method(&MemberSignature::new("handler$onBar$aaa000", "()V")).is_some());
    assert!(again.method(&MemberSignature::new("handler$onBar$aaa001", "()V")).is_some());

    // A fresh registry reproduces the first name
    let (fresh, _) = session(MapClassSource::new(), &SharedRegistry::new());
    fresh.register_overlay(overlay_m());
    let mut third = ClassNode::new("demo/Foo", Access::PUBLIC);
    fresh.process_class("demo/Foo", &mut third).unwrap();
    assert_eq!(third, foo);
}

#[test]
fn handler_renaming_is_stable_across_reprocessing() {
    let registry = SharedRegistry::new();
    let (session, _) = session(MapClassSource::new(), &registry);
    session.register_overlay(overlay_m());

    let mut first = ClassNode::new("demo/Foo", Access::PUBLIC);
    session.process_class("demo/Foo", &mut first).unwrap();
    let mut second = ClassNode::new("demo/Foo", Access::PUBLIC);
    session.process_class("demo/Foo", &mut second).unwrap();

    assert_eq!(first, second);
}

#[test]
fn overlay_with_two_targets_gets_a_handler_name_per_target() {
    let registry = SharedRegistry::new();
    let (session, _) = session(MapClassSource::new(), &registry);
    session.register_overlay(overlay_m().with_target("demo/Bar"));

    let mut foo = ClassNode::new("demo/Foo", Access::PUBLIC);
    session.process_class("demo/Foo", &mut foo).unwrap();
    let mut bar = ClassNode::new("demo/Bar", Access::PUBLIC);
    session.process_class("demo/Bar", &mut bar).unwrap();

    assert_eq!(registry.uid_for_class("demo/Bar").unwrap(), "aab");
    let names = |class: &ClassNode| -> Vec<String> { class.methods.iter().map(|m| m.name.clone()).collect() };
    assert_eq!(names(&foo), vec!["bar", "handler$onBar$aaa000"]);
    assert_eq!(names(&bar), vec!["bar", "handler$onBar$aab001"]);

    let call = &bar.method(&MemberSignature::new("bar", "()V")).unwrap().body[1];
    assert_eq!(
        call,
        &Insn::Invoke {
            kind: InvokeKind::Special,
            target: MemberRef::new("demo/Bar", "handler$onBar$aab001", "()V"),
        }
    );

    // Each target keeps its own name when processed again
    let mut foo_again = ClassNode::new("demo/Foo", Access::PUBLIC);
    session.process_class("demo/Foo", &mut foo_again).unwrap();
    assert_eq!(foo_again, foo);
}

#[test]
fn rejected_interface_overlay_leaves_bytes_identical() {
    let registry = SharedRegistry::new();
    let (session, queue) = session(MapClassSource::new(), &registry);
    session.register_overlay(
        OverlayDecl::new(
            ClassNode::new("demo/IM", Access::PUBLIC | Access::INTERFACE | Access::ABSTRACT)
                .with_method(MethodNode::new(Access::PRIVATE, "helper", "()V").with_body(vec![Insn::Return])),
        )
        .with_target("demo/Foo"),
    );

    let codec = BincodeCodec;
    let foo = ClassNode::new("demo/Foo", Access::PUBLIC)
        .with_method(MethodNode::new(Access::PUBLIC, "tick", "()V").with_body(vec![Insn::Return]));
    let bytes = codec.serialize(&foo).unwrap();

    let (out, report) = session.transform_bytes("demo/Foo", &bytes, &codec).unwrap();

    assert_eq!(out, bytes);
    assert_eq!(report.result, TransformResult::Unchanged);
    assert_eq!(report.rejected[0].error.code(), ErrorCode::G1001);
    assert_eq!(queue.flush()[0].code, ErrorCode::G1001);
}

#[test]
fn soft_implements_and_interface_propagation() {
    let source = MapClassSource::new()
        .with(
            ClassNode::new("demo/Named", Access::PUBLIC | Access::INTERFACE | Access::ABSTRACT)
                .with_interface("demo/Labelled")
                .with_method(MethodNode::new(Access::PUBLIC | Access::ABSTRACT, "name", "()Ljava/lang/String;")),
        )
        .with(
            ClassNode::new("demo/Labelled", Access::PUBLIC | Access::INTERFACE | Access::ABSTRACT)
                .with_method(MethodNode::new(Access::PUBLIC | Access::ABSTRACT, "label", "()Ljava/lang/String;")),
        );
    let registry = SharedRegistry::new();
    let (session, _) = session(source, &registry);
    session.register_overlay(
        OverlayDecl::new(
            ClassNode::new("demo/NamedFoo", Access::PUBLIC)
                .with_interface("demo/Named")
                .with_method(
                    MethodNode::new(Access::PUBLIC, "named$label", "()Ljava/lang/String;")
                        .with_body(vec![Insn::Ldc("foo".into()), Insn::ReturnValue("Ljava/lang/String;".into())]),
                ),
        )
        .with_target("demo/Foo")
        .with_binding(InterfaceBinding::new("demo/Named", "named$")),
    );

    let mut foo = ClassNode::new("demo/Foo", Access::PUBLIC);
    let report = session.process_class("demo/Foo", &mut foo).unwrap();

    assert!(report.is_clean());
    assert_eq!(foo.interfaces, vec!["demo/Named".to_string()]);
    assert!(foo.method(&MemberSignature::new("label", "()Ljava/lang/String;")).is_some());
}

#[test]
fn accessor_overlay_end_to_end() {
    let registry = SharedRegistry::new();
    let (session, _) = session(MapClassSource::new(), &registry);
    let accessor = OverlayDecl::new(
        ClassNode::new("demo/FooAccessor", Access::PUBLIC | Access::INTERFACE | Access::ABSTRACT).with_method(
            MethodNode::new(Access::PUBLIC | Access::ABSTRACT, "getCount", "()I")
                .with_annotation(MemberAnnotation::Accessor { field: "count".into() }),
        ),
    )
    .with_target("demo/Foo");
    session.register_overlay(accessor.clone());

    let mut foo = ClassNode::new("demo/Foo", Access::PUBLIC).with_field(FieldNode::new(Access::PRIVATE, "count", "I"));
    let report = session.process_class("demo/Foo", &mut foo).unwrap();

    assert!(report.is_clean());
    assert_eq!(foo.interfaces, vec!["demo/FooAccessor".to_string()]);
    let getter = foo.method(&MemberSignature::new("getCount", "()I")).unwrap();
    assert_eq!(getter.access, Access::PUBLIC);
    assert_eq!(
        getter.body,
        vec![
            Insn::Load { slot: 0, desc: "Ldemo/Foo;".into() },
            Insn::Field {
                op: FieldOp::Get,
                target: MemberRef::new("demo/Foo", "count", "I"),
            },
            Insn::ReturnValue("I".into()),
        ]
    );
    assert_eq!(
        getter.annotations,
        vec![MemberAnnotation::Merged { overlay: "demo/FooAccessor".into(), priority: 1000 }]
    );

    // The accessor interface itself is never a merge target
    let mut iface = accessor.class;
    let report = session.process_class("demo/FooAccessor", &mut iface).unwrap();
    assert!(report.passthrough);
}

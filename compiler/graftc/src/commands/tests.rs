use std::path::PathBuf;

use graft_diagnostic::ErrorCode;
use graft_ir::{
    Access, ClassNode, FieldNode, InjectorKind, Insn, InvokeKind, MemberAnnotation, MemberRef,
    MethodNode,
};
use graft_mixin::{MixinConfig, OverlayDecl, TransformResult};
use pretty_assertions::assert_eq;

use super::*;
use crate::bundle::Bundle;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

fn handler_overlay() -> OverlayDecl {
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
        .with_body(vec![Insn::Return]);

    OverlayDecl::new(
        ClassNode::new("demo/M", Access::PUBLIC)
            .with_method(bar)
            .with_method(on_bar),
    )
    .with_target("demo/Foo")
    .with_target("demo/Baz")
}

fn method_names(class: &ClassNode) -> Vec<&str> {
    class.methods.iter().map(|m| m.name.as_str()).collect()
}

#[test]
fn options_default_to_parallel_stdout() {
    assert_eq!(parse_apply_options(&[]), ApplyOptions::default());
    assert!(ApplyOptions::default().parallel);
}

#[test]
fn options_are_parsed() {
    let options = parse_apply_options(&args(&[
        "-o",
        "out.json",
        "--priority=250",
        "--strict-overwrite",
        "--no-parallel",
    ]));

    assert_eq!(
        options,
        ApplyOptions {
            output: Some(PathBuf::from("out.json")),
            priority: Some(250),
            strict_overwrite: true,
            parallel: false,
        }
    );
}

#[test]
fn output_accepts_long_form() {
    let options = parse_apply_options(&args(&["--output=merged.json"]));
    assert_eq!(options.output, Some(PathBuf::from("merged.json")));
}

#[test]
fn bad_values_and_unknown_flags_are_skipped() {
    let options = parse_apply_options(&args(&["--priority=high", "--frobnicate", "-o"]));
    assert_eq!(options, ApplyOptions::default());
}

#[test]
fn flags_layer_over_config() {
    let options = ApplyOptions {
        priority: Some(7),
        strict_overwrite: true,
        ..ApplyOptions::default()
    };
    let config = options.config(MixinConfig::default());

    assert_eq!(config.default_priority, 7);
    assert!(config.require_overwrite_targets);
    assert_eq!(
        ApplyOptions::default().config(MixinConfig::default()),
        MixinConfig::default()
    );
}

#[test]
fn sequential_apply_names_handlers_in_input_order() {
    let bundle = Bundle {
        classes: vec![
            ClassNode::new("demo/Foo", Access::PUBLIC),
            ClassNode::new("demo/Untouched", Access::PUBLIC),
            ClassNode::new("demo/Baz", Access::PUBLIC),
        ],
        overlays: vec![handler_overlay()],
    };
    let options = ApplyOptions {
        parallel: false,
        ..ApplyOptions::default()
    };

    let outcome = apply_bundle(bundle, &options).unwrap();
    let classes = &outcome.output.classes;

    assert!(outcome.diagnostics.is_empty());
    assert_eq!(classes.len(), 3);
    assert_eq!(method_names(&classes[0]), vec!["bar", "handler$onBar$aaa000"]);
    assert_eq!(classes[1], ClassNode::new("demo/Untouched", Access::PUBLIC));
    assert_eq!(method_names(&classes[2]), vec!["bar", "handler$onBar$aab001"]);

    let results: Vec<_> = outcome.reports.iter().map(|r| r.result).collect();
    assert_eq!(
        results,
        vec![
            TransformResult::Transformed,
            TransformResult::Unchanged,
            TransformResult::Transformed,
        ]
    );
}

#[test]
fn parallel_apply_keeps_order_and_class_tokens() {
    let bundle = Bundle {
        classes: vec![
            ClassNode::new("demo/Foo", Access::PUBLIC),
            ClassNode::new("demo/Baz", Access::PUBLIC),
        ],
        overlays: vec![handler_overlay()],
    };

    let outcome = apply_bundle(bundle, &ApplyOptions::default()).unwrap();
    let classes = &outcome.output.classes;

    assert_eq!(classes[0].name, "demo/Foo");
    assert_eq!(classes[1].name, "demo/Baz");
    assert!(classes[0].methods[1].name.starts_with("handler$onBar$aaa"));
    assert!(classes[1].methods[1].name.starts_with("handler$onBar$aab"));
    let member_tokens: Vec<_> = classes.iter().map(|c| &c.methods[1].name[17..]).collect();
    assert_ne!(member_tokens[0], member_tokens[1]);
}

#[test]
fn rejected_overlay_is_reported_and_leaves_class_alone() {
    let overlay = OverlayDecl::new(
        ClassNode::new("demo/Broken", Access::PUBLIC).with_field(
            FieldNode::new(Access::PRIVATE, "count", "I").with_annotation(MemberAnnotation::Shadow),
        ),
    )
    .with_target("demo/Foo");
    let foo = ClassNode::new("demo/Foo", Access::PUBLIC);
    let bundle = Bundle {
        classes: vec![foo.clone()],
        overlays: vec![overlay],
    };

    let outcome = apply_bundle(bundle, &ApplyOptions::default()).unwrap();

    assert!(outcome.has_errors());
    assert_eq!(outcome.error_count(), 1);
    assert_eq!(outcome.warning_count(), 0);
    assert_eq!(outcome.diagnostics[0].code, ErrorCode::G1003);
    assert_eq!(outcome.output.classes, vec![foo]);
    assert_eq!(outcome.reports[0].rejected.len(), 1);
}

#[test]
fn explain_known_codes() {
    let text = explain("G2001").unwrap();
    assert!(text.starts_with("G2001 (error)"));
    assert!(text.contains(ErrorCode::G2001.explanation()));

    let warning = explain("w1002").unwrap();
    assert!(warning.starts_with("W1002 (warning)"));
}

#[test]
fn explain_unknown_code() {
    assert_eq!(explain("E0001"), None);
    assert_eq!(explain("G9999"), None);
}

use super::*;
use graft_ir::{Access, MemberAnnotation, MethodNode};
use pretty_assertions::assert_eq;

#[test]
fn missing_sections_default_to_empty() {
    let bundle = Bundle::from_json("{}").unwrap();
    assert!(bundle.classes.is_empty());
    assert!(bundle.overlays.is_empty());
}

#[test]
fn overlay_priority_and_bindings_are_optional() {
    let overlay = ClassNode::new("demo/FooMixin", Access::PUBLIC).with_method(
        MethodNode::new(Access::PRIVATE, "onBar", "()V")
            .with_annotation(MemberAnnotation::Unique),
    );
    let class = serde_json::to_string(&overlay).unwrap();
    let text = format!(r#"{{"overlays": [{{"class": {class}, "targets": ["demo/Foo"]}}]}}"#);

    let bundle = Bundle::from_json(&text).unwrap();
    assert_eq!(bundle.overlays.len(), 1);
    let decl = &bundle.overlays[0];
    assert_eq!(decl.class, overlay);
    assert_eq!(decl.targets, vec!["demo/Foo".to_string()]);
    assert_eq!(decl.priority, None);
    assert!(decl.bindings.is_empty());
}

#[test]
fn malformed_json_is_reported() {
    let err = Bundle::from_json("{ classes: }").unwrap_err();
    assert!(matches!(err, BundleError::Json(_)));
    assert!(err.to_string().starts_with("malformed bundle"));
}

#[test]
fn missing_file_names_the_path() {
    let err = Bundle::load(Path::new("/nonexistent/graft/bundle.json")).unwrap_err();
    assert!(matches!(err, BundleError::Read { .. }));
    assert!(err.to_string().contains("/nonexistent/graft/bundle.json"));
}

#[test]
fn output_parses_back() {
    let out = ClassBundle {
        classes: vec![ClassNode::new("demo/Foo", Access::PUBLIC)],
    };
    let parsed: ClassBundle = serde_json::from_str(&out.to_json().unwrap()).unwrap();
    assert_eq!(parsed, out);
}

use super::*;

#[test]
fn diagnostic_builder() {
    let diag = Diagnostic::error(ErrorCode::G1003)
        .with_message("shadow target not found")
        .with_class("demo/Foo")
        .with_overlay("demo/mixin/FooMixin")
        .with_member("count:I")
        .with_note("the target declares no field named `count`")
        .with_suggestion("remove the shadow member");

    assert_eq!(diag.code, ErrorCode::G1003);
    assert!(diag.is_error());
    assert_eq!(diag.class.as_deref(), Some("demo/Foo"));
    assert_eq!(diag.member.as_deref(), Some("count:I"));
    assert_eq!(diag.notes.len(), 1);
    assert_eq!(diag.suggestions.len(), 1);
}

#[test]
fn warning_is_not_error() {
    let diag = Diagnostic::warning(ErrorCode::W1001).with_message("redundant");
    assert!(diag.is_warning());
    assert!(!diag.is_error());
}

#[test]
fn display_includes_code() {
    let diag = Diagnostic::error(ErrorCode::G2001).with_message("conflict");
    assert_eq!(diag.to_string(), "error[G2001]: conflict");
}

use super::*;

#[test]
fn visibility_from_flags() {
    assert_eq!(Access::PUBLIC.visibility(), Visibility::Public);
    assert_eq!(Access::PRIVATE.visibility(), Visibility::Private);
    assert_eq!(Access::PROTECTED.visibility(), Visibility::Protected);
    assert_eq!((Access::STATIC | Access::FINAL).visibility(), Visibility::Package);
}

#[test]
fn with_visibility_keeps_other_flags() {
    let access = Access::PRIVATE | Access::STATIC | Access::SYNTHETIC;
    let widened = access.with_visibility(Visibility::Public);

    assert_eq!(widened, Access::PUBLIC | Access::STATIC | Access::SYNTHETIC);
}

#[test]
fn widening_never_lowers() {
    let public = Access::PUBLIC | Access::FINAL;
    assert_eq!(public.widened_to(Visibility::Package), public);

    let private = Access::PRIVATE;
    assert_eq!(private.widened_to(Visibility::Protected), Access::PROTECTED);
}

#[test]
fn visibility_ordering() {
    assert!(Visibility::Private < Visibility::Package);
    assert!(Visibility::Package < Visibility::Protected);
    assert!(Visibility::Protected < Visibility::Public);
}

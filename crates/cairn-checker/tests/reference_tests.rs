use cairn_checker::{parse_and_check, CheckResult, ErrorKind};

fn check(source: &str) -> CheckResult {
    parse_and_check(source).unwrap_or_else(|e| panic!("parse failed: {e} in {source:?}"))
}

#[test]
fn test_borrow_with_non_reference_type_argument() {
    let source = r#"
        resource R {}
        let capability: Capability = panic("")
        let r <- capability.borrow<@R>()
    "#;
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TypeMismatch),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_reference_to_non_reference_type() {
    let source = r"
        fun f() {
            let x = 1
            let r = &x as Int
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::NonReferenceTypeReference),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_reference_to_optional() {
    let source = r"
        fun f() {
            let x: Int? = 1
            let r = &x as &Int
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::OptionalTypeReference),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_reference_formation_is_clean() {
    let source = r"
        fun f() {
            let x = 1
            let r = &x as &Int
            let y: Int = r == r ? 1 : 2
        }
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_authorized_reference_subtyping() {
    let source = r"
        fun f() {
            let x = 1
            let authorized = &x as auth(Withdraw) &Int
            let plain: &Int = authorized
        }
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_unauthorized_reference_is_not_authorized() {
    let source = r"
        fun f() {
            let x = 1
            let plain = &x as &Int
            let authorized: auth(Withdraw) &Int = plain
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TypeMismatch),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_external_mutation_through_reference() {
    let source = r"
        struct S {
            pub let xs: [Int]
            init() {
                self.xs = []
            }
        }
        fun f(s: &S) {
            s.xs.append(1)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::ExternalMutation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_pub_set_field_allows_external_mutation() {
    let source = r"
        struct S {
            pub(set) var xs: [Int]
            init() {
                self.xs = []
            }
        }
        fun f(s: &S) {
            s.xs.append(1)
        }
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_index_assignment_through_reference() {
    let source = r"
        struct S {
            pub let xs: [Int]
            init() {
                self.xs = []
            }
        }
        fun f(s: &S) {
            s.xs[0] = 1
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::ExternalMutation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_reading_container_field_through_reference_is_clean() {
    let source = r"
        struct S {
            pub let xs: [Int]
            init() {
                self.xs = []
            }
        }
        fun f(s: &S): Int {
            return s.xs.length
        }
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_account_save_and_borrow_roundtrip() {
    let source = r"
        resource R {}
        fun f(account: AuthAccount) {
            let r <- create R()
            account.save(<-r, to: /storage/r)
            let reference = account.borrow<&R>(from: /storage/r)
        }
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_account_borrow_requires_inferable_type_argument() {
    let source = r"
        fun f(account: AuthAccount) {
            let reference = account.borrow(from: /storage/r)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TypeParameterTypeInference),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_account_borrow_requires_reference_type_argument() {
    let source = r"
        resource R {}
        fun f(account: AuthAccount) {
            let reference = account.borrow<R>(from: /storage/r)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TypeMismatch),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_link_requires_reference_type_argument() {
    let source = r"
        resource R {}
        fun f(account: AuthAccount) {
            account.link<@R>(/private/r, target: /storage/r)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TypeMismatch),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_get_capability_without_type_argument() {
    let source = r"
        fun f(account: PublicAccount): Capability {
            return account.getCapability(/public/r)
        }
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_capability_check_returns_bool() {
    let source = r"
        fun f(capability: Capability): Bool {
            return capability.check()
        }
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_typed_capability_borrow() {
    let source = r"
        resource R {}
        fun f(capability: Capability<&R>): Bool {
            let reference = capability.borrow()
            return reference == nil
        }
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_capability_address() {
    let source = r"
        fun f(capability: Capability): Address {
            return capability.address
        }
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

use cairn_checker::{parse_and_check, CheckResult, ErrorKind};

fn check(source: &str) -> CheckResult {
    parse_and_check(source).unwrap_or_else(|e| panic!("parse failed: {e} in {source:?}"))
}

#[test]
fn test_missing_members_note_text() {
    let source = r"
        resource interface I { fun foo(): Int ; fun bar(): Int }
        resource R: I {}
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Conformance),
        1,
        "got: {:?}",
        result.diagnostics
    );
    let diagnostic = result
        .diagnostics
        .iter()
        .find(|d| d.kind == ErrorKind::Conformance)
        .unwrap();
    assert_eq!(
        diagnostic.notes[0].message,
        "`R` is missing definitions for members: `foo`, `bar`"
    );
}

#[test]
fn test_conforming_composite_is_clean() {
    let source = r"
        struct interface I {
            let x: Int
            fun foo(): Int
        }
        struct S: I {
            let x: Int
            init() {
                self.x = 1
            }
            fun foo(): Int {
                return self.x
            }
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
fn test_parameter_specialization_is_rejected() {
    let source = r"
        struct interface I { fun foo(_ x: AnyStruct) }
        struct S: I {
            fun foo(_ x: Int) {}
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Conformance),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_result_covariance_is_allowed() {
    let source = r"
        struct interface I { fun foo(): AnyStruct }
        struct S: I {
            fun foo(): Int {
                return 1
            }
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
fn test_result_contravariance_is_rejected() {
    let source = r"
        struct interface I { fun foo(): Int }
        struct S: I {
            fun foo(): AnyStruct {
                return 1
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Conformance),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_internal_parameter_name_may_differ() {
    let source = r"
        struct interface I { fun foo(with x: Int) }
        struct S: I {
            fun foo(with y: Int) {}
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
fn test_argument_label_mismatch() {
    let source = r"
        struct interface I { fun foo(to x: Int) }
        struct S: I {
            fun foo(from x: Int) {}
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Conformance),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_view_init_parity() {
    let source = r"
        struct interface I { view init(x: Int) }
        struct S: I {
            let x: Int
            init(x: Int) {
                self.x = x
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Conformance),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_view_function_requirement() {
    let source = r"
        struct interface I { view fun foo(): Int }
        struct S: I {
            fun foo(): Int {
                return 1
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Conformance),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_interface_default_implementation_not_required() {
    let source = r"
        struct interface I {
            fun foo(): Int {
                return 1
            }
        }
        struct S: I {}
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_missing_members_reported_at_declaration() {
    let source = "struct interface I { fun foo() }\nstruct Missing: I {}";
    let result = check(source);
    let diagnostic = result
        .diagnostics
        .iter()
        .find(|d| d.kind == ErrorKind::Conformance)
        .unwrap();
    assert_eq!(diagnostic.span.slice(source), "Missing");
}

#[test]
fn test_cyclic_interface_conformance() {
    let source = r"
        struct interface A: B {}
        struct interface B: A {}
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InvalidDeclaration),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

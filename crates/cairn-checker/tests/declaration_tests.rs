use std::sync::Arc;

use cairn_checker::{
    parse_and_check, parse_and_check_with_config, AccessCheckMode, CheckResult, CheckerConfig,
    ErrorKind, TopLevelDeclarationKind,
};

fn check(source: &str) -> CheckResult {
    parse_and_check(source).unwrap_or_else(|e| panic!("parse failed: {e} in {source:?}"))
}

#[test]
fn test_value_redeclaration_in_same_scope() {
    let result = check("let x = 1\nlet x = 2");
    assert_eq!(
        result.count(ErrorKind::Redeclaration),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_type_redeclaration() {
    let result = check("struct S {}\nstruct S {}");
    assert_eq!(
        result.count(ErrorKind::Redeclaration),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_shadowing_in_inner_scope_is_allowed() {
    let source = r"
        fun f() {
            let x = 1
            if true {
                let x = 2
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
fn test_missing_name_produces_single_diagnostic() {
    let result = check("let x = y");
    assert_eq!(
        result.count(ErrorKind::NotDeclared),
        1,
        "got: {:?}",
        result.diagnostics
    );
    assert_eq!(result.diagnostics.len(), 1);
}

#[test]
fn test_missing_name_does_not_cascade() {
    let source = r"
        fun f(): Int {
            let x = y
            let z = y
            return z
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::NotDeclared),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_not_declared_ordering_annotation_before_initializer() {
    let source = "let x: X = y";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::NotDeclared),
        2,
        "got: {:?}",
        result.diagnostics
    );
    // Type-annotation first, then initializer.
    assert!(result.diagnostics[0].message.contains("type"));
    assert!(result.diagnostics[1].message.contains("variable"));
    assert_eq!(result.diagnostics[0].span.slice(source), "X");
    assert_eq!(result.diagnostics[1].span.slice(source), "y");
}

#[test]
fn test_top_level_declaration_policy() {
    let config = CheckerConfig {
        valid_top_level_declarations: Some(Arc::new(|_| {
            vec![
                TopLevelDeclarationKind::Composite,
                TopLevelDeclarationKind::Import,
            ]
        })),
        ..CheckerConfig::default()
    };
    let result = parse_and_check_with_config("let x = 1\nstruct S {}", &config).unwrap();
    assert_eq!(
        result.count(ErrorKind::InvalidTopLevelDeclaration),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_nested_composite_outside_contract() {
    let source = r"
        struct Outer {
            struct Inner {}
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InvalidNestedDeclaration),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_contract_nesting_is_allowed() {
    let source = r"
        contract C {
            struct Inner {}
            fun make(): Inner {
                return Inner()
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
fn test_nested_type_reachable_through_parent() {
    let source = r"
        contract C {
            struct Inner {}
        }
        fun f(): C.Inner {
            return C.Inner()
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
fn test_field_never_initialized() {
    let source = r"
        struct S {
            let x: Int
            init() {}
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::FieldUninitialized),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_field_assigned_on_every_branch() {
    let source = r"
        struct S {
            let x: Int
            init(b: Bool) {
                if b {
                    self.x = 1
                } else {
                    self.x = 2
                }
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
fn test_field_assigned_on_one_branch_only() {
    let source = r"
        struct S {
            let x: Int
            init(b: Bool) {
                if b {
                    self.x = 1
                }
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::FieldUninitialized),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_field_read_before_assignment() {
    let source = r"
        struct S {
            let x: Int
            init() {
                let y = self.x
                self.x = 1
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::UninitializedFieldAccess),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_constant_field_assigned_twice() {
    let source = r"
        struct S {
            let x: Int
            init() {
                self.x = 1
                self.x = 2
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::AssignmentToConstantMember),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_var_field_may_be_reassigned_in_initializer() {
    let source = r"
        struct S {
            var x: Int
            init() {
                self.x = 1
                self.x = 2
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
fn test_self_used_before_fully_initialized() {
    let source = r"
        fun takes(_ s: S) {}
        struct S {
            let x: Int
            init() {
                takes(self)
                self.x = 1
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::UninitializedUse),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_strict_access_mode_requires_modifiers() {
    let config = CheckerConfig {
        access_check_mode: AccessCheckMode::Strict,
        ..CheckerConfig::default()
    };
    let source = r"
        struct S {
            let x: Int
            init() {
                self.x = 1
            }
        }
    ";
    let result = parse_and_check_with_config(source, &config).unwrap();
    assert_eq!(
        result.count(ErrorKind::InvalidAccess),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_private_member_not_accessible_outside() {
    let source = r"
        struct S {
            priv let x: Int
            init() {
                self.x = 1
            }
        }
        fun f(s: S): Int {
            return s.x
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InvalidAccess),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_contract_field_must_be_storable() {
    let source = r"
        contract C {
            let callback: fun(): Int
            init(callback: fun(): Int) {
                self.callback = callback
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TypeMismatchWithDescription),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_invalid_pragma_forms() {
    let result = check("#allowAccountLinking");
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );

    let result = check(r#"#feature("deprecation-warnings")"#);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );

    let result = check("#feature(1)");
    assert_eq!(
        result.count(ErrorKind::InvalidPragma),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_restricted_type_mixing_kinds_is_ambiguous() {
    let source = r"
        struct interface SI {}
        resource interface RI {}
        fun f(x: {SI, RI}) {}
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::AmbiguousRestrictedType),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_empty_restriction_set_is_ambiguous() {
    let source = "fun f(x: {}) {}";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::AmbiguousRestrictedType),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_restricted_type_accepts_conforming_composite() {
    let source = r"
        struct interface I {
            fun foo(): Int
        }
        struct S: I {
            fun foo(): Int {
                return 1
            }
        }
        fun f(): {I} {
            return S()
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
fn test_restricted_type_member_access() {
    let source = r"
        struct interface I {
            fun foo(): Int
        }
        struct S: I {
            fun foo(): Int {
                return 1
            }
            fun hidden(): Int {
                return 2
            }
        }
        fun f(v: {I}): Int {
            return v.foo()
        }
        fun g(v: {I}): Int {
            return v.hidden()
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::NotDeclaredMember),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

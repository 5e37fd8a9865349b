use cairn_checker::{parse_and_check, CheckResult, ErrorKind};

fn check(source: &str) -> CheckResult {
    parse_and_check(source).unwrap_or_else(|e| panic!("parse failed: {e} in {source:?}"))
}

#[test]
fn test_missing_return_statement() {
    let source = "fun f(): Int {}";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::MissingReturnStatement),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_both_branches_returning_exits() {
    let source = r"
        fun f(b: Bool): Int {
            if b {
                return 1
            } else {
                return 2
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
fn test_literal_true_condition_is_not_a_guaranteed_exit() {
    let source = r"
        fun f(): Int {
            if true {
                return 1
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::MissingReturnStatement),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_never_call_counts_as_exit() {
    let source = r#"
        fun f(): Int {
            panic("unreachable")
        }
    "#;
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_missing_return_value() {
    let source = r"
        fun f(): Int {
            return
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::MissingReturnValue),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_invalid_return_value_in_void_function() {
    let source = r"
        fun f() {
            return 1
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InvalidReturnValue),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_unreachable_statement_after_return() {
    let source = r"
        fun f(): Int {
            return 1
            let x = 2
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::UnreachableStatement),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_if_let_unwraps_optional() {
    let source = r"
        fun f() {
            let x: Int? = 1
            if let y = x {
                let z: Int = y
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
fn test_if_let_on_non_optional_single_diagnostic() {
    let source = r"
        fun f() {
            let x = 1
            if let y = x {
                let z = y
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TypeMismatch),
        1,
        "got: {:?}",
        result.diagnostics
    );
    assert_eq!(result.diagnostics.len(), 1);
}

#[test]
fn test_if_let_binding_not_visible_in_else() {
    let source = r"
        fun f() {
            let x: Int? = 1
            if let y = x {
            } else {
                let z = y
            }
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
fn test_for_in_with_index_binding() {
    let source = r"
        fun f(xs: [Int]) {
            for i, x in xs {
                let a: Int = i
                let b: Int = x
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
fn test_for_over_string_yields_characters() {
    let source = r"
        fun f(s: String) {
            for c in s {
                let ch: Character = c
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
fn test_for_over_reference_yields_element_references() {
    let source = r"
        fun f(xs: &[Int]) {
            for x in xs {
                let r: &Int = x
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
fn test_for_over_resource_array_is_rejected() {
    let source = r"
        resource R {}
        fun f(rs: @[R]) {
            for r in rs {}
            destroy rs
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::UnsupportedResourceForLoop),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_for_over_non_iterable() {
    let source = r"
        fun f(x: Int) {
            for y in x {}
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
fn test_break_in_loop_is_valid() {
    let source = r"
        fun f(b: Bool) {
            while b {
                break
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
fn test_break_inside_nested_function_literal() {
    let source = r"
        fun f(xs: [Int]) {
            for x in xs {
                let g = fun () {
                    break
                }
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::ControlStatement),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_continue_outside_loop() {
    let source = r"
        fun f() {
            continue
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::ControlStatement),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_while_condition_must_be_bool() {
    let source = r"
        fun f() {
            while 1 {}
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
fn test_ternary_condition_and_join() {
    let source = r"
        fun f(b: Bool): Int {
            return b ? 1 : 2
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
fn test_ternary_joins_integers_at_smallest_signed_supertype() {
    let source = r"
        fun f(b: Bool, small: UInt8, signed: Int8): Int16 {
            return b ? small : signed
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
fn test_nil_coalescing() {
    let source = r"
        fun f(x: Int?): Int {
            return x ?? 0
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
fn test_nil_coalescing_requires_optional_left_operand() {
    let source = r"
        fun f(x: Int): Int {
            return x ?? 0
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InvalidBinaryOperands),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_force_unwrap() {
    let source = r"
        fun f(x: Int?): Int {
            return x!
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
fn test_optional_chaining() {
    let source = r"
        struct S {
            let x: Int
            init() {
                self.x = 1
            }
        }
        fun f(s: S?): Int? {
            return s?.x
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
fn test_optional_chaining_on_non_optional() {
    let source = r"
        struct S {
            let x: Int
            init() {
                self.x = 1
            }
        }
        fun f(s: S): Int? {
            return s?.x
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InvalidOptionalChaining),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_assignment_through_optional_chaining() {
    let source = r"
        struct S {
            var x: Int
            init() {
                self.x = 1
            }
        }
        fun f(s: S?) {
            s?.x = 1
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::UnsupportedOptionalChainingAssignment),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_swap_statement() {
    let source = r"
        fun f() {
            var a = 1
            var b = 2
            a <-> b
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
fn test_swap_type_mismatch() {
    let source = r#"
        fun f() {
            var a = 1
            var b = "two"
            a <-> b
        }
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
fn test_assignment_to_constant() {
    let source = r"
        fun f() {
            let x = 1
            x = 2
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::AssignmentToConstant),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_assignment_to_parameter() {
    let source = r"
        fun f(x: Int) {
            x = 2
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::AssignmentToConstant),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_failable_cast_produces_optional() {
    let source = r"
        fun f(x: AnyStruct): Int? {
            return x as? Int
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
fn test_static_cast_requires_subtype() {
    let source = r#"
        fun f(x: String): Int {
            return x as Int
        }
    "#;
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TypeMismatch),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

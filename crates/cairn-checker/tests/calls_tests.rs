use cairn_checker::{parse_and_check, CheckResult, ErrorKind};

fn check(source: &str) -> CheckResult {
    parse_and_check(source).unwrap_or_else(|e| panic!("parse failed: {e} in {source:?}"))
}

#[test]
fn test_missing_argument_label() {
    let source = r"
        fun f(to x: Int) {}
        fun g() {
            f(5)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::MissingArgumentLabel),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_incorrect_argument_label() {
    let source = r"
        fun f(to x: Int) {}
        fun g() {
            f(from: 5)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::IncorrectArgumentLabel),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_unexpected_argument_label() {
    let source = r"
        fun f(_ x: Int) {}
        fun g() {
            f(x: 5)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::IncorrectArgumentLabel),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_parameter_name_doubles_as_label() {
    let source = r"
        fun f(x: Int) {}
        fun g() {
            f(x: 5)
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
fn test_insufficient_arguments() {
    let source = r"
        fun f(x: Int, y: Int) {}
        fun g() {
            f(x: 1)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InsufficientArguments),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_excessive_arguments() {
    let source = r"
        fun f(x: Int) {}
        fun g() {
            f(x: 1, y: 2)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::ExcessiveArguments),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_argument_type_mismatch() {
    let source = r"
        fun f(x: Int) {}
        fun g() {
            f(x: true)
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
fn test_calling_a_non_function() {
    let source = r"
        fun g() {
            let x = 1
            x()
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::NotCallable),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_numeric_conversion_functions() {
    let source = r"
        let a: UInt8 = UInt8(5)
        let b: Int128 = Int128(5)
        let c: UFix64 = UFix64(1)
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_assert_with_optional_message() {
    let source = r#"
        fun f(b: Bool) {
            assert(b)
            assert(b, message: "failed")
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
fn test_explicit_type_argument_on_non_generic_function() {
    let source = r"
        fun f(x: Int) {}
        fun g() {
            f<Int>(x: 1)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TypeParameterTypeMismatch),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_generic_inference_from_argument() {
    let source = r"
        resource R {}
        fun f(account: AuthAccount) {
            let r <- create R()
            account.save(<-r, to: /storage/r)
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
fn test_explicit_type_argument_conflicting_with_inference() {
    let source = r"
        resource R {}
        struct S {}
        fun f(account: AuthAccount) {
            let s = S()
            account.save<@R>(s, to: /storage/s)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TypeParameterTypeMismatch),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_optional_chained_call_produces_optional() {
    let source = r"
        struct S {
            fun value(): Int {
                return 1
            }
        }
        fun f(s: S?): Int? {
            return s?.value()
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
fn test_function_expression_call() {
    let source = r"
        fun f(): Int {
            let double = fun (x: Int): Int {
                return x * 2
            }
            return double(x: 4)
        }
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

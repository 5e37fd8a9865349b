use cairn_checker::{parse_and_check, CheckResult, ErrorKind};

fn check(source: &str) -> CheckResult {
    parse_and_check(source).unwrap_or_else(|e| panic!("parse failed: {e} in {source:?}"))
}

#[test]
fn test_view_calling_impure_function() {
    let source = "fun bar() {}\nview fun foo() { bar() }";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Purity),
        1,
        "got: {:?}",
        result.diagnostics
    );
    assert_eq!(result.diagnostics.len(), 1);
    // The range spans the call site.
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.span.slice(source), "bar()");
}

#[test]
fn test_view_calling_view_is_clean() {
    let source = r"
        view fun bar(): Int {
            return 1
        }
        view fun foo(): Int {
            return bar()
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
fn test_impure_calling_view_is_clean() {
    let source = r"
        view fun bar(): Int {
            return 1
        }
        fun foo(): Int {
            return bar()
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
fn test_view_cannot_assign_to_global() {
    let source = r"
        var total: Int = 0
        view fun bump() {
            total = 5
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Purity),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_view_local_mutation_is_clean() {
    let source = r"
        view fun f(): Int {
            var x = 1
            x = 2
            return x
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
fn test_view_cannot_call_mutating_container_member() {
    let source = r"
        view fun f() {
            let xs: [Int] = [1]
            xs.append(2)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Purity),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_view_may_use_non_mutating_members() {
    let source = r"
        view fun f(xs: [Int]): Bool {
            let n = xs.length
            let combined = xs.concat(xs)
            return combined.contains(1) && n > 0
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
fn test_view_cannot_destroy() {
    let source = r"
        resource R {}
        view fun f(r: @R) {
            destroy r
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Purity),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_view_cannot_emit() {
    let source = r"
        event E()
        view fun f() {
            emit E()
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Purity),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_view_cannot_call_account_mutator() {
    let source = r"
        view fun f(account: AuthAccount) {
            account.unlink(/private/x)
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Purity),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_nested_literal_is_unconstrained_but_uncallable() {
    let source = r"
        view fun f() {
            let g = fun () {
                var x = 1
                x = 2
            }
            g()
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::Purity),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_view_guard_with_panic_is_clean() {
    let source = r#"
        view fun f(x: Int): Int {
            if x < 0 {
                panic("negative")
            }
            return x
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
fn test_view_function_type_subtyping() {
    let source = r"
        view fun pure(): Int {
            return 1
        }
        fun f() {
            let g: fun(): Int = pure
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
fn test_impure_function_is_not_a_view_function_type() {
    let source = r"
        fun impure(): Int {
            return 1
        }
        fun f() {
            let g: view fun(): Int = impure
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

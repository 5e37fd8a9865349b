use cairn_checker::{parse_and_check, CheckResult, ErrorKind};

fn check(source: &str) -> CheckResult {
    parse_and_check(source).unwrap_or_else(|e| panic!("parse failed: {e} in {source:?}"))
}

fn count(result: &CheckResult, kind: ErrorKind) -> usize {
    result.count(kind)
}

#[test]
fn test_resource_move_second_value() {
    let source = r"
        resource R {}
        let x <- create R()
        var y <- create R()
        let z <- y <- x
        let r <- y
    ";
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "expected no diagnostics, got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_use_after_move_in_second_value_form() {
    let source = r"
        resource R {}
        let x <- create R()
        var y <- create R()
        let z <- y <- x
        let r <- x
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::ResourceUseAfterInvalidation),
        1,
        "expected exactly one use-after-invalidation, got: {:?}",
        result.diagnostics
    );
    assert_eq!(result.diagnostics.len(), 1);
}

#[test]
fn test_copy_transfer_of_resource() {
    let source = r"
        resource R {}
        let x = create R()
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::IncorrectTransferOperation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_use_after_destroy() {
    let source = r"
        resource R {}
        fun f() {
            let x <- create R()
            destroy x
            destroy x
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::ResourceUseAfterInvalidation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_resource_loss_at_scope_exit() {
    let source = r"
        resource R {}
        fun f() {
            let x <- create R()
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::ResourceLoss),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_resource_parameter_must_be_consumed() {
    let source = r"
        resource R {}
        fun f(_ r: @R) {}
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::ResourceLoss),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_branch_merge_becomes_potentially_lost() {
    let source = r"
        resource R {}
        fun f(b: Bool) {
            let x <- create R()
            if b {
                destroy x
            }
            destroy x
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::ResourceUseAfterInvalidation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_both_branches_consume_is_clean() {
    let source = r"
        resource R {}
        fun f(b: Bool) {
            let x <- create R()
            if b {
                destroy x
            } else {
                destroy x
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
fn test_exiting_branch_does_not_poison_merge() {
    let source = r"
        resource R {}
        fun f(b: Bool) {
            let x <- create R()
            if b {
                destroy x
                return
            }
            destroy x
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
fn test_move_inside_loop_body() {
    let source = r"
        resource R {}
        fun f(b: Bool) {
            let x <- create R()
            while b {
                destroy x
                break
            }
            destroy x
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::ResourceUseAfterInvalidation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_return_resource_requires_move_operator() {
    let source = r"
        resource R {}
        fun f(): @R {
            let x <- create R()
            return x
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::IncorrectTransferOperation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_return_with_move_is_clean() {
    let source = r"
        resource R {}
        fun f(): @R {
            let x <- create R()
            return <-x
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
fn test_argument_requires_move_operator() {
    let source = r"
        resource R {}
        fun consume(_ r: @R) {
            destroy r
        }
        fun f() {
            let x <- create R()
            consume(x)
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::IncorrectTransferOperation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_argument_with_move_is_clean() {
    let source = r"
        resource R {}
        fun consume(_ r: @R) {
            destroy r
        }
        fun f() {
            let x <- create R()
            consume(<-x)
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
fn test_second_value_with_copy_inner_transfer() {
    let source = r"
        resource R {}
        fun f() {
            var y <- create R()
            let x <- create R()
            let z <- y = x
            destroy z
            destroy y
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::IncorrectTransferOperation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_second_value_requires_assignable_slot() {
    let source = r"
        resource R {}
        let z <- create R() <- create R()
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::InvalidAssignmentTarget),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_non_constant_index_move_marks_container_indeterminate() {
    let source = r"
        resource R {}
        fun f(rs: @[R], i: Int) {
            let x <- rs[i]
            destroy x
            let y <- rs[0]
            destroy y
            destroy rs
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::ResourceUseAfterInvalidation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_constant_index_move_tracks_slot() {
    let source = r"
        resource R {}
        fun f(rs: @[R; 2]) {
            let x <- rs[0]
            destroy x
            let y <- rs[0]
            destroy y
            destroy rs
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::ResourceUseAfterInvalidation),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_distinct_constant_slots_are_independent() {
    let source = r"
        resource R {}
        fun f(rs: @[R; 2]) {
            let x <- rs[0]
            destroy x
            let y <- rs[1]
            destroy y
            destroy rs
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
fn test_struct_cannot_hold_resource_field() {
    let source = r"
        resource R {}
        struct S {
            let r: @R
            init(r: @R) {
                self.r <- r
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::InvalidDeclaration),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_any_resource_requires_resource_value() {
    let source = r"
        let x: @AnyResource <- 5
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::NonResourceType),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_destroy_of_non_resource() {
    let source = r"
        fun f() {
            let x = 1
            destroy x
        }
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::NonResourceType),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_create_requires_resource_constructor() {
    let source = r"
        struct S {}
        let s = create S()
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::NonResourceType),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_resource_constructor_requires_create() {
    let source = r"
        resource R {}
        let r <- R()
    ";
    let result = check(source);
    assert_eq!(
        count(&result, ErrorKind::MissingCreate),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

use cairn_checker::{parse_and_check, CheckResult, ErrorKind};

fn check(source: &str) -> CheckResult {
    parse_and_check(source).unwrap_or_else(|e| panic!("parse failed: {e} in {source:?}"))
}

#[test]
fn test_well_formed_transaction() {
    let source = r"
        transaction {
            let x: Int
            prepare(acct: AuthAccount) {
                self.x = 1
            }
            execute {
                let y = self.x
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
fn test_transaction_field_access_modifier() {
    let source = r"
        transaction {
            pub let x: Int
            prepare(acct: AuthAccount) {
                self.x = 1
            }
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InvalidTransactionFieldAccessModifier),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_prepare_parameter_must_be_auth_account() {
    let source = r"
        transaction {
            prepare(x: Int) {}
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InvalidTransactionPrepareParameterType),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_transaction_with_fields_requires_prepare() {
    let source = r"
        transaction {
            let x: Int
            execute {}
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::TransactionMissingPrepare),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_unknown_transaction_block() {
    let source = r"
        transaction {
            prepare(acct: AuthAccount) {}
            cleanup {}
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InvalidTransactionBlock),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_transaction_field_not_initialized_in_prepare() {
    let source = r"
        transaction {
            let x: Int
            prepare(acct: AuthAccount) {}
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
fn test_resource_field_must_be_invalidated() {
    let source = r"
        resource R {}
        transaction {
            let r: @R
            prepare(acct: AuthAccount) {
                self.r <- create R()
            }
            execute {}
        }
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::ResourceFieldNotInvalidated),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_resource_field_destroyed_in_execute_is_clean() {
    let source = r"
        resource R {}
        transaction {
            let r: @R
            prepare(acct: AuthAccount) {
                self.r <- create R()
            }
            execute {
                destroy self.r
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
fn test_transaction_storage_interaction() {
    let source = r"
        resource R {}
        transaction {
            let r: @R
            prepare(acct: AuthAccount) {
                self.r <- create R()
                acct.save(<-self.r, to: /storage/r)
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

use cairn_checker::{parse_and_check, CheckResult, ErrorKind};

fn check(source: &str) -> CheckResult {
    parse_and_check(source).unwrap_or_else(|e| panic!("parse failed: {e} in {source:?}"))
}

#[test]
fn test_integer_literal_in_range() {
    let result = check("let x: Int8 = 127\nlet y: Int8 = -128\nlet z: UInt8 = 255");
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_integer_literal_out_of_range() {
    for source in [
        "let x: Int8 = 128",
        "let x: Int8 = -129",
        "let x: UInt8 = 256",
        "let x: UInt8 = -1",
        "let x: Int16 = 40000",
        "let x: UInt64 = 18446744073709551616",
    ] {
        let result = check(source);
        assert_eq!(
            result.count(ErrorKind::InvalidIntegerLiteralRange),
            1,
            "source {source:?} got: {:?}",
            result.diagnostics
        );
    }
}

#[test]
fn test_256_bit_integer_bounds() {
    let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
    let result = check(&format!("let x: UInt256 = {max}"));
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );

    let over = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
    let result = check(&format!("let x: UInt256 = {over}"));
    assert_eq!(
        result.count(ErrorKind::InvalidIntegerLiteralRange),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_arbitrary_precision_int_has_no_range() {
    let result = check("let x: Int = 123456789012345678901234567890123456789012345678901234567890");
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_fixed_point_scale_overflow_in_declaration() {
    for fixed_type in ["Fix64", "UFix64"] {
        let source = format!("let x: {fixed_type} = 1.123456789");
        let result = check(&source);
        assert_eq!(
            result.count(ErrorKind::InvalidFixedPointLiteralScale),
            1,
            "source {source:?} got: {:?}",
            result.diagnostics
        );
    }
}

#[test]
fn test_fixed_point_scale_overflow_in_declaration_and_bare_expression() {
    let source = r"
        let x: Fix64 = 1.123456789
        let y = 1.123456789
    ";
    let result = check(source);
    assert_eq!(
        result.count(ErrorKind::InvalidFixedPointLiteralScale),
        2,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_fixed_point_scale_at_limit() {
    let result = check("let x: Fix64 = 1.12345678\nlet y: UFix64 = 0.00000001");
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_fixed_point_range() {
    let result = check("let x: Fix64 = 92233720368.54775807");
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );

    let result = check("let x: Fix64 = 92233720368.54775808");
    assert_eq!(
        result.count(ErrorKind::InvalidFixedPointLiteralRange),
        1,
        "got: {:?}",
        result.diagnostics
    );

    let result = check("let x: UFix64 = -0.5");
    assert_eq!(
        result.count(ErrorKind::InvalidFixedPointLiteralRange),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_address_literal_must_be_hexadecimal() {
    let result = check("let a: Address = 0x1");
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );

    let result = check("let a: Address = 1");
    assert_eq!(
        result.count(ErrorKind::InvalidAddressLiteral),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_address_literal_overflow() {
    let result = check("let a: Address = 0x10000000000000000");
    assert_eq!(
        result.count(ErrorKind::InvalidAddressLiteral),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_path_domains() {
    let result = check("let a = /storage/x\nlet b = /public/x\nlet c = /private/x");
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );

    let result = check("let p = /bogus/x");
    assert_eq!(
        result.count(ErrorKind::InvalidPathDomain),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_path_subtyping() {
    let result = check("let p: Path = /storage/x");
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_radix_literals() {
    let result = check("let x: Int = 0xFF\nlet y: Int = 0b1010\nlet z: Int = 0o17");
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_array_literal_element_coercion() {
    let result = check("let xs: [Int8] = [1, 2, 3]");
    assert!(
        result.diagnostics.is_empty(),
        "got: {:?}",
        result.diagnostics
    );

    let result = check("let xs: [Int8] = [1, 300]");
    assert_eq!(
        result.count(ErrorKind::InvalidIntegerLiteralRange),
        1,
        "got: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_dictionary_key_must_be_hashable() {
    let source = r"
        fun f(k: fun(): Int) {
            let d: {fun(): Int: Int} = {}
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

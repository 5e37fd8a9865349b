use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cairn_checker::{
    parse_and_check_with_config, CheckerConfig, ErrorKind, ResolvedImport,
};

#[test]
fn test_global_value_and_type_tables() {
    let source = r"
        struct S {}
        fun f(): Int {
            return 1
        }
        let x = 1
    ";
    let result = parse_and_check_with_config(source, &CheckerConfig::default()).unwrap();
    assert!(result.diagnostics.is_empty(), "got: {:?}", result.diagnostics);

    let elaboration = &result.elaboration;
    assert!(elaboration.global_types.contains_key("S"));
    let names: Vec<&String> = elaboration.global_values.keys().collect();
    assert_eq!(names, vec!["S", "f", "x"]);
}

#[test]
fn test_position_info_point_queries() {
    let source = "let x = 1\nlet y = x";
    let config = CheckerConfig {
        position_info_enabled: true,
        ..CheckerConfig::default()
    };
    let result = parse_and_check_with_config(source, &config).unwrap();
    assert!(result.diagnostics.is_empty(), "got: {:?}", result.diagnostics);

    // The use of `x` on the second line.
    let use_offset = u32::try_from(source.rfind('x').unwrap()).unwrap();
    let ranges = result.elaboration.ranges_at(use_offset);
    assert!(
        !ranges.is_empty(),
        "expected an occurrence at offset {use_offset}"
    );

    // Occurrences are ordered by start position.
    let occurrences = result.elaboration.occurrences().unwrap();
    for pair in occurrences.windows(2) {
        assert!(pair[0].span.start <= pair[1].span.start);
    }
}

#[test]
fn test_position_info_disabled_by_default() {
    let result =
        parse_and_check_with_config("let x = 1", &CheckerConfig::default()).unwrap();
    assert!(result.elaboration.occurrences().is_none());
}

#[test]
fn test_import_handler_resolves_names() {
    let config = CheckerConfig {
        import_handler: Some(Arc::new(|_, _| {
            Some(ResolvedImport {
                value_names: vec!["Token".to_string()],
            })
        })),
        ..CheckerConfig::default()
    };
    let source = "import Token from 0x01\nlet t = Token";
    let result = parse_and_check_with_config(source, &config).unwrap();
    assert!(result.diagnostics.is_empty(), "got: {:?}", result.diagnostics);
    assert_eq!(result.elaboration.imports, vec!["0x01".to_string()]);
}

#[test]
fn test_unresolved_import_does_not_cascade() {
    let source = "import Token from 0x01\nlet t = Token";
    let result =
        parse_and_check_with_config(source, &CheckerConfig::default()).unwrap();
    assert_eq!(result.count(ErrorKind::NotDeclared), 0);
}

#[test]
fn test_memory_gauge_is_invoked() {
    let counter = Arc::new(AtomicU64::new(0));
    let gauge_counter = Arc::clone(&counter);
    let config = CheckerConfig {
        memory_gauge: Some(Arc::new(move |_, amount| {
            gauge_counter.fetch_add(amount, Ordering::Relaxed);
        })),
        ..CheckerConfig::default()
    };
    parse_and_check_with_config("struct S {}\nlet x = 1", &config).unwrap();
    assert!(counter.load(Ordering::Relaxed) > 0);
}

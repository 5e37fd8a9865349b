use cairn_ast::{
    CastOp, CompositeKind, Declaration, ExpressionKind, IfTest, Member, Statement, Transfer,
    TypeSyntax,
};
use cairn_parser::parse_program;

fn parse(source: &str) -> cairn_ast::Program {
    parse_program(source).unwrap_or_else(|e| panic!("parse failed: {e} in {source:?}"))
}

#[test]
fn test_parse_composite_kinds() {
    let program = parse(
        r"
        struct S {}
        resource R {}
        contract C {}
        event E(a: Int)
        attachment A for R {}
        ",
    );
    assert_eq!(program.declarations.len(), 5);
    let kinds: Vec<CompositeKind> = program
        .declarations
        .iter()
        .filter_map(|d| match d {
            Declaration::Composite(c) => Some(c.kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            CompositeKind::Struct,
            CompositeKind::Resource,
            CompositeKind::Contract,
            CompositeKind::Event,
            CompositeKind::Attachment,
        ]
    );
}

#[test]
fn test_event_parameters_become_fields_and_initializer() {
    let program = parse("event Transfer(from: Address, amount: Int)");
    let Declaration::Composite(event) = &program.declarations[0] else {
        panic!("expected composite");
    };
    let fields = event
        .members
        .iter()
        .filter(|m| matches!(m, Member::Field(_)))
        .count();
    let initializers = event
        .members
        .iter()
        .filter(|m| matches!(m, Member::Initializer(_)))
        .count();
    assert_eq!(fields, 2);
    assert_eq!(initializers, 1);
}

#[test]
fn test_parse_interface_with_requirements() {
    let program = parse(
        r"
        resource interface Vault {
            fun withdraw(amount: Int): Int
            fun deposit(_ value: Int)
        }
        ",
    );
    let Declaration::Interface(interface) = &program.declarations[0] else {
        panic!("expected interface");
    };
    assert_eq!(interface.kind, CompositeKind::Resource);
    assert_eq!(interface.members.len(), 2);
    for member in &interface.members {
        let Member::Function(function) = member else {
            panic!("expected function member");
        };
        assert!(function.body.is_none());
    }
}

#[test]
fn test_second_value_transfer() {
    let program = parse("let z <- y <- x");
    let Declaration::Variable(declaration) = &program.declarations[0] else {
        panic!("expected variable");
    };
    assert_eq!(declaration.transfer, Transfer::Move);
    assert_eq!(declaration.second_transfer, Some(Transfer::Move));
    assert!(declaration.second_value.is_some());
    assert!(matches!(
        declaration.value.kind,
        ExpressionKind::Identifier(_)
    ));
}

#[test]
fn test_if_let_binding() {
    let program = parse("fun f() { if let y = x { } else { } }");
    let Declaration::Function(function) = &program.declarations[0] else {
        panic!("expected function");
    };
    let body = function.body.as_ref().unwrap();
    let Statement::If(if_statement) = &body.statements[0] else {
        panic!("expected if");
    };
    assert!(matches!(if_statement.test, IfTest::Binding { .. }));
    assert!(if_statement.else_block.is_some());
}

#[test]
fn test_cast_adjacency() {
    // `as?` must be adjacent; a separated `?` belongs to a ternary.
    let program = parse("let a = x as? Int");
    let Declaration::Variable(declaration) = &program.declarations[0] else {
        panic!("expected variable");
    };
    let ExpressionKind::Casting { op, .. } = &declaration.value.kind else {
        panic!("expected cast");
    };
    assert_eq!(*op, CastOp::Failable);

    let program = parse("let a = b ? c : d");
    let Declaration::Variable(declaration) = &program.declarations[0] else {
        panic!("expected variable");
    };
    assert!(matches!(
        declaration.value.kind,
        ExpressionKind::Ternary { .. }
    ));
}

#[test]
fn test_generic_invocation_vs_comparison() {
    let program = parse("let a = capability.borrow<&R>()");
    let Declaration::Variable(declaration) = &program.declarations[0] else {
        panic!("expected variable");
    };
    let ExpressionKind::Invocation { type_arguments, .. } = &declaration.value.kind else {
        panic!("expected invocation");
    };
    assert_eq!(type_arguments.len(), 1);

    // A bare `<` stays a comparison.
    let program = parse("let a = x < y");
    let Declaration::Variable(declaration) = &program.declarations[0] else {
        panic!("expected variable");
    };
    assert!(matches!(
        declaration.value.kind,
        ExpressionKind::Binary { .. }
    ));
}

#[test]
fn test_restricted_type_brace_adjacency() {
    // `R{I}` is a restriction; `fun f(): R {` opens the body.
    let program = parse("let x: R{I} = y");
    let Declaration::Variable(declaration) = &program.declarations[0] else {
        panic!("expected variable");
    };
    let annotation = declaration.type_annotation.as_ref().unwrap();
    assert!(matches!(annotation.syntax, TypeSyntax::Restricted { .. }));

    let program = parse("fun f(): R { return y }");
    let Declaration::Function(function) = &program.declarations[0] else {
        panic!("expected function");
    };
    assert!(function.body.is_some());
    assert!(matches!(
        function.return_type.as_ref().unwrap().syntax,
        TypeSyntax::Named(_)
    ));
}

#[test]
fn test_reference_and_auth_types() {
    let program = parse("let r = &x as auth(Withdraw) &Int");
    let Declaration::Variable(declaration) = &program.declarations[0] else {
        panic!("expected variable");
    };
    let ExpressionKind::Reference {
        type_annotation, ..
    } = &declaration.value.kind
    else {
        panic!("expected reference expression");
    };
    let TypeSyntax::Reference { authorization, .. } = &type_annotation.syntax else {
        panic!("expected reference type");
    };
    assert_eq!(authorization.as_ref().unwrap().entitlements.len(), 1);
}

#[test]
fn test_transaction_blocks() {
    let program = parse(
        r"
        transaction {
            let x: Int
            prepare(acct: AuthAccount) { self.x = 1 }
            execute { }
            cleanup { }
        }
        ",
    );
    let Declaration::Transaction(transaction) = &program.declarations[0] else {
        panic!("expected transaction");
    };
    assert_eq!(transaction.fields.len(), 1);
    assert!(transaction.prepare.is_some());
    assert!(transaction.execute.is_some());
    assert_eq!(transaction.unknown_blocks.len(), 1);
    assert_eq!(transaction.unknown_blocks[0].0.name, "cleanup");
}

#[test]
fn test_path_and_dictionary_literals() {
    let program = parse(r#"let p = /storage/vault
let d = {"a": 1, "b": 2}"#);
    let Declaration::Variable(path_declaration) = &program.declarations[0] else {
        panic!("expected variable");
    };
    assert!(matches!(
        path_declaration.value.kind,
        ExpressionKind::PathLiteral { .. }
    ));
    let Declaration::Variable(dict_declaration) = &program.declarations[1] else {
        panic!("expected variable");
    };
    let ExpressionKind::DictionaryLiteral(entries) = &dict_declaration.value.kind else {
        panic!("expected dictionary literal");
    };
    assert_eq!(entries.len(), 2);
}

#[test]
fn test_keyword_argument_labels() {
    let program = parse("let v = account.load(from: /storage/x)");
    let Declaration::Variable(declaration) = &program.declarations[0] else {
        panic!("expected variable");
    };
    let ExpressionKind::Invocation { arguments, .. } = &declaration.value.kind else {
        panic!("expected invocation");
    };
    assert_eq!(arguments[0].label.as_ref().unwrap().name, "from");
}

#[test]
fn test_node_ids_are_unique_and_dense() {
    let program = parse("fun f(x: Int): Int { return x + 1 }");
    assert!(program.node_count > 0);
}

#[test]
fn test_parse_errors() {
    assert!(parse_program("let x = ").is_err());
    assert!(parse_program(r#"let s = "unterminated"#).is_err());
    assert!(parse_program("fun {}").is_err());
    assert!(parse_program("struct S { 5 }").is_err());
}

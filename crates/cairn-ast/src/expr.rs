//! Expression nodes.

use cairn_common::numeric::{FixedPointValue, IntegerValue};
use cairn_common::span::Span;
use serde::Serialize;

use crate::stmt::Block;
use crate::typ::TypeAnnotation;
use crate::{Identifier, NodeId, Parameter, Purity};

/// An expression node: stable id, source span, and kind.
#[derive(Clone, Debug, Serialize)]
pub struct Expression {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExpressionKind,
}

#[derive(Clone, Debug, Serialize)]
pub enum ExpressionKind {
    Identifier(Identifier),
    IntegerLiteral(IntegerValue),
    FixedPointLiteral(FixedPointValue),
    StringLiteral(String),
    BoolLiteral(bool),
    NilLiteral,
    /// `/domain/identifier`
    PathLiteral {
        domain: Identifier,
        identifier: Identifier,
    },
    ArrayLiteral(Vec<Expression>),
    DictionaryLiteral(Vec<(Expression, Expression)>),
    /// `target.name` or `target?.name`
    Member {
        target: Box<Expression>,
        optional: bool,
        name: Identifier,
    },
    /// `target[index]`
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },
    /// `target<T1, T2>(label: value, ...)`
    Invocation {
        target: Box<Expression>,
        type_arguments: Vec<TypeAnnotation>,
        arguments: Vec<Argument>,
    },
    /// `create C(...)`
    Create { invocation: Box<Expression> },
    /// `destroy e`
    Destroy { value: Box<Expression> },
    /// `&e as T`
    Reference {
        value: Box<Expression>,
        type_annotation: TypeAnnotation,
    },
    Unary {
        op: UnaryOp,
        value: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `test ? then : else`
    Ternary {
        test: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
    },
    /// `e as T`, `e as? T`, `e as! T`
    Casting {
        value: Box<Expression>,
        op: CastOp,
        type_annotation: TypeAnnotation,
    },
    /// `e!`
    ForceUnwrap { value: Box<Expression> },
    /// `fun (x: T): U { ... }` / `view fun (...) { ... }`
    Function {
        purity: Purity,
        parameters: Vec<Parameter>,
        return_type: Option<TypeAnnotation>,
        body: Block,
    },
}

/// A call argument: optional label plus value.
#[derive(Clone, Debug, Serialize)]
pub struct Argument {
    pub span: Span,
    pub label: Option<Identifier>,
    pub value: Expression,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// `-e`
    Minus,
    /// `!e`
    Not,
    /// `<-e`, the move operator in value position (arguments, array
    /// elements)
    Move,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
    /// `??`
    NilCoalesce,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::NilCoalesce => "??",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CastOp {
    /// `as` - static cast, requires subtyping.
    Static,
    /// `as?` - failable downcast, produces an optional.
    Failable,
    /// `as!` - forced downcast.
    Forced,
}

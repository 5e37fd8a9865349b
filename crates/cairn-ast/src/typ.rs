//! Type annotation nodes.

use cairn_common::numeric::IntegerValue;
use cairn_common::span::Span;
use serde::Serialize;

use crate::{Identifier, Purity};

/// A type annotation as written in source: optional `@` resource marker
/// plus the type syntax.
#[derive(Clone, Debug, Serialize)]
pub struct TypeAnnotation {
    pub span: Span,
    /// `@T` - the annotated type must be a resource.
    pub is_resource: bool,
    pub syntax: TypeSyntax,
}

/// The syntactic forms of types.
#[derive(Clone, Debug, Serialize)]
pub enum TypeSyntax {
    /// `Foo` or `Foo.Bar` (nested type path).
    Named(Vec<Identifier>),
    /// `Foo<T1, T2>` - instantiation of a parameterized built-in.
    Instantiation {
        base: Identifier,
        type_arguments: Vec<TypeAnnotation>,
    },
    /// `T?`
    Optional(Box<TypeAnnotation>),
    /// `[T]`
    VariableArray(Box<TypeAnnotation>),
    /// `[T; N]`
    ConstantArray {
        element: Box<TypeAnnotation>,
        size: IntegerValue,
    },
    /// `{K: V}`
    Dictionary {
        key: Box<TypeAnnotation>,
        value: Box<TypeAnnotation>,
    },
    /// `&T`, `auth &T`, `auth(E1, E2) &T`
    Reference {
        authorization: Option<Authorization>,
        referenced: Box<TypeAnnotation>,
    },
    /// `T{I1, I2}` or `{I1, I2}`
    Restricted {
        base: Option<Box<TypeAnnotation>>,
        restrictions: Vec<TypeAnnotation>,
    },
    /// `fun (T1, T2): U`, `view fun (T): U`
    Function {
        purity: Purity,
        parameters: Vec<TypeAnnotation>,
        return_type: Box<TypeAnnotation>,
    },
}

/// The `auth` clause of a reference type.
#[derive(Clone, Debug, Serialize)]
pub struct Authorization {
    pub span: Span,
    /// Entitlement names; empty for bare `auth`.
    pub entitlements: Vec<Identifier>,
}

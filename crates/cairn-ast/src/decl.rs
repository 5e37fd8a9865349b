//! Declaration nodes: composites, interfaces, functions, fields,
//! transactions, imports, and pragmas.

use cairn_common::span::Span;
use serde::Serialize;

use crate::expr::Expression;
use crate::stmt::{Block, VariableDeclaration};
use crate::typ::TypeAnnotation;
use crate::{Access, CompositeKind, Identifier, NodeId, Purity, VariableKind};

/// A top-level or nested declaration.
#[derive(Clone, Debug, Serialize)]
pub enum Declaration {
    Composite(CompositeDeclaration),
    Interface(InterfaceDeclaration),
    Function(FunctionDeclaration),
    Variable(Box<VariableDeclaration>),
    Transaction(TransactionDeclaration),
    Import(ImportDeclaration),
    Pragma(PragmaDeclaration),
}

impl Declaration {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Declaration::Composite(d) => d.span,
            Declaration::Interface(d) => d.span,
            Declaration::Function(d) => d.span,
            Declaration::Variable(d) => d.span,
            Declaration::Transaction(d) => d.span,
            Declaration::Import(d) => d.span,
            Declaration::Pragma(d) => d.span,
        }
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        match self {
            Declaration::Composite(d) => d.id,
            Declaration::Interface(d) => d.id,
            Declaration::Function(d) => d.id,
            Declaration::Variable(d) => d.id,
            Declaration::Transaction(d) => d.id,
            Declaration::Import(d) => d.id,
            Declaration::Pragma(d) => d.id,
        }
    }
}

/// A `struct` / `resource` / `contract` / `event` / `attachment`
/// declaration.
#[derive(Clone, Debug, Serialize)]
pub struct CompositeDeclaration {
    pub id: NodeId,
    pub span: Span,
    pub access: Access,
    pub kind: CompositeKind,
    pub identifier: Identifier,
    /// `attachment A for Base` - the base type.
    pub base_type: Option<TypeAnnotation>,
    /// Declared interface conformances.
    pub conformances: Vec<TypeAnnotation>,
    /// Members in declaration order.
    pub members: Vec<Member>,
}

/// A `struct interface` / `resource interface` / `contract interface`
/// declaration.
#[derive(Clone, Debug, Serialize)]
pub struct InterfaceDeclaration {
    pub id: NodeId,
    pub span: Span,
    pub access: Access,
    pub kind: CompositeKind,
    pub identifier: Identifier,
    /// Interfaces this interface inherits from.
    pub conformances: Vec<TypeAnnotation>,
    pub members: Vec<Member>,
}

/// A member of a composite or interface body, in declaration order.
#[derive(Clone, Debug, Serialize)]
pub enum Member {
    Field(FieldDeclaration),
    Initializer(SpecialFunctionDeclaration),
    Function(FunctionDeclaration),
    Composite(CompositeDeclaration),
    Interface(InterfaceDeclaration),
}

/// A field inside a composite, interface, event, or transaction.
#[derive(Clone, Debug, Serialize)]
pub struct FieldDeclaration {
    pub id: NodeId,
    pub span: Span,
    pub access: Access,
    pub kind: VariableKind,
    pub identifier: Identifier,
    pub type_annotation: TypeAnnotation,
}

/// An `init` block (or transaction `prepare`): a function-like member with
/// no name of its own and no return type.
#[derive(Clone, Debug, Serialize)]
pub struct SpecialFunctionDeclaration {
    pub id: NodeId,
    pub span: Span,
    pub purity: Purity,
    pub parameters: Vec<Parameter>,
    pub body: Option<Block>,
}

/// A function declaration, global or member.
#[derive(Clone, Debug, Serialize)]
pub struct FunctionDeclaration {
    pub id: NodeId,
    pub span: Span,
    pub access: Access,
    pub purity: Purity,
    pub identifier: Identifier,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeAnnotation>,
    /// Interface requirements may omit the body.
    pub body: Option<Block>,
}

/// A single parameter: `label name: Type`.
///
/// The argument label is the explicit label token when present (`_` means
/// "no label at the call site"); when absent the parameter name doubles as
/// the label.
#[derive(Clone, Debug, Serialize)]
pub struct Parameter {
    pub span: Span,
    pub label: Option<Identifier>,
    pub name: Identifier,
    pub type_annotation: TypeAnnotation,
}

impl Parameter {
    /// The label callers must write, or `None` for `_`-labelled parameters.
    #[must_use]
    pub fn effective_label(&self) -> Option<&str> {
        match &self.label {
            Some(label) if label.name == "_" => None,
            Some(label) => Some(&label.name),
            None => Some(&self.name.name),
        }
    }
}

/// A `transaction { ... }` declaration.
#[derive(Clone, Debug, Serialize)]
pub struct TransactionDeclaration {
    pub id: NodeId,
    pub span: Span,
    pub fields: Vec<FieldDeclaration>,
    pub prepare: Option<SpecialFunctionDeclaration>,
    pub execute: Option<Block>,
    /// Block identifiers other than `prepare`/`execute`, kept for
    /// diagnostics.
    pub unknown_blocks: Vec<(Identifier, Block)>,
}

/// `import A, B from 0x01` or `import A from "location"`.
#[derive(Clone, Debug, Serialize)]
pub struct ImportDeclaration {
    pub id: NodeId,
    pub span: Span,
    pub identifiers: Vec<Identifier>,
    pub location: ImportLocation,
}

/// Where an import resolves from.
#[derive(Clone, Debug, Serialize)]
pub enum ImportLocation {
    Address(String),
    Named(Identifier),
}

/// A `#identifier(...)` pragma; the checker validates the expression form.
#[derive(Clone, Debug, Serialize)]
pub struct PragmaDeclaration {
    pub id: NodeId,
    pub span: Span,
    pub expression: Expression,
}

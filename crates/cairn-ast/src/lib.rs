//! Abstract syntax tree for the Cairn contract language.
//!
//! The parser produces a [`Program`]: an owned tree of typed nodes. Every
//! declaration, statement, and expression carries a stable [`NodeId`]
//! handed out by the parser; the checker keys its elaboration tables on
//! node identity, so ids must be unique within a program and stable across
//! repeated checks of the same parse.

pub mod decl;
pub mod expr;
pub mod stmt;
pub mod typ;

pub use decl::*;
pub use expr::*;
pub use stmt::*;
pub use typ::*;

use cairn_common::span::Span;
use serde::Serialize;

/// Stable identity of an AST node within one program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const DUMMY: NodeId = NodeId(u32::MAX);
}

/// An identifier occurrence with its source span.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// Access modifier on declarations and members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Access {
    /// No modifier written.
    #[default]
    NotSpecified,
    Priv,
    Pub,
    /// `pub(set)` - publicly readable and externally writable.
    PubSet,
    AccessAll,
    AccessSelf,
    AccessContract,
    AccessAccount,
}

impl Access {
    /// Whether the member may be written through a reference from outside
    /// the declaring composite.
    #[must_use]
    pub const fn allows_external_mutation(self) -> bool {
        matches!(self, Access::PubSet)
    }
}

/// `let` vs `var`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VariableKind {
    Let,
    Var,
}

/// The transfer operator used in a declaration or assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Transfer {
    /// `=`
    Copy,
    /// `<-`
    Move,
}

/// Kind of a composite or interface declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CompositeKind {
    Struct,
    Resource,
    Contract,
    Event,
    Attachment,
}

impl CompositeKind {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            CompositeKind::Struct => "struct",
            CompositeKind::Resource => "resource",
            CompositeKind::Contract => "contract",
            CompositeKind::Event => "event",
            CompositeKind::Attachment => "attachment",
        }
    }
}

/// Function purity as declared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Purity {
    #[default]
    Impure,
    View,
}

impl Purity {
    #[must_use]
    pub const fn is_view(self) -> bool {
        matches!(self, Purity::View)
    }
}

/// A parsed program: the ordered list of top-level declarations.
#[derive(Clone, Debug, Serialize)]
pub struct Program {
    pub declarations: Vec<Declaration>,
    /// Total number of node ids handed out by the parser; elaboration
    /// tables size themselves from this.
    pub node_count: u32,
}

//! Diagnostic types for the semantic checker.
//!
//! Every user-visible checker failure is a [`Diagnostic`]: a kind from the
//! closed [`ErrorKind`] taxonomy, a primary source span, a printable
//! message, and optional secondary [`Note`]s (e.g. the list of missing
//! members attached to a conformance error).
//!
//! Diagnostics are ordered by emission; the checker emits them in a fixed
//! traversal order of the program so repeated runs produce identical lists.

use serde::Serialize;

use crate::span::Span;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

/// The kind of program entity a name lookup expected to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DeclarationKind {
    Value,
    Type,
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclarationKind::Value => write!(f, "variable"),
            DeclarationKind::Type => write!(f, "type"),
        }
    }
}

/// The closed taxonomy of checker error kinds.
///
/// Kind names are part of the checker's public contract: hosts and tests
/// match on them, while message texts are presentation only (except the
/// conformance secondary message, which is stable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    // Declaration / scope
    Redeclaration,
    NotDeclared,
    NotDeclaredMember,
    InvalidDeclaration,
    InvalidTopLevelDeclaration,
    InvalidNestedDeclaration,

    // Types / values
    TypeMismatch,
    TypeMismatchWithDescription,
    TypeAnnotationRequired,
    TypeParameterTypeInference,
    TypeParameterTypeMismatch,
    InvalidUnaryOperand,
    InvalidBinaryOperands,
    NonReferenceTypeReference,
    OptionalTypeReference,
    AmbiguousRestrictedType,
    InvalidOptionalChaining,
    UnsupportedOptionalChainingAssignment,
    InvalidPathDomain,
    InvalidAddressLiteral,
    InvalidIntegerLiteralRange,
    InvalidFixedPointLiteralRange,
    InvalidFixedPointLiteralScale,
    MissingArgumentLabel,
    IncorrectArgumentLabel,
    InsufficientArguments,
    ExcessiveArguments,
    ArgumentCount,
    InvalidAssignmentTarget,
    AssignmentToConstant,
    AssignmentToConstantMember,
    ReadOnlyTargetAssignment,
    ExternalMutation,
    InvalidAccess,
    InvalidPragma,
    NotCallable,

    // Control flow
    ControlStatement,
    MissingReturnStatement,
    MissingReturnValue,
    InvalidReturnValue,
    UnreachableStatement,

    // Resources
    ResourceLoss,
    ResourceUseAfterInvalidation,
    ResourceFieldNotInvalidated,
    IncorrectTransferOperation,
    UnsupportedResourceForLoop,
    NonResourceType,
    MissingCreate,
    FieldUninitialized,
    UninitializedFieldAccess,
    UninitializedUse,
    NotIndexableType,

    // Conformance / transactions / events
    Conformance,
    InvalidTransactionBlock,
    InvalidTransactionPrepareParameterType,
    InvalidTransactionFieldAccessModifier,
    TransactionMissingPrepare,
    EmitNonEvent,

    // Purity
    Purity,
}

/// A secondary note attached to a diagnostic, pointing at related source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Note {
    /// Location the note refers to, if any.
    pub span: Option<Span>,
    pub message: String,
}

impl Note {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            span: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn at(span: Span, message: impl Into<String>) -> Self {
        Self {
            span: Some(span),
            message: message.into(),
        }
    }
}

/// A single checker diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub severity: Severity,
    /// Primary source range.
    pub span: Span,
    pub message: String,
    /// Secondary ranges and notes (e.g. missing conformance members).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub fn error(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            span,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Attach a secondary note.
    #[must_use]
    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} [{}]: {}", self.kind, self.span, self.message)
    }
}

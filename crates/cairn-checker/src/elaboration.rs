//! The elaboration: the typed, attributed view of a checked program.
//!
//! Keyed by AST node identity. Built up during the single check pass and
//! read-only afterwards; downstream consumers (an interpreter, editor
//! tooling) query it but never mutate it.

use cairn_ast::NodeId;
use cairn_common::span::Span;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::Location;
use crate::types::TypeId;

/// A resolved global value (top-level variable, function, or composite
/// constructor).
#[derive(Clone, Debug)]
pub struct GlobalValue {
    pub type_id: TypeId,
    pub declaration_span: Span,
}

/// The target a name occurrence resolved to.
#[derive(Clone, Debug)]
pub struct VariableTarget {
    pub name: String,
    pub variable_id: u32,
}

/// Per-position occurrence info for editor tooling.
#[derive(Clone, Debug)]
pub struct Occurrence {
    pub span: Span,
    pub node: NodeId,
}

#[derive(Clone, Debug, Default)]
pub struct Elaboration {
    pub location: Option<Location>,

    expression_types: FxHashMap<NodeId, TypeId>,
    target_variables: FxHashMap<NodeId, VariableTarget>,
    type_argument_bindings: FxHashMap<NodeId, Vec<TypeId>>,
    move_expressions: FxHashSet<NodeId>,
    implicit_conversions: FxHashMap<NodeId, TypeId>,

    /// Global value table: name -> variable with type, in declaration
    /// order.
    pub global_values: IndexMap<String, GlobalValue>,
    /// Global type table: name -> type, in declaration order.
    pub global_types: IndexMap<String, TypeId>,
    /// Import locations, in source order.
    pub imports: Vec<String>,

    /// Ordered occurrences; `None` when position info is disabled.
    occurrences: Option<Vec<Occurrence>>,
}

impl Elaboration {
    #[must_use]
    pub fn new(location: Location, position_info_enabled: bool) -> Self {
        Self {
            location: Some(location),
            occurrences: position_info_enabled.then(Vec::new),
            ..Self::default()
        }
    }

    pub fn set_expression_type(&mut self, node: NodeId, type_id: TypeId) {
        self.expression_types.insert(node, type_id);
    }

    #[must_use]
    pub fn expression_type(&self, node: NodeId) -> Option<TypeId> {
        self.expression_types.get(&node).copied()
    }

    pub fn set_target_variable(&mut self, node: NodeId, target: VariableTarget) {
        self.target_variables.insert(node, target);
    }

    #[must_use]
    pub fn target_variable(&self, node: NodeId) -> Option<&VariableTarget> {
        self.target_variables.get(&node)
    }

    pub fn set_type_arguments(&mut self, node: NodeId, arguments: Vec<TypeId>) {
        self.type_argument_bindings.insert(node, arguments);
    }

    #[must_use]
    pub fn type_arguments(&self, node: NodeId) -> Option<&[TypeId]> {
        self.type_argument_bindings.get(&node).map(Vec::as_slice)
    }

    pub fn record_move(&mut self, node: NodeId) {
        self.move_expressions.insert(node);
    }

    #[must_use]
    pub fn is_move(&self, node: NodeId) -> bool {
        self.move_expressions.contains(&node)
    }

    /// Record an implicit literal conversion to a target type.
    pub fn record_conversion(&mut self, node: NodeId, target: TypeId) {
        self.implicit_conversions.insert(node, target);
    }

    #[must_use]
    pub fn conversion(&self, node: NodeId) -> Option<TypeId> {
        self.implicit_conversions.get(&node).copied()
    }

    pub fn record_occurrence(&mut self, span: Span, node: NodeId) {
        if let Some(occurrences) = &mut self.occurrences {
            occurrences.push(Occurrence { span, node });
        }
    }

    /// All recorded occurrences, ordered by start position.
    #[must_use]
    pub fn occurrences(&self) -> Option<&[Occurrence]> {
        self.occurrences.as_deref()
    }

    /// Point query: every recorded range enclosing the given offset.
    #[must_use]
    pub fn ranges_at(&self, offset: u32) -> Vec<&Occurrence> {
        self.occurrences
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter(|occurrence| occurrence.span.contains(offset))
            .collect()
    }

    /// Sort occurrences by source position; called once when checking
    /// completes.
    pub fn finalize(&mut self) {
        if let Some(occurrences) = &mut self.occurrences {
            occurrences.sort_by_key(|o| (o.span.start, o.span.end));
        }
    }
}

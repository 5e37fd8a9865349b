//! Reference formation, assignment targets, and the external-mutation
//! restriction.
//!
//! A stored container field of a composite may be read through a
//! reference but not mutated through it unless the field grants external
//! write access (`pub(set)`). Mutation through an interface-restricted
//! reference surface is rejected as a read-only target.

use cairn_ast::{Access, Expression, ExpressionKind, TypeAnnotation};
use cairn_common::diagnostics::ErrorKind;
use cairn_common::span::Span;

use crate::activations::BindingKind;
use crate::checker::Checker;
use crate::types::{Type, TypeId};

impl<'a> Checker<'a> {
    // =========================================================================
    // Reference expressions
    // =========================================================================

    /// `&v as T`.
    pub(crate) fn check_reference(
        &mut self,
        expression: &'a Expression,
        value: &'a Expression,
        annotation: &TypeAnnotation,
    ) -> TypeId {
        let target_type = self.resolve_type_annotation(annotation);
        let value_type = self.check_expression(value);

        if matches!(self.store.get(value_type), Type::Optional(_)) {
            self.error(
                ErrorKind::OptionalTypeReference,
                value.span,
                "cannot take a reference to an optional value",
            );
            return self.store.invalid;
        }

        match self.store.get(target_type) {
            Type::Reference { referenced, .. } => {
                let referenced = *referenced;
                if !self.store.is_subtype(value_type, referenced) {
                    let got = self.store.pretty(value_type);
                    let expected = self.store.pretty(referenced);
                    let message = format!("mismatched types: expected `{expected}`, got `{got}`");
                    self.error(ErrorKind::TypeMismatch, value.span, message);
                }
                target_type
            }
            Type::Invalid => self.store.invalid,
            _ => {
                let pretty = self.store.pretty(target_type);
                let message =
                    format!("expected a reference type in a reference expression, got `{pretty}`");
                self.error(ErrorKind::NonReferenceTypeReference, expression.span, message);
                self.store.invalid
            }
        }
    }

    // =========================================================================
    // Assignment targets
    // =========================================================================

    /// Type a target location and enforce the assignability rules.
    pub(crate) fn check_assignment_target(&mut self, target: &'a Expression) -> TypeId {
        match &target.kind {
            ExpressionKind::Identifier(identifier) => {
                if identifier.name == "self" {
                    self.error(
                        ErrorKind::InvalidAssignmentTarget,
                        identifier.span,
                        "cannot assign to `self`",
                    );
                    return self.store.invalid;
                }
                let variable = self.resolve_value(&identifier.name, identifier.span);
                self.record_target(target.id, identifier.span, &variable);
                self.elaboration
                    .set_expression_type(target.id, variable.type_id);
                match variable.kind {
                    BindingKind::Variable => {}
                    BindingKind::Constant | BindingKind::Parameter => {
                        let message = format!("cannot assign to constant `{}`", identifier.name);
                        self.error(ErrorKind::AssignmentToConstant, identifier.span, message);
                    }
                    _ => {
                        let message = format!("`{}` is not an assignable target", identifier.name);
                        self.error(ErrorKind::InvalidAssignmentTarget, identifier.span, message);
                    }
                }
                variable.type_id
            }
            ExpressionKind::Member {
                target: receiver,
                optional,
                name,
            } => {
                if *optional {
                    self.error(
                        ErrorKind::UnsupportedOptionalChainingAssignment,
                        target.span,
                        "cannot assign through optional chaining",
                    );
                }
                self.check_member_assignment_target(target, receiver, name)
            }
            ExpressionKind::Index {
                target: container,
                index,
            } => self.check_index_assignment_target(target, container, index),
            _ => {
                self.error(
                    ErrorKind::InvalidAssignmentTarget,
                    target.span,
                    "expression is not an assignable target",
                );
                self.check_expression(target);
                self.store.invalid
            }
        }
    }

    fn check_member_assignment_target(
        &mut self,
        target: &'a Expression,
        receiver: &'a Expression,
        name: &cairn_ast::Identifier,
    ) -> TypeId {
        let (receiver_type, receiver_is_self) = self.check_receiver(receiver);
        if receiver_type == self.store.invalid {
            return receiver_type;
        }

        // Optional receivers are unwrapped for the lookup; the chaining
        // itself was already reported as unsupported in target position.
        let receiver_type = match self.store.get(receiver_type) {
            Type::Optional(inner) => *inner,
            _ => receiver_type,
        };

        let Some(info) = self.store.member_type(receiver_type, &name.name) else {
            let pretty = self.store.pretty(receiver_type);
            let message = format!("value of type `{pretty}` has no member `{}`", name.name);
            self.error(ErrorKind::NotDeclaredMember, name.span, message);
            return self.store.invalid;
        };
        self.elaboration.set_expression_type(target.id, info.type_id);

        let Some(field_kind) = info.field_kind else {
            let message = format!("cannot assign to method `{}`", name.name);
            self.error(ErrorKind::InvalidAssignmentTarget, name.span, message);
            return info.type_id;
        };

        // Constant members: assignable exactly once, in the initializer of
        // the declaring composite.
        let in_initializer = self.current_function().is_some_and(|f| f.is_initializer);
        if receiver_is_self && in_initializer {
            if let Some(assigned) = &mut self.init_assigned {
                let first_assignment = assigned.insert(name.name.clone());
                if !first_assignment && field_kind == cairn_ast::VariableKind::Let {
                    let message =
                        format!("constant field `{}` can only be assigned once", name.name);
                    self.error(ErrorKind::AssignmentToConstantMember, name.span, message);
                }
            }
        } else if field_kind == cairn_ast::VariableKind::Let {
            let message = format!("cannot assign to constant member `{}`", name.name);
            self.error(ErrorKind::AssignmentToConstantMember, name.span, message);
        }

        let through_reference = matches!(self.store.get(receiver_type), Type::Reference { .. });
        if info.from_interface && through_reference {
            self.error(
                ErrorKind::ReadOnlyTargetAssignment,
                target.span,
                "cannot assign through a read-only interface surface",
            );
        } else if self.is_container_type(info.type_id) {
            self.check_field_mutation_allowed(
                receiver_type,
                receiver_is_self,
                &info,
                name,
                target.span,
            );
        }

        info.type_id
    }

    fn check_index_assignment_target(
        &mut self,
        target: &'a Expression,
        container: &'a Expression,
        index: &'a Expression,
    ) -> TypeId {
        let container_type = match &container.kind {
            ExpressionKind::Member {
                target: receiver,
                optional: false,
                name,
            } => {
                // Check the container-through-field path with mutation
                // rules applied to the field itself.
                let (receiver_type, receiver_is_self) = self.check_receiver(receiver);
                if receiver_type == self.store.invalid {
                    return receiver_type;
                }
                match self.store.member_type(receiver_type, &name.name) {
                    Some(info) => {
                        let through_reference =
                            matches!(self.store.get(receiver_type), Type::Reference { .. });
                        if info.from_interface && through_reference {
                            self.error(
                                ErrorKind::ReadOnlyTargetAssignment,
                                target.span,
                                "cannot assign through a read-only interface surface",
                            );
                        } else {
                            self.check_field_mutation_allowed(
                                receiver_type,
                                receiver_is_self,
                                &info,
                                name,
                                target.span,
                            );
                        }
                        self.elaboration
                            .set_expression_type(container.id, info.type_id);
                        info.type_id
                    }
                    None => {
                        let pretty = self.store.pretty(receiver_type);
                        let message =
                            format!("value of type `{pretty}` has no member `{}`", name.name);
                        self.error(ErrorKind::NotDeclaredMember, name.span, message);
                        return self.store.invalid;
                    }
                }
            }
            _ => self.check_expression(container),
        };

        let index_type = self.check_expression(index);
        let dereferenced = match self.store.get(container_type) {
            Type::Reference { referenced, .. } => *referenced,
            _ => container_type,
        };
        match self.store.get(dereferenced).clone() {
            Type::VariableArray(element) | Type::ConstantArray { element, .. } => {
                if !matches!(self.store.get(index_type), Type::Integer(_) | Type::Invalid) {
                    let got = self.store.pretty(index_type);
                    let message = format!("array index must be an integer, got `{got}`");
                    self.error(ErrorKind::TypeMismatch, index.span, message);
                }
                element
            }
            Type::Dictionary { key, value } => {
                if !self.store.is_subtype(index_type, key) {
                    let got = self.store.pretty(index_type);
                    let expected = self.store.pretty(key);
                    let message = format!("mismatched types: expected `{expected}`, got `{got}`");
                    self.error(ErrorKind::TypeMismatch, index.span, message);
                }
                value
            }
            Type::Invalid => self.store.invalid,
            _ => {
                let pretty = self.store.pretty(container_type);
                let message = format!("type `{pretty}` is not indexable");
                self.error(ErrorKind::NotIndexableType, target.span, message);
                self.store.invalid
            }
        }
    }

    // =========================================================================
    // External mutation
    // =========================================================================

    pub(crate) fn is_container_type(&self, type_id: TypeId) -> bool {
        matches!(
            self.store.get(type_id),
            Type::VariableArray(_) | Type::ConstantArray { .. } | Type::Dictionary { .. }
        )
    }

    /// Whether mutating a composite's field from here is allowed:
    /// mutation through a reference or from outside the declaring
    /// composite requires `pub(set)`.
    fn check_field_mutation_allowed(
        &mut self,
        receiver_type: TypeId,
        receiver_is_self: bool,
        info: &crate::members::MemberInfo,
        name: &cairn_ast::Identifier,
        span: Span,
    ) {
        if receiver_is_self || info.access == Access::PubSet {
            return;
        }
        let through_reference = matches!(self.store.get(receiver_type), Type::Reference { .. });
        let outside_composite = info
            .defined_in
            .is_some_and(|composite| !self.inside_composite(composite));
        if through_reference || outside_composite {
            let message = format!(
                "cannot mutate container field `{}` from outside its composite",
                name.name
            );
            self.error(ErrorKind::ExternalMutation, span, message);
        }
    }

    /// Applied to mutating member calls (`x.f.append(...)`): if the
    /// receiver chain goes through a composite's container field, the
    /// external-mutation rules apply.
    pub(crate) fn check_container_mutation(&mut self, receiver: &'a Expression, span: Span) {
        let ExpressionKind::Member {
            target: inner_receiver,
            optional: false,
            name,
        } = &receiver.kind
        else {
            return;
        };
        let Some(receiver_type) = self.elaboration.expression_type(inner_receiver.id) else {
            return;
        };
        let receiver_is_self = matches!(
            &inner_receiver.kind,
            ExpressionKind::Identifier(identifier) if identifier.name == "self"
        );
        let Some(info) = self.store.member_type(receiver_type, &name.name) else {
            return;
        };
        if info.field_kind.is_none() || !self.is_container_type(info.type_id) {
            return;
        }
        let through_reference = matches!(self.store.get(receiver_type), Type::Reference { .. });
        if info.from_interface && through_reference {
            self.error(
                ErrorKind::ReadOnlyTargetAssignment,
                span,
                "cannot mutate through a read-only interface surface",
            );
            return;
        }
        self.check_field_mutation_allowed(receiver_type, receiver_is_self, &info, name, span);
    }

    // =========================================================================
    // Purity of assignments
    // =========================================================================

    /// In a `view` context, assignment roots must be local to the
    /// function; `self` fields are permitted only in a view initializer.
    pub(crate) fn check_assignment_purity(&mut self, target: &'a Expression, span: Span) {
        let Some(function) = self.current_function() else {
            return;
        };
        if !function.is_view {
            return;
        }
        let is_initializer = function.is_initializer;
        let entry_depth = function.entry_depth;

        let root = assignment_root(target);
        let local = match &root.kind {
            ExpressionKind::Identifier(identifier) if identifier.name == "self" => is_initializer,
            ExpressionKind::Identifier(identifier) => self
                .values
                .lookup(&identifier.name)
                .is_some_and(|variable| variable.depth >= entry_depth),
            _ => false,
        };
        if !local {
            self.error(
                ErrorKind::Purity,
                span,
                "`view` functions cannot mutate non-local state",
            );
        }
    }
}

/// The base expression a member/index chain is rooted at.
fn assignment_root<'e>(expression: &'e Expression) -> &'e Expression {
    match &expression.kind {
        ExpressionKind::Member { target, .. } | ExpressionKind::Index { target, .. } => {
            assignment_root(target)
        }
        _ => expression,
    }
}

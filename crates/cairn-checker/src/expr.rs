//! Expression checking.
//!
//! Every expression produces a type, recorded into the elaboration under
//! the expression's node id, plus an effect on the resource and purity
//! state. Member and invocation checking live here and in `calls`;
//! reference formation and assignment-target rules live in `references`.

use cairn_ast::{Expression, ExpressionKind, Identifier, UnaryOp};
use cairn_common::diagnostics::ErrorKind;
use cairn_common::span::Span;

use crate::activations::BindingKind;
use crate::checker::{Checker, FunctionContext};
use crate::members::MemberInfo;
use crate::resources::{ResourceHandle, ResourceState, TrackedLocation};
use crate::statements::Exit;
use crate::types::{FixedKind, FunctionType, IntegerKind, Type, TypeId};

impl<'a> Checker<'a> {
    pub(crate) fn check_expression(&mut self, expression: &'a Expression) -> TypeId {
        self.check_expression_expecting(expression, None)
    }

    pub(crate) fn check_expression_expecting(
        &mut self,
        expression: &'a Expression,
        expected: Option<TypeId>,
    ) -> TypeId {
        let type_id = self.check_expression_inner(expression, expected);
        self.elaboration.set_expression_type(expression.id, type_id);
        // Literals coerced to an annotated type are implicit conversions.
        if expected.is_some()
            && matches!(
                expression.kind,
                ExpressionKind::IntegerLiteral(_) | ExpressionKind::FixedPointLiteral(_)
            )
        {
            self.elaboration.record_conversion(expression.id, type_id);
        }
        type_id
    }

    fn check_expression_inner(
        &mut self,
        expression: &'a Expression,
        expected: Option<TypeId>,
    ) -> TypeId {
        match &expression.kind {
            ExpressionKind::Identifier(identifier) => {
                self.check_identifier(expression, identifier)
            }
            ExpressionKind::IntegerLiteral(value) => {
                self.check_integer_literal(expression.span, value, expected)
            }
            ExpressionKind::FixedPointLiteral(value) => {
                self.check_fixed_point_literal(expression.span, value, expected)
            }
            ExpressionKind::StringLiteral(_) => self.store.string,
            ExpressionKind::BoolLiteral(_) => self.store.bool_type,
            ExpressionKind::NilLiteral => match expected.map(|e| self.store.get(e).clone()) {
                Some(Type::Optional(_)) => expected.unwrap_or(self.store.invalid),
                _ => {
                    let never = self.store.never;
                    self.store.optional(never)
                }
            },
            ExpressionKind::PathLiteral { domain, identifier: _ } => {
                self.check_path_literal(domain)
            }
            ExpressionKind::ArrayLiteral(elements) => {
                self.check_array_literal(expression, elements, expected)
            }
            ExpressionKind::DictionaryLiteral(entries) => {
                self.check_dictionary_literal(expression, entries, expected)
            }
            ExpressionKind::Member {
                target,
                optional,
                name,
            } => {
                let (type_id, _, _) = self.check_member_full(expression, target, *optional, name);
                type_id
            }
            ExpressionKind::Index { target, index } => {
                self.check_index(expression, target, index)
            }
            ExpressionKind::Invocation {
                target,
                type_arguments,
                arguments,
            } => self.check_invocation(expression, target, type_arguments, arguments),
            ExpressionKind::Create { invocation } => self.check_create(expression, invocation),
            ExpressionKind::Destroy { value } => self.check_destroy(expression, value),
            ExpressionKind::Reference {
                value,
                type_annotation,
            } => self.check_reference(expression, value, type_annotation),
            ExpressionKind::Unary { op, value } => {
                self.check_unary(expression, *op, value, expected)
            }
            ExpressionKind::Binary { op, left, right } => {
                self.check_binary(expression, *op, left, right, expected)
            }
            ExpressionKind::Ternary {
                test,
                then_expr,
                else_expr,
            } => self.check_ternary(test, then_expr, else_expr, expected),
            ExpressionKind::Casting {
                value,
                op,
                type_annotation,
            } => self.check_casting(value, *op, type_annotation),
            ExpressionKind::ForceUnwrap { value } => self.check_force_unwrap(expression, value),
            ExpressionKind::Function {
                purity,
                parameters,
                return_type,
                body,
            } => self.check_function_expression(expression, *purity, parameters, return_type, body),
        }
    }

    // =========================================================================
    // Identifiers and self
    // =========================================================================

    fn check_identifier(&mut self, expression: &'a Expression, identifier: &Identifier) -> TypeId {
        let variable = self.resolve_value(&identifier.name, identifier.span);
        self.record_target(expression.id, identifier.span, &variable);

        // Use of a whole `self` before every field is assigned.
        if variable.kind == BindingKind::SelfBinding {
            self.check_self_fully_initialized(identifier.span);
        }

        self.check_resource_read(
            &TrackedLocation::Variable(variable.variable_id),
            &identifier.name,
            identifier.span,
        );
        variable.type_id
    }

    /// Resolve a receiver expression; `self` bypasses the whole-value
    /// initialization check since `self.f` reads/writes are tracked per
    /// field.
    pub(crate) fn check_receiver(&mut self, target: &'a Expression) -> (TypeId, bool) {
        if let ExpressionKind::Identifier(identifier) = &target.kind {
            if identifier.name == "self" {
                let variable = self.resolve_value("self", identifier.span);
                self.record_target(target.id, identifier.span, &variable);
                self.elaboration
                    .set_expression_type(target.id, variable.type_id);
                return (variable.type_id, variable.kind == BindingKind::SelfBinding);
            }
        }
        (self.check_expression(target), false)
    }

    pub(crate) fn check_self_fully_initialized(&mut self, span: Span) {
        if let Some(assigned) = &self.init_assigned {
            let missing: Vec<&String> = self
                .init_fields
                .iter()
                .filter(|field| !assigned.contains(*field))
                .collect();
            if !missing.is_empty() {
                let names = missing
                    .iter()
                    .map(|name| format!("`{name}`"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let message =
                    format!("`self` is used before all fields are initialized (missing: {names})");
                self.error(ErrorKind::UninitializedUse, span, message);
            }
        }
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Full member resolution; returns the member type, the member info,
    /// and whether the receiver was `self`.
    pub(crate) fn check_member_full(
        &mut self,
        expression: &'a Expression,
        target: &'a Expression,
        optional: bool,
        name: &Identifier,
    ) -> (TypeId, Option<MemberInfo>, bool) {
        let (receiver_type, receiver_is_self) = self.check_receiver(target);
        if receiver_type == self.store.invalid {
            self.elaboration
                .set_expression_type(expression.id, receiver_type);
            return (receiver_type, None, receiver_is_self);
        }

        let (lookup_type, result_optional) = match self.store.get(receiver_type) {
            Type::Optional(inner) if optional => (*inner, true),
            _ if optional => {
                let pretty = self.store.pretty(receiver_type);
                let message = format!(
                    "optional chaining on non-optional type `{pretty}`"
                );
                self.error(ErrorKind::InvalidOptionalChaining, expression.span, message);
                (receiver_type, true)
            }
            _ => (receiver_type, false),
        };

        let Some(info) = self.store.member_type(lookup_type, &name.name) else {
            let pretty = self.store.pretty(lookup_type);
            let message = format!("value of type `{pretty}` has no member `{}`", name.name);
            self.error(ErrorKind::NotDeclaredMember, name.span, message);
            let invalid = self.store.invalid;
            self.elaboration.set_expression_type(expression.id, invalid);
            return (invalid, None, receiver_is_self);
        };

        self.check_member_access(&info, name, receiver_is_self);

        // Reads of `self` fields inside an initializer.
        if receiver_is_self && info.field_kind.is_some() {
            if let Some(assigned) = &self.init_assigned {
                if self.init_fields.contains(&name.name) && !assigned.contains(&name.name) {
                    let message = format!("field `{}` is read before it is initialized", name.name);
                    self.error(ErrorKind::UninitializedFieldAccess, name.span, message);
                }
            }
            self.check_resource_read(
                &TrackedLocation::SelfField(name.name.clone()),
                &name.name,
                name.span,
            );
        }

        let mut result = info.type_id;
        if result_optional {
            result = self.store.optional(result);
        }
        self.elaboration.set_expression_type(expression.id, result);
        self.elaboration.record_occurrence(name.span, expression.id);
        (result, Some(info), receiver_is_self)
    }

    fn check_member_access(&mut self, info: &MemberInfo, name: &Identifier, receiver_is_self: bool) {
        use crate::config::AccessCheckMode;
        if receiver_is_self {
            return;
        }
        let effective = match info.access {
            cairn_ast::Access::NotSpecified => {
                if self.config.access_check_mode == AccessCheckMode::NotSpecifiedRestricted {
                    cairn_ast::Access::AccessSelf
                } else {
                    cairn_ast::Access::Pub
                }
            }
            other => other,
        };
        let restricted = matches!(
            effective,
            cairn_ast::Access::Priv | cairn_ast::Access::AccessSelf
        );
        if restricted {
            let accessible = info
                .defined_in
                .is_some_and(|composite| self.inside_composite(composite));
            if !accessible {
                let message = format!("member `{}` is not accessible here", name.name);
                self.error(ErrorKind::InvalidAccess, name.span, message);
            }
        }
    }

    // =========================================================================
    // Indexing
    // =========================================================================

    fn check_index(
        &mut self,
        expression: &'a Expression,
        target: &'a Expression,
        index: &'a Expression,
    ) -> TypeId {
        let target_type = self.check_expression(target);
        let index_type = self.check_expression(index);

        // Resource container slots at constant indexes are tracked; read
        // checks happen against the slot.
        self.check_indexed_resource_read(target, index, expression.span);

        let container = match self.store.get(target_type) {
            Type::Reference { referenced, .. } => *referenced,
            _ => target_type,
        };

        match self.store.get(container).clone() {
            Type::VariableArray(element) | Type::ConstantArray { element, .. } => {
                if !matches!(
                    self.store.get(index_type),
                    Type::Integer(_) | Type::Invalid
                ) {
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
                self.store.optional(value)
            }
            Type::Invalid => self.store.invalid,
            _ => {
                let pretty = self.store.pretty(target_type);
                let message = format!("type `{pretty}` is not indexable");
                self.error(ErrorKind::NotIndexableType, expression.span, message);
                self.store.invalid
            }
        }
    }

    // =========================================================================
    // Create / destroy
    // =========================================================================

    fn check_create(&mut self, expression: &'a Expression, invocation: &'a Expression) -> TypeId {
        if !matches!(invocation.kind, ExpressionKind::Invocation { .. }) {
            self.error(
                ErrorKind::MissingCreate,
                invocation.span,
                "`create` requires a constructor invocation",
            );
            return self.check_expression(invocation);
        }
        let saved = self.create_target;
        self.create_target = Some(invocation.id);
        let type_id = self.check_expression(invocation);
        self.create_target = saved;

        match self.store.get(type_id) {
            Type::Composite(id) => {
                if self.store.composite(*id).kind != cairn_ast::CompositeKind::Resource {
                    let pretty = self.store.pretty(type_id);
                    let message = format!("`create` requires a resource type, got `{pretty}`");
                    self.error(ErrorKind::NonResourceType, expression.span, message);
                }
            }
            Type::Invalid => {}
            _ => {
                let pretty = self.store.pretty(type_id);
                let message = format!("`create` requires a resource type, got `{pretty}`");
                self.error(ErrorKind::NonResourceType, expression.span, message);
            }
        }
        type_id
    }

    fn check_destroy(&mut self, expression: &'a Expression, value: &'a Expression) -> TypeId {
        let value_type = self.check_expression(value);
        if !self.store.is_resource(value_type) && value_type != self.store.invalid {
            let pretty = self.store.pretty(value_type);
            let message = format!("`destroy` requires a resource, got `{pretty}`");
            self.error(ErrorKind::NonResourceType, value.span, message);
        }
        if self.current_function().is_some_and(|f| f.is_view) {
            self.error(
                ErrorKind::Purity,
                expression.span,
                "resources cannot be destroyed in a `view` context",
            );
        }
        self.record_resource_destroy(value, expression.span);
        self.store.void
    }

    // =========================================================================
    // Unary / binary / ternary
    // =========================================================================

    fn check_unary(
        &mut self,
        expression: &'a Expression,
        op: UnaryOp,
        value: &'a Expression,
        expected: Option<TypeId>,
    ) -> TypeId {
        match op {
            UnaryOp::Minus => {
                // Fold negated literals so range checks see the sign.
                match &value.kind {
                    ExpressionKind::IntegerLiteral(literal) => {
                        let negated = literal.negated();
                        let type_id =
                            self.check_integer_literal(expression.span, &negated, expected);
                        self.elaboration.set_expression_type(value.id, type_id);
                        return type_id;
                    }
                    ExpressionKind::FixedPointLiteral(literal) => {
                        let negated = literal.negated();
                        let type_id =
                            self.check_fixed_point_literal(expression.span, &negated, expected);
                        self.elaboration.set_expression_type(value.id, type_id);
                        return type_id;
                    }
                    _ => {}
                }
                let value_type = self.check_expression_expecting(value, expected);
                let signed = match self.store.get(value_type) {
                    Type::Integer(kind) => kind.is_signed(),
                    Type::Fixed(kind) => kind.is_signed(),
                    Type::Invalid => true,
                    _ => false,
                };
                if !signed {
                    let pretty = self.store.pretty(value_type);
                    let message = format!("cannot negate a value of type `{pretty}`");
                    self.error(ErrorKind::InvalidUnaryOperand, expression.span, message);
                }
                value_type
            }
            UnaryOp::Not => {
                let value_type = self.check_expression(value);
                let bool_type = self.store.bool_type;
                if !self.store.is_subtype(value_type, bool_type) {
                    let pretty = self.store.pretty(value_type);
                    let message = format!("`!` requires `Bool`, got `{pretty}`");
                    self.error(ErrorKind::InvalidUnaryOperand, expression.span, message);
                }
                bool_type
            }
            UnaryOp::Move => {
                let value_type = self.check_expression_expecting(value, expected);
                if !self.store.is_resource(value_type) && value_type != self.store.invalid {
                    let pretty = self.store.pretty(value_type);
                    let message =
                        format!("the move operator `<-` is only valid for resources, got `{pretty}`");
                    self.error(
                        ErrorKind::IncorrectTransferOperation,
                        expression.span,
                        message,
                    );
                }
                self.record_resource_move(value);
                self.elaboration.record_move(expression.id);
                value_type
            }
        }
    }

    fn check_binary(
        &mut self,
        expression: &'a Expression,
        op: cairn_ast::BinaryOp,
        left: &'a Expression,
        right: &'a Expression,
        expected: Option<TypeId>,
    ) -> TypeId {
        use cairn_ast::BinaryOp;
        match op {
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let numeric_expected = expected.filter(|e| {
                    matches!(self.store.get(*e), Type::Integer(_) | Type::Fixed(_))
                });
                let left_type = self.check_expression_expecting(left, numeric_expected);
                let operand_hint = if matches!(
                    self.store.get(left_type),
                    Type::Integer(_) | Type::Fixed(_)
                ) {
                    Some(left_type)
                } else {
                    numeric_expected
                };
                let right_type = self.check_expression_expecting(right, operand_hint);

                let invalid = self.store.invalid;
                if left_type == invalid || right_type == invalid {
                    return invalid;
                }
                let numeric = |t: &Type| matches!(t, Type::Integer(_) | Type::Fixed(_));
                if left_type != right_type
                    || !numeric(self.store.get(left_type))
                {
                    let left_pretty = self.store.pretty(left_type);
                    let right_pretty = self.store.pretty(right_type);
                    let message = format!(
                        "invalid operands for `{}`: `{left_pretty}` and `{right_pretty}`",
                        op.symbol()
                    );
                    self.error(ErrorKind::InvalidBinaryOperands, expression.span, message);
                    return invalid;
                }
                left_type
            }
            BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual => {
                let left_type = self.check_expression(left);
                let hint = matches!(
                    self.store.get(left_type),
                    Type::Integer(_) | Type::Fixed(_)
                )
                .then_some(left_type);
                let right_type = self.check_expression_expecting(right, hint);
                let invalid = self.store.invalid;
                let numeric = |t: &Type| matches!(t, Type::Integer(_) | Type::Fixed(_));
                if left_type != invalid
                    && right_type != invalid
                    && (left_type != right_type || !numeric(self.store.get(left_type)))
                {
                    let left_pretty = self.store.pretty(left_type);
                    let right_pretty = self.store.pretty(right_type);
                    let message = format!(
                        "invalid operands for `{}`: `{left_pretty}` and `{right_pretty}`",
                        op.symbol()
                    );
                    self.error(ErrorKind::InvalidBinaryOperands, expression.span, message);
                }
                self.store.bool_type
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                let left_type = self.check_expression(left);
                let right_type = self.check_expression_expecting(right, Some(left_type));
                let invalid = self.store.invalid;
                if left_type != invalid && right_type != invalid {
                    if self.store.is_resource(left_type) || self.store.is_resource(right_type) {
                        self.error(
                            ErrorKind::InvalidBinaryOperands,
                            expression.span,
                            "resources cannot be compared",
                        );
                    } else if !self.store.is_subtype(left_type, right_type)
                        && !self.store.is_subtype(right_type, left_type)
                    {
                        let left_pretty = self.store.pretty(left_type);
                        let right_pretty = self.store.pretty(right_type);
                        let message = format!(
                            "cannot compare `{left_pretty}` and `{right_pretty}`"
                        );
                        self.error(ErrorKind::InvalidBinaryOperands, expression.span, message);
                    } else if !self.store.is_equatable(left_type)
                        && !self.store.is_equatable(right_type)
                    {
                        let left_pretty = self.store.pretty(left_type);
                        let message = format!("`{left_pretty}` is not equatable");
                        self.error(ErrorKind::InvalidBinaryOperands, expression.span, message);
                    }
                }
                self.store.bool_type
            }
            BinaryOp::And | BinaryOp::Or => {
                let bool_type = self.store.bool_type;
                let left_type = self.check_expression(left);
                let right_type = self.check_expression(right);
                for (operand_type, operand) in [(left_type, left), (right_type, right)] {
                    if !self.store.is_subtype(operand_type, bool_type) {
                        let pretty = self.store.pretty(operand_type);
                        let message = format!(
                            "`{}` requires `Bool` operands, got `{pretty}`",
                            op.symbol()
                        );
                        self.error(ErrorKind::InvalidBinaryOperands, operand.span, message);
                    }
                }
                bool_type
            }
            BinaryOp::NilCoalesce => {
                let left_type = self.check_expression(left);
                let inner = match self.store.get(left_type) {
                    Type::Optional(inner) => *inner,
                    Type::Invalid => self.store.invalid,
                    _ => {
                        let pretty = self.store.pretty(left_type);
                        let message =
                            format!("`??` requires an optional left operand, got `{pretty}`");
                        self.error(ErrorKind::InvalidBinaryOperands, left.span, message);
                        self.store.invalid
                    }
                };
                let right_type = self.check_expression_expecting(right, Some(inner));
                if self.store.is_subtype(right_type, inner) {
                    inner
                } else if self.store.is_subtype(right_type, left_type) {
                    left_type
                } else {
                    match self.store.unify(inner, right_type) {
                        Some(joined) => joined,
                        None => {
                            let left_pretty = self.store.pretty(inner);
                            let right_pretty = self.store.pretty(right_type);
                            let message = format!(
                                "invalid operands for `??`: `{left_pretty}` and `{right_pretty}`"
                            );
                            self.error(ErrorKind::InvalidBinaryOperands, expression.span, message);
                            self.store.invalid
                        }
                    }
                }
            }
        }
    }

    fn check_ternary(
        &mut self,
        test: &'a Expression,
        then_expr: &'a Expression,
        else_expr: &'a Expression,
        expected: Option<TypeId>,
    ) -> TypeId {
        let test_type = self.check_expression(test);
        let bool_type = self.store.bool_type;
        if !self.store.is_subtype(test_type, bool_type) {
            let pretty = self.store.pretty(test_type);
            let message = format!("mismatched types: expected `Bool`, got `{pretty}`");
            self.error(ErrorKind::TypeMismatch, test.span, message);
        }
        let then_type = self.check_expression_expecting(then_expr, expected);
        let else_type = self.check_expression_expecting(else_expr, expected);
        match self.store.unify(then_type, else_type) {
            Some(joined) => joined,
            None => {
                let then_pretty = self.store.pretty(then_type);
                let else_pretty = self.store.pretty(else_type);
                let message = format!(
                    "conditional branches have incompatible types `{then_pretty}` and `{else_pretty}`"
                );
                self.error(ErrorKind::TypeMismatch, else_expr.span, message);
                self.store.invalid
            }
        }
    }

    fn check_casting(
        &mut self,
        value: &'a Expression,
        op: cairn_ast::CastOp,
        annotation: &cairn_ast::TypeAnnotation,
    ) -> TypeId {
        let target_type = self.resolve_type_annotation(annotation);
        let value_type = self.check_expression_expecting(value, Some(target_type));
        match op {
            cairn_ast::CastOp::Static => {
                if !self.store.is_subtype(value_type, target_type) {
                    let got = self.store.pretty(value_type);
                    let expected = self.store.pretty(target_type);
                    let message =
                        format!("cannot statically cast `{got}` to `{expected}`");
                    self.error(ErrorKind::TypeMismatch, value.span, message);
                }
                target_type
            }
            cairn_ast::CastOp::Failable => self.store.optional(target_type),
            cairn_ast::CastOp::Forced => target_type,
        }
    }

    fn check_force_unwrap(&mut self, expression: &'a Expression, value: &'a Expression) -> TypeId {
        let value_type = self.check_expression(value);
        match self.store.get(value_type) {
            Type::Optional(inner) => *inner,
            Type::Invalid => self.store.invalid,
            _ => {
                let pretty = self.store.pretty(value_type);
                let message = format!("force-unwrap requires an optional, got `{pretty}`");
                self.error(
                    ErrorKind::TypeMismatchWithDescription,
                    expression.span,
                    message,
                );
                value_type
            }
        }
    }

    // =========================================================================
    // Function expressions
    // =========================================================================

    fn check_function_expression(
        &mut self,
        expression: &'a Expression,
        purity: cairn_ast::Purity,
        parameters: &'a [cairn_ast::Parameter],
        return_type: &Option<cairn_ast::TypeAnnotation>,
        body: &'a cairn_ast::Block,
    ) -> TypeId {
        let resolved_parameters = self.resolve_parameters(parameters);
        let resolved_return = return_type
            .as_ref()
            .map_or(self.store.void, |annotation| {
                self.resolve_type_annotation(annotation)
            });
        let function_type = self.store.function(FunctionType {
            is_view: purity.is_view(),
            type_parameters: Vec::new(),
            parameters: resolved_parameters.clone(),
            return_type: resolved_return,
        });

        let saved_resources = std::mem::take(&mut self.resources);
        self.enter_scope();
        self.declare_ast_parameters(parameters, &resolved_parameters);
        self.functions.push(FunctionContext {
            return_type: resolved_return,
            is_view: purity.is_view(),
            is_initializer: false,
            loop_depth: 0,
            entry_depth: self.values.depth(),
        });
        let exit = self.check_block(body);
        self.functions.pop();
        self.exit_scope(exit == Exit::Definite);
        self.resources = saved_resources;

        if resolved_return != self.store.void
            && resolved_return != self.store.invalid
            && exit != Exit::Definite
        {
            self.error(
                ErrorKind::MissingReturnStatement,
                expression.span,
                "function does not exit on every path",
            );
        }

        function_type
    }

    // =========================================================================
    // Array / dictionary literals and paths
    // =========================================================================

    fn check_path_literal(&mut self, domain: &Identifier) -> TypeId {
        match crate::types::PathDomain::parse(&domain.name) {
            Some(path_domain) => self.store.path_with_domain(path_domain),
            None => {
                let message = format!("unknown path domain `{}`", domain.name);
                self.error(ErrorKind::InvalidPathDomain, domain.span, message);
                self.store.path
            }
        }
    }

    fn check_array_literal(
        &mut self,
        expression: &'a Expression,
        elements: &'a [Expression],
        expected: Option<TypeId>,
    ) -> TypeId {
        let expected_element = expected.and_then(|e| match self.store.get(e) {
            Type::VariableArray(element) => Some(*element),
            Type::ConstantArray { element, .. } => Some(*element),
            _ => None,
        });

        let mut element_type = expected_element;
        for element in elements {
            let actual = self.check_expression_expecting(element, expected_element);
            self.check_resource_element_transfer(element, actual);
            match element_type {
                None => element_type = Some(actual),
                Some(current) => {
                    if let Some(expected_elem) = expected_element {
                        if !self.store.is_subtype(actual, expected_elem) {
                            let got = self.store.pretty(actual);
                            let want = self.store.pretty(expected_elem);
                            let message =
                                format!("mismatched types: expected `{want}`, got `{got}`");
                            self.error(ErrorKind::TypeMismatch, element.span, message);
                        }
                    } else {
                        element_type = self.store.unify(current, actual).or(Some(current));
                    }
                }
            }
        }

        if let Some(expected_type) = expected {
            if matches!(
                self.store.get(expected_type),
                Type::VariableArray(_) | Type::ConstantArray { .. }
            ) {
                if let (Type::ConstantArray { size, .. }, true) = (
                    self.store.get(expected_type).clone(),
                    expected_element.is_some(),
                ) {
                    if size as usize != elements.len() {
                        let message = format!(
                            "constant-sized array literal has {} elements, expected {size}",
                            elements.len()
                        );
                        self.error(ErrorKind::TypeMismatch, expression.span, message);
                    }
                }
                return expected_type;
            }
        }

        let element_type = element_type.unwrap_or(self.store.never);
        self.store.variable_array(element_type)
    }

    fn check_resource_element_transfer(&mut self, element: &'a Expression, actual: TypeId) {
        if self.store.is_resource(actual)
            && !matches!(
                element.kind,
                ExpressionKind::Unary {
                    op: UnaryOp::Move,
                    ..
                } | ExpressionKind::Create { .. }
            )
        {
            self.error(
                ErrorKind::IncorrectTransferOperation,
                element.span,
                "moving a resource into a container requires the move operator `<-`",
            );
            self.record_resource_move(element);
        }
    }

    fn check_dictionary_literal(
        &mut self,
        _expression: &'a Expression,
        entries: &'a [(Expression, Expression)],
        expected: Option<TypeId>,
    ) -> TypeId {
        let expected_pair = expected.and_then(|e| match self.store.get(e) {
            Type::Dictionary { key, value } => Some((*key, *value)),
            _ => None,
        });

        let mut key_type = expected_pair.map(|(k, _)| k);
        let mut value_type = expected_pair.map(|(_, v)| v);

        for (key, value) in entries {
            let actual_key = self.check_expression_expecting(key, key_type);
            let actual_value = self.check_expression_expecting(value, value_type);
            self.check_resource_element_transfer(value, actual_value);
            if let Some(expected_key) = key_type {
                if expected_pair.is_some() && !self.store.is_subtype(actual_key, expected_key) {
                    let got = self.store.pretty(actual_key);
                    let want = self.store.pretty(expected_key);
                    let message = format!("mismatched types: expected `{want}`, got `{got}`");
                    self.error(ErrorKind::TypeMismatch, key.span, message);
                }
            } else {
                key_type = Some(actual_key);
            }
            match value_type {
                Some(current) if expected_pair.is_none() => {
                    value_type = self.store.unify(current, actual_value).or(Some(current));
                }
                Some(expected_value) => {
                    if expected_pair.is_some()
                        && !self.store.is_subtype(actual_value, expected_value)
                    {
                        let got = self.store.pretty(actual_value);
                        let want = self.store.pretty(expected_value);
                        let message = format!("mismatched types: expected `{want}`, got `{got}`");
                        self.error(ErrorKind::TypeMismatch, value.span, message);
                    }
                }
                None => value_type = Some(actual_value),
            }
        }

        if let Some(expected_type) = expected {
            if matches!(self.store.get(expected_type), Type::Dictionary { .. }) {
                return expected_type;
            }
        }

        let key_type = key_type.unwrap_or(self.store.never);
        let value_type = value_type.unwrap_or(self.store.never);
        if !self.store.is_hashable(key_type) {
            let pretty = self.store.pretty(key_type);
            let message = format!("dictionary key type `{pretty}` is not hashable");
            self.error(
                ErrorKind::TypeMismatchWithDescription,
                _expression.span,
                message,
            );
        }
        self.store.dictionary(key_type, value_type)
    }

    // =========================================================================
    // Resource tracking effects
    // =========================================================================

    /// The tracked location an expression denotes, if any.
    pub(crate) fn tracked_location_of(
        &self,
        expression: &Expression,
    ) -> Option<TrackedLocation> {
        match &expression.kind {
            ExpressionKind::Identifier(identifier) => {
                if identifier.name == "self" {
                    return None;
                }
                self.elaboration
                    .target_variable(expression.id)
                    .map(|target| TrackedLocation::Variable(target.variable_id))
            }
            ExpressionKind::Member {
                target, name, ..
            } => match &target.kind {
                ExpressionKind::Identifier(identifier) if identifier.name == "self" => {
                    Some(TrackedLocation::SelfField(name.name.clone()))
                }
                _ => None,
            },
            ExpressionKind::Index { target, index } => {
                let ExpressionKind::Identifier(_) = &target.kind else {
                    return None;
                };
                let container = self
                    .elaboration
                    .target_variable(target.id)
                    .map(|t| t.variable_id)?;
                match &index.kind {
                    ExpressionKind::IntegerLiteral(value) => value
                        .as_u64()
                        .map(|constant| TrackedLocation::Element(container, constant)),
                    _ => None,
                }
            }
            ExpressionKind::Unary {
                op: UnaryOp::Move,
                value,
            } => self.tracked_location_of(value),
            _ => None,
        }
    }

    /// Read check: using an invalidated location. Container
    /// indeterminacy is checked at the indexing site, not on the whole
    /// container, so that replacing or destroying the container stays
    /// legal.
    pub(crate) fn check_resource_read(
        &mut self,
        location: &TrackedLocation,
        name: &str,
        span: Span,
    ) {
        let Some(handle) = self.resources.get(location) else {
            return;
        };
        if handle.state.is_invalidated() {
            let message = format!("resource `{name}` is used after it was invalidated");
            self.error(ErrorKind::ResourceUseAfterInvalidation, span, message);
        }
    }

    fn check_indexed_resource_read(
        &mut self,
        target: &'a Expression,
        index: &'a Expression,
        span: Span,
    ) {
        let ExpressionKind::Identifier(identifier) = &target.kind else {
            return;
        };
        let Some(variable_target) = self.elaboration.target_variable(target.id) else {
            return;
        };
        let container_id = variable_target.variable_id;
        let container_location = TrackedLocation::Variable(container_id);
        let Some(container) = self.resources.get(&container_location) else {
            return;
        };
        if container.indeterminate {
            let message = format!(
                "resource container `{}` is indeterminate after a non-constant move",
                identifier.name
            );
            self.error(ErrorKind::ResourceUseAfterInvalidation, span, message);
            return;
        }
        if let ExpressionKind::IntegerLiteral(value) = &index.kind {
            if let Some(constant) = value.as_u64() {
                let slot = TrackedLocation::Element(container_id, constant);
                self.check_resource_read(&slot, &identifier.name, span);
            }
        }
    }

    /// Mark the location denoted by an expression as moved out.
    pub(crate) fn record_resource_move(&mut self, expression: &'a Expression) {
        self.elaboration.record_move(expression.id);
        let span = expression.span;

        // A move out of a non-constant index makes the whole container
        // indeterminate.
        if let ExpressionKind::Index { target, index } = &expression.kind {
            if !matches!(index.kind, ExpressionKind::IntegerLiteral(_)) {
                if let Some(TrackedLocation::Variable(container)) = self.tracked_location_of(target)
                {
                    if let Some(handle) = self
                        .resources
                        .get_mut(&TrackedLocation::Variable(container))
                    {
                        handle.indeterminate = true;
                    }
                    return;
                }
            }
        }

        let Some(location) = self.tracked_location_of(expression) else {
            return;
        };
        match self.resources.get_mut(&location) {
            Some(handle) => handle.transition(ResourceState::MovedOut, span),
            None => {
                // First interaction with a self field or container slot.
                if !matches!(location, TrackedLocation::Variable(_)) {
                    let mut handle = ResourceHandle::valid(describe_location(&location), span);
                    handle.transition(ResourceState::MovedOut, span);
                    self.resources.insert(location, handle);
                }
            }
        }
    }

    pub(crate) fn record_resource_destroy(&mut self, expression: &'a Expression, span: Span) {
        let Some(location) = self.tracked_location_of(expression) else {
            return;
        };
        match self.resources.get_mut(&location) {
            Some(handle) => handle.transition(ResourceState::Destroyed, span),
            None => {
                if !matches!(location, TrackedLocation::Variable(_)) {
                    let mut handle = ResourceHandle::valid(describe_location(&location), span);
                    handle.transition(ResourceState::Destroyed, span);
                    self.resources.insert(location, handle);
                }
            }
        }
    }

    /// Re-validate a slot after something moved back into it.
    pub(crate) fn revalidate_location(&mut self, expression: &'a Expression) {
        if let Some(location) = self.tracked_location_of(expression) {
            self.mark_location_valid(location, expression.span);
        }
    }

    pub(crate) fn mark_location_valid(&mut self, location: TrackedLocation, span: Span) {
        match self.resources.get_mut(&location) {
            Some(handle) => {
                handle.state = ResourceState::Valid;
                handle.transition = Some(span);
                if matches!(location, TrackedLocation::Variable(_)) {
                    handle.indeterminate = false;
                }
            }
            None => {
                self.resources
                    .insert(location.clone(), ResourceHandle::valid(describe_location(&location), span));
            }
        }
    }

    /// Literal coercion entry points live in `literals`; re-exported here
    /// for the match arms above.
    pub(crate) fn numeric_default(&mut self) -> TypeId {
        self.store.integer(IntegerKind::Int)
    }

    pub(crate) fn fixed_default(&mut self, negative: bool) -> TypeId {
        if negative {
            self.store.fixed(FixedKind::Fix64)
        } else {
            self.store.fixed(FixedKind::UFix64)
        }
    }
}

fn describe_location(location: &TrackedLocation) -> String {
    match location {
        TrackedLocation::Variable(id) => format!("<{id}>"),
        TrackedLocation::SelfField(name) => format!("self.{name}"),
        TrackedLocation::Element(id, index) => format!("<{id}>[{index}]"),
    }
}

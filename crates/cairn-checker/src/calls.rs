//! Invocation checking: argument labels, arity, generic type-argument
//! inference, constructor rules, and call purity.
//!
//! Generic inference is bounded: each call site has a small set of
//! type-parameter slots filled by unifying argument types with declared
//! parameter types. On contradiction the earliest binding wins and a
//! mismatch is reported; there is no backtracking.

use cairn_ast::{Argument, CompositeKind, Expression, ExpressionKind, TypeAnnotation, UnaryOp};
use cairn_common::diagnostics::ErrorKind;

use crate::activations::BindingKind;
use crate::checker::Checker;
use crate::members::MemberInfo;
use crate::types::{CompositeId, FunctionType, Type, TypeId};

impl<'a> Checker<'a> {
    pub(crate) fn check_invocation(
        &mut self,
        expression: &'a Expression,
        target: &'a Expression,
        type_arguments: &'a [TypeAnnotation],
        arguments: &'a [Argument],
    ) -> TypeId {
        // Resolve the callee, keeping member info for constructor and
        // mutation rules.
        let (callee_type, member_info, constructor_of) = self.resolve_callee(target);

        // Optional-chained calls produce optional results.
        let (callee_type, optional_result) = match self.store.get(callee_type) {
            Type::Optional(inner)
                if matches!(target.kind, ExpressionKind::Member { optional: true, .. }) =>
            {
                (*inner, true)
            }
            _ => (callee_type, false),
        };

        let function = match self.store.get(callee_type).clone() {
            Type::Function(function) => function,
            Type::Invalid => {
                for argument in arguments {
                    self.check_expression(&argument.value);
                }
                return self.store.invalid;
            }
            _ => {
                let pretty = self.store.pretty(callee_type);
                let message = format!("cannot call a value of type `{pretty}`");
                self.error(ErrorKind::NotCallable, target.span, message);
                for argument in arguments {
                    self.check_expression(&argument.value);
                }
                return self.store.invalid;
            }
        };

        // Purity: calling a non-view function from a view context. The
        // emit operand is excluded; `emit` reports its own violation.
        if self.current_function().is_some_and(|f| f.is_view)
            && !function.is_view
            && self.emit_target != Some(expression.id)
        {
            self.error(
                ErrorKind::Purity,
                expression.span,
                "`view` functions can only call `view` functions",
            );
        }

        // Mutating container members through references or foreign
        // composites.
        if member_info.as_ref().is_some_and(|info| info.mutating) {
            if let ExpressionKind::Member {
                target: receiver, ..
            } = &target.kind
            {
                self.check_container_mutation(receiver, expression.span);
            }
        }

        let bindings = self.check_arguments(expression, &function, type_arguments, arguments);

        self.enforce_constructor_rules(expression, constructor_of);

        let mut return_type = self.store.instantiate(function.return_type, &bindings);
        if optional_result {
            return_type = self.store.optional(return_type);
        }
        return_type
    }

    /// Resolve the invocation target to a callee type, with constructor
    /// bookkeeping.
    fn resolve_callee(
        &mut self,
        target: &'a Expression,
    ) -> (TypeId, Option<MemberInfo>, Option<CompositeId>) {
        match &target.kind {
            ExpressionKind::Identifier(identifier) => {
                let variable = self.resolve_value(&identifier.name, identifier.span);
                self.record_target(target.id, identifier.span, &variable);
                self.elaboration
                    .set_expression_type(target.id, variable.type_id);
                let constructor = if variable.kind == BindingKind::Constructor {
                    match self.store.get(variable.type_id) {
                        Type::Function(function) => match self.store.get(function.return_type) {
                            Type::Composite(id) => Some(*id),
                            _ => None,
                        },
                        _ => None,
                    }
                } else {
                    None
                };
                (variable.type_id, None, constructor)
            }
            ExpressionKind::Member {
                target: receiver,
                optional,
                name,
            } => {
                let (member_type, info, _) =
                    self.check_member_full(target, receiver, *optional, name);
                let constructor = info.as_ref().and_then(|i| i.constructor_of);
                (member_type, info, constructor)
            }
            _ => (self.check_expression(target), None, None),
        }
    }

    /// Check labels, arity, argument types, and infer type arguments.
    /// Returns the resolved type-parameter bindings.
    fn check_arguments(
        &mut self,
        expression: &'a Expression,
        function: &FunctionType,
        type_arguments: &'a [TypeAnnotation],
        arguments: &'a [Argument],
    ) -> Vec<Option<TypeId>> {
        // Explicit type arguments.
        let mut bindings: Vec<Option<TypeId>> = vec![None; function.type_parameters.len()];
        if !type_arguments.is_empty() && function.type_parameters.is_empty() {
            self.error(
                ErrorKind::TypeParameterTypeMismatch,
                expression.span,
                "function does not take type arguments",
            );
        } else if type_arguments.len() > function.type_parameters.len() {
            let message = format!(
                "too many type arguments: expected at most {}, got {}",
                function.type_parameters.len(),
                type_arguments.len()
            );
            self.error(ErrorKind::TypeParameterTypeMismatch, expression.span, message);
        }
        for (index, annotation) in type_arguments
            .iter()
            .take(function.type_parameters.len())
            .enumerate()
        {
            bindings[index] = Some(self.resolve_type_annotation(annotation));
        }

        // Arity.
        let required = function.parameters.iter().filter(|p| p.required).count();
        if arguments.len() < required {
            let message = format!(
                "too few arguments: expected {required}, got {}",
                arguments.len()
            );
            self.error(ErrorKind::InsufficientArguments, expression.span, message);
        } else if arguments.len() > function.parameters.len() {
            let message = format!(
                "too many arguments: expected {}, got {}",
                function.parameters.len(),
                arguments.len()
            );
            self.error(ErrorKind::ExcessiveArguments, expression.span, message);
        }

        // Arguments, with labels and inference.
        for (index, argument) in arguments.iter().enumerate() {
            let parameter = function.parameters.get(index);

            if let Some(parameter) = parameter {
                match (&parameter.label, &argument.label) {
                    (Some(expected), None) => {
                        let message = format!("missing argument label `{expected}`");
                        self.error(ErrorKind::MissingArgumentLabel, argument.span, message);
                    }
                    (Some(expected), Some(given)) if *expected != given.name => {
                        let message = format!(
                            "incorrect argument label: expected `{expected}`, got `{}`",
                            given.name
                        );
                        self.error(ErrorKind::IncorrectArgumentLabel, given.span, message);
                    }
                    (None, Some(given)) => {
                        let message =
                            format!("unexpected argument label `{}`", given.name);
                        self.error(ErrorKind::IncorrectArgumentLabel, given.span, message);
                    }
                    _ => {}
                }
            }

            let declared = parameter.map(|p| p.type_id);
            let expected = declared.filter(|d| !self.store.mentions_generic(*d));
            let argument_type = self.check_expression_expecting(&argument.value, expected);

            if let Some(declared) = declared {
                if self.store.mentions_generic(declared) {
                    self.collect_generic_bindings(
                        declared,
                        argument_type,
                        &mut bindings,
                        expression,
                    );
                } else if !self.store.is_subtype(argument_type, declared) {
                    let got = self.store.pretty(argument_type);
                    let want = self.store.pretty(declared);
                    let message = format!("mismatched types: expected `{want}`, got `{got}`");
                    self.error(ErrorKind::TypeMismatch, argument.value.span, message);
                }

                // Resource arguments must be explicitly moved.
                let instantiated = self.store.instantiate(declared, &bindings);
                if self.store.is_resource(instantiated)
                    && self.store.is_resource(argument_type)
                    && !matches!(
                        argument.value.kind,
                        ExpressionKind::Unary {
                            op: UnaryOp::Move,
                            ..
                        } | ExpressionKind::Create { .. }
                            | ExpressionKind::Invocation { .. }
                    )
                {
                    self.error(
                        ErrorKind::IncorrectTransferOperation,
                        argument.value.span,
                        "passing a resource requires the move operator `<-`",
                    );
                    self.record_resource_move(&argument.value);
                }
            }
        }

        // Every non-optional slot must be bound; bounds must hold.
        for (index, type_parameter) in function.type_parameters.iter().enumerate() {
            match bindings[index] {
                None => {
                    if !type_parameter.optional {
                        let message = format!(
                            "cannot infer type parameter `{}`; provide an explicit type argument",
                            type_parameter.name
                        );
                        self.error(
                            ErrorKind::TypeParameterTypeInference,
                            expression.span,
                            message,
                        );
                    }
                }
                Some(binding) => {
                    if type_parameter.must_be_reference
                        && !matches!(
                            self.store.get(binding),
                            Type::Reference { .. } | Type::Invalid
                        )
                    {
                        let pretty = self.store.pretty(binding);
                        let message = format!(
                            "type argument for `{}` must be a reference type, got `{pretty}`",
                            type_parameter.name
                        );
                        self.error(ErrorKind::TypeMismatch, expression.span, message);
                    }
                    if let Some(bound) = type_parameter.bound {
                        if !self.store.is_subtype(binding, bound) {
                            let got = self.store.pretty(binding);
                            let want = self.store.pretty(bound);
                            let message = format!(
                                "type argument `{got}` does not satisfy bound `{want}`"
                            );
                            self.error(
                                ErrorKind::TypeParameterTypeMismatch,
                                expression.span,
                                message,
                            );
                        }
                    }
                }
            }
        }

        let resolved: Vec<TypeId> = bindings
            .iter()
            .map(|binding| binding.unwrap_or(self.store.invalid))
            .collect();
        self.elaboration.set_type_arguments(expression.id, resolved);

        bindings
    }

    /// Structural unification of a declared generic parameter type with
    /// the actual argument type. The earliest binding wins.
    fn collect_generic_bindings(
        &mut self,
        declared: TypeId,
        actual: TypeId,
        bindings: &mut Vec<Option<TypeId>>,
        call: &'a Expression,
    ) {
        match (self.store.get(declared).clone(), self.store.get(actual).clone()) {
            (Type::Generic { index, name }, _) => {
                if *self.store.get(actual) == Type::Invalid {
                    return;
                }
                match bindings.get(index as usize).copied().flatten() {
                    None => {
                        if let Some(slot) = bindings.get_mut(index as usize) {
                            *slot = Some(actual);
                        }
                    }
                    Some(existing) => {
                        if existing != actual && !self.store.is_subtype(actual, existing) {
                            let got = self.store.pretty(actual);
                            let bound = self.store.pretty(existing);
                            let message = format!(
                                "type parameter `{name}` was bound to `{bound}` but argument has type `{got}`"
                            );
                            self.error(ErrorKind::TypeParameterTypeMismatch, call.span, message);
                        }
                    }
                }
            }
            (Type::Optional(declared_inner), Type::Optional(actual_inner)) => {
                self.collect_generic_bindings(declared_inner, actual_inner, bindings, call);
            }
            (Type::VariableArray(declared_inner), Type::VariableArray(actual_inner)) => {
                self.collect_generic_bindings(declared_inner, actual_inner, bindings, call);
            }
            (
                Type::Dictionary {
                    key: declared_key,
                    value: declared_value,
                },
                Type::Dictionary {
                    key: actual_key,
                    value: actual_value,
                },
            ) => {
                self.collect_generic_bindings(declared_key, actual_key, bindings, call);
                self.collect_generic_bindings(declared_value, actual_value, bindings, call);
            }
            (
                Type::Reference {
                    referenced: declared_inner,
                    ..
                },
                Type::Reference {
                    referenced: actual_inner,
                    ..
                },
            ) => {
                self.collect_generic_bindings(declared_inner, actual_inner, bindings, call);
            }
            (Type::Capability { borrow: Some(declared_inner) }, Type::Capability { borrow: Some(actual_inner) }) => {
                self.collect_generic_bindings(declared_inner, actual_inner, bindings, call);
            }
            _ => {}
        }
    }

    /// `create` for resource constructors, `emit` for event constructors.
    fn enforce_constructor_rules(
        &mut self,
        expression: &'a Expression,
        constructor_of: Option<CompositeId>,
    ) {
        let Some(composite_id) = constructor_of else {
            return;
        };
        let kind = self.store.composite(composite_id).kind;
        match kind {
            CompositeKind::Resource => {
                if self.create_target != Some(expression.id) {
                    self.error(
                        ErrorKind::MissingCreate,
                        expression.span,
                        "resource constructors must be invoked with `create`",
                    );
                }
            }
            CompositeKind::Event => {
                if self.emit_target == Some(expression.id) {
                    self.emitted_event = Some(true);
                } else {
                    self.error(
                        ErrorKind::EmitNonEvent,
                        expression.span,
                        "events can only be invoked with `emit`",
                    );
                }
            }
            _ => {}
        }
    }
}

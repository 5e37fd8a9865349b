//! Statement checking: declarations, assignments, control flow, loops,
//! returns, and the exit analysis.
//!
//! Exit analysis is conservative: a path exits on a value-returning
//! `return`, a call whose result type is `Never`, or an `if`/`else` whose
//! arms both exit. A condition that is guaranteed to run its body (a
//! literal `true`) deliberately does not count.

use cairn_ast::{
    AssignmentStatement, Block, EmitStatement, ExpressionKind, ForInStatement, IfStatement,
    IfTest, ReturnStatement, Statement, SwapStatement, Transfer, VariableDeclaration,
    VariableKind,
};
use cairn_common::diagnostics::ErrorKind;

use crate::activations::BindingKind;
use crate::checker::Checker;
use crate::resources::{ResourceMap, ResourceState};
use crate::types::{Type, TypeId};

/// How a statement (or block) terminates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Exit {
    /// Control continues past the statement.
    None,
    /// `break`/`continue`: leaves the block, not the function.
    Jump,
    /// `return` or a `Never`-typed call: leaves the function.
    Definite,
}

impl Exit {
    fn combine_branches(then_exit: Exit, else_exit: Exit) -> Exit {
        match (then_exit, else_exit) {
            (Exit::None, _) | (_, Exit::None) => Exit::None,
            (Exit::Definite, Exit::Definite) => Exit::Definite,
            _ => Exit::Jump,
        }
    }
}

impl<'a> Checker<'a> {
    /// Check a block in a fresh scope. Reports `UnreachableStatement` for
    /// the first statement after a definite termination and returns how
    /// the block exits.
    pub(crate) fn check_block(&mut self, block: &'a Block) -> Exit {
        self.enter_scope();
        let exit = self.check_statements(&block.statements);
        self.exit_scope(exit == Exit::Definite);
        exit
    }

    /// Check statements in the current scope (used where bindings must be
    /// visible in the same frame as the block, e.g. `if let`).
    pub(crate) fn check_statements(&mut self, statements: &'a [Statement]) -> Exit {
        let mut exit = Exit::None;
        let mut unreachable_reported = false;
        for statement in statements {
            if exit != Exit::None && !unreachable_reported {
                self.error(
                    ErrorKind::UnreachableStatement,
                    statement.span(),
                    "statement is unreachable",
                );
                unreachable_reported = true;
            }
            let statement_exit = self.check_statement(statement);
            if exit == Exit::None {
                exit = statement_exit;
            }
        }
        exit
    }

    pub(crate) fn check_statement(&mut self, statement: &'a Statement) -> Exit {
        match statement {
            Statement::Variable(declaration) => {
                self.check_variable_declaration(declaration);
                Exit::None
            }
            Statement::Assignment(assignment) => {
                self.check_assignment(assignment);
                Exit::None
            }
            Statement::Swap(swap) => {
                self.check_swap(swap);
                Exit::None
            }
            Statement::If(if_statement) => self.check_if(if_statement),
            Statement::While(while_statement) => {
                self.check_while(while_statement);
                Exit::None
            }
            Statement::ForIn(for_statement) => {
                self.check_for_in(for_statement);
                Exit::None
            }
            Statement::Return(return_statement) => self.check_return(return_statement),
            Statement::Break { span, .. } => {
                if self.current_function().is_none_or(|f| f.loop_depth == 0) {
                    self.error(
                        ErrorKind::ControlStatement,
                        *span,
                        "`break` is only valid inside the innermost loop",
                    );
                }
                Exit::Jump
            }
            Statement::Continue { span, .. } => {
                if self.current_function().is_none_or(|f| f.loop_depth == 0) {
                    self.error(
                        ErrorKind::ControlStatement,
                        *span,
                        "`continue` is only valid inside the innermost loop",
                    );
                }
                Exit::Jump
            }
            Statement::Emit(emit) => {
                self.check_emit(emit);
                Exit::None
            }
            Statement::Expression(expression) => {
                let type_id = self.check_expression(expression);
                if *self.store.get(type_id) == Type::Never {
                    Exit::Definite
                } else {
                    Exit::None
                }
            }
        }
    }

    // =========================================================================
    // Variable declarations
    // =========================================================================

    pub(crate) fn check_variable_declaration(
        &mut self,
        declaration: &'a VariableDeclaration,
    ) -> TypeId {
        let declared = declaration
            .type_annotation
            .as_ref()
            .map(|annotation| self.resolve_type_annotation(annotation));

        if declaration.second_value.is_some() {
            return self.check_second_value_declaration(declaration, declared);
        }

        let value_type = self.check_expression_expecting(&declaration.value, declared);

        if let Some(declared_type) = declared {
            if !self.store.is_subtype(value_type, declared_type) {
                let got = self.store.pretty(value_type);
                let expected = self.store.pretty(declared_type);
                let message = format!("mismatched types: expected `{expected}`, got `{got}`");
                self.error(ErrorKind::TypeMismatch, declaration.value.span, message);
            }
        }

        let target_type = declared.unwrap_or(value_type);
        self.check_transfer(
            declaration.transfer,
            declaration.transfer_span,
            target_type,
            value_type,
            &declaration.value,
        );

        let kind = match declaration.kind {
            VariableKind::Let => BindingKind::Constant,
            VariableKind::Var => BindingKind::Variable,
        };
        self.declare_value(
            &declaration.identifier.name,
            target_type,
            kind,
            declaration.access,
            declaration.identifier.span,
        );
        self.elaboration
            .set_expression_type(declaration.id, target_type);
        self.elaboration
            .record_occurrence(declaration.identifier.span, declaration.id);
        target_type
    }

    /// `let z <- y <- x`: `x` moves into the slot `y`; the slot's prior
    /// contents bind to `z`.
    fn check_second_value_declaration(
        &mut self,
        declaration: &'a VariableDeclaration,
        declared: Option<TypeId>,
    ) -> TypeId {
        let slot = &declaration.value;
        let slot_is_target = matches!(
            slot.kind,
            ExpressionKind::Identifier(_)
                | ExpressionKind::Member { .. }
                | ExpressionKind::Index { .. }
        );
        if !slot_is_target {
            self.error(
                ErrorKind::InvalidAssignmentTarget,
                slot.span,
                "second-value transfer requires an assignable target",
            );
        }

        let slot_type = self.check_expression(slot);

        if declaration.transfer != Transfer::Move && self.store.is_resource(slot_type) {
            self.error(
                ErrorKind::IncorrectTransferOperation,
                declaration.transfer_span,
                "resource transfer requires the move operator `<-`",
            );
        }
        if declaration.second_transfer == Some(Transfer::Copy)
            && self.store.is_resource(slot_type)
        {
            let span = declaration
                .second_transfer_span
                .unwrap_or(declaration.span);
            self.error(
                ErrorKind::IncorrectTransferOperation,
                span,
                "resource transfer requires the move operator `<-`",
            );
        }

        let second_value = declaration
            .second_value
            .as_ref()
            .unwrap_or_else(|| unreachable!("checked by caller"));
        let second_type = self.check_expression_expecting(second_value, Some(slot_type));
        if !self.store.is_subtype(second_type, slot_type) {
            let got = self.store.pretty(second_type);
            let expected = self.store.pretty(slot_type);
            let message = format!("mismatched types: expected `{expected}`, got `{got}`");
            self.error(ErrorKind::TypeMismatch, second_value.span, message);
        }

        // The slot's contents move out into the new binding, then the
        // second value moves in, leaving the slot valid again.
        if self.store.is_resource(slot_type) {
            self.record_resource_move(slot);
            self.record_resource_move(second_value);
            self.revalidate_location(slot);
        }

        if let Some(declared_type) = declared {
            if !self.store.is_subtype(slot_type, declared_type) {
                let got = self.store.pretty(slot_type);
                let expected = self.store.pretty(declared_type);
                let message = format!("mismatched types: expected `{expected}`, got `{got}`");
                self.error(ErrorKind::TypeMismatch, slot.span, message);
            }
        }
        let target_type = declared.unwrap_or(slot_type);

        let kind = match declaration.kind {
            VariableKind::Let => BindingKind::Constant,
            VariableKind::Var => BindingKind::Variable,
        };
        self.declare_value(
            &declaration.identifier.name,
            target_type,
            kind,
            declaration.access,
            declaration.identifier.span,
        );
        self.elaboration
            .set_expression_type(declaration.id, target_type);
        target_type
    }

    /// Validate the transfer operator against the value's resource-ness
    /// and record moves.
    pub(crate) fn check_transfer(
        &mut self,
        transfer: Transfer,
        transfer_span: cairn_common::span::Span,
        target_type: TypeId,
        value_type: TypeId,
        value: &'a cairn_ast::Expression,
    ) {
        let value_is_resource = self.store.is_resource(value_type);
        let invalid = self.store.invalid;
        match transfer {
            Transfer::Copy if value_is_resource => {
                self.error(
                    ErrorKind::IncorrectTransferOperation,
                    transfer_span,
                    "resource transfer requires the move operator `<-`",
                );
            }
            Transfer::Move if !value_is_resource && value_type != invalid => {
                if self.store.is_resource(target_type) {
                    let got = self.store.pretty(value_type);
                    let message =
                        format!("expected a resource value to move, got `{got}`");
                    self.error(ErrorKind::NonResourceType, value.span, message);
                } else {
                    self.error(
                        ErrorKind::IncorrectTransferOperation,
                        transfer_span,
                        "the move operator `<-` is only valid for resources",
                    );
                }
            }
            _ => {}
        }
        if value_is_resource && transfer == Transfer::Move {
            self.record_resource_move(value);
        }
    }

    // =========================================================================
    // Assignments and swaps
    // =========================================================================

    fn check_assignment(&mut self, assignment: &'a AssignmentStatement) {
        let target_type = self.check_assignment_target(&assignment.target);
        let value_type = self.check_expression_expecting(&assignment.value, Some(target_type));

        if !self.store.is_subtype(value_type, target_type) {
            let got = self.store.pretty(value_type);
            let expected = self.store.pretty(target_type);
            let message = format!("mismatched types: expected `{expected}`, got `{got}`");
            self.error(ErrorKind::TypeMismatch, assignment.value.span, message);
        }

        self.check_transfer(
            assignment.transfer,
            assignment.transfer_span,
            target_type,
            value_type,
            &assignment.value,
        );

        // Resource slot bookkeeping: moving into a slot whose current
        // contents are still valid would silently discard them.
        if self.store.is_resource(target_type) && assignment.transfer == Transfer::Move {
            if let Some(location) = self.tracked_location_of(&assignment.target) {
                let already_valid = self
                    .resources
                    .get(&location)
                    .is_some_and(|handle| handle.state == ResourceState::Valid);
                if already_valid && !self.is_initializer_self_assignment(&assignment.target) {
                    self.error(
                        ErrorKind::ResourceLoss,
                        assignment.span,
                        "assignment would discard the resource currently in the target",
                    );
                }
                self.mark_location_valid(location, assignment.target.span);
            }
        }

        self.check_assignment_purity(&assignment.target, assignment.span);
    }

    fn is_initializer_self_assignment(&self, target: &cairn_ast::Expression) -> bool {
        self.current_function()
            .is_some_and(|f| f.is_initializer)
            && matches!(
                &target.kind,
                ExpressionKind::Member { target, .. }
                    if matches!(&target.kind, ExpressionKind::Identifier(id) if id.name == "self")
            )
    }

    fn check_swap(&mut self, swap: &'a SwapStatement) {
        let left_type = self.check_assignment_target(&swap.left);
        let right_type = self.check_assignment_target(&swap.right);
        if !self.store.is_subtype(left_type, right_type)
            || !self.store.is_subtype(right_type, left_type)
        {
            let left = self.store.pretty(left_type);
            let right = self.store.pretty(right_type);
            let message = format!("cannot swap values of types `{left}` and `{right}`");
            self.error(ErrorKind::TypeMismatch, swap.span, message);
        }
        self.check_assignment_purity(&swap.left, swap.span);
        self.check_assignment_purity(&swap.right, swap.span);
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    fn check_if(&mut self, if_statement: &'a IfStatement) -> Exit {
        let binding = match &if_statement.test {
            IfTest::Condition(condition) => {
                let condition_type = self.check_expression(condition);
                let bool_type = self.store.bool_type;
                if !self.store.is_subtype(condition_type, bool_type) {
                    let got = self.store.pretty(condition_type);
                    let message = format!("mismatched types: expected `Bool`, got `{got}`");
                    self.error(ErrorKind::TypeMismatch, condition.span, message);
                }
                None
            }
            IfTest::Binding {
                kind,
                identifier,
                type_annotation,
                value,
            } => {
                let expected = type_annotation.as_ref().map(|annotation| {
                    let inner = self.resolve_type_annotation(annotation);
                    self.store.optional(inner)
                });
                let value_type = self.check_expression_expecting(value, expected);
                let inner = match self.store.get(value_type) {
                    Type::Optional(inner) => *inner,
                    Type::Invalid => self.store.invalid,
                    _ => {
                        let got = self.store.pretty(value_type);
                        let message =
                            format!("mismatched types: expected an optional, got `{got}`");
                        self.error(ErrorKind::TypeMismatch, value.span, message);
                        self.store.invalid
                    }
                };
                Some((*kind, identifier, inner))
            }
        };

        let snapshot = self.resources.clone();
        let assigned_snapshot = self.init_assigned.clone();

        // Then branch; an `if let` binding is visible only here.
        self.enter_scope();
        if let Some((kind, identifier, inner)) = binding {
            let binding_kind = match kind {
                VariableKind::Let => BindingKind::Constant,
                VariableKind::Var => BindingKind::Variable,
            };
            self.declare_value(
                &identifier.name,
                inner,
                binding_kind,
                cairn_ast::Access::NotSpecified,
                identifier.span,
            );
        }
        let then_exit = self.check_statements(&if_statement.then_block.statements);
        self.exit_scope(then_exit == Exit::Definite);
        let then_resources = std::mem::replace(&mut self.resources, snapshot);
        let then_assigned = std::mem::replace(&mut self.init_assigned, assigned_snapshot);

        let else_exit = match &if_statement.else_block {
            Some(else_block) => self.check_block(else_block),
            None => Exit::None,
        };
        let else_resources = std::mem::take(&mut self.resources);
        let else_assigned = self.init_assigned.take();

        self.resources = ResourceMap::merge_branches(
            then_resources,
            else_resources,
            then_exit != Exit::None,
            else_exit != Exit::None,
        );

        // A field is assigned after the branch only if it is assigned on
        // every arm that falls through.
        self.init_assigned = match (then_assigned, else_assigned) {
            (Some(then_set), Some(else_set)) => {
                if then_exit != Exit::None {
                    Some(else_set)
                } else if else_exit != Exit::None {
                    Some(then_set)
                } else {
                    Some(then_set.intersection(&else_set).cloned().collect())
                }
            }
            (then_set, else_set) => then_set.or(else_set),
        };

        if if_statement.else_block.is_some() {
            Exit::combine_branches(then_exit, else_exit)
        } else {
            Exit::None
        }
    }

    fn check_while(&mut self, while_statement: &'a cairn_ast::WhileStatement) {
        let condition_type = self.check_expression(&while_statement.test);
        let bool_type = self.store.bool_type;
        if !self.store.is_subtype(condition_type, bool_type) {
            let got = self.store.pretty(condition_type);
            let message = format!("mismatched types: expected `Bool`, got `{got}`");
            self.error(ErrorKind::TypeMismatch, while_statement.test.span, message);
        }

        // The body may run zero times: merge the pre-loop state with the
        // state after one iteration, and discard its field assignments.
        let snapshot = self.resources.clone();
        let assigned_snapshot = self.init_assigned.clone();
        if let Some(function) = self.current_function_mut() {
            function.loop_depth += 1;
        }
        let body_exit = self.check_block(&while_statement.block);
        if let Some(function) = self.current_function_mut() {
            function.loop_depth -= 1;
        }
        let body_resources = std::mem::take(&mut self.resources);
        self.resources = ResourceMap::merge_branches(
            body_resources,
            snapshot,
            body_exit == Exit::Definite,
            false,
        );
        self.init_assigned = assigned_snapshot;
    }

    fn check_for_in(&mut self, for_statement: &'a ForInStatement) {
        let iterand_type = self.check_expression(&for_statement.iterand);

        let element_type = match self.store.get(iterand_type).clone() {
            Type::VariableArray(element) | Type::ConstantArray { element, .. } => element,
            Type::String => self.store.character,
            Type::InclusiveRange(member) => member,
            Type::Reference {
                authorization,
                referenced,
            } => match self.store.get(referenced).clone() {
                Type::VariableArray(element) | Type::ConstantArray { element, .. } => {
                    self.store.reference(authorization, element)
                }
                Type::Invalid => self.store.invalid,
                _ => {
                    let got = self.store.pretty(iterand_type);
                    let message = format!("`{got}` is not iterable");
                    self.error(
                        ErrorKind::TypeMismatchWithDescription,
                        for_statement.iterand.span,
                        message,
                    );
                    self.store.invalid
                }
            },
            Type::Invalid => self.store.invalid,
            _ => {
                let got = self.store.pretty(iterand_type);
                let message = format!("`{got}` is not iterable");
                self.error(
                    ErrorKind::TypeMismatchWithDescription,
                    for_statement.iterand.span,
                    message,
                );
                self.store.invalid
            }
        };

        if self.store.is_resource(iterand_type) || self.store.is_resource(element_type) {
            self.error(
                ErrorKind::UnsupportedResourceForLoop,
                for_statement.iterand.span,
                "loops over resource arrays are not supported",
            );
        }

        let snapshot = self.resources.clone();
        let assigned_snapshot = self.init_assigned.clone();
        self.enter_scope();
        if let Some(index) = &for_statement.index {
            let int = self.store.int;
            self.declare_value(
                &index.name,
                int,
                BindingKind::Constant,
                cairn_ast::Access::NotSpecified,
                index.span,
            );
        }
        self.declare_value(
            &for_statement.identifier.name,
            element_type,
            BindingKind::Constant,
            cairn_ast::Access::NotSpecified,
            for_statement.identifier.span,
        );

        if let Some(function) = self.current_function_mut() {
            function.loop_depth += 1;
        }
        let body_exit = self.check_statements(&for_statement.block.statements);
        if let Some(function) = self.current_function_mut() {
            function.loop_depth -= 1;
        }
        self.exit_scope(body_exit == Exit::Definite);

        let body_resources = std::mem::take(&mut self.resources);
        self.resources = ResourceMap::merge_branches(
            body_resources,
            snapshot,
            body_exit == Exit::Definite,
            false,
        );
        self.init_assigned = assigned_snapshot;
    }

    fn check_return(&mut self, return_statement: &'a ReturnStatement) -> Exit {
        let Some(function) = self.current_function() else {
            self.error(
                ErrorKind::ControlStatement,
                return_statement.span,
                "`return` is only valid inside a function",
            );
            if let Some(expression) = &return_statement.expression {
                self.check_expression(expression);
            }
            return Exit::Definite;
        };
        let return_type = function.return_type;
        let void = self.store.void;
        let invalid = self.store.invalid;

        match &return_statement.expression {
            None => {
                if return_type != void && return_type != invalid {
                    let expected = self.store.pretty(return_type);
                    let message =
                        format!("missing value in return from function returning `{expected}`");
                    self.error(ErrorKind::MissingReturnValue, return_statement.span, message);
                }
            }
            Some(expression) => {
                let value_type = self.check_expression_expecting(expression, Some(return_type));
                if return_type == void {
                    if value_type != void && value_type != invalid {
                        self.error(
                            ErrorKind::InvalidReturnValue,
                            expression.span,
                            "function returning `Void` cannot return a value",
                        );
                    }
                } else if !self.store.is_subtype(value_type, return_type) {
                    let got = self.store.pretty(value_type);
                    let expected = self.store.pretty(return_type);
                    let message = format!("mismatched types: expected `{expected}`, got `{got}`");
                    self.error(ErrorKind::TypeMismatch, expression.span, message);
                }

                if self.store.is_resource(value_type)
                    && !matches!(
                        expression.kind,
                        ExpressionKind::Unary {
                            op: cairn_ast::UnaryOp::Move,
                            ..
                        }
                    )
                {
                    self.error(
                        ErrorKind::IncorrectTransferOperation,
                        expression.span,
                        "returning a resource requires the move operator `<-`",
                    );
                    self.record_resource_move(expression);
                }
            }
        }

        Exit::Definite
    }

    fn check_emit(&mut self, emit: &'a EmitStatement) {
        if !matches!(emit.invocation.kind, ExpressionKind::Invocation { .. }) {
            self.error(
                ErrorKind::EmitNonEvent,
                emit.invocation.span,
                "`emit` requires an event invocation",
            );
            self.check_expression(&emit.invocation);
            return;
        }

        if self.current_function().is_some_and(|f| f.is_view) {
            self.error(
                ErrorKind::Purity,
                emit.span,
                "events cannot be emitted from a `view` context",
            );
        }

        let saved_emit_target = self.emit_target;
        self.emit_target = Some(emit.invocation.id);
        self.emitted_event = Some(false);
        self.check_expression(&emit.invocation);
        self.emit_target = saved_emit_target;

        if self.emitted_event.take() == Some(false) {
            self.error(
                ErrorKind::EmitNonEvent,
                emit.invocation.span,
                "only events can be emitted",
            );
        }
    }
}

//! Transaction checking.
//!
//! A transaction behaves like an anonymous composite: its fields are
//! reachable through `self` in `prepare` and `execute`. `prepare` plays
//! the initializer role (field-initialization analysis applies), and
//! resource-typed fields must be invalidated by the end of the
//! transaction.

use cairn_ast::{Access, TransactionDeclaration};
use cairn_common::diagnostics::ErrorKind;
use rustc_hash::FxHashSet;

use crate::activations::BindingKind;
use crate::checker::{Checker, CompositeContext, FunctionContext};
use crate::resources::{ResourceState, TrackedLocation};
use crate::statements::Exit;
use crate::types::{CompositeData, FieldData, InitializerData};

impl<'a> Checker<'a> {
    pub(crate) fn check_transaction(&mut self, transaction: &'a TransactionDeclaration) {
        for (name, _) in &transaction.unknown_blocks {
            let message = format!("invalid block `{}` in transaction", name.name);
            self.error(ErrorKind::InvalidTransactionBlock, name.span, message);
        }

        // Fields become members of a synthetic composite bound to `self`.
        let mut data = CompositeData::new(
            "Transaction".to_string(),
            cairn_ast::CompositeKind::Struct,
            transaction.span,
        );
        for field in &transaction.fields {
            if field.access != Access::NotSpecified {
                self.error(
                    ErrorKind::InvalidTransactionFieldAccessModifier,
                    field.identifier.span,
                    "transaction fields cannot have access modifiers",
                );
            }
            let type_id = self.resolve_type_annotation(&field.type_annotation);
            data.fields.insert(
                field.identifier.name.clone(),
                FieldData {
                    name: field.identifier.name.clone(),
                    type_id,
                    kind: field.kind,
                    access: Access::NotSpecified,
                    span: field.identifier.span,
                },
            );
        }
        let id = self.store.add_composite(data);
        let self_type = self.store.composite_type(id);

        if !transaction.fields.is_empty() && transaction.prepare.is_none() {
            self.error(
                ErrorKind::TransactionMissingPrepare,
                transaction.span,
                "transaction with fields requires a `prepare` block",
            );
        }

        self.composite_stack.push(CompositeContext {
            composite: Some(id),
            self_type,
        });
        self.enter_scope();
        self.declare_value(
            "self",
            self_type,
            BindingKind::SelfBinding,
            Access::Pub,
            transaction.span,
        );

        // prepare: initializer semantics, with AuthAccount parameters.
        if let Some(prepare) = &transaction.prepare {
            let parameters = self.resolve_parameters(&prepare.parameters);
            for (ast_parameter, resolved) in prepare.parameters.iter().zip(parameters.iter()) {
                let auth_account = self.store.auth_account;
                let invalid = self.store.invalid;
                if resolved.type_id != auth_account && resolved.type_id != invalid {
                    let pretty = self.store.pretty(resolved.type_id);
                    let message = format!(
                        "`prepare` parameter must have type `AuthAccount`, got `{pretty}`"
                    );
                    self.error(
                        ErrorKind::InvalidTransactionPrepareParameterType,
                        ast_parameter.type_annotation.span,
                        message,
                    );
                }
            }
            self.store.composite_mut(id).initializer = Some(InitializerData {
                is_view: false,
                parameters: parameters.clone(),
                span: prepare.span,
            });

            if let Some(body) = &prepare.body {
                let fields: Vec<String> =
                    self.store.composite(id).fields.keys().cloned().collect();
                let saved_assigned = self.init_assigned.take();
                let saved_fields = std::mem::take(&mut self.init_fields);
                self.init_assigned = Some(FxHashSet::default());
                self.init_fields = fields;

                self.enter_scope();
                self.declare_ast_parameters(&prepare.parameters, &parameters);
                self.functions.push(FunctionContext {
                    return_type: self.store.void,
                    is_view: false,
                    is_initializer: true,
                    loop_depth: 0,
                    entry_depth: self.values.depth(),
                });
                let exit = self.check_block(body);
                self.functions.pop();
                self.exit_scope(exit == Exit::Definite);

                let assigned = self.init_assigned.take().unwrap_or_default();
                if exit != Exit::Definite {
                    let unassigned: Vec<(String, cairn_common::span::Span)> = self
                        .store
                        .composite(id)
                        .fields
                        .values()
                        .filter(|f| !assigned.contains(&f.name))
                        .map(|f| (f.name.clone(), f.span))
                        .collect();
                    for (name, span) in unassigned {
                        let message = format!("field `{name}` is never initialized");
                        self.error(ErrorKind::FieldUninitialized, span, message);
                    }
                }
                self.init_assigned = saved_assigned;
                self.init_fields = saved_fields;
            }
        }

        // execute: an ordinary impure body over the same `self`.
        if let Some(execute) = &transaction.execute {
            self.enter_scope();
            self.functions.push(FunctionContext {
                return_type: self.store.void,
                is_view: false,
                is_initializer: false,
                loop_depth: 0,
                entry_depth: self.values.depth(),
            });
            let exit = self.check_block(execute);
            self.functions.pop();
            self.exit_scope(exit == Exit::Definite);
        }

        // Resource fields must be invalidated by the end of the
        // transaction.
        let resource_fields: Vec<(String, cairn_common::span::Span)> = self
            .store
            .composite(id)
            .fields
            .values()
            .filter(|f| self.store.is_resource(f.type_id))
            .map(|f| (f.name.clone(), f.span))
            .collect();
        for (name, span) in resource_fields {
            let location = TrackedLocation::SelfField(name.clone());
            let still_valid = self.resources.get(&location).is_some_and(|handle| {
                matches!(
                    handle.state,
                    ResourceState::Valid | ResourceState::PotentiallyLost
                )
            });
            if still_valid {
                let message =
                    format!("resource field `{name}` is not invalidated by the transaction");
                self.error(ErrorKind::ResourceFieldNotInvalidated, span, message);
            }
            self.resources.remove(&location);
        }

        self.exit_scope(true);
        self.composite_stack.pop();
    }
}

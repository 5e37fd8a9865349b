//! Declaration resolution.
//!
//! Pass 1 registers every globally declared type and function signature
//! without entering bodies: composite and interface shells first (so
//! forward and mutually recursive references resolve), then member
//! signatures resolved inside a scope that exposes sibling nested types,
//! then conformance-cycle detection. Pass 2 checks bodies in source order
//! under fresh activations with `self` bound.

use cairn_ast::{
    Access, CompositeDeclaration, CompositeKind, Declaration, FieldDeclaration,
    FunctionDeclaration, InterfaceDeclaration, Member, Parameter, PragmaDeclaration,
    SpecialFunctionDeclaration, TypeAnnotation, TypeSyntax,
};
use cairn_common::diagnostics::ErrorKind;
use cairn_common::span::Span;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::activations::BindingKind;
use crate::checker::{Checker, CompositeContext, FunctionContext};
use crate::config::TopLevelDeclarationKind;
use crate::elaboration::GlobalValue;
use crate::statements::Exit;
use crate::types::{
    Authorization, CompositeData, CompositeId, FieldData, FunctionData, FunctionParameter,
    FunctionType, InitializerData, InterfaceData, InterfaceId, Type, TypeId,
};

impl<'a> Checker<'a> {
    // =========================================================================
    // Pass 1: registration
    // =========================================================================

    pub(crate) fn register_declarations(&mut self) {
        self.enforce_top_level_policy();

        // 1a: shells. Top-level names go into the global type activation;
        // nested names are reachable through their parent.
        let mut top_composites: Vec<(&'a CompositeDeclaration, CompositeId)> = Vec::new();
        let mut top_interfaces: Vec<(&'a InterfaceDeclaration, InterfaceId)> = Vec::new();
        let program = self.program;
        for declaration in &program.declarations {
            match declaration {
                Declaration::Composite(composite) => {
                    let id = self.register_composite_shell(composite, None);
                    top_composites.push((composite, id));
                }
                Declaration::Interface(interface) => {
                    let id = self.register_interface_shell(interface, None);
                    top_interfaces.push((interface, id));
                }
                Declaration::Import(import) => self.process_import(import),
                _ => {}
            }
        }

        // 1b: member signatures, inside scopes exposing nested names.
        for &(interface, id) in &top_interfaces {
            self.resolve_interface_signatures(interface, id);
        }
        for &(composite, id) in &top_composites {
            self.resolve_composite_tree(composite, id);
        }

        // Top-level composites in value position: contracts resolve to
        // their singleton instance, everything else to its constructor.
        // Shadowed duplicates were already reported at the type side.
        for &(composite, id) in &top_composites {
            let my_type = self.store.composite_type(id);
            let current = self
                .types_env
                .lookup(&composite.identifier.name)
                .map(|entry| entry.type_id);
            if current != Some(my_type) {
                continue;
            }
            let (value_type, binding_kind) = if composite.kind == CompositeKind::Contract {
                (self.store.composite_type(id), BindingKind::Constant)
            } else {
                (self.store.constructor_type(id), BindingKind::Constructor)
            };
            self.declare_value(
                &composite.identifier.name,
                value_type,
                binding_kind,
                composite.access,
                composite.identifier.span,
            );
            self.elaboration.global_values.insert(
                composite.identifier.name.clone(),
                GlobalValue {
                    type_id: value_type,
                    declaration_span: composite.identifier.span,
                },
            );
            let type_id = self.store.composite_type(id);
            self.elaboration
                .global_types
                .insert(composite.identifier.name.clone(), type_id);
        }
        for &(interface, id) in &top_interfaces {
            let type_id = self.store.interface_type(id);
            self.elaboration
                .global_types
                .insert(interface.identifier.name.clone(), type_id);
        }

        self.detect_conformance_cycles();

        // Global function signatures.
        for declaration in &program.declarations {
            if let Declaration::Function(function) = declaration {
                self.register_global_function(function);
            }
        }
    }

    fn enforce_top_level_policy(&mut self) {
        let Some(policy) = &self.config.valid_top_level_declarations else {
            return;
        };
        let allowed = policy(&self.location);
        let program = self.program;
        for declaration in &program.declarations {
            let kind = match declaration {
                Declaration::Composite(_) => TopLevelDeclarationKind::Composite,
                Declaration::Interface(_) => TopLevelDeclarationKind::Interface,
                Declaration::Function(_) => TopLevelDeclarationKind::Function,
                Declaration::Variable(_) => TopLevelDeclarationKind::Variable,
                Declaration::Transaction(_) => TopLevelDeclarationKind::Transaction,
                Declaration::Import(_) => TopLevelDeclarationKind::Import,
                Declaration::Pragma(_) => TopLevelDeclarationKind::Pragma,
            };
            if !allowed.contains(&kind) {
                let message = format!("declaration kind {kind:?} is not valid at the top level");
                self.error(
                    ErrorKind::InvalidTopLevelDeclaration,
                    declaration.span(),
                    message,
                );
            }
        }
    }

    fn register_composite_shell(
        &mut self,
        composite: &'a CompositeDeclaration,
        parent: Option<CompositeId>,
    ) -> CompositeId {
        trace!(name = %composite.identifier.name, "register composite shell");
        let data = CompositeData::new(
            composite.identifier.name.clone(),
            composite.kind,
            composite.identifier.span,
        );
        let id = self.store.add_composite(data);
        let type_id = self.store.composite_type(id);

        match parent {
            None => {
                self.declare_type(&composite.identifier.name, type_id, composite.identifier.span);
            }
            Some(parent_id) => {
                if self
                    .store
                    .composite(parent_id)
                    .nested_types
                    .contains_key(&composite.identifier.name)
                {
                    let message = format!("cannot redeclare `{}`", composite.identifier.name);
                    self.error(ErrorKind::Redeclaration, composite.identifier.span, message);
                }
                self.store
                    .composite_mut(parent_id)
                    .nested_types
                    .insert(composite.identifier.name.clone(), type_id);
            }
        }

        for member in &composite.members {
            match member {
                Member::Composite(nested) => {
                    if composite.kind != CompositeKind::Contract
                        && nested.kind != CompositeKind::Event
                    {
                        let message = format!(
                            "composite `{}` cannot be nested in {} `{}`",
                            nested.identifier.name,
                            composite.kind.keyword(),
                            composite.identifier.name
                        );
                        self.error(
                            ErrorKind::InvalidNestedDeclaration,
                            nested.identifier.span,
                            message,
                        );
                    }
                    self.register_composite_shell(nested, Some(id));
                }
                Member::Interface(nested) => {
                    if composite.kind != CompositeKind::Contract {
                        let message = format!(
                            "interface `{}` cannot be nested in {} `{}`",
                            nested.identifier.name,
                            composite.kind.keyword(),
                            composite.identifier.name
                        );
                        self.error(
                            ErrorKind::InvalidNestedDeclaration,
                            nested.identifier.span,
                            message,
                        );
                    }
                    self.register_interface_shell(nested, Some(id));
                }
                _ => {}
            }
        }

        id
    }

    fn register_interface_shell(
        &mut self,
        interface: &'a InterfaceDeclaration,
        parent: Option<CompositeId>,
    ) -> InterfaceId {
        trace!(name = %interface.identifier.name, "register interface shell");
        let data = InterfaceData::new(
            interface.identifier.name.clone(),
            interface.kind,
            interface.identifier.span,
        );
        let id = self.store.add_interface(data);
        let type_id = self.store.interface_type(id);

        match parent {
            None => {
                self.declare_type(&interface.identifier.name, type_id, interface.identifier.span);
            }
            Some(parent_id) => {
                if self
                    .store
                    .composite(parent_id)
                    .nested_types
                    .contains_key(&interface.identifier.name)
                {
                    let message = format!("cannot redeclare `{}`", interface.identifier.name);
                    self.error(ErrorKind::Redeclaration, interface.identifier.span, message);
                }
                self.store
                    .composite_mut(parent_id)
                    .nested_types
                    .insert(interface.identifier.name.clone(), type_id);
            }
        }

        id
    }

    /// Resolve member signatures for a composite and its nested
    /// declarations, with the nested names in scope.
    fn resolve_composite_tree(&mut self, composite: &'a CompositeDeclaration, id: CompositeId) {
        let nested: Vec<(String, TypeId, Span)> = self
            .store
            .composite(id)
            .nested_types
            .iter()
            .map(|(name, type_id)| (name.clone(), *type_id, composite.identifier.span))
            .collect();
        let has_nested = !nested.is_empty();
        if has_nested {
            self.types_env.push();
            for (name, type_id, span) in nested {
                self.types_env.declare_forced(
                    name.clone(),
                    crate::activations::TypeEntry {
                        name,
                        type_id,
                        span,
                    },
                );
            }
        }

        for member in &composite.members {
            if let Member::Interface(nested_interface) = member {
                if let Some(nested_id) = self.nested_interface_id(id, &nested_interface.identifier.name)
                {
                    self.resolve_interface_signatures(nested_interface, nested_id);
                }
            }
        }
        self.resolve_composite_signatures(composite, id);
        for member in &composite.members {
            if let Member::Composite(nested_composite) = member {
                if let Some(nested_id) =
                    self.nested_composite_id(id, &nested_composite.identifier.name)
                {
                    self.resolve_composite_tree(nested_composite, nested_id);
                }
            }
        }

        if has_nested {
            self.types_env.pop();
        }
    }

    pub(crate) fn nested_composite_id(
        &self,
        parent: CompositeId,
        name: &str,
    ) -> Option<CompositeId> {
        let type_id = self.store.composite(parent).nested_types.get(name)?;
        match self.store.get(*type_id) {
            Type::Composite(id) => Some(*id),
            _ => None,
        }
    }

    fn nested_interface_id(&self, parent: CompositeId, name: &str) -> Option<InterfaceId> {
        let type_id = self.store.composite(parent).nested_types.get(name)?;
        match self.store.get(*type_id) {
            Type::Interface(id) => Some(*id),
            _ => None,
        }
    }

    fn resolve_composite_signatures(&mut self, composite: &'a CompositeDeclaration, id: CompositeId) {
        let mut conformances = Vec::new();
        for conformance in &composite.conformances {
            if let Some(interface_id) = self.resolve_conformance(conformance) {
                conformances.push(interface_id);
            }
        }
        self.store.composite_mut(id).conformances = conformances;

        if let Some(base) = &composite.base_type {
            let base_type = self.resolve_type_annotation(base);
            self.store.composite_mut(id).base_type = Some(base_type);
        }

        for member in &composite.members {
            match member {
                Member::Field(field) => self.resolve_field_signature(field, Some(id), None),
                Member::Initializer(initializer) => {
                    let parameters = self.resolve_parameters(&initializer.parameters);
                    let data = InitializerData {
                        is_view: initializer.purity.is_view(),
                        parameters,
                        span: initializer.span,
                    };
                    self.store.composite_mut(id).initializer = Some(data);
                }
                Member::Function(function) => {
                    let type_id = self.resolve_function_signature(function);
                    let duplicate = self
                        .store
                        .composite(id)
                        .functions
                        .contains_key(&function.identifier.name)
                        || self
                            .store
                            .composite(id)
                            .fields
                            .contains_key(&function.identifier.name);
                    if duplicate {
                        let message =
                            format!("cannot redeclare member `{}`", function.identifier.name);
                        self.error(ErrorKind::Redeclaration, function.identifier.span, message);
                    }
                    self.store.composite_mut(id).functions.insert(
                        function.identifier.name.clone(),
                        FunctionData::user(
                            function.access,
                            type_id,
                            function.purity.is_view(),
                            function.body.is_some(),
                            function.identifier.span,
                        ),
                    );
                }
                Member::Composite(_) | Member::Interface(_) => {}
            }
        }
    }

    fn resolve_interface_signatures(&mut self, interface: &'a InterfaceDeclaration, id: InterfaceId) {
        let mut conformances = Vec::new();
        for conformance in &interface.conformances {
            if let Some(interface_id) = self.resolve_conformance(conformance) {
                conformances.push(interface_id);
            }
        }
        self.store.interface_mut(id).conformances = conformances;

        for member in &interface.members {
            match member {
                Member::Field(field) => self.resolve_field_signature(field, None, Some(id)),
                Member::Initializer(initializer) => {
                    let parameters = self.resolve_parameters(&initializer.parameters);
                    let data = InitializerData {
                        is_view: initializer.purity.is_view(),
                        parameters,
                        span: initializer.span,
                    };
                    self.store.interface_mut(id).initializer = Some(data);
                }
                Member::Function(function) => {
                    let type_id = self.resolve_function_signature(function);
                    self.store.interface_mut(id).functions.insert(
                        function.identifier.name.clone(),
                        FunctionData::user(
                            function.access,
                            type_id,
                            function.purity.is_view(),
                            function.body.is_some(),
                            function.identifier.span,
                        ),
                    );
                }
                Member::Composite(nested) => {
                    let message = format!(
                        "composite `{}` cannot be nested in an interface",
                        nested.identifier.name
                    );
                    self.error(
                        ErrorKind::InvalidNestedDeclaration,
                        nested.identifier.span,
                        message,
                    );
                }
                Member::Interface(nested) => {
                    let message = format!(
                        "interface `{}` cannot be nested in an interface",
                        nested.identifier.name
                    );
                    self.error(
                        ErrorKind::InvalidNestedDeclaration,
                        nested.identifier.span,
                        message,
                    );
                }
            }
        }
    }

    fn resolve_field_signature(
        &mut self,
        field: &'a FieldDeclaration,
        composite: Option<CompositeId>,
        interface: Option<InterfaceId>,
    ) {
        let type_id = self.resolve_type_annotation(&field.type_annotation);
        let data = FieldData {
            name: field.identifier.name.clone(),
            type_id,
            kind: field.kind,
            access: field.access,
            span: field.identifier.span,
        };
        if let Some(id) = composite {
            if self
                .store
                .composite(id)
                .fields
                .contains_key(&field.identifier.name)
            {
                let message = format!("cannot redeclare member `{}`", field.identifier.name);
                self.error(ErrorKind::Redeclaration, field.identifier.span, message);
            }
            self.store
                .composite_mut(id)
                .fields
                .insert(field.identifier.name.clone(), data);
        } else if let Some(id) = interface {
            self.store
                .interface_mut(id)
                .fields
                .insert(field.identifier.name.clone(), data);
        }
    }

    fn resolve_conformance(&mut self, annotation: &TypeAnnotation) -> Option<InterfaceId> {
        let type_id = self.resolve_type_annotation_raw(annotation);
        match self.store.get(type_id) {
            Type::Interface(id) => Some(*id),
            Type::Invalid => None,
            _ => {
                let pretty = self.store.pretty(type_id);
                let message = format!("`{pretty}` is not an interface");
                self.error(ErrorKind::InvalidDeclaration, annotation.span, message);
                None
            }
        }
    }

    pub(crate) fn resolve_parameters(
        &mut self,
        parameters: &[Parameter],
    ) -> Vec<FunctionParameter> {
        parameters
            .iter()
            .map(|parameter| {
                let type_id = self.resolve_type_annotation(&parameter.type_annotation);
                FunctionParameter {
                    label: parameter.effective_label().map(str::to_string),
                    name: parameter.name.name.clone(),
                    type_id,
                    required: true,
                }
            })
            .collect()
    }

    pub(crate) fn resolve_function_signature(
        &mut self,
        function: &'a FunctionDeclaration,
    ) -> TypeId {
        let parameters = self.resolve_parameters(&function.parameters);
        let return_type = function
            .return_type
            .as_ref()
            .map_or(self.store.void, |annotation| {
                self.resolve_type_annotation(annotation)
            });
        self.store.function(FunctionType {
            is_view: function.purity.is_view(),
            type_parameters: Vec::new(),
            parameters,
            return_type,
        })
    }

    fn register_global_function(&mut self, function: &'a FunctionDeclaration) {
        let type_id = self.resolve_function_signature(function);
        self.declare_value(
            &function.identifier.name,
            type_id,
            BindingKind::Function,
            function.access,
            function.identifier.span,
        );
        self.elaboration.global_values.insert(
            function.identifier.name.clone(),
            GlobalValue {
                type_id,
                declaration_span: function.identifier.span,
            },
        );
    }

    /// Two-color traversal over interface conformance edges.
    fn detect_conformance_cycles(&mut self) {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            Visiting,
            Done,
        }

        fn visit(
            store: &crate::types::TypeStore,
            id: InterfaceId,
            colors: &mut FxHashMap<InterfaceId, Color>,
            cyclic: &mut FxHashSet<InterfaceId>,
        ) {
            match colors.get(&id) {
                Some(Color::Done) => return,
                Some(Color::Visiting) => {
                    cyclic.insert(id);
                    return;
                }
                None => {}
            }
            colors.insert(id, Color::Visiting);
            for conformance in store.interface(id).conformances.clone() {
                visit(store, conformance, colors, cyclic);
            }
            colors.insert(id, Color::Done);
        }

        let mut colors: FxHashMap<InterfaceId, Color> = FxHashMap::default();
        let mut cyclic: FxHashSet<InterfaceId> = FxHashSet::default();
        for index in 0..self.store.interface_count() {
            visit(&self.store, InterfaceId(index as u32), &mut colors, &mut cyclic);
        }

        let mut reports: Vec<(String, Span)> = cyclic
            .iter()
            .map(|id| {
                let data = self.store.interface(*id);
                (data.identifier.clone(), data.span)
            })
            .collect();
        reports.sort_by_key(|(_, span)| (span.start, span.end));
        for (name, span) in reports {
            let message = format!("interface `{name}` has a cyclic conformance");
            self.error(ErrorKind::InvalidDeclaration, span, message);
        }
    }

    fn process_import(&mut self, import: &'a cairn_ast::ImportDeclaration) {
        let location_name = match &import.location {
            cairn_ast::ImportLocation::Address(address) => address.clone(),
            cairn_ast::ImportLocation::Named(name) => name.name.clone(),
        };
        self.elaboration.imports.push(location_name);

        let resolved = self
            .config
            .import_handler
            .as_ref()
            .and_then(|handler| handler(&self.location, &import.location));

        for identifier in &import.identifiers {
            let type_id = match &resolved {
                Some(module) if module.value_names.contains(&identifier.name) => {
                    self.store.any_struct
                }
                // Unresolvable imports degrade to the invalid type so the
                // names do not cascade into NotDeclared errors.
                _ => self.store.invalid,
            };
            self.declare_value(
                &identifier.name,
                type_id,
                BindingKind::Builtin,
                Access::Pub,
                identifier.span,
            );
        }
    }

    // =========================================================================
    // Pass 2: bodies
    // =========================================================================

    pub(crate) fn check_declaration_bodies(&mut self) {
        let program = self.program;
        for declaration in &program.declarations {
            match declaration {
                Declaration::Composite(composite) => self.check_composite_body(composite),
                Declaration::Interface(interface) => self.check_interface_body(interface),
                Declaration::Function(function) => self.check_global_function_body(function),
                Declaration::Variable(variable) => self.check_global_variable(variable),
                Declaration::Transaction(transaction) => self.check_transaction(transaction),
                Declaration::Pragma(pragma) => self.check_pragma(pragma),
                Declaration::Import(_) => {}
            }
        }
    }

    fn composite_id_of(&mut self, name: &str) -> Option<CompositeId> {
        let entry = self.types_env.lookup(name)?;
        match self.store.get(entry.type_id) {
            Type::Composite(id) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn check_composite_body(&mut self, composite: &'a CompositeDeclaration) {
        let Some(id) = self.composite_id_of(&composite.identifier.name) else {
            return;
        };
        let self_type = self.store.composite_type(id);
        trace!(name = %composite.identifier.name, "check composite body");

        self.composite_stack.push(CompositeContext {
            composite: Some(id),
            self_type,
        });
        self.enter_scope();

        // Nested type names and constructors are visible unqualified
        // inside the body.
        let nested: Vec<(String, TypeId)> = self
            .store
            .composite(id)
            .nested_types
            .iter()
            .map(|(name, type_id)| (name.clone(), *type_id))
            .collect();
        for (name, type_id) in nested {
            self.declare_type(&name, type_id, composite.identifier.span);
            if let Type::Composite(nested_id) = *self.store.get(type_id) {
                let (value_type, binding_kind) =
                    if self.store.composite(nested_id).kind == CompositeKind::Contract {
                        (type_id, BindingKind::Constant)
                    } else {
                        (self.store.constructor_type(nested_id), BindingKind::Constructor)
                    };
                self.declare_value(
                    &name,
                    value_type,
                    binding_kind,
                    Access::Pub,
                    composite.identifier.span,
                );
            }
        }

        self.declare_value(
            "self",
            self_type,
            BindingKind::SelfBinding,
            Access::Pub,
            composite.identifier.span,
        );

        self.check_member_access_modifiers(&composite.members);

        let mut has_initializer = false;
        for member in &composite.members {
            match member {
                Member::Field(field) => self.check_field_declaration(field, composite.kind, id),
                Member::Initializer(initializer) => {
                    has_initializer = true;
                    self.check_initializer_body(initializer, id);
                }
                Member::Function(function) => self.check_member_function_body(function, id),
                Member::Composite(nested) => self.check_composite_body(nested),
                Member::Interface(nested) => self.check_interface_body(nested),
            }
        }

        if !has_initializer {
            let fields: Vec<(String, Span)> = self
                .store
                .composite(id)
                .fields
                .values()
                .map(|f| (f.name.clone(), f.span))
                .collect();
            for (name, span) in fields {
                let message = format!("field `{name}` is never initialized");
                self.error(ErrorKind::FieldUninitialized, span, message);
            }
        }

        self.exit_scope(true);
        self.composite_stack.pop();

        // Post-order: conformance, reported at the declaration.
        self.check_conformances(composite, id);
    }

    fn check_field_declaration(
        &mut self,
        field: &'a FieldDeclaration,
        parent_kind: CompositeKind,
        id: CompositeId,
    ) {
        let type_id = self
            .store
            .composite(id)
            .fields
            .get(&field.identifier.name)
            .map(|f| f.type_id)
            .unwrap_or(self.store.invalid);

        match parent_kind {
            CompositeKind::Contract => {
                if !self.store.is_storable(type_id) {
                    let pretty = self.store.pretty(type_id);
                    let message = format!(
                        "contract field `{}` has non-storable type `{pretty}`",
                        field.identifier.name
                    );
                    self.error(
                        ErrorKind::TypeMismatchWithDescription,
                        field.type_annotation.span,
                        message,
                    );
                }
            }
            CompositeKind::Struct | CompositeKind::Event => {
                if self.store.is_resource(type_id) {
                    let message = format!(
                        "{} `{}` cannot contain a resource-typed field",
                        parent_kind.keyword(),
                        field.identifier.name
                    );
                    self.error(ErrorKind::InvalidDeclaration, field.identifier.span, message);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn current_composite_id(&self) -> Option<CompositeId> {
        self.current_composite().and_then(|ctx| ctx.composite)
    }

    fn check_member_access_modifiers(&mut self, members: &'a [Member]) {
        if self.config.access_check_mode != crate::config::AccessCheckMode::Strict {
            return;
        }
        for member in members {
            let (access, span, name) = match member {
                Member::Field(field) => {
                    (field.access, field.identifier.span, &field.identifier.name)
                }
                Member::Function(function) => (
                    function.access,
                    function.identifier.span,
                    &function.identifier.name,
                ),
                _ => continue,
            };
            if access == Access::NotSpecified {
                let message = format!("member `{name}` requires an explicit access modifier");
                self.error(ErrorKind::InvalidAccess, span, message);
            }
        }
    }

    pub(crate) fn check_initializer_body(
        &mut self,
        initializer: &'a SpecialFunctionDeclaration,
        id: CompositeId,
    ) {
        let Some(body) = &initializer.body else {
            return;
        };
        let parameters = self
            .store
            .composite(id)
            .initializer
            .as_ref()
            .map(|init| init.parameters.clone())
            .unwrap_or_default();

        let fields: Vec<String> = self.store.composite(id).fields.keys().cloned().collect();
        let saved_assigned = self.init_assigned.take();
        let saved_fields = std::mem::take(&mut self.init_fields);
        self.init_assigned = Some(FxHashSet::default());
        self.init_fields = fields;

        let saved_resources = std::mem::take(&mut self.resources);
        self.enter_scope();
        self.declare_ast_parameters(&initializer.parameters, &parameters);
        self.functions.push(FunctionContext {
            return_type: self.store.void,
            is_view: initializer.purity.is_view(),
            is_initializer: true,
            loop_depth: 0,
            entry_depth: self.values.depth(),
        });

        let exit = self.check_block(body);

        self.functions.pop();
        self.exit_scope(exit == Exit::Definite);
        self.resources = saved_resources;

        let assigned = self.init_assigned.take().unwrap_or_default();
        if exit != Exit::Definite {
            let field_spans: Vec<(String, Span)> = self
                .store
                .composite(id)
                .fields
                .values()
                .filter(|f| !assigned.contains(&f.name))
                .map(|f| (f.name.clone(), f.span))
                .collect();
            for (name, span) in field_spans {
                let message = format!("field `{name}` is never initialized");
                self.error(ErrorKind::FieldUninitialized, span, message);
            }
        }
        self.init_assigned = saved_assigned;
        self.init_fields = saved_fields;
    }

    fn check_member_function_body(&mut self, function: &'a FunctionDeclaration, id: CompositeId) {
        let Some(body) = &function.body else {
            return;
        };
        let function_type = self
            .store
            .composite(id)
            .functions
            .get(&function.identifier.name)
            .map(|f| f.type_id)
            .unwrap_or(self.store.invalid);
        self.check_function_body_common(function, body, function_type);
    }

    fn check_global_function_body(&mut self, function: &'a FunctionDeclaration) {
        let Some(body) = &function.body else {
            return;
        };
        let function_type = self
            .values
            .lookup(&function.identifier.name)
            .map(|v| v.type_id)
            .unwrap_or(self.store.invalid);
        self.check_function_body_common(function, body, function_type);
    }

    pub(crate) fn check_function_body_common(
        &mut self,
        function: &'a FunctionDeclaration,
        body: &'a cairn_ast::Block,
        function_type: TypeId,
    ) {
        let (parameters, return_type, is_view) = match self.store.get(function_type) {
            Type::Function(f) => (f.parameters.clone(), f.return_type, f.is_view),
            _ => (Vec::new(), self.store.invalid, false),
        };

        // Each body is analyzed against a fresh resource map; tracked
        // state never leaks between bodies.
        let saved_resources = std::mem::take(&mut self.resources);
        self.enter_scope();
        self.declare_ast_parameters(&function.parameters, &parameters);
        self.functions.push(FunctionContext {
            return_type,
            is_view,
            is_initializer: false,
            loop_depth: 0,
            entry_depth: self.values.depth(),
        });

        let exit = self.check_block(body);

        self.functions.pop();
        self.exit_scope(exit == Exit::Definite);
        self.resources = saved_resources;

        if return_type != self.store.void
            && return_type != self.store.invalid
            && exit != Exit::Definite
        {
            let message = format!(
                "function `{}` does not exit on every path",
                function.identifier.name
            );
            self.error(
                ErrorKind::MissingReturnStatement,
                function.identifier.span,
                message,
            );
        }
    }

    /// Declare the parameters of a function body, pairing the AST
    /// parameters with the already-resolved signature.
    pub(crate) fn declare_ast_parameters(
        &mut self,
        ast_parameters: &'a [Parameter],
        resolved: &[FunctionParameter],
    ) {
        for (index, parameter) in ast_parameters.iter().enumerate() {
            let type_id = resolved
                .get(index)
                .map(|p| p.type_id)
                .unwrap_or(self.store.invalid);
            self.declare_value(
                &parameter.name.name,
                type_id,
                BindingKind::Parameter,
                Access::NotSpecified,
                parameter.name.span,
            );
        }
    }

    pub(crate) fn check_interface_body(&mut self, interface: &'a InterfaceDeclaration) {
        let Some(entry) = self.types_env.lookup(&interface.identifier.name) else {
            return;
        };
        let interface_type = entry.type_id;
        let Type::Interface(id) = *self.store.get(interface_type) else {
            return;
        };

        // `self` in interface default implementations is the restricted
        // form of the interface.
        let base = if interface.kind == CompositeKind::Resource {
            self.store.any_resource
        } else {
            self.store.any_struct
        };
        let self_type = self.store.restricted(base, vec![id]);

        self.composite_stack.push(CompositeContext {
            composite: None,
            self_type,
        });
        self.enter_scope();
        self.declare_value(
            "self",
            self_type,
            BindingKind::SelfBinding,
            Access::Pub,
            interface.identifier.span,
        );

        for member in &interface.members {
            if let Member::Function(function) = member {
                if let Some(body) = &function.body {
                    let function_type = self
                        .store
                        .interface(id)
                        .functions
                        .get(&function.identifier.name)
                        .map(|f| f.type_id)
                        .unwrap_or(self.store.invalid);
                    self.check_function_body_common(function, body, function_type);
                }
            }
        }

        self.exit_scope(true);
        self.composite_stack.pop();
    }

    fn check_global_variable(&mut self, variable: &'a cairn_ast::VariableDeclaration) {
        let type_id = self.check_variable_declaration(variable);
        self.elaboration.global_values.insert(
            variable.identifier.name.clone(),
            GlobalValue {
                type_id,
                declaration_span: variable.identifier.span,
            },
        );
    }

    fn check_pragma(&mut self, pragma: &'a PragmaDeclaration) {
        use cairn_ast::ExpressionKind;
        let valid = match &pragma.expression.kind {
            ExpressionKind::Identifier(_) => true,
            ExpressionKind::Invocation {
                target,
                type_arguments,
                arguments,
            } => {
                matches!(target.kind, ExpressionKind::Identifier(_))
                    && type_arguments.is_empty()
                    && arguments
                        .iter()
                        .all(|a| matches!(a.value.kind, ExpressionKind::StringLiteral(_)))
            }
            _ => false,
        };
        if !valid {
            self.error(
                ErrorKind::InvalidPragma,
                pragma.span,
                "pragma must be an identifier or an identifier applied to string literals",
            );
        }
    }

    // =========================================================================
    // Type annotation resolution
    // =========================================================================

    /// Resolve an annotation; a bare interface name becomes its restricted
    /// form (`{I}`).
    pub(crate) fn resolve_type_annotation(&mut self, annotation: &TypeAnnotation) -> TypeId {
        let type_id = self.resolve_type_annotation_raw(annotation);
        if let Type::Interface(id) = *self.store.get(type_id) {
            let base = if self.store.interface(id).kind == CompositeKind::Resource {
                self.store.any_resource
            } else {
                self.store.any_struct
            };
            return self.store.restricted(base, vec![id]);
        }
        type_id
    }

    /// Resolve an annotation without interface-to-restricted promotion.
    pub(crate) fn resolve_type_annotation_raw(&mut self, annotation: &TypeAnnotation) -> TypeId {
        match &annotation.syntax {
            TypeSyntax::Named(path) => self.resolve_named_type_path(path),
            TypeSyntax::Instantiation {
                base,
                type_arguments,
            } => self.resolve_instantiation(base, type_arguments, annotation.span),
            TypeSyntax::Optional(inner) => {
                let inner = self.resolve_type_annotation(inner);
                self.store.optional(inner)
            }
            TypeSyntax::VariableArray(element) => {
                let element = self.resolve_type_annotation(element);
                self.store.variable_array(element)
            }
            TypeSyntax::ConstantArray { element, size } => {
                let element = self.resolve_type_annotation(element);
                match size.as_u64() {
                    Some(size) => self.store.intern(Type::ConstantArray { element, size }),
                    None => {
                        self.error(
                            ErrorKind::InvalidIntegerLiteralRange,
                            annotation.span,
                            "constant-sized array size is out of range",
                        );
                        self.store.invalid
                    }
                }
            }
            TypeSyntax::Dictionary { key, value } => {
                let key_type = self.resolve_type_annotation(key);
                let value_type = self.resolve_type_annotation(value);
                if !self.store.is_hashable(key_type) {
                    let pretty = self.store.pretty(key_type);
                    let message = format!("dictionary key type `{pretty}` is not hashable");
                    self.error(ErrorKind::TypeMismatchWithDescription, key.span, message);
                }
                self.store.dictionary(key_type, value_type)
            }
            TypeSyntax::Reference {
                authorization,
                referenced,
            } => {
                let referenced_type = self.resolve_type_annotation(referenced);
                let authorization = match authorization {
                    None => Authorization::Unauthorized,
                    Some(auth) => Authorization::authorized(
                        auth.entitlements.iter().map(|e| e.name.clone()).collect(),
                    ),
                };
                self.store.reference(authorization, referenced_type)
            }
            TypeSyntax::Restricted { base, restrictions } => {
                self.resolve_restricted_type(base.as_deref(), restrictions, annotation.span)
            }
            TypeSyntax::Function {
                purity,
                parameters,
                return_type,
            } => {
                let parameters = parameters
                    .iter()
                    .map(|parameter| {
                        let type_id = self.resolve_type_annotation(parameter);
                        FunctionParameter {
                            label: None,
                            name: String::new(),
                            type_id,
                            required: true,
                        }
                    })
                    .collect();
                let return_type = self.resolve_type_annotation(return_type);
                self.store.function(FunctionType {
                    is_view: purity.is_view(),
                    type_parameters: Vec::new(),
                    parameters,
                    return_type,
                })
            }
        }
    }

    fn resolve_named_type_path(&mut self, path: &[cairn_ast::Identifier]) -> TypeId {
        let first = &path[0];
        let mut current = self.resolve_type_name(&first.name, first.span);
        for segment in &path[1..] {
            if current == self.store.invalid {
                return current;
            }
            let nested = match self.store.get(current) {
                Type::Composite(id) => self
                    .store
                    .composite(*id)
                    .nested_types
                    .get(&segment.name)
                    .copied(),
                Type::Interface(id) => self
                    .store
                    .interface(*id)
                    .nested_types
                    .get(&segment.name)
                    .copied(),
                _ => None,
            };
            match nested {
                Some(type_id) => current = type_id,
                None => {
                    let message = format!("cannot find type in this scope: `{}`", segment.name);
                    self.error(ErrorKind::NotDeclared, segment.span, message);
                    return self.store.invalid;
                }
            }
        }
        current
    }

    fn resolve_instantiation(
        &mut self,
        base: &cairn_ast::Identifier,
        type_arguments: &[TypeAnnotation],
        span: Span,
    ) -> TypeId {
        match base.name.as_str() {
            "Capability" => {
                if type_arguments.len() != 1 {
                    self.error(
                        ErrorKind::ArgumentCount,
                        span,
                        "`Capability` takes exactly one type argument",
                    );
                    return self.store.capability(None);
                }
                let borrow = self.resolve_type_annotation(&type_arguments[0]);
                if !matches!(self.store.get(borrow), Type::Reference { .. } | Type::Invalid) {
                    let pretty = self.store.pretty(borrow);
                    let message = format!(
                        "`Capability` type argument must be a reference type, got `{pretty}`"
                    );
                    self.error(ErrorKind::TypeMismatch, type_arguments[0].span, message);
                }
                self.store.capability(Some(borrow))
            }
            "InclusiveRange" => {
                if type_arguments.len() != 1 {
                    self.error(
                        ErrorKind::ArgumentCount,
                        span,
                        "`InclusiveRange` takes exactly one type argument",
                    );
                    return self.store.invalid;
                }
                let member = self.resolve_type_annotation(&type_arguments[0]);
                if !matches!(self.store.get(member), Type::Integer(_) | Type::Invalid) {
                    let pretty = self.store.pretty(member);
                    let message = format!(
                        "`InclusiveRange` member type must be an integer type, got `{pretty}`"
                    );
                    self.error(ErrorKind::TypeMismatch, type_arguments[0].span, message);
                }
                self.store.intern(Type::InclusiveRange(member))
            }
            _ => {
                let base_type = self.resolve_type_name(&base.name, base.span);
                if base_type != self.store.invalid {
                    let message = format!("type `{}` is not parameterized", base.name);
                    self.error(ErrorKind::TypeParameterTypeMismatch, span, message);
                }
                base_type
            }
        }
    }

    fn resolve_restricted_type(
        &mut self,
        base: Option<&TypeAnnotation>,
        restrictions: &[TypeAnnotation],
        span: Span,
    ) -> TypeId {
        let mut interface_ids = Vec::new();
        let mut restriction_kind: Option<CompositeKind> = None;
        let mut ambiguous = false;

        for restriction in restrictions {
            let type_id = self.resolve_type_annotation_raw(restriction);
            match self.store.get(type_id) {
                Type::Interface(id) => {
                    let kind = self.store.interface(*id).kind;
                    match restriction_kind {
                        None => restriction_kind = Some(kind),
                        Some(previous) if previous != kind => ambiguous = true,
                        Some(_) => {}
                    }
                    interface_ids.push(*id);
                }
                Type::Invalid => {}
                _ => {
                    let pretty = self.store.pretty(type_id);
                    let message = format!("restriction `{pretty}` is not an interface");
                    self.error(
                        ErrorKind::TypeMismatchWithDescription,
                        restriction.span,
                        message,
                    );
                }
            }
        }

        let base_type = match base {
            Some(annotation) => self.resolve_type_annotation_raw(annotation),
            None => match restriction_kind {
                Some(CompositeKind::Resource) => self.store.any_resource,
                Some(_) => self.store.any_struct,
                None => {
                    self.error(
                        ErrorKind::AmbiguousRestrictedType,
                        span,
                        "restricted type requires at least one restriction or a base type",
                    );
                    return self.store.invalid;
                }
            },
        };

        if ambiguous {
            self.error(
                ErrorKind::AmbiguousRestrictedType,
                span,
                "restrictions mix struct and resource interfaces",
            );
            return self.store.invalid;
        }

        self.store.restricted(base_type, interface_ids)
    }
}

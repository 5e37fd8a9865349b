//! The checker: shared state and scope machinery.
//!
//! `Checker` holds everything a check needs: the type store, the two
//! activation stacks, the resource tracking map, the function/composite
//! context stacks, the diagnostic collector, and the elaboration being
//! built. The analyses live in sibling modules as further `impl Checker`
//! blocks; this module owns the state and the entry point.

use cairn_ast::{Access, Program};
use cairn_common::diagnostics::{Diagnostic, ErrorKind};
use cairn_common::span::Span;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::debug;

use crate::activations::{Activations, BindingKind, TypeEntry, Variable};
use crate::config::{CheckerConfig, Location, MemoryKind};
use crate::elaboration::{Elaboration, VariableTarget};
use crate::resources::{ResourceHandle, ResourceMap, ResourceState, TrackedLocation};
use crate::types::{CompositeId, TypeId, TypeStore};

/// A resource-typed binding declared in the current scope, checked for
/// loss when the scope is left.
#[derive(Clone, Debug)]
pub(crate) struct ScopedResource {
    pub location: TrackedLocation,
    pub name: String,
    pub origin: Span,
}

/// Most scopes declare at most a handful of resources.
pub(crate) type ScopedResources = SmallVec<[ScopedResource; 4]>;

/// Per-function checking context.
#[derive(Clone, Debug)]
pub(crate) struct FunctionContext {
    pub return_type: TypeId,
    pub is_view: bool,
    pub is_initializer: bool,
    pub loop_depth: u32,
    /// Value-activation depth at function entry; bindings at or above
    /// this depth are local to the function.
    pub entry_depth: usize,
}

/// Per-composite checking context (`self` binding).
#[derive(Clone, Debug)]
pub(crate) struct CompositeContext {
    pub composite: Option<CompositeId>,
    pub self_type: TypeId,
}

pub struct Checker<'a> {
    pub(crate) program: &'a Program,
    pub(crate) config: &'a CheckerConfig,
    pub(crate) location: Location,
    pub(crate) store: TypeStore,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) elaboration: Elaboration,

    pub(crate) values: Activations<Variable>,
    pub(crate) types_env: Activations<TypeEntry>,

    pub(crate) resources: ResourceMap,
    pub(crate) resource_scopes: Vec<ScopedResources>,
    pub(crate) next_variable_id: u32,

    pub(crate) functions: Vec<FunctionContext>,
    pub(crate) composite_stack: Vec<CompositeContext>,

    /// Assigned-field set while checking an initializer body.
    pub(crate) init_assigned: Option<FxHashSet<String>>,
    /// Fields of the composite whose initializer is being checked.
    pub(crate) init_fields: Vec<String>,

    /// The invocation node that is the direct operand of a `create`.
    pub(crate) create_target: Option<cairn_ast::NodeId>,
    /// The invocation node that is the direct operand of an `emit`.
    pub(crate) emit_target: Option<cairn_ast::NodeId>,
    /// Set by invocation checking on the emit operand: whether the
    /// invoked target was an event constructor.
    pub(crate) emitted_event: Option<bool>,
}

impl<'a> Checker<'a> {
    #[must_use]
    pub fn new(program: &'a Program, location: Location, config: &'a CheckerConfig) -> Self {
        let store = TypeStore::new(config.memory_gauge.clone());
        let elaboration = Elaboration::new(location.clone(), config.position_info_enabled);
        Self {
            program,
            config,
            location,
            store,
            diagnostics: Vec::new(),
            elaboration,
            values: Activations::new(),
            types_env: Activations::new(),
            resources: ResourceMap::new(),
            resource_scopes: vec![ScopedResources::new()],
            next_variable_id: 0,
            functions: Vec::new(),
            composite_stack: Vec::new(),
            init_assigned: None,
            init_fields: Vec::new(),
            create_target: None,
            emit_target: None,
            emitted_event: None,
        }
    }

    /// Run the check: seed built-ins, two declaration passes, finalize.
    pub fn check(mut self) -> (Elaboration, Vec<Diagnostic>) {
        debug!(location = %self.location, "check start");
        self.seed_base_environment();

        // Pass 1: register global signatures.
        self.register_declarations();
        // Pass 2: check bodies.
        self.check_declaration_bodies();

        self.elaboration.finalize();
        debug!(
            location = %self.location,
            diagnostics = self.diagnostics.len(),
            "check complete"
        );
        (self.elaboration, self.diagnostics)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        if let Some(gauge) = &self.config.memory_gauge {
            gauge(MemoryKind::Diagnostic, 1);
        }
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn error(&mut self, kind: ErrorKind, span: Span, message: impl Into<String>) {
        self.report(Diagnostic::error(kind, span, message));
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub(crate) fn enter_scope(&mut self) {
        if let Some(gauge) = &self.config.memory_gauge {
            gauge(MemoryKind::Activation, 1);
        }
        self.values.push();
        self.types_env.push();
        self.resource_scopes.push(ScopedResources::new());
    }

    /// Leave a scope, reporting `ResourceLoss` for still-valid resources
    /// declared in it. When `exited` is set the scope ended in a definite
    /// exit (return/never), so nothing can be lost here.
    pub(crate) fn exit_scope(&mut self, exited: bool) {
        let scoped = self.resource_scopes.pop().unwrap_or_default();
        for resource in scoped {
            if let Some(handle) = self.resources.remove(&resource.location) {
                if !exited
                    && matches!(
                        handle.state,
                        ResourceState::Valid | ResourceState::PotentiallyLost
                    )
                {
                    let message = format!("resource `{}` is not invalidated", resource.name);
                    self.error(ErrorKind::ResourceLoss, resource.origin, message);
                }
            }
            if let TrackedLocation::Variable(variable_id) = resource.location {
                self.resources.remove_elements_of(variable_id);
            }
        }
        self.values.pop();
        self.types_env.pop();
    }

    // =========================================================================
    // Declarations into activations
    // =========================================================================

    pub(crate) fn fresh_variable_id(&mut self) -> u32 {
        let id = self.next_variable_id;
        self.next_variable_id += 1;
        id
    }

    /// Declare a value binding in the current frame. Reports
    /// `Redeclaration` on a same-frame duplicate. Resource-typed bindings
    /// are registered with the resource tracker.
    pub(crate) fn declare_value(
        &mut self,
        name: &str,
        type_id: TypeId,
        kind: BindingKind,
        access: Access,
        span: Span,
    ) -> u32 {
        let variable_id = self.fresh_variable_id();
        let variable = Variable {
            name: name.to_string(),
            type_id,
            kind,
            access,
            span,
            variable_id,
            depth: self.values.depth(),
        };
        if !self.values.declare(name.to_string(), variable) {
            let message = format!("cannot redeclare `{name}`: already declared in this scope");
            self.error(ErrorKind::Redeclaration, span, message);
            // Overwrite so later uses see the newest declaration.
            let variable = Variable {
                name: name.to_string(),
                type_id,
                kind,
                access,
                span,
                variable_id,
                depth: self.values.depth(),
            };
            self.values.declare_forced(name.to_string(), variable);
        }

        if self.store.is_resource(type_id)
            && matches!(
                kind,
                BindingKind::Constant | BindingKind::Variable | BindingKind::Parameter
            )
        {
            let location = TrackedLocation::Variable(variable_id);
            self.resources
                .insert(location.clone(), ResourceHandle::valid(name, span));
            if let Some(scope) = self.resource_scopes.last_mut() {
                scope.push(ScopedResource {
                    location,
                    name: name.to_string(),
                    origin: span,
                });
            }
        }

        variable_id
    }

    pub(crate) fn declare_type(&mut self, name: &str, type_id: TypeId, span: Span) {
        let entry = TypeEntry {
            name: name.to_string(),
            type_id,
            span,
        };
        if !self.types_env.declare(name.to_string(), entry) {
            let message = format!("cannot redeclare type `{name}`: already declared in this scope");
            self.error(ErrorKind::Redeclaration, span, message);
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Resolve a value name, reporting `NotDeclared` once on a miss and
    /// degrading to the invalid type.
    pub(crate) fn resolve_value(&mut self, name: &str, span: Span) -> Variable {
        if let Some(variable) = self.values.lookup(name) {
            return variable.clone();
        }
        let message = format!("cannot find variable in this scope: `{name}`");
        self.error(ErrorKind::NotDeclared, span, message);
        // Suppress cascades: declare the name with the invalid type.
        let variable_id = self.fresh_variable_id();
        let variable = Variable {
            name: name.to_string(),
            type_id: self.store.invalid,
            kind: BindingKind::Variable,
            access: Access::NotSpecified,
            span,
            variable_id,
            depth: self.values.depth(),
        };
        self.values
            .declare_forced(name.to_string(), variable.clone());
        variable
    }

    /// Resolve a type name, reporting `NotDeclared` once on a miss.
    pub(crate) fn resolve_type_name(&mut self, name: &str, span: Span) -> TypeId {
        if let Some(entry) = self.types_env.lookup(name) {
            return entry.type_id;
        }
        let message = format!("cannot find type in this scope: `{name}`");
        self.error(ErrorKind::NotDeclared, span, message);
        let invalid = self.store.invalid;
        self.types_env.declare_forced(
            name.to_string(),
            TypeEntry {
                name: name.to_string(),
                type_id: invalid,
                span,
            },
        );
        invalid
    }

    // =========================================================================
    // Contexts
    // =========================================================================

    pub(crate) fn current_function(&self) -> Option<&FunctionContext> {
        self.functions.last()
    }

    pub(crate) fn current_function_mut(&mut self) -> Option<&mut FunctionContext> {
        self.functions.last_mut()
    }

    pub(crate) fn current_composite(&self) -> Option<&CompositeContext> {
        self.composite_stack.last()
    }

    /// Whether the checker is currently inside the given composite (for
    /// access checks and external-mutation decisions).
    pub(crate) fn inside_composite(&self, composite: CompositeId) -> bool {
        self.composite_stack
            .iter()
            .any(|ctx| ctx.composite == Some(composite))
    }

    /// Record an identifier resolution into the elaboration.
    pub(crate) fn record_target(
        &mut self,
        node: cairn_ast::NodeId,
        span: Span,
        variable: &Variable,
    ) {
        self.elaboration.set_target_variable(
            node,
            VariableTarget {
                name: variable.name.clone(),
                variable_id: variable.variable_id,
            },
        );
        self.elaboration.record_occurrence(span, node);
    }
}

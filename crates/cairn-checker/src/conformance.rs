//! Interface conformance checking.
//!
//! Runs post-order, after a composite's body has been checked, and
//! reports at the declaration's position. Member matching compares names,
//! then per-parameter (argument label, parameter type) pairs where the
//! parameter type must be equal (invariant) while the internal name may
//! differ; function results are covariant. Missing members and missing
//! nested types are reported in one diagnostic whose secondary note text
//! is stable and tested.

use cairn_ast::{CompositeDeclaration, CompositeKind};
use cairn_common::diagnostics::{Diagnostic, ErrorKind, Note};

use crate::checker::Checker;
use crate::types::{CompositeId, FunctionType, InterfaceId, Type};

impl<'a> Checker<'a> {
    pub(crate) fn check_conformances(
        &mut self,
        declaration: &'a CompositeDeclaration,
        id: CompositeId,
    ) {
        // Event conformance is name-only.
        if declaration.kind == CompositeKind::Event {
            return;
        }
        let conformances = self.store.composite(id).conformances.clone();
        for interface_id in conformances {
            self.check_conformance(declaration, id, interface_id);
        }
    }

    fn check_conformance(
        &mut self,
        declaration: &'a CompositeDeclaration,
        composite_id: CompositeId,
        interface_id: InterfaceId,
    ) {
        let interface = self.store.interface(interface_id).clone();
        let composite = self.store.composite(composite_id).clone();

        let mut missing_members: Vec<String> = Vec::new();
        let mut missing_types: Vec<String> = Vec::new();
        let mut mismatch_notes: Vec<Note> = Vec::new();

        // Function requirements.
        for (name, requirement) in &interface.functions {
            let Some(implementation) = composite.functions.get(name) else {
                if !requirement.has_body {
                    missing_members.push(name.clone());
                }
                continue;
            };
            let (Type::Function(required), Type::Function(provided)) = (
                self.store.get(requirement.type_id).clone(),
                self.store.get(implementation.type_id).clone(),
            ) else {
                continue;
            };
            if let Some(note) =
                self.function_mismatch_note(name, &required, &provided, implementation.span)
            {
                mismatch_notes.push(note);
            }
        }

        // Field requirements.
        for (name, requirement) in &interface.fields {
            let Some(implementation) = composite.fields.get(name) else {
                missing_members.push(name.clone());
                continue;
            };
            if implementation.type_id != requirement.type_id {
                let got = self.store.pretty(implementation.type_id);
                let expected = self.store.pretty(requirement.type_id);
                mismatch_notes.push(Note::at(
                    implementation.span,
                    format!("field `{name}` has type `{got}`, expected `{expected}`"),
                ));
            } else if implementation.kind != requirement.kind {
                mismatch_notes.push(Note::at(
                    implementation.span,
                    format!("field `{name}` has a mismatched variable kind"),
                ));
            }
        }

        // Nested type requirements must appear structurally.
        for name in interface.nested_types.keys() {
            if !composite.nested_types.contains_key(name) {
                missing_types.push(name.clone());
            }
        }

        // Initializer parity: a `view init` requirement demands a `view`
        // initializer.
        let mut initializer_note: Option<Note> = None;
        if let Some(required_init) = &interface.initializer {
            match &composite.initializer {
                Some(provided_init) => {
                    if required_init.is_view && !provided_init.is_view {
                        initializer_note = Some(Note::at(
                            provided_init.span,
                            format!(
                                "initializer of `{}` must be `view` to conform to `{}`",
                                composite.identifier, interface.identifier
                            ),
                        ));
                    }
                }
                None => {
                    if !required_init.parameters.is_empty() {
                        initializer_note = Some(Note::new(format!(
                            "`{}` is missing an initializer required by `{}`",
                            composite.identifier, interface.identifier
                        )));
                    }
                }
            }
        }

        if missing_members.is_empty()
            && missing_types.is_empty()
            && mismatch_notes.is_empty()
            && initializer_note.is_none()
        {
            return;
        }

        let message = format!(
            "`{}` does not conform to {} interface `{}`",
            composite.identifier,
            interface.kind.keyword(),
            interface.identifier
        );
        let mut diagnostic = Diagnostic::error(
            ErrorKind::Conformance,
            declaration.identifier.span,
            message,
        );
        if !missing_members.is_empty() {
            let names = missing_members
                .iter()
                .map(|name| format!("`{name}`"))
                .collect::<Vec<_>>()
                .join(", ");
            diagnostic = diagnostic.with_note(Note::new(format!(
                "`{}` is missing definitions for members: {names}",
                composite.identifier
            )));
        }
        if !missing_types.is_empty() {
            let names = missing_types
                .iter()
                .map(|name| format!("`{name}`"))
                .collect::<Vec<_>>()
                .join(", ");
            diagnostic = diagnostic.with_note(Note::new(format!(
                "`{}` is missing definitions for types: {names}",
                composite.identifier
            )));
        }
        if let Some(note) = initializer_note {
            diagnostic = diagnostic.with_note(note);
        }
        for note in mismatch_notes {
            diagnostic = diagnostic.with_note(note);
        }
        self.report(diagnostic);
    }

    /// A note pointing at a nonconforming member, or `None` when the
    /// implementation satisfies the requirement.
    fn function_mismatch_note(
        &self,
        name: &str,
        required: &FunctionType,
        provided: &FunctionType,
        span: cairn_common::span::Span,
    ) -> Option<Note> {
        if provided.parameters.len() != required.parameters.len() {
            return Some(Note::at(
                span,
                format!(
                    "function `{name}` has {} parameters, expected {}",
                    provided.parameters.len(),
                    required.parameters.len()
                ),
            ));
        }
        for (provided_param, required_param) in
            provided.parameters.iter().zip(required.parameters.iter())
        {
            if provided_param.label != required_param.label {
                return Some(Note::at(
                    span,
                    format!("function `{name}` has a mismatched argument label"),
                ));
            }
            // Parameters are invariant: a specialization of the declared
            // parameter type does not conform.
            if provided_param.type_id != required_param.type_id {
                let got = self.store.pretty(provided_param.type_id);
                let expected = self.store.pretty(required_param.type_id);
                return Some(Note::at(
                    span,
                    format!(
                        "function `{name}` parameter has type `{got}`, expected exactly `{expected}`"
                    ),
                ));
            }
        }
        if !self
            .store
            .is_subtype(provided.return_type, required.return_type)
        {
            let got = self.store.pretty(provided.return_type);
            let expected = self.store.pretty(required.return_type);
            return Some(Note::at(
                span,
                format!("function `{name}` returns `{got}`, expected a subtype of `{expected}`"),
            ));
        }
        if required.is_view && !provided.is_view {
            return Some(Note::at(
                span,
                format!("function `{name}` must be `view`"),
            ));
        }
        None
    }
}

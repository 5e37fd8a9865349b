//! Subtyping, unification, and type predicates.
//!
//! The rules:
//! - `Never` is a subtype of everything; `Invalid` relates to everything
//!   (error suppression).
//! - Optionals are covariant, and `T <: T?`.
//! - References are covariant in the target and contravariant in
//!   authorization: an unauthorized reference accepts any source, an
//!   authorized one requires the source to carry at least its entitlement
//!   set.
//! - Functions are contravariant in parameters, covariant in results;
//!   `view` function types are subtypes of non-`view` ones, not the
//!   converse.
//! - `T{I1, ..}` is a subtype of `T` and of `{I1, ..}`.

use rustc_hash::FxHashSet;

use crate::types::{Authorization, FunctionType, IntegerKind, Type, TypeId, TypeStore};

bitflags::bitflags! {
    /// Derived capabilities of a type.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TypeFlags: u8 {
        const RESOURCE = 1 << 0;
        const STORABLE = 1 << 1;
        const EQUATABLE = 1 << 2;
        const HASHABLE = 1 << 3;
    }
}

impl TypeStore {
    // =========================================================================
    // Predicates
    // =========================================================================

    #[must_use]
    pub fn is_resource(&self, id: TypeId) -> bool {
        self.flags(id).contains(TypeFlags::RESOURCE)
    }

    #[must_use]
    pub fn is_storable(&self, id: TypeId) -> bool {
        self.flags(id).contains(TypeFlags::STORABLE)
    }

    #[must_use]
    pub fn is_equatable(&self, id: TypeId) -> bool {
        self.flags(id).contains(TypeFlags::EQUATABLE)
    }

    #[must_use]
    pub fn is_hashable(&self, id: TypeId) -> bool {
        self.flags(id).contains(TypeFlags::HASHABLE)
    }

    #[must_use]
    pub fn flags(&self, id: TypeId) -> TypeFlags {
        let mut in_progress = FxHashSet::default();
        self.flags_inner(id, &mut in_progress)
    }

    /// Compute flags with a cycle guard: recursive composite references
    /// assume the optimistic fixpoint (storable, equatable, hashable as
    /// appropriate for the composite kind).
    fn flags_inner(&self, id: TypeId, in_progress: &mut FxHashSet<TypeId>) -> TypeFlags {
        use cairn_ast::CompositeKind;

        match self.get(id) {
            Type::Invalid => TypeFlags::STORABLE | TypeFlags::EQUATABLE | TypeFlags::HASHABLE,
            Type::Never => TypeFlags::STORABLE | TypeFlags::EQUATABLE | TypeFlags::HASHABLE,
            Type::Void | Type::Function(_) | Type::Account(_) | Type::Generic { .. } => {
                TypeFlags::empty()
            }
            Type::Bool
            | Type::String
            | Type::Character
            | Type::Address
            | Type::Number
            | Type::Integer(_)
            | Type::Fixed(_)
            | Type::Path { .. } => TypeFlags::STORABLE | TypeFlags::EQUATABLE | TypeFlags::HASHABLE,
            Type::AnyStruct => TypeFlags::STORABLE,
            Type::HashableStruct => TypeFlags::STORABLE | TypeFlags::EQUATABLE | TypeFlags::HASHABLE,
            Type::AnyResource => TypeFlags::RESOURCE | TypeFlags::STORABLE,
            Type::Optional(inner) => {
                let inner_flags = self.flags_inner(*inner, in_progress);
                // Optionals preserve resource-ness, storability, and
                // equatability/hashability of the wrapped type.
                inner_flags
            }
            Type::VariableArray(element) | Type::InclusiveRange(element) => {
                let element_flags = self.flags_inner(*element, in_progress);
                element_flags & (TypeFlags::RESOURCE | TypeFlags::STORABLE | TypeFlags::EQUATABLE)
            }
            Type::ConstantArray { element, .. } => {
                let element_flags = self.flags_inner(*element, in_progress);
                element_flags & (TypeFlags::RESOURCE | TypeFlags::STORABLE | TypeFlags::EQUATABLE)
            }
            Type::Dictionary { key, value } => {
                let key_flags = self.flags_inner(*key, in_progress);
                let value_flags = self.flags_inner(*value, in_progress);
                let mut flags = TypeFlags::empty();
                if value_flags.contains(TypeFlags::RESOURCE) {
                    flags |= TypeFlags::RESOURCE;
                }
                if key_flags.contains(TypeFlags::STORABLE)
                    && value_flags.contains(TypeFlags::STORABLE)
                {
                    flags |= TypeFlags::STORABLE;
                }
                flags
            }
            // References are equatable (identity) but never storable.
            Type::Reference { .. } => TypeFlags::EQUATABLE,
            Type::Capability { .. } => TypeFlags::STORABLE | TypeFlags::EQUATABLE,
            Type::Composite(composite_id) => {
                let data = self.composite(*composite_id);
                let mut flags = TypeFlags::empty();
                if data.kind == CompositeKind::Resource {
                    flags |= TypeFlags::RESOURCE;
                }
                if !in_progress.insert(id) {
                    // Cycle: assume storable; the outer call decides.
                    return flags | TypeFlags::STORABLE;
                }
                let all_fields_storable = data
                    .fields
                    .values()
                    .all(|f| self.flags_inner(f.type_id, in_progress).contains(TypeFlags::STORABLE));
                in_progress.remove(&id);
                if all_fields_storable && data.kind != CompositeKind::Contract {
                    flags |= TypeFlags::STORABLE;
                }
                flags
            }
            Type::Interface(interface_id) => {
                let mut flags = TypeFlags::STORABLE;
                if self.interface(*interface_id).kind == cairn_ast::CompositeKind::Resource {
                    flags |= TypeFlags::RESOURCE;
                }
                flags
            }
            Type::Restricted { base, .. } => self.flags_inner(*base, in_progress),
        }
    }

    // =========================================================================
    // Equality and subtyping
    // =========================================================================

    /// Structural equality is interning identity.
    #[must_use]
    pub fn equal(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }

    #[must_use]
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }

        match (self.get(sub), self.get(sup)) {
            // Error suppression in both directions.
            (Type::Invalid, _) | (_, Type::Invalid) => true,

            (Type::Never, _) => true,

            (_, Type::AnyStruct) => !self.is_resource(sub) && *self.get(sub) != Type::Void,
            (_, Type::AnyResource) => self.is_resource(sub),
            (_, Type::HashableStruct) => self.is_hashable(sub) && !self.is_resource(sub),
            (Type::Integer(_) | Type::Fixed(_), Type::Number) => true,

            // Domain-specific paths are subtypes of the general path type.
            (Type::Path { domain: Some(_) }, Type::Path { domain: None }) => true,

            (Type::Optional(inner_sub), Type::Optional(inner_sup)) => {
                self.is_subtype(*inner_sub, *inner_sup)
            }
            (_, Type::Optional(inner_sup)) => self.is_subtype(sub, *inner_sup),

            (Type::VariableArray(a), Type::VariableArray(b)) => self.is_subtype(*a, *b),
            (
                Type::ConstantArray {
                    element: a,
                    size: n,
                },
                Type::ConstantArray {
                    element: b,
                    size: m,
                },
            ) => n == m && self.is_subtype(*a, *b),

            (
                Type::Dictionary {
                    key: k1,
                    value: v1,
                },
                Type::Dictionary {
                    key: k2,
                    value: v2,
                },
            ) => self.is_subtype(*k1, *k2) && self.is_subtype(*v1, *v2),

            (
                Type::Reference {
                    authorization: sub_auth,
                    referenced: sub_target,
                },
                Type::Reference {
                    authorization: sup_auth,
                    referenced: sup_target,
                },
            ) => {
                let auth_ok = match sup_auth {
                    Authorization::Unauthorized => true,
                    Authorization::Authorized(required) => match sub_auth {
                        Authorization::Unauthorized => false,
                        Authorization::Authorized(provided) => {
                            required.iter().all(|e| provided.contains(e))
                        }
                    },
                };
                auth_ok && self.is_subtype(*sub_target, *sup_target)
            }

            (Type::Capability { borrow: Some(b1) }, Type::Capability { borrow: Some(b2) }) => {
                self.is_subtype(*b1, *b2)
            }
            (Type::Capability { .. }, Type::Capability { borrow: None }) => true,

            (Type::Function(f1), Type::Function(f2)) => self.is_function_subtype(f1, f2),

            (Type::Composite(c), Type::Interface(i)) => self.composite_conforms_to(*c, *i),

            (
                Type::Restricted {
                    base: b1,
                    restrictions: r1,
                },
                Type::Restricted {
                    base: b2,
                    restrictions: r2,
                },
            ) => {
                if !self.is_subtype(*b1, *b2) {
                    return false;
                }
                r2.iter().all(|required| {
                    r1.contains(required)
                        || match self.get(*b1) {
                            Type::Composite(c) => self.composite_conforms_to(*c, *required),
                            _ => false,
                        }
                })
            }
            (Type::Restricted { base, .. }, _) => self.is_subtype(*base, sup),
            (
                Type::Composite(c),
                Type::Restricted {
                    base,
                    restrictions,
                },
            ) => {
                self.is_subtype(sub, *base)
                    && restrictions
                        .iter()
                        .all(|r| self.composite_conforms_to(*c, *r))
            }

            _ => false,
        }
    }

    fn is_function_subtype(&self, f1: &FunctionType, f2: &FunctionType) -> bool {
        if f2.is_view && !f1.is_view {
            return false;
        }
        if !f1.type_parameters.is_empty() || !f2.type_parameters.is_empty() {
            return false;
        }
        if f1.parameters.len() != f2.parameters.len() {
            return false;
        }
        // Contravariant parameters, covariant result.
        f1.parameters
            .iter()
            .zip(f2.parameters.iter())
            .all(|(p1, p2)| self.is_subtype(p2.type_id, p1.type_id))
            && self.is_subtype(f1.return_type, f2.return_type)
    }

    // =========================================================================
    // Unification (least upper bound)
    // =========================================================================

    /// Least upper bound of two types where defined.
    pub fn unify(&mut self, a: TypeId, b: TypeId) -> Option<TypeId> {
        if a == b {
            return Some(a);
        }
        if *self.get(a) == Type::Invalid || *self.get(b) == Type::Invalid {
            return Some(self.invalid);
        }
        if self.is_subtype(a, b) {
            return Some(b);
        }
        if self.is_subtype(b, a) {
            return Some(a);
        }

        // Integers of different kinds join at the smallest signed type
        // containing both ranges.
        if let (Type::Integer(ka), Type::Integer(kb)) = (self.get(a), self.get(b)) {
            let (ka, kb) = (*ka, *kb);
            let joined = IntegerKind::SIGNED_JOIN_ORDER
                .iter()
                .copied()
                .find(|candidate| {
                    ka.range_contained_in(*candidate) && kb.range_contained_in(*candidate)
                })?;
            return Some(self.integer(joined));
        }

        // Fixed-point kinds join at Fix64 when both ranges fit; they do
        // not, so fall through to the struct/resource tops below.

        // Optionals unify by unwrapping.
        match (self.get(a).clone(), self.get(b).clone()) {
            (Type::Optional(inner_a), Type::Optional(inner_b)) => {
                let inner = self.unify(inner_a, inner_b)?;
                return Some(self.optional(inner));
            }
            (Type::Optional(inner_a), _) => {
                let inner = self.unify(inner_a, b)?;
                return Some(self.optional(inner));
            }
            (_, Type::Optional(inner_b)) => {
                let inner = self.unify(a, inner_b)?;
                return Some(self.optional(inner));
            }
            _ => {}
        }

        let a_resource = self.is_resource(a);
        let b_resource = self.is_resource(b);
        if a_resource && b_resource {
            return Some(self.any_resource);
        }
        if !a_resource
            && !b_resource
            && *self.get(a) != Type::Void
            && *self.get(b) != Type::Void
        {
            return Some(self.any_struct);
        }
        None
    }

    // =========================================================================
    // Instantiation of generic built-in signatures
    // =========================================================================

    /// Substitute generic slots with the given bindings. An unbound
    /// optional slot inside `Capability<...>` degrades to the bare
    /// `Capability` type; an unbound slot anywhere else is invalid.
    pub fn instantiate(&mut self, id: TypeId, bindings: &[Option<TypeId>]) -> TypeId {
        match self.get(id).clone() {
            Type::Generic { index, .. } => bindings
                .get(index as usize)
                .copied()
                .flatten()
                .unwrap_or(self.invalid),
            Type::Optional(inner) => {
                let inner = self.instantiate(inner, bindings);
                self.optional(inner)
            }
            Type::VariableArray(element) => {
                let element = self.instantiate(element, bindings);
                self.variable_array(element)
            }
            Type::ConstantArray { element, size } => {
                let element = self.instantiate(element, bindings);
                self.intern(Type::ConstantArray { element, size })
            }
            Type::Dictionary { key, value } => {
                let key = self.instantiate(key, bindings);
                let value = self.instantiate(value, bindings);
                self.dictionary(key, value)
            }
            Type::Reference {
                authorization,
                referenced,
            } => {
                let referenced = self.instantiate(referenced, bindings);
                self.reference(authorization, referenced)
            }
            Type::Capability { borrow: Some(b) } => {
                let generic_index = match self.get(b) {
                    Type::Generic { index, .. } => Some(*index),
                    _ => None,
                };
                if let Some(index) = generic_index {
                    if bindings.get(index as usize).copied().flatten().is_none() {
                        return self.capability(None);
                    }
                }
                let b = self.instantiate(b, bindings);
                self.capability(Some(b))
            }
            Type::Function(function) => {
                let parameters = function
                    .parameters
                    .iter()
                    .map(|p| {
                        let type_id = self.instantiate(p.type_id, bindings);
                        crate::types::FunctionParameter {
                            label: p.label.clone(),
                            name: p.name.clone(),
                            type_id,
                            required: p.required,
                        }
                    })
                    .collect();
                let return_type = self.instantiate(function.return_type, bindings);
                self.function(FunctionType {
                    is_view: function.is_view,
                    type_parameters: Vec::new(),
                    parameters,
                    return_type,
                })
            }
            Type::InclusiveRange(member) => {
                let member = self.instantiate(member, bindings);
                self.intern(Type::InclusiveRange(member))
            }
            _ => id,
        }
    }

    /// Whether a declared (possibly generic) parameter type mentions any
    /// generic slot.
    #[must_use]
    pub fn mentions_generic(&self, id: TypeId) -> bool {
        match self.get(id) {
            Type::Generic { .. } => true,
            Type::Optional(inner)
            | Type::VariableArray(inner)
            | Type::InclusiveRange(inner)
            | Type::ConstantArray { element: inner, .. } => self.mentions_generic(*inner),
            Type::Dictionary { key, value } => {
                self.mentions_generic(*key) || self.mentions_generic(*value)
            }
            Type::Reference { referenced, .. } => self.mentions_generic(*referenced),
            Type::Capability { borrow: Some(b) } => self.mentions_generic(*b),
            Type::Function(f) => {
                f.parameters.iter().any(|p| self.mentions_generic(p.type_id))
                    || self.mentions_generic(f.return_type)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompositeData;
    use cairn_ast::CompositeKind;
    use cairn_common::span::Span;

    fn store() -> TypeStore {
        TypeStore::new(None)
    }

    #[test]
    fn test_reflexivity_and_never() {
        let mut s = store();
        let int8 = s.integer(IntegerKind::Int8);
        assert!(s.is_subtype(int8, int8));
        assert!(s.is_subtype(s.never, int8));
        assert!(s.is_subtype(s.never, s.any_resource));
    }

    #[test]
    fn test_optional_covariance() {
        let mut s = store();
        let int8 = s.integer(IntegerKind::Int8);
        let opt_int8 = s.optional(int8);
        let opt_any = s.optional(s.any_struct);
        assert!(s.is_subtype(int8, opt_int8));
        assert!(s.is_subtype(opt_int8, opt_any));
        assert!(!s.is_subtype(opt_int8, int8));
    }

    #[test]
    fn test_reference_authorization_contravariance() {
        let mut s = store();
        let target = s.bool_type;
        let unauth = s.reference(Authorization::Unauthorized, target);
        let auth_a = s.reference(
            Authorization::authorized(vec!["A".to_string()]),
            target,
        );
        let auth_ab = s.reference(
            Authorization::authorized(vec!["A".to_string(), "B".to_string()]),
            target,
        );
        // Any authorization is assignable to an unauthorized reference.
        assert!(s.is_subtype(auth_a, unauth));
        // An authorized reference requires the source to carry the set.
        assert!(!s.is_subtype(unauth, auth_a));
        assert!(s.is_subtype(auth_ab, auth_a));
        assert!(!s.is_subtype(auth_a, auth_ab));
    }

    #[test]
    fn test_function_variance_and_view() {
        let mut s = store();
        let int8 = s.integer(IntegerKind::Int8);
        let view_fn = s.function(FunctionType {
            is_view: true,
            type_parameters: Vec::new(),
            parameters: vec![],
            return_type: int8,
        });
        let impure_fn = s.function(FunctionType {
            is_view: false,
            type_parameters: Vec::new(),
            parameters: vec![],
            return_type: int8,
        });
        assert!(s.is_subtype(view_fn, impure_fn));
        assert!(!s.is_subtype(impure_fn, view_fn));
    }

    #[test]
    fn test_integer_join() {
        let mut s = store();
        let u8t = s.integer(IntegerKind::UInt8);
        let i8t = s.integer(IntegerKind::Int8);
        let joined = s.unify(u8t, i8t).unwrap();
        assert_eq!(*s.get(joined), Type::Integer(IntegerKind::Int16));

        let u64t = s.integer(IntegerKind::UInt64);
        let i16t = s.integer(IntegerKind::Int16);
        let joined = s.unify(u64t, i16t).unwrap();
        assert_eq!(*s.get(joined), Type::Integer(IntegerKind::Int128));
    }

    #[test]
    fn test_subtype_transitivity_over_samples() {
        let mut s = store();
        let resource = {
            let id = s.add_composite(CompositeData::new(
                "R".to_string(),
                CompositeKind::Resource,
                Span::dummy(),
            ));
            s.composite_type(id)
        };
        let int8 = s.integer(IntegerKind::Int8);
        let opt_int8 = s.optional(int8);
        let samples = vec![
            s.never,
            int8,
            opt_int8,
            s.any_struct,
            resource,
            s.any_resource,
            s.bool_type,
        ];
        for &t1 in &samples {
            for &t2 in &samples {
                for &t3 in &samples {
                    if s.is_subtype(t1, t2) && s.is_subtype(t2, t3) {
                        assert!(
                            s.is_subtype(t1, t3),
                            "transitivity violated: {} <: {} <: {}",
                            s.pretty(t1),
                            s.pretty(t2),
                            s.pretty(t3),
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_resource_predicates() {
        let mut s = store();
        let r = {
            let id = s.add_composite(CompositeData::new(
                "R".to_string(),
                CompositeKind::Resource,
                Span::dummy(),
            ));
            s.composite_type(id)
        };
        assert!(s.is_resource(r));
        let arr = s.variable_array(r);
        assert!(s.is_resource(arr));
        let opt = s.optional(r);
        assert!(s.is_resource(opt));
        assert!(!s.is_resource(s.bool_type));
        // Account types and functions are not storable.
        assert!(!s.is_storable(s.auth_account));
        let f = s.function(FunctionType {
            is_view: false,
            type_parameters: Vec::new(),
            parameters: vec![],
            return_type: s.void,
        });
        assert!(!s.is_storable(f));
        assert!(s.is_storable(s.address));
    }
}

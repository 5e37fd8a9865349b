//! Member resolution.
//!
//! Resolves `receiver.name` against composite declarations, restricted
//! types, references (auto-dereferenced), and the built-in member tables
//! of arrays, dictionaries, strings, capabilities, and accounts.
//!
//! Built-in non-mutating members are `view` function types, mutating ones
//! are not; the purity analysis falls out of ordinary function-call
//! checking plus the `mutating`/`account_mutator` flags carried here.

use cairn_ast::{Access, VariableKind};

use crate::types::{
    AccountKind, CompositeId, FunctionParameter, FunctionType, Type, TypeId, TypeParameter,
    TypeStore,
};

/// A resolved member.
#[derive(Clone, Debug)]
pub struct MemberInfo {
    pub type_id: TypeId,
    pub is_function: bool,
    /// Mutates its receiver in place (`append`, `insert`, `remove`, ...).
    pub mutating: bool,
    /// Mutates account state (`save`, `load`, `link`, `unlink`, ...).
    pub account_mutator: bool,
    pub access: Access,
    pub field_kind: Option<VariableKind>,
    /// Resolved through an interface of a restricted type.
    pub from_interface: bool,
    /// The member is a nested composite's constructor.
    pub constructor_of: Option<CompositeId>,
    /// Composite the member was declared in, for access checks.
    pub defined_in: Option<CompositeId>,
}

impl MemberInfo {
    fn field(type_id: TypeId, kind: VariableKind, access: Access) -> Self {
        Self {
            type_id,
            is_function: false,
            mutating: false,
            account_mutator: false,
            access,
            field_kind: Some(kind),
            from_interface: false,
            constructor_of: None,
            defined_in: None,
        }
    }

    fn function(type_id: TypeId) -> Self {
        Self {
            type_id,
            is_function: true,
            mutating: false,
            account_mutator: false,
            access: Access::Pub,
            field_kind: None,
            from_interface: false,
            constructor_of: None,
            defined_in: None,
        }
    }

    fn mutating_function(type_id: TypeId) -> Self {
        Self {
            mutating: true,
            ..Self::function(type_id)
        }
    }

    fn account_function(type_id: TypeId) -> Self {
        Self {
            account_mutator: true,
            ..Self::function(type_id)
        }
    }
}

impl TypeStore {
    /// Intern a built-in member function type.
    fn member_fn(
        &mut self,
        is_view: bool,
        type_parameters: Vec<TypeParameter>,
        parameters: Vec<FunctionParameter>,
        return_type: TypeId,
    ) -> TypeId {
        self.function(FunctionType {
            is_view,
            type_parameters,
            parameters,
            return_type,
        })
    }

    /// Resolve a member on a receiver type. Returns `None` when the type
    /// has no such member (`NotDeclaredMember` at the call site).
    pub fn member_type(&mut self, receiver: TypeId, name: &str) -> Option<MemberInfo> {
        match self.get(receiver).clone() {
            Type::Invalid => Some(MemberInfo::field(
                self.invalid,
                VariableKind::Var,
                Access::Pub,
            )),
            Type::Reference { referenced, .. } => self.member_type(referenced, name),
            Type::Composite(id) => self.composite_member(id, name),
            Type::Interface(id) => self.interface_member(id, name),
            Type::Restricted { restrictions, .. } => {
                for interface_id in restrictions {
                    if let Some(mut info) = self.interface_member(interface_id, name) {
                        info.from_interface = true;
                        return Some(info);
                    }
                }
                None
            }
            Type::VariableArray(element) => self.array_member(receiver, element, name),
            Type::ConstantArray { element, .. } => self.constant_array_member(element, name),
            Type::Dictionary { key, value } => self.dictionary_member(key, value, name),
            Type::String => self.string_member(name),
            Type::Capability { borrow } => self.capability_member(borrow, name),
            Type::Account(kind) => self.account_member(kind, name),
            _ => None,
        }
    }

    fn composite_member(&mut self, id: CompositeId, name: &str) -> Option<MemberInfo> {
        let data = self.composite(id);
        if let Some(field) = data.fields.get(name) {
            let mut info = MemberInfo::field(field.type_id, field.kind, field.access);
            info.defined_in = Some(id);
            return Some(info);
        }
        if let Some(function) = data.functions.get(name) {
            let mut info = MemberInfo::function(function.type_id);
            info.access = function.access;
            info.mutating = function.is_mutating;
            info.account_mutator = function.is_account_mutator;
            info.defined_in = Some(id);
            return Some(info);
        }
        if let Some(&nested) = data.nested_types.get(name) {
            if let Type::Composite(nested_id) = *self.get(nested) {
                let constructor = self.constructor_type(nested_id);
                let mut info = MemberInfo::function(constructor);
                info.constructor_of = Some(nested_id);
                info.defined_in = Some(id);
                return Some(info);
            }
        }
        None
    }

    fn interface_member(&mut self, id: crate::types::InterfaceId, name: &str) -> Option<MemberInfo> {
        let data = self.interface(id);
        if let Some(field) = data.fields.get(name) {
            return Some(MemberInfo::field(field.type_id, field.kind, field.access));
        }
        if let Some(function) = data.functions.get(name) {
            let mut info = MemberInfo::function(function.type_id);
            info.access = function.access;
            return Some(info);
        }
        None
    }

    /// The constructor function type of a composite.
    pub fn constructor_type(&mut self, id: CompositeId) -> TypeId {
        let parameters = self
            .composite(id)
            .initializer
            .as_ref()
            .map(|init| init.parameters.clone())
            .unwrap_or_default();
        let return_type = self.composite_type(id);
        self.member_fn(false, Vec::new(), parameters, return_type)
    }

    // =========================================================================
    // Built-in container members
    // =========================================================================

    fn array_member(
        &mut self,
        array: TypeId,
        element: TypeId,
        name: &str,
    ) -> Option<MemberInfo> {
        let int = self.int;
        match name {
            "length" => Some(MemberInfo::field(int, VariableKind::Let, Access::Pub)),
            "append" => {
                let ty = self.member_fn(
                    false,
                    Vec::new(),
                    vec![FunctionParameter::required(None, "element", element)],
                    self.void,
                );
                Some(MemberInfo::mutating_function(ty))
            }
            "appendAll" => {
                let ty = self.member_fn(
                    false,
                    Vec::new(),
                    vec![FunctionParameter::required(None, "array", array)],
                    self.void,
                );
                Some(MemberInfo::mutating_function(ty))
            }
            "concat" => {
                let ty = self.member_fn(
                    true,
                    Vec::new(),
                    vec![FunctionParameter::required(None, "other", array)],
                    array,
                );
                Some(MemberInfo::function(ty))
            }
            "contains" => {
                let ty = self.member_fn(
                    true,
                    Vec::new(),
                    vec![FunctionParameter::required(None, "element", element)],
                    self.bool_type,
                );
                Some(MemberInfo::function(ty))
            }
            "insert" => {
                let ty = self.member_fn(
                    false,
                    Vec::new(),
                    vec![
                        FunctionParameter::required(Some("at"), "index", int),
                        FunctionParameter::required(None, "element", element),
                    ],
                    self.void,
                );
                Some(MemberInfo::mutating_function(ty))
            }
            "remove" => {
                let ty = self.member_fn(
                    false,
                    Vec::new(),
                    vec![FunctionParameter::required(Some("at"), "index", int)],
                    element,
                );
                Some(MemberInfo::mutating_function(ty))
            }
            "removeFirst" => {
                let ty = self.member_fn(false, Vec::new(), vec![], element);
                Some(MemberInfo::mutating_function(ty))
            }
            "removeLast" => {
                let ty = self.member_fn(false, Vec::new(), vec![], element);
                Some(MemberInfo::mutating_function(ty))
            }
            "firstIndex" => {
                let result = self.optional(int);
                let ty = self.member_fn(
                    true,
                    Vec::new(),
                    vec![FunctionParameter::required(Some("of"), "element", element)],
                    result,
                );
                Some(MemberInfo::function(ty))
            }
            "slice" => {
                let ty = self.member_fn(
                    true,
                    Vec::new(),
                    vec![
                        FunctionParameter::required(Some("from"), "start", int),
                        FunctionParameter::required(Some("upTo"), "end", int),
                    ],
                    array,
                );
                Some(MemberInfo::function(ty))
            }
            _ => None,
        }
    }

    fn constant_array_member(&mut self, element: TypeId, name: &str) -> Option<MemberInfo> {
        match name {
            "length" => Some(MemberInfo::field(self.int, VariableKind::Let, Access::Pub)),
            "contains" => {
                let ty = self.member_fn(
                    true,
                    Vec::new(),
                    vec![FunctionParameter::required(None, "element", element)],
                    self.bool_type,
                );
                Some(MemberInfo::function(ty))
            }
            "firstIndex" => {
                let result = self.optional(self.int);
                let ty = self.member_fn(
                    true,
                    Vec::new(),
                    vec![FunctionParameter::required(Some("of"), "element", element)],
                    result,
                );
                Some(MemberInfo::function(ty))
            }
            _ => None,
        }
    }

    fn dictionary_member(&mut self, key: TypeId, value: TypeId, name: &str) -> Option<MemberInfo> {
        match name {
            "length" => Some(MemberInfo::field(self.int, VariableKind::Let, Access::Pub)),
            "keys" => {
                let keys = self.variable_array(key);
                Some(MemberInfo::field(keys, VariableKind::Let, Access::Pub))
            }
            "values" => {
                let values = self.variable_array(value);
                Some(MemberInfo::field(values, VariableKind::Let, Access::Pub))
            }
            "containsKey" => {
                let ty = self.member_fn(
                    true,
                    Vec::new(),
                    vec![FunctionParameter::required(None, "key", key)],
                    self.bool_type,
                );
                Some(MemberInfo::function(ty))
            }
            "insert" => {
                let result = self.optional(value);
                let ty = self.member_fn(
                    false,
                    Vec::new(),
                    vec![
                        FunctionParameter::required(Some("key"), "key", key),
                        FunctionParameter::required(None, "value", value),
                    ],
                    result,
                );
                Some(MemberInfo::mutating_function(ty))
            }
            "remove" => {
                let result = self.optional(value);
                let ty = self.member_fn(
                    false,
                    Vec::new(),
                    vec![FunctionParameter::required(Some("key"), "key", key)],
                    result,
                );
                Some(MemberInfo::mutating_function(ty))
            }
            _ => None,
        }
    }

    fn string_member(&mut self, name: &str) -> Option<MemberInfo> {
        let string = self.string;
        match name {
            "length" => Some(MemberInfo::field(self.int, VariableKind::Let, Access::Pub)),
            "concat" => {
                let ty = self.member_fn(
                    true,
                    Vec::new(),
                    vec![FunctionParameter::required(None, "other", string)],
                    string,
                );
                Some(MemberInfo::function(ty))
            }
            "slice" => {
                let int = self.int;
                let ty = self.member_fn(
                    true,
                    Vec::new(),
                    vec![
                        FunctionParameter::required(Some("from"), "start", int),
                        FunctionParameter::required(Some("upTo"), "end", int),
                    ],
                    string,
                );
                Some(MemberInfo::function(ty))
            }
            "contains" => {
                let ty = self.member_fn(
                    true,
                    Vec::new(),
                    vec![FunctionParameter::required(None, "other", string)],
                    self.bool_type,
                );
                Some(MemberInfo::function(ty))
            }
            _ => None,
        }
    }

    // =========================================================================
    // Capabilities and accounts
    // =========================================================================

    fn capability_member(&mut self, borrow: Option<TypeId>, name: &str) -> Option<MemberInfo> {
        match name {
            "address" => Some(MemberInfo::field(
                self.address,
                VariableKind::Let,
                Access::Pub,
            )),
            "borrow" => {
                let ty = match borrow {
                    Some(borrow_type) => {
                        let result = self.optional(borrow_type);
                        self.member_fn(true, Vec::new(), vec![], result)
                    }
                    None => {
                        let generic = self.generic(0, "T");
                        let result = self.optional(generic);
                        self.member_fn(
                            true,
                            vec![TypeParameter {
                                name: "T".to_string(),
                                bound: None,
                                must_be_reference: true,
                                optional: false,
                            }],
                            vec![],
                            result,
                        )
                    }
                };
                Some(MemberInfo::function(ty))
            }
            "check" => {
                let ty = self.member_fn(true, Vec::new(), vec![], self.bool_type);
                Some(MemberInfo::function(ty))
            }
            _ => None,
        }
    }

    fn account_member(&mut self, kind: AccountKind, name: &str) -> Option<MemberInfo> {
        let storage_path = self.path_with_domain(crate::types::PathDomain::Storage);
        match (kind, name) {
            (_, "address") => Some(MemberInfo::field(
                self.address,
                VariableKind::Let,
                Access::Pub,
            )),
            (AccountKind::Auth, "save") => {
                let generic = self.generic(0, "T");
                let ty = self.member_fn(
                    false,
                    vec![TypeParameter {
                        name: "T".to_string(),
                        bound: None,
                        must_be_reference: false,
                        optional: false,
                    }],
                    vec![
                        FunctionParameter::required(None, "value", generic),
                        FunctionParameter::required(Some("to"), "path", storage_path),
                    ],
                    self.void,
                );
                Some(MemberInfo::account_function(ty))
            }
            (AccountKind::Auth, "load") => {
                let generic = self.generic(0, "T");
                let result = self.optional(generic);
                let ty = self.member_fn(
                    false,
                    vec![TypeParameter {
                        name: "T".to_string(),
                        bound: None,
                        must_be_reference: false,
                        optional: false,
                    }],
                    vec![FunctionParameter::required(Some("from"), "path", storage_path)],
                    result,
                );
                Some(MemberInfo::account_function(ty))
            }
            (AccountKind::Auth, "borrow") => {
                let generic = self.generic(0, "T");
                let result = self.optional(generic);
                let ty = self.member_fn(
                    true,
                    vec![TypeParameter {
                        name: "T".to_string(),
                        bound: None,
                        must_be_reference: true,
                        optional: false,
                    }],
                    vec![FunctionParameter::required(Some("from"), "path", storage_path)],
                    result,
                );
                Some(MemberInfo::function(ty))
            }
            (AccountKind::Auth, "link") => {
                let generic = self.generic(0, "T");
                let capability = self.capability(Some(generic));
                let result = self.optional(capability);
                let path = self.path;
                let ty = self.member_fn(
                    false,
                    vec![TypeParameter {
                        name: "T".to_string(),
                        bound: None,
                        must_be_reference: true,
                        optional: false,
                    }],
                    vec![
                        FunctionParameter::required(None, "newCapabilityPath", path),
                        FunctionParameter::required(Some("target"), "target", path),
                    ],
                    result,
                );
                Some(MemberInfo::account_function(ty))
            }
            (AccountKind::Auth, "unlink") => {
                let path = self.path;
                let ty = self.member_fn(
                    false,
                    Vec::new(),
                    vec![FunctionParameter::required(None, "path", path)],
                    self.void,
                );
                Some(MemberInfo::account_function(ty))
            }
            (_, "getCapability") => {
                let generic = self.generic(0, "T");
                let capability = self.capability(Some(generic));
                let path = self.path;
                let ty = self.member_fn(
                    true,
                    vec![TypeParameter {
                        name: "T".to_string(),
                        bound: None,
                        must_be_reference: true,
                        optional: true,
                    }],
                    vec![FunctionParameter::required(None, "path", path)],
                    capability,
                );
                Some(MemberInfo::function(ty))
            }
            (_, "contracts") => {
                let contracts = self.account_contracts_type();
                Some(MemberInfo::field(contracts, VariableKind::Let, Access::Pub))
            }
            (_, "keys") => {
                let keys = self.account_keys_type();
                Some(MemberInfo::field(keys, VariableKind::Let, Access::Pub))
            }
            _ => None,
        }
    }
}

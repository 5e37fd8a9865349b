//! The base environment seeded into every check.
//!
//! Built-in types (the numeric tower, paths, accounts, capabilities) go
//! into the base type activation; built-in values (`panic`, `assert`,
//! `log`, numeric conversion functions, the algorithm enums, and any
//! host-provided account constants) go into the base value activation.
//! The base activation is read-only after construction.

use cairn_ast::{Access, CompositeKind, VariableKind};
use cairn_common::span::Span;
use once_cell::sync::Lazy;

use crate::activations::BindingKind;
use crate::checker::Checker;
use crate::config::BaseValue;
use crate::types::{
    CompositeData, CompositeId, FieldData, FixedKind, FunctionData, FunctionParameter,
    FunctionType, IntegerKind, PathDomain, TypeId, TypeStore,
};

/// Case names of the built-in algorithm enums; process-wide constants.
static HASH_ALGORITHM_CASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "SHA2_256",
        "SHA2_384",
        "SHA3_256",
        "SHA3_384",
        "KECCAK_256",
    ]
});

static SIGNATURE_ALGORITHM_CASES: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["ECDSA_P256", "ECDSA_secp256k1", "BLS_BLS12_381"]);

impl TypeStore {
    /// The `AuthAccount.contracts` surface, registered on first use.
    pub(crate) fn account_contracts_type(&mut self) -> TypeId {
        if let Some(id) = self.account_contracts {
            return self.composite_type(id);
        }
        let mut data = CompositeData::new(
            "AuthAccountContracts".to_string(),
            CompositeKind::Struct,
            Span::dummy(),
        );
        let string = self.string;
        let uint8 = self.integer(IntegerKind::UInt8);
        let code = self.variable_array(uint8);
        let void = self.void;

        let add = self.function(FunctionType {
            is_view: false,
            type_parameters: Vec::new(),
            parameters: vec![
                FunctionParameter::required(Some("name"), "name", string),
                FunctionParameter::required(Some("code"), "code", code),
            ],
            return_type: void,
        });
        let remove = self.function(FunctionType {
            is_view: false,
            type_parameters: Vec::new(),
            parameters: vec![FunctionParameter::required(Some("name"), "name", string)],
            return_type: void,
        });
        for (name, type_id) in [("add", add), ("update", add), ("remove", remove)] {
            data.functions.insert(
                name.to_string(),
                FunctionData {
                    access: Access::Pub,
                    type_id,
                    is_view: false,
                    has_body: true,
                    is_mutating: false,
                    is_account_mutator: true,
                    span: Span::dummy(),
                },
            );
        }

        let id = self.add_composite(data);
        self.account_contracts = Some(id);
        self.composite_type(id)
    }

    /// The `account.keys` surface, registered on first use.
    pub(crate) fn account_keys_type(&mut self) -> TypeId {
        if let Some(id) = self.account_keys {
            return self.composite_type(id);
        }
        let mut data = CompositeData::new(
            "AccountKeys".to_string(),
            CompositeKind::Struct,
            Span::dummy(),
        );
        let int = self.int;
        let void = self.void;
        let revoke = self.function(FunctionType {
            is_view: false,
            type_parameters: Vec::new(),
            parameters: vec![FunctionParameter::required(
                Some("keyIndex"),
                "keyIndex",
                int,
            )],
            return_type: void,
        });
        data.functions.insert(
            "revoke".to_string(),
            FunctionData {
                access: Access::Pub,
                type_id: revoke,
                is_view: false,
                has_body: true,
                is_mutating: false,
                is_account_mutator: true,
                span: Span::dummy(),
            },
        );

        let id = self.add_composite(data);
        self.account_keys = Some(id);
        self.composite_type(id)
    }

    /// Register a built-in enum-like struct whose cases are `let` fields
    /// typed as the struct itself.
    fn register_algorithm_enum(&mut self, name: &str, cases: &[&'static str]) -> CompositeId {
        let data = CompositeData::new(name.to_string(), CompositeKind::Struct, Span::dummy());
        let id = self.add_composite(data);
        let self_type = self.composite_type(id);
        let composite = self.composite_mut(id);
        for case in cases {
            composite.fields.insert(
                (*case).to_string(),
                FieldData {
                    name: (*case).to_string(),
                    type_id: self_type,
                    kind: VariableKind::Let,
                    access: Access::Pub,
                    span: Span::dummy(),
                },
            );
        }
        id
    }
}

impl<'a> Checker<'a> {
    /// Seed the base type and value activations.
    pub(crate) fn seed_base_environment(&mut self) {
        self.seed_base_types();
        self.seed_base_values();
    }

    fn seed_base_types(&mut self) {
        let dummy = Span::dummy();

        for kind in IntegerKind::ALL {
            let type_id = self.store.integer(kind);
            self.declare_type(kind.name(), type_id, dummy);
        }
        for kind in [FixedKind::Fix64, FixedKind::UFix64] {
            let type_id = self.store.fixed(kind);
            self.declare_type(kind.name(), type_id, dummy);
        }

        let store = &mut self.store;
        let simple = [
            ("Bool", store.bool_type),
            ("String", store.string),
            ("Character", store.character),
            ("Address", store.address),
            ("Number", store.number),
            ("Void", store.void),
            ("Never", store.never),
            ("AnyStruct", store.any_struct),
            ("AnyResource", store.any_resource),
            ("HashableStruct", store.hashable_struct),
            ("Path", store.path),
            ("AuthAccount", store.auth_account),
            ("PublicAccount", store.public_account),
        ];
        for (name, type_id) in simple {
            self.declare_type(name, type_id, dummy);
        }

        for domain in [PathDomain::Storage, PathDomain::Public, PathDomain::Private] {
            let type_id = self.store.path_with_domain(domain);
            self.declare_type(domain.name(), type_id, dummy);
        }

        let capability = self.store.capability(None);
        self.declare_type("Capability", capability, dummy);
    }

    fn seed_base_values(&mut self) {
        let dummy = Span::dummy();

        // panic(_ message: String): Never
        let string = self.store.string;
        let never = self.store.never;
        let panic_type = self.store.function(FunctionType {
            is_view: true,
            type_parameters: Vec::new(),
            parameters: vec![FunctionParameter::required(None, "message", string)],
            return_type: never,
        });
        self.declare_value("panic", panic_type, BindingKind::Builtin, Access::Pub, dummy);

        // assert(_ condition: Bool, message: String)
        let bool_type = self.store.bool_type;
        let void = self.store.void;
        let assert_type = self.store.function(FunctionType {
            is_view: true,
            type_parameters: Vec::new(),
            parameters: vec![
                FunctionParameter::required(None, "condition", bool_type),
                FunctionParameter {
                    label: Some("message".to_string()),
                    name: "message".to_string(),
                    type_id: string,
                    required: false,
                },
            ],
            return_type: void,
        });
        self.declare_value("assert", assert_type, BindingKind::Builtin, Access::Pub, dummy);

        // log(_ value: AnyStruct)
        let any_struct = self.store.any_struct;
        let log_type = self.store.function(FunctionType {
            is_view: false,
            type_parameters: Vec::new(),
            parameters: vec![FunctionParameter::required(None, "value", any_struct)],
            return_type: void,
        });
        self.declare_value("log", log_type, BindingKind::Builtin, Access::Pub, dummy);

        // Numeric conversion functions: one per numeric type name.
        let number = self.store.number;
        for kind in IntegerKind::ALL {
            let result = self.store.integer(kind);
            let conversion = self.store.function(FunctionType {
                is_view: true,
                type_parameters: Vec::new(),
                parameters: vec![FunctionParameter::required(None, "value", number)],
                return_type: result,
            });
            self.declare_value(kind.name(), conversion, BindingKind::Builtin, Access::Pub, dummy);
        }
        for kind in [FixedKind::Fix64, FixedKind::UFix64] {
            let result = self.store.fixed(kind);
            let conversion = self.store.function(FunctionType {
                is_view: true,
                type_parameters: Vec::new(),
                parameters: vec![FunctionParameter::required(None, "value", number)],
                return_type: result,
            });
            self.declare_value(kind.name(), conversion, BindingKind::Builtin, Access::Pub, dummy);
        }

        // Algorithm enums: a type plus a value exposing the cases.
        let hash_id = self
            .store
            .register_algorithm_enum("HashAlgorithm", &HASH_ALGORITHM_CASES);
        let hash_type = self.store.composite_type(hash_id);
        self.declare_type("HashAlgorithm", hash_type, dummy);
        self.declare_value("HashAlgorithm", hash_type, BindingKind::Builtin, Access::Pub, dummy);

        let signature_id = self
            .store
            .register_algorithm_enum("SignatureAlgorithm", &SIGNATURE_ALGORITHM_CASES);
        let signature_type = self.store.composite_type(signature_id);
        self.declare_type("SignatureAlgorithm", signature_type, dummy);
        self.declare_value(
            "SignatureAlgorithm",
            signature_type,
            BindingKind::Builtin,
            Access::Pub,
            dummy,
        );

        // Host-provided account constants.
        if let Some(provider) = &self.config.base_value_activation {
            let base_values = provider(&self.location);
            for base_value in base_values {
                match base_value {
                    BaseValue::AuthAccount(name) => {
                        let type_id = self.store.auth_account;
                        self.declare_value(&name, type_id, BindingKind::Builtin, Access::Pub, dummy);
                    }
                    BaseValue::PublicAccount(name) => {
                        let type_id = self.store.public_account;
                        self.declare_value(&name, type_id, BindingKind::Builtin, Access::Pub, dummy);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_enum_cases_are_self_typed() {
        let mut store = TypeStore::new(None);
        let id = store.register_algorithm_enum("HashAlgorithm", &HASH_ALGORITHM_CASES);
        let self_type = store.composite_type(id);
        let data = store.composite(id);
        assert_eq!(data.fields.len(), HASH_ALGORITHM_CASES.len());
        for field in data.fields.values() {
            assert_eq!(field.type_id, self_type);
        }
    }

    #[test]
    fn test_account_surfaces_are_cached() {
        let mut store = TypeStore::new(None);
        let a = store.account_contracts_type();
        let b = store.account_contracts_type();
        assert_eq!(a, b);
        let keys_a = store.account_keys_type();
        let keys_b = store.account_keys_type();
        assert_eq!(keys_a, keys_b);
    }
}

//! The semantic type model.
//!
//! Types are interned: structurally equal types share a stable [`TypeId`]
//! handle into a content-addressed arena. Composite and interface types are
//! represented nominally by index into side registries, which is what makes
//! cyclic and self-referential type graphs (a composite whose field type
//! mentions the composite) representable without reference cycles.

use cairn_ast::{Access, CompositeKind, VariableKind};
use cairn_common::span::Span;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::config::{MemoryGauge, MemoryKind};

/// Stable handle to an interned type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

/// Handle to a composite declaration's semantic data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CompositeId(pub u32);

/// Handle to an interface declaration's semantic data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InterfaceId(pub u32);

/// The primitive integer kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IntegerKind {
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    UInt,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
    Word8,
    Word16,
    Word32,
    Word64,
}

impl IntegerKind {
    pub const ALL: [IntegerKind; 18] = [
        IntegerKind::Int,
        IntegerKind::Int8,
        IntegerKind::Int16,
        IntegerKind::Int32,
        IntegerKind::Int64,
        IntegerKind::Int128,
        IntegerKind::Int256,
        IntegerKind::UInt,
        IntegerKind::UInt8,
        IntegerKind::UInt16,
        IntegerKind::UInt32,
        IntegerKind::UInt64,
        IntegerKind::UInt128,
        IntegerKind::UInt256,
        IntegerKind::Word8,
        IntegerKind::Word16,
        IntegerKind::Word32,
        IntegerKind::Word64,
    ];

    /// Candidates for the "smallest signed supertype" join, in order.
    pub const SIGNED_JOIN_ORDER: [IntegerKind; 7] = [
        IntegerKind::Int8,
        IntegerKind::Int16,
        IntegerKind::Int32,
        IntegerKind::Int64,
        IntegerKind::Int128,
        IntegerKind::Int256,
        IntegerKind::Int,
    ];

    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            IntegerKind::Int
                | IntegerKind::Int8
                | IntegerKind::Int16
                | IntegerKind::Int32
                | IntegerKind::Int64
                | IntegerKind::Int128
                | IntegerKind::Int256
        )
    }

    /// Bit width, or `None` for the arbitrary-precision `Int`/`UInt`.
    #[must_use]
    pub const fn bits(self) -> Option<u32> {
        match self {
            IntegerKind::Int | IntegerKind::UInt => None,
            IntegerKind::Int8 | IntegerKind::UInt8 | IntegerKind::Word8 => Some(8),
            IntegerKind::Int16 | IntegerKind::UInt16 | IntegerKind::Word16 => Some(16),
            IntegerKind::Int32 | IntegerKind::UInt32 | IntegerKind::Word32 => Some(32),
            IntegerKind::Int64 | IntegerKind::UInt64 | IntegerKind::Word64 => Some(64),
            IntegerKind::Int128 | IntegerKind::UInt128 => Some(128),
            IntegerKind::Int256 | IntegerKind::UInt256 => Some(256),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            IntegerKind::Int => "Int",
            IntegerKind::Int8 => "Int8",
            IntegerKind::Int16 => "Int16",
            IntegerKind::Int32 => "Int32",
            IntegerKind::Int64 => "Int64",
            IntegerKind::Int128 => "Int128",
            IntegerKind::Int256 => "Int256",
            IntegerKind::UInt => "UInt",
            IntegerKind::UInt8 => "UInt8",
            IntegerKind::UInt16 => "UInt16",
            IntegerKind::UInt32 => "UInt32",
            IntegerKind::UInt64 => "UInt64",
            IntegerKind::UInt128 => "UInt128",
            IntegerKind::UInt256 => "UInt256",
            IntegerKind::Word8 => "Word8",
            IntegerKind::Word16 => "Word16",
            IntegerKind::Word32 => "Word32",
            IntegerKind::Word64 => "Word64",
        }
    }

    /// Whether this kind's value range is contained in `other`'s.
    #[must_use]
    pub fn range_contained_in(self, other: IntegerKind) -> bool {
        if self == other {
            return true;
        }
        match (other.bits(), self.bits()) {
            // Arbitrary-precision signed contains everything; unsigned
            // contains only unsigned.
            (None, _) => other.is_signed() || !self.is_signed(),
            (Some(_), None) => false,
            (Some(ob), Some(sb)) => {
                if other.is_signed() == self.is_signed() {
                    ob >= sb
                } else if other.is_signed() {
                    // Signed needs one extra bit to hold an unsigned range.
                    ob > sb
                } else {
                    false
                }
            }
        }
    }
}

/// The fixed-point kinds; both use scale 8 over 64 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FixedKind {
    Fix64,
    UFix64,
}

impl FixedKind {
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, FixedKind::Fix64)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        64
    }

    /// Declared fractional scale.
    #[must_use]
    pub const fn scale(self) -> usize {
        8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FixedKind::Fix64 => "Fix64",
            FixedKind::UFix64 => "UFix64",
        }
    }
}

/// Path domains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PathDomain {
    Storage,
    Public,
    Private,
}

impl PathDomain {
    #[must_use]
    pub fn parse(name: &str) -> Option<PathDomain> {
        match name {
            "storage" => Some(PathDomain::Storage),
            "public" => Some(PathDomain::Public),
            "private" => Some(PathDomain::Private),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            PathDomain::Storage => "StoragePath",
            PathDomain::Public => "PublicPath",
            PathDomain::Private => "PrivatePath",
        }
    }
}

/// The account built-ins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AccountKind {
    Auth,
    Public,
}

/// Reference authorization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Authorization {
    Unauthorized,
    /// Entitlement names, kept sorted for canonical interning.
    Authorized(Vec<String>),
}

impl Authorization {
    #[must_use]
    pub fn authorized(mut entitlements: Vec<String>) -> Self {
        entitlements.sort();
        entitlements.dedup();
        Authorization::Authorized(entitlements)
    }

    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Authorization::Authorized(_))
    }
}

/// One parameter of a function type: argument label, internal name, type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionParameter {
    /// Label callers must write; `None` means unlabelled (`_`).
    pub label: Option<String>,
    pub name: String,
    pub type_id: TypeId,
    /// Built-in signatures may declare trailing optional parameters.
    pub required: bool,
}

impl FunctionParameter {
    #[must_use]
    pub fn required(label: Option<&str>, name: &str, type_id: TypeId) -> Self {
        Self {
            label: label.map(str::to_string),
            name: name.to_string(),
            type_id,
            required: true,
        }
    }
}

/// A type parameter of a (built-in) generic function.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TypeParameter {
    pub name: String,
    /// Upper bound the argument must satisfy.
    pub bound: Option<TypeId>,
    /// The argument must be a reference type (`borrow`, `link`).
    pub must_be_reference: bool,
    /// May be left unbound (`getCapability` without a type argument).
    pub optional: bool,
}

/// A function type: purity, type parameters, parameters, result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionType {
    pub is_view: bool,
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<FunctionParameter>,
    pub return_type: TypeId,
}

/// A semantic type. Interned; compare via `TypeId`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    /// Produced when checking failed; a subtype and supertype of
    /// everything so a single error does not cascade.
    Invalid,
    Never,
    Void,
    Bool,
    String,
    Character,
    Address,
    /// Abstract supertype of all numeric types.
    Number,
    Integer(IntegerKind),
    Fixed(FixedKind),
    AnyStruct,
    AnyResource,
    HashableStruct,
    /// `Path` (no domain) or a domain-specific path type.
    Path { domain: Option<PathDomain> },
    Optional(TypeId),
    VariableArray(TypeId),
    ConstantArray { element: TypeId, size: u64 },
    Dictionary { key: TypeId, value: TypeId },
    Reference {
        authorization: Authorization,
        referenced: TypeId,
    },
    Capability { borrow: Option<TypeId> },
    Function(FunctionType),
    Composite(CompositeId),
    Interface(InterfaceId),
    Restricted {
        base: TypeId,
        /// Sorted for canonical interning.
        restrictions: Vec<InterfaceId>,
    },
    InclusiveRange(TypeId),
    Account(AccountKind),
    /// A type-parameter slot inside a built-in generic signature.
    Generic { index: u32, name: String },
}

/// A field of a composite or interface.
#[derive(Clone, Debug)]
pub struct FieldData {
    pub name: String,
    pub type_id: TypeId,
    pub kind: VariableKind,
    pub access: Access,
    pub span: Span,
}

/// A function member of a composite or interface.
#[derive(Clone, Debug)]
pub struct FunctionData {
    pub access: Access,
    pub type_id: TypeId,
    pub is_view: bool,
    pub has_body: bool,
    /// Mutates its receiver (built-in container members).
    pub is_mutating: bool,
    /// One of the account-state mutators (`save`, `link`, ...).
    pub is_account_mutator: bool,
    pub span: Span,
}

impl FunctionData {
    #[must_use]
    pub fn user(access: Access, type_id: TypeId, is_view: bool, has_body: bool, span: Span) -> Self {
        Self {
            access,
            type_id,
            is_view,
            has_body,
            is_mutating: false,
            is_account_mutator: false,
            span,
        }
    }
}

/// An initializer of a composite or interface requirement.
#[derive(Clone, Debug)]
pub struct InitializerData {
    pub is_view: bool,
    pub parameters: Vec<FunctionParameter>,
    pub span: Span,
}

/// Semantic data of a composite declaration.
#[derive(Clone, Debug)]
pub struct CompositeData {
    pub identifier: String,
    pub kind: CompositeKind,
    pub conformances: Vec<InterfaceId>,
    pub fields: IndexMap<String, FieldData>,
    pub functions: IndexMap<String, FunctionData>,
    pub initializer: Option<InitializerData>,
    /// Attachment base type.
    pub base_type: Option<TypeId>,
    pub nested_types: IndexMap<String, TypeId>,
    pub span: Span,
}

impl CompositeData {
    #[must_use]
    pub fn new(identifier: String, kind: CompositeKind, span: Span) -> Self {
        Self {
            identifier,
            kind,
            conformances: Vec::new(),
            fields: IndexMap::new(),
            functions: IndexMap::new(),
            initializer: None,
            base_type: None,
            nested_types: IndexMap::new(),
            span,
        }
    }
}

/// Semantic data of an interface declaration.
#[derive(Clone, Debug)]
pub struct InterfaceData {
    pub identifier: String,
    pub kind: CompositeKind,
    pub conformances: Vec<InterfaceId>,
    pub fields: IndexMap<String, FieldData>,
    pub functions: IndexMap<String, FunctionData>,
    pub initializer: Option<InitializerData>,
    pub nested_types: IndexMap<String, TypeId>,
    pub span: Span,
}

impl InterfaceData {
    #[must_use]
    pub fn new(identifier: String, kind: CompositeKind, span: Span) -> Self {
        Self {
            identifier,
            kind,
            conformances: Vec::new(),
            fields: IndexMap::new(),
            functions: IndexMap::new(),
            initializer: None,
            nested_types: IndexMap::new(),
            span,
        }
    }
}

/// The content-addressed type arena plus composite/interface registries.
pub struct TypeStore {
    types: Vec<Type>,
    ids: FxHashMap<Type, TypeId>,
    composites: Vec<CompositeData>,
    interfaces: Vec<InterfaceData>,
    gauge: Option<MemoryGauge>,

    // Pre-interned singletons.
    pub invalid: TypeId,
    pub never: TypeId,
    pub void: TypeId,
    pub bool_type: TypeId,
    pub string: TypeId,
    pub character: TypeId,
    pub address: TypeId,
    pub number: TypeId,
    pub any_struct: TypeId,
    pub any_resource: TypeId,
    pub hashable_struct: TypeId,
    pub int: TypeId,
    pub path: TypeId,
    pub auth_account: TypeId,
    pub public_account: TypeId,

    // Lazily registered built-in composites.
    pub(crate) account_contracts: Option<CompositeId>,
    pub(crate) account_keys: Option<CompositeId>,
}

impl TypeStore {
    #[must_use]
    pub fn new(gauge: Option<MemoryGauge>) -> Self {
        let mut store = Self {
            types: Vec::with_capacity(64),
            ids: FxHashMap::default(),
            composites: Vec::new(),
            interfaces: Vec::new(),
            gauge,
            invalid: TypeId(0),
            never: TypeId(0),
            void: TypeId(0),
            bool_type: TypeId(0),
            string: TypeId(0),
            character: TypeId(0),
            address: TypeId(0),
            number: TypeId(0),
            any_struct: TypeId(0),
            any_resource: TypeId(0),
            hashable_struct: TypeId(0),
            int: TypeId(0),
            path: TypeId(0),
            auth_account: TypeId(0),
            public_account: TypeId(0),
            account_contracts: None,
            account_keys: None,
        };
        store.invalid = store.intern(Type::Invalid);
        store.never = store.intern(Type::Never);
        store.void = store.intern(Type::Void);
        store.bool_type = store.intern(Type::Bool);
        store.string = store.intern(Type::String);
        store.character = store.intern(Type::Character);
        store.address = store.intern(Type::Address);
        store.number = store.intern(Type::Number);
        store.any_struct = store.intern(Type::AnyStruct);
        store.any_resource = store.intern(Type::AnyResource);
        store.hashable_struct = store.intern(Type::HashableStruct);
        store.int = store.intern(Type::Integer(IntegerKind::Int));
        store.path = store.intern(Type::Path { domain: None });
        store.auth_account = store.intern(Type::Account(AccountKind::Auth));
        store.public_account = store.intern(Type::Account(AccountKind::Public));
        store
    }

    /// Intern a type, returning its stable handle.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.ids.get(&ty) {
            return id;
        }
        let id = TypeId(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        if let Some(gauge) = &self.gauge {
            gauge(MemoryKind::TypeInterning, 1);
        }
        self.types.push(ty.clone());
        self.ids.insert(ty, id);
        id
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    // =========================================================================
    // Convenience constructors
    // =========================================================================

    pub fn integer(&mut self, kind: IntegerKind) -> TypeId {
        self.intern(Type::Integer(kind))
    }

    pub fn fixed(&mut self, kind: FixedKind) -> TypeId {
        self.intern(Type::Fixed(kind))
    }

    pub fn optional(&mut self, inner: TypeId) -> TypeId {
        self.intern(Type::Optional(inner))
    }

    pub fn variable_array(&mut self, element: TypeId) -> TypeId {
        self.intern(Type::VariableArray(element))
    }

    pub fn dictionary(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(Type::Dictionary { key, value })
    }

    pub fn reference(&mut self, authorization: Authorization, referenced: TypeId) -> TypeId {
        self.intern(Type::Reference {
            authorization,
            referenced,
        })
    }

    pub fn capability(&mut self, borrow: Option<TypeId>) -> TypeId {
        self.intern(Type::Capability { borrow })
    }

    pub fn function(&mut self, function: FunctionType) -> TypeId {
        self.intern(Type::Function(function))
    }

    pub fn composite_type(&mut self, id: CompositeId) -> TypeId {
        self.intern(Type::Composite(id))
    }

    pub fn interface_type(&mut self, id: InterfaceId) -> TypeId {
        self.intern(Type::Interface(id))
    }

    pub fn restricted(&mut self, base: TypeId, mut restrictions: Vec<InterfaceId>) -> TypeId {
        restrictions.sort();
        restrictions.dedup();
        self.intern(Type::Restricted { base, restrictions })
    }

    pub fn path_with_domain(&mut self, domain: PathDomain) -> TypeId {
        self.intern(Type::Path {
            domain: Some(domain),
        })
    }

    pub fn generic(&mut self, index: u32, name: &str) -> TypeId {
        self.intern(Type::Generic {
            index,
            name: name.to_string(),
        })
    }

    // =========================================================================
    // Registries
    // =========================================================================

    pub fn add_composite(&mut self, data: CompositeData) -> CompositeId {
        let id = CompositeId(u32::try_from(self.composites.len()).unwrap_or(u32::MAX));
        self.composites.push(data);
        id
    }

    #[must_use]
    pub fn composite(&self, id: CompositeId) -> &CompositeData {
        &self.composites[id.0 as usize]
    }

    pub fn composite_mut(&mut self, id: CompositeId) -> &mut CompositeData {
        &mut self.composites[id.0 as usize]
    }

    pub fn add_interface(&mut self, data: InterfaceData) -> InterfaceId {
        let id = InterfaceId(u32::try_from(self.interfaces.len()).unwrap_or(u32::MAX));
        self.interfaces.push(data);
        id
    }

    #[must_use]
    pub fn interface(&self, id: InterfaceId) -> &InterfaceData {
        &self.interfaces[id.0 as usize]
    }

    pub fn interface_mut(&mut self, id: InterfaceId) -> &mut InterfaceData {
        &mut self.interfaces[id.0 as usize]
    }

    #[must_use]
    pub fn composite_count(&self) -> usize {
        self.composites.len()
    }

    #[must_use]
    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    /// Whether a composite declares conformance to `interface_id`,
    /// directly or through interface inheritance.
    #[must_use]
    pub fn composite_conforms_to(&self, composite: CompositeId, interface_id: InterfaceId) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack: Vec<InterfaceId> = self.composite(composite).conformances.clone();
        while let Some(current) = stack.pop() {
            if current == interface_id {
                return true;
            }
            if seen.insert(current) {
                stack.extend(self.interface(current).conformances.iter().copied());
            }
        }
        false
    }

    // =========================================================================
    // Pretty printing
    // =========================================================================

    /// Human-readable form of a type, used in diagnostics.
    #[must_use]
    pub fn pretty(&self, id: TypeId) -> String {
        match self.get(id) {
            Type::Invalid => "<<invalid>>".to_string(),
            Type::Never => "Never".to_string(),
            Type::Void => "Void".to_string(),
            Type::Bool => "Bool".to_string(),
            Type::String => "String".to_string(),
            Type::Character => "Character".to_string(),
            Type::Address => "Address".to_string(),
            Type::Number => "Number".to_string(),
            Type::Integer(kind) => kind.name().to_string(),
            Type::Fixed(kind) => kind.name().to_string(),
            Type::AnyStruct => "AnyStruct".to_string(),
            Type::AnyResource => "AnyResource".to_string(),
            Type::HashableStruct => "HashableStruct".to_string(),
            Type::Path { domain: None } => "Path".to_string(),
            Type::Path {
                domain: Some(domain),
            } => domain.name().to_string(),
            Type::Optional(inner) => format!("{}?", self.pretty(*inner)),
            Type::VariableArray(element) => format!("[{}]", self.pretty(*element)),
            Type::ConstantArray { element, size } => {
                format!("[{}; {size}]", self.pretty(*element))
            }
            Type::Dictionary { key, value } => {
                format!("{{{}: {}}}", self.pretty(*key), self.pretty(*value))
            }
            Type::Reference {
                authorization,
                referenced,
            } => match authorization {
                Authorization::Unauthorized => format!("&{}", self.pretty(*referenced)),
                Authorization::Authorized(entitlements) if entitlements.is_empty() => {
                    format!("auth &{}", self.pretty(*referenced))
                }
                Authorization::Authorized(entitlements) => {
                    format!("auth({}) &{}", entitlements.join(", "), self.pretty(*referenced))
                }
            },
            Type::Capability { borrow: None } => "Capability".to_string(),
            Type::Capability { borrow: Some(b) } => {
                format!("Capability<{}>", self.pretty(*b))
            }
            Type::Function(function) => {
                let params = function
                    .parameters
                    .iter()
                    .map(|p| self.pretty(p.type_id))
                    .collect::<Vec<_>>()
                    .join(", ");
                let prefix = if function.is_view { "view fun" } else { "fun" };
                format!("{prefix}({params}): {}", self.pretty(function.return_type))
            }
            Type::Composite(id) => self.composite(*id).identifier.clone(),
            Type::Interface(id) => self.interface(*id).identifier.clone(),
            Type::Restricted { base, restrictions } => {
                let names = restrictions
                    .iter()
                    .map(|r| self.interface(*r).identifier.clone())
                    .collect::<Vec<_>>()
                    .join(", ");
                match self.get(*base) {
                    Type::AnyStruct | Type::AnyResource => format!("{{{names}}}"),
                    _ => format!("{}{{{names}}}", self.pretty(*base)),
                }
            }
            Type::InclusiveRange(member) => {
                format!("InclusiveRange<{}>", self.pretty(*member))
            }
            Type::Account(AccountKind::Auth) => "AuthAccount".to_string(),
            Type::Account(AccountKind::Public) => "PublicAccount".to_string(),
            Type::Generic { name, .. } => name.clone(),
        }
    }
}

//! Checker configuration.
//!
//! A `CheckerConfig` is immutable for the duration of a check and may be
//! shared across parallel checks of independent programs.

use std::sync::Arc;

use cairn_ast::ImportLocation;

/// How unspecified access modifiers are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessCheckMode {
    #[default]
    Default,
    /// Members without a modifier are treated as self-scoped.
    NotSpecifiedRestricted,
    /// Members without a modifier are treated as public.
    NotSpecifiedUnrestricted,
    /// Every declaration must carry an explicit modifier.
    Strict,
}

/// Kinds of declarations a host may allow at the top level of a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopLevelDeclarationKind {
    Composite,
    Interface,
    Function,
    Variable,
    Transaction,
    Import,
    Pragma,
}

/// Identifies the program being checked; appears in diagnostics and is
/// passed to the import handler.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location(pub String);

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocation categories reported to the memory gauge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryKind {
    TypeInterning,
    Activation,
    Diagnostic,
    ElaborationEntry,
}

/// Callback invoked at declared allocation points. Checking never blocks
/// on the gauge.
pub type MemoryGauge = Arc<dyn Fn(MemoryKind, u64) + Send + Sync>;

/// The module surface an import handler resolves to: the names the import
/// makes available as opaque values.
#[derive(Clone, Debug, Default)]
pub struct ResolvedImport {
    pub value_names: Vec<String>,
}

/// Resolves `import X from L` declarations.
pub type ImportHandler =
    Arc<dyn Fn(&Location, &ImportLocation) -> Option<ResolvedImport> + Send + Sync>;

/// Host policy for valid top-level declaration kinds.
pub type TopLevelDeclarationsPolicy =
    Arc<dyn Fn(&Location) -> Vec<TopLevelDeclarationKind> + Send + Sync>;

/// Additional host-provided base-activation values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BaseValue {
    /// A pre-declared `AuthAccount` constant (e.g. `authAccount`).
    AuthAccount(String),
    /// A pre-declared `PublicAccount` constant (e.g. `publicAccount`).
    PublicAccount(String),
}

/// Host provider of extra base-activation values per location.
pub type BaseValueActivation = Arc<dyn Fn(&Location) -> Vec<BaseValue> + Send + Sync>;

/// Immutable configuration for a check.
#[derive(Clone, Default)]
pub struct CheckerConfig {
    pub access_check_mode: AccessCheckMode,
    /// When `Some`, top-level declarations of other kinds are rejected.
    pub valid_top_level_declarations: Option<TopLevelDeclarationsPolicy>,
    pub base_value_activation: Option<BaseValueActivation>,
    pub import_handler: Option<ImportHandler>,
    pub memory_gauge: Option<MemoryGauge>,
    /// Capture richer per-node annotations for downstream tools.
    pub extended_elaboration_enabled: bool,
    /// Capture per-position occurrences and ranges for editor tooling.
    pub position_info_enabled: bool,
}

impl std::fmt::Debug for CheckerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckerConfig")
            .field("access_check_mode", &self.access_check_mode)
            .field(
                "valid_top_level_declarations",
                &self.valid_top_level_declarations.is_some(),
            )
            .field("base_value_activation", &self.base_value_activation.is_some())
            .field("import_handler", &self.import_handler.is_some())
            .field("memory_gauge", &self.memory_gauge.is_some())
            .field(
                "extended_elaboration_enabled",
                &self.extended_elaboration_enabled,
            )
            .field("position_info_enabled", &self.position_info_enabled)
            .finish()
    }
}

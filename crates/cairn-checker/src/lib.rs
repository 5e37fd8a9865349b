//! Semantic checker for the Cairn contract language.
//!
//! Given an already-parsed program, the checker computes a fully
//! elaborated type environment, validates every declaration and
//! expression against the static rules — including the flow-sensitive
//! resource linearity analysis — and emits a deterministic, ordered list
//! of diagnostics.
//!
//! A check is strictly sequential; independent checks of different
//! programs may run in parallel, because a check consumes an immutable
//! parse tree and configuration and produces an independent elaboration
//! and diagnostic list.
//!
//! ```
//! use cairn_checker::parse_and_check;
//!
//! let result = parse_and_check("let x: Int8 = 300").unwrap();
//! assert_eq!(result.diagnostics.len(), 1);
//! ```

pub mod activations;
pub mod builtins;
pub mod calls;
pub mod checker;
pub mod config;
pub mod conformance;
pub mod declarations;
pub mod elaboration;
pub mod expr;
pub mod literals;
pub mod members;
pub mod references;
pub mod resources;
pub mod statements;
pub mod subtyping;
pub mod transactions;
pub mod types;

pub use cairn_common::diagnostics::{Diagnostic, ErrorKind, Note, Severity};
pub use cairn_parser::ParseError;
pub use checker::Checker;
pub use config::{
    AccessCheckMode, BaseValue, CheckerConfig, Location, MemoryKind, ResolvedImport,
    TopLevelDeclarationKind,
};
pub use elaboration::Elaboration;
pub use types::{Type, TypeId, TypeStore};

use cairn_ast::Program;

/// The output of one check: the elaboration plus the ordered diagnostics.
#[derive(Clone, Debug)]
pub struct CheckResult {
    pub elaboration: Elaboration,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResult {
    /// Count diagnostics of one kind; the common assertion in tests.
    #[must_use]
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

/// Check an already-parsed program.
#[must_use]
pub fn check_program(program: &Program, location: Location, config: &CheckerConfig) -> CheckResult {
    let (elaboration, diagnostics) = Checker::new(program, location, config).check();
    CheckResult {
        elaboration,
        diagnostics,
    }
}

/// Parse and check a source string with the default configuration.
pub fn parse_and_check(source: &str) -> Result<CheckResult, ParseError> {
    parse_and_check_with_config(source, &CheckerConfig::default())
}

/// Parse and check a source string.
pub fn parse_and_check_with_config(
    source: &str,
    config: &CheckerConfig,
) -> Result<CheckResult, ParseError> {
    let program = cairn_parser::parse_program(source)?;
    Ok(check_program(
        &program,
        Location("test".to_string()),
        config,
    ))
}

/// Self-test mode: run `n` repeated checks over the same parse and verify
/// the diagnostic lists are bit-identical. Returns the first result.
pub fn check_repeatedly(source: &str, n: usize) -> Result<CheckResult, ParseError> {
    let program = cairn_parser::parse_program(source)?;
    let config = CheckerConfig::default();
    let first = check_program(&program, Location("test".to_string()), &config);
    for _ in 1..n {
        let next = check_program(&program, Location("test".to_string()), &config);
        assert_eq!(
            first.diagnostics, next.diagnostics,
            "repeated checks produced differing diagnostics"
        );
    }
    Ok(first)
}

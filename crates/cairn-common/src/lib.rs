//! Common types and utilities for the Cairn contract-language toolchain.
//!
//! This crate provides foundational types used across all cairn crates:
//! - Source spans (`Span`, `Spanned`)
//! - Position/Range types and line maps for source locations
//! - The checker diagnostic model (`Diagnostic`, `ErrorKind`, `Note`)
//! - Numeric literal utilities (exact integer and fixed-point parsing)

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::{Span, Spanned};

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Position, Range};

// Checker diagnostics
pub mod diagnostics;
pub use diagnostics::{DeclarationKind, Diagnostic, ErrorKind, Note, Severity};

// Numeric literal parsing
pub mod numeric;
pub use numeric::{FixedPointValue, IntegerValue};

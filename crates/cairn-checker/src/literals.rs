//! Numeric and address literal coercion.
//!
//! Integer literals coerce to a declared annotation with an exact range
//! check, and default to `Int` otherwise. Fixed-point literals check the
//! declared fractional scale before the range. Address literals accept
//! only `0x`-prefixed hexadecimal that fits 8 bytes.

use cairn_common::diagnostics::ErrorKind;
use cairn_common::numeric::{FixedPointValue, IntegerValue};
use cairn_common::span::Span;

use crate::checker::Checker;
use crate::types::{Type, TypeId};

impl<'a> Checker<'a> {
    pub(crate) fn check_integer_literal(
        &mut self,
        span: Span,
        value: &IntegerValue,
        expected: Option<TypeId>,
    ) -> TypeId {
        let Some(expected_type) = expected else {
            return self.numeric_default();
        };

        match self.store.get(expected_type).clone() {
            Type::Optional(inner) => self.check_integer_literal(span, value, Some(inner)),
            Type::Address => {
                if value.radix != 16 {
                    self.error(
                        ErrorKind::InvalidAddressLiteral,
                        span,
                        "address literals must be hexadecimal with a `0x` prefix",
                    );
                } else if value.negative || value.as_u64().is_none() {
                    self.error(
                        ErrorKind::InvalidAddressLiteral,
                        span,
                        "address literal is out of range",
                    );
                }
                self.store.address
            }
            Type::Integer(kind) => {
                if !value.fits(kind.is_signed(), kind.bits()) {
                    let message = format!(
                        "integer literal `{value}` is out of range for `{}`",
                        kind.name()
                    );
                    self.error(ErrorKind::InvalidIntegerLiteralRange, span, message);
                }
                self.store.integer(kind)
            }
            Type::Fixed(kind) => {
                // An integer literal in fixed-point position: scale 0.
                let as_fixed = FixedPointValue {
                    negative: value.negative,
                    integer: value.digits.clone(),
                    fractional: "0".to_string(),
                };
                if !as_fixed.fits(kind.is_signed(), kind.bits(), kind.scale()) {
                    let message = format!(
                        "literal `{value}` is out of range for `{}`",
                        kind.name()
                    );
                    self.error(ErrorKind::InvalidFixedPointLiteralRange, span, message);
                }
                self.store.fixed(kind)
            }
            Type::Number => self.numeric_default(),
            _ => self.numeric_default(),
        }
    }

    pub(crate) fn check_fixed_point_literal(
        &mut self,
        span: Span,
        value: &FixedPointValue,
        expected: Option<TypeId>,
    ) -> TypeId {
        let target = match expected.map(|e| self.store.get(e).clone()) {
            Some(Type::Optional(inner)) => {
                return self.check_fixed_point_literal(span, value, Some(inner));
            }
            Some(Type::Fixed(kind)) => kind,
            _ => {
                let default = self.fixed_default(value.negative);
                let Type::Fixed(kind) = *self.store.get(default) else {
                    return default;
                };
                kind
            }
        };

        if value.scale() > target.scale() {
            let message = format!(
                "fixed-point literal has {} fractional digits, but `{}` has scale {}",
                value.scale(),
                target.name(),
                target.scale()
            );
            self.error(ErrorKind::InvalidFixedPointLiteralScale, span, message);
            return self.store.fixed(target);
        }

        if !value.fits(target.is_signed(), target.bits(), target.scale()) {
            let message = format!(
                "fixed-point literal `{value}` is out of range for `{}`",
                target.name()
            );
            self.error(ErrorKind::InvalidFixedPointLiteralRange, span, message);
        }
        self.store.fixed(target)
    }
}

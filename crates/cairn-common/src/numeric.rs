//! Exact parsing and range checking for numeric literals.
//!
//! Integer literals support `0x`, `0b`, and `0o` prefixes and `_`
//! separators. Values are kept as canonical decimal digit strings so that
//! range checks against 256-bit integer types stay exact without a bignum
//! dependency; comparisons are length-then-lexicographic on the canonical
//! form.

use std::cmp::Ordering;

use serde::Serialize;

/// An exact, arbitrary-size integer literal value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct IntegerValue {
    pub negative: bool,
    /// Canonical decimal magnitude: no sign, no leading zeros ("0" for zero).
    pub digits: String,
    /// Radix the literal was written in (10, 16, 2, or 8).
    pub radix: u32,
}

impl IntegerValue {
    /// Parse an unsigned integer literal with optional radix prefix and
    /// `_` separators. Returns `None` for malformed digit sequences.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }

        let (radix, digits) = if text.len() > 2 {
            let prefix = &text[0..2];
            if prefix.eq_ignore_ascii_case("0x") {
                (16, &text[2..])
            } else if prefix.eq_ignore_ascii_case("0b") {
                (2, &text[2..])
            } else if prefix.eq_ignore_ascii_case("0o") {
                (8, &text[2..])
            } else {
                (10, text)
            }
        } else {
            (10, text)
        };

        let mut decimal = String::from("0");
        let mut seen_digit = false;
        for byte in digits.bytes() {
            if byte == b'_' {
                continue;
            }
            let digit = match byte {
                b'0'..=b'9' => u32::from(byte - b'0'),
                b'a'..=b'f' => u32::from(byte - b'a' + 10),
                b'A'..=b'F' => u32::from(byte - b'A' + 10),
                _ => return None,
            };
            if digit >= radix {
                return None;
            }
            seen_digit = true;
            decimal = decimal_mul_add(&decimal, radix, digit);
        }

        if !seen_digit {
            return None;
        }

        Some(Self {
            negative: false,
            digits: decimal,
            radix,
        })
    }

    /// The value with the opposite sign. `-0` stays non-negative.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self {
            negative: !self.negative && self.digits != "0",
            digits: self.digits.clone(),
            radix: self.radix,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.digits == "0"
    }

    /// Whether the value fits an integer type of the given signedness and
    /// bit width. A width of `None` means arbitrary precision (only the
    /// sign is checked for unsigned types).
    #[must_use]
    pub fn fits(&self, signed: bool, bits: Option<u32>) -> bool {
        if self.negative && !signed {
            return false;
        }
        let Some(bits) = bits else {
            return true;
        };

        let bound = if signed {
            if self.negative {
                // |min| = 2^(bits-1)
                pow2_decimal(bits - 1)
            } else {
                decimal_sub_one(&pow2_decimal(bits - 1))
            }
        } else {
            decimal_sub_one(&pow2_decimal(bits))
        };

        cmp_decimal(&self.digits, &bound) != Ordering::Greater
    }

    /// The value as a `u64`, if the magnitude fits and the sign is
    /// non-negative. Used for address literals and constant array sizes.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        if self.negative {
            return None;
        }
        self.digits.parse::<u64>().ok()
    }
}

impl std::fmt::Display for IntegerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "{}", self.digits)
    }
}

/// An exact fixed-point literal value (`12.34`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FixedPointValue {
    pub negative: bool,
    /// Integer part digits, canonical (no leading zeros, "0" for zero).
    pub integer: String,
    /// Fractional digits exactly as written (trailing zeros preserved).
    pub fractional: String,
}

impl FixedPointValue {
    /// Parse a fixed-point literal of the form `digits.digits`, with `_`
    /// separators permitted in either part.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (int_part, frac_part) = text.split_once('.')?;
        let integer: String = int_part.chars().filter(|c| *c != '_').collect();
        let fractional: String = frac_part.chars().filter(|c| *c != '_').collect();
        if integer.is_empty()
            || fractional.is_empty()
            || !integer.bytes().all(|b| b.is_ascii_digit())
            || !fractional.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        Some(Self {
            negative: false,
            integer: canonicalize(&integer),
            fractional,
        })
    }

    #[must_use]
    pub fn negated(&self) -> Self {
        let is_zero = self.integer == "0" && self.fractional.bytes().all(|b| b == b'0');
        Self {
            negative: !self.negative && !is_zero,
            integer: self.integer.clone(),
            fractional: self.fractional.clone(),
        }
    }

    /// Number of fractional digits written in the literal.
    #[must_use]
    pub fn scale(&self) -> usize {
        self.fractional.len()
    }

    /// The magnitude scaled by `10^scale` as a canonical decimal string,
    /// or `None` if the literal has more fractional digits than `scale`.
    #[must_use]
    pub fn scaled_magnitude(&self, scale: usize) -> Option<String> {
        if self.fractional.len() > scale {
            return None;
        }
        let mut digits = String::with_capacity(self.integer.len() + scale);
        digits.push_str(&self.integer);
        digits.push_str(&self.fractional);
        for _ in self.fractional.len()..scale {
            digits.push('0');
        }
        Some(canonicalize(&digits))
    }

    /// Whether the value fits a fixed-point type with the given signedness,
    /// underlying bit width, and fractional scale. Assumes the scale check
    /// already passed.
    #[must_use]
    pub fn fits(&self, signed: bool, bits: u32, scale: usize) -> bool {
        if self.negative && !signed {
            return false;
        }
        let Some(magnitude) = self.scaled_magnitude(scale) else {
            return false;
        };
        let bound = if signed {
            if self.negative {
                pow2_decimal(bits - 1)
            } else {
                decimal_sub_one(&pow2_decimal(bits - 1))
            }
        } else {
            decimal_sub_one(&pow2_decimal(bits))
        };
        cmp_decimal(&magnitude, &bound) != Ordering::Greater
    }
}

impl std::fmt::Display for FixedPointValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "{}.{}", self.integer, self.fractional)
    }
}

// =============================================================================
// Decimal string arithmetic
// =============================================================================

/// Compare two canonical decimal magnitude strings.
#[must_use]
pub fn cmp_decimal(a: &str, b: &str) -> Ordering {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => a.cmp(b),
        other => other,
    }
}

/// `digits * factor + addend`, all base 10, `factor` and `addend` small.
fn decimal_mul_add(digits: &str, factor: u32, addend: u32) -> String {
    let mut carry = u64::from(addend);
    let mut out = Vec::with_capacity(digits.len() + 1);
    for byte in digits.bytes().rev() {
        let d = u64::from(byte - b'0');
        let value = d * u64::from(factor) + carry;
        out.push(b'0' + (value % 10) as u8);
        carry = value / 10;
    }
    while carry > 0 {
        out.push(b'0' + (carry % 10) as u8);
        carry /= 10;
    }
    out.reverse();
    canonicalize(std::str::from_utf8(&out).unwrap_or("0"))
}

/// `2^bits` as a decimal string.
#[must_use]
pub fn pow2_decimal(bits: u32) -> String {
    let mut value = String::from("1");
    for _ in 0..bits {
        value = decimal_mul_add(&value, 2, 0);
    }
    value
}

/// `digits - 1` for a positive canonical decimal string.
fn decimal_sub_one(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    let mut i = out.len();
    loop {
        if i == 0 {
            return String::from("0");
        }
        i -= 1;
        if out[i] == b'0' {
            out[i] = b'9';
        } else {
            out[i] -= 1;
            break;
        }
    }
    canonicalize(std::str::from_utf8(&out).unwrap_or("0"))
}

/// Strip leading zeros, keeping at least one digit.
fn canonicalize(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        String::from("0")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_radix_and_separators() {
        assert_eq!(IntegerValue::parse("123").unwrap().digits, "123");
        assert_eq!(IntegerValue::parse("1_000").unwrap().digits, "1000");
        assert_eq!(IntegerValue::parse("0xFF").unwrap().digits, "255");
        assert_eq!(IntegerValue::parse("0b1_0").unwrap().digits, "2");
        assert_eq!(IntegerValue::parse("0o17").unwrap().digits, "15");
        assert_eq!(IntegerValue::parse("0xFF").unwrap().radix, 16);
        assert!(IntegerValue::parse("0b2").is_none());
        assert!(IntegerValue::parse("0xg").is_none());
        assert!(IntegerValue::parse("_").is_none());
    }

    #[test]
    fn test_integer_range_checks() {
        let v127 = IntegerValue::parse("127").unwrap();
        let v128 = IntegerValue::parse("128").unwrap();
        assert!(v127.fits(true, Some(8)));
        assert!(!v128.fits(true, Some(8)));
        assert!(v128.negated().fits(true, Some(8)));
        assert!(!IntegerValue::parse("129").unwrap().negated().fits(true, Some(8)));
        assert!(IntegerValue::parse("255").unwrap().fits(false, Some(8)));
        assert!(!IntegerValue::parse("256").unwrap().fits(false, Some(8)));
        assert!(!v127.negated().fits(false, Some(8)));
        // Arbitrary precision: anything fits
        assert!(IntegerValue::parse("123456789012345678901234567890").unwrap().fits(true, None));
    }

    #[test]
    fn test_256_bit_bounds() {
        // UInt256 max = 2^256 - 1
        let max = decimal_sub_one(&pow2_decimal(256));
        let just_over = decimal_mul_add(&max, 1, 1);
        let v = IntegerValue {
            negative: false,
            digits: max.clone(),
            radix: 10,
        };
        assert!(v.fits(false, Some(256)));
        let v = IntegerValue {
            negative: false,
            digits: just_over,
            radix: 10,
        };
        assert!(!v.fits(false, Some(256)));
    }

    #[test]
    fn test_fixed_point_parse_and_scale() {
        let v = FixedPointValue::parse("1.05").unwrap();
        assert_eq!(v.integer, "1");
        assert_eq!(v.fractional, "05");
        assert_eq!(v.scale(), 2);
        assert_eq!(v.scaled_magnitude(8).unwrap(), "105000000");
        assert!(v.scaled_magnitude(1).is_none());
        assert!(FixedPointValue::parse("1.").is_none());
        assert!(FixedPointValue::parse(".5").is_none());
    }

    #[test]
    fn test_fixed_point_range() {
        // Fix64 max = (2^63 - 1) / 10^8 = 92233720368.54775807
        let max = FixedPointValue::parse("92233720368.54775807").unwrap();
        assert!(max.fits(true, 64, 8));
        let over = FixedPointValue::parse("92233720368.54775808").unwrap();
        assert!(!over.fits(true, 64, 8));
        assert!(over.negated().fits(true, 64, 8));
        // UFix64 max = (2^64 - 1) / 10^8
        let umax = FixedPointValue::parse("184467440737.09551615").unwrap();
        assert!(umax.fits(false, 64, 8));
        assert!(!umax.negated().fits(false, 64, 8));
    }
}

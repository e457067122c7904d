// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numeric coercions and comparisons (`spec.md` §4.1).
//!
//! These operate on plain `f64`/`i32`/`u32` — the `Value`-level wrappers
//! that invoke `ToPrimitive` on objects live in
//! [`crate::value::convert`]; this module is the pure-math layer underneath
//! it, mirroring the split between `Number::toString`/`Number::bitwiseAnd`
//! (math on `f64`) and `to_number` (object coercion) in the teacher's
//! `ecmascript/types/language/number.rs`.

/// `2^53 - 1`, the largest safe integer `spec.md` §6 names for
/// `Number.MAX_SAFE_INTEGER`.
pub const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;
pub const MIN_SAFE_INTEGER: f64 = -9007199254740991.0;

/// ### [ToInt32 ( argument )](https://tc39.es/ecma262/#sec-toint32)
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// ### [ToUint32 ( argument )](https://tc39.es/ecma262/#sec-touint32)
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let modulus = 4294967296.0_f64; // 2^32
    let int = n.trunc();
    let positive = int.rem_euclid(modulus);
    positive as u32
}

/// ### [ToIndex ( value )](https://tc39.es/ecma262/#sec-toindex), restricted
/// to the already-`ToIntegerOrInfinity`'d float; returns `Err(())` — a
/// *range* failure per `spec.md` §4.1 — outside `[0, 2^53)`.
pub fn to_index(integer: f64) -> Result<u64, ()> {
    if integer < 0.0 || integer >= 9007199254740992.0 {
        return Err(());
    }
    Ok(integer as u64)
}

/// ### [ToIntegerOrInfinity ( argument )](https://tc39.es/ecma262/#sec-tointegerorinfinity)
pub fn to_integer_or_infinity(n: f64) -> f64 {
    if n.is_nan() {
        return 0.0;
    }
    if n.is_infinite() {
        return n;
    }
    n.trunc()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonResult {
    Less,
    Greater,
    Equal,
    Undefined,
}

/// ### [IsLessThan](https://tc39.es/ecma262/#sec-islessthan), numeric
/// branch only. `spec.md` §4.1's `ordinary_compare`.
pub fn ordinary_compare(a: f64, b: f64) -> ComparisonResult {
    if a.is_nan() || b.is_nan() {
        return ComparisonResult::Undefined;
    }
    if a < b {
        ComparisonResult::Less
    } else if a > b {
        ComparisonResult::Greater
    } else {
        ComparisonResult::Equal
    }
}

/// ### [Number::equal ( x, y )](https://tc39.es/ecma262/#sec-numeric-types-number-equal)
///
/// `NaN != NaN`; `+0 == -0`.
pub fn number_equal(a: f64, b: f64) -> bool {
    a == b
}

/// Parses an ECMAScript `StringNumericLiteral` (`spec.md` §4.1
/// `to_number`'s string branch): optional surrounding whitespace, decimal,
/// `0x`/`0X` hex, `0b`/`0B` binary, `0o`/`0O` octal. Returns `NaN` (as
/// `Some(f64::NAN)`) only for the empty-after-trim case; a genuinely
/// malformed literal returns `None` so callers can still special-case it
/// the same way (`to_number` maps both to `NaN`, but `parseFloat`-style
/// callers need to tell "empty" apart from "junk").
pub fn parse_string_numeric_literal(s: &str) -> Option<f64> {
    let trimmed = s.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return Some(0.0);
    }
    if let Some(rest) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(rest, 16).ok().map(|v| v as f64);
    }
    if let Some(rest) = trimmed.strip_prefix("0b").or_else(|| trimmed.strip_prefix("0B")) {
        return u64::from_str_radix(rest, 2).ok().map(|v| v as f64);
    }
    if let Some(rest) = trimmed.strip_prefix("0o").or_else(|| trimmed.strip_prefix("0O")) {
        return u64::from_str_radix(rest, 8).ok().map(|v| v as f64);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    lexical::parse::<f64, _>(trimmed.as_bytes()).ok()
}

fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

/// ### [Number::toString ( x, radix )](https://tc39.es/ecma262/#sec-numeric-types-number-tostring), radix-10 case
///
/// Produces the shortest decimal string that round-trips back to `x`, via
/// `ryu_js`'s ECMAScript-flavored Grisu implementation, rather than the
/// digit-by-digit `to_string_radix` below (which is only exact for
/// non-fractional values and would otherwise drift from `Number::toString`'s
/// "shortest round-tripping representation" requirement for fractional
/// doubles).
pub fn to_exact_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    let mut buf = ryu_js::Buffer::new();
    buf.format(n).to_string()
}

/// Converts an integer-valued `f64` to an arbitrary radix in `[2, 36]`
/// (`spec.md` §6 `Number.prototype.toString(radix)`). The fractional part
/// (if any) is produced by repeated multiplication, matching the ES
/// algorithm rather than relying on a fixed-precision formatter.
pub fn to_string_radix(mut value: f64, radix: u32) -> String {
    debug_assert!((2..=36).contains(&radix));
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
        value = -value;
    }
    if value.is_infinite() {
        out.push_str("Infinity");
        return out;
    }
    let digits = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut int_part = value.trunc();
    let mut frac_part = value - int_part;

    let mut int_digits = Vec::new();
    if int_part == 0.0 {
        int_digits.push(b'0');
    }
    while int_part >= 1.0 {
        let digit = (int_part % radix as f64) as usize;
        int_digits.push(digits[digit]);
        int_part = (int_part / radix as f64).trunc();
    }
    int_digits.reverse();
    out.push_str(std::str::from_utf8(&int_digits).unwrap());

    if frac_part > 0.0 {
        out.push('.');
        // Bounded like every real-world engine: enough digits to
        // round-trip a double, never an unbounded loop.
        for _ in 0..1100 {
            frac_part *= radix as f64;
            let digit = frac_part.trunc() as usize;
            out.push(digits[digit.min(35)] as char);
            frac_part -= digit as f64;
            if frac_part <= 0.0 {
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_uint32_wraps_negative() {
        assert_eq!(to_uint32(-1.0), 4294967295);
    }

    #[test]
    fn to_int32_round_trips_small_values() {
        assert_eq!(to_int32(42.0), 42);
        assert_eq!(to_int32(-42.0), -42);
    }

    #[test]
    fn to_index_rejects_out_of_range() {
        assert!(to_index(-1.0).is_err());
        assert!(to_index(9007199254740992.0).is_err());
        assert_eq!(to_index(5.0), Ok(5));
    }

    #[test]
    fn ordinary_compare_nan_is_undefined() {
        assert_eq!(ordinary_compare(f64::NAN, 1.0), ComparisonResult::Undefined);
    }

    #[test]
    fn hex_binary_octal_literals() {
        assert_eq!(parse_string_numeric_literal("0x10"), Some(16.0));
        assert_eq!(parse_string_numeric_literal("0b101"), Some(5.0));
        assert_eq!(parse_string_numeric_literal("0o17"), Some(15.0));
        assert_eq!(parse_string_numeric_literal(""), Some(0.0));
        assert_eq!(parse_string_numeric_literal("  \t12 "), Some(12.0));
    }

    #[test]
    fn radix_conversion_matches_known_values() {
        assert_eq!(to_string_radix(255.0, 16), "ff");
        assert_eq!(to_string_radix(-8.0, 2), "-1000");
    }

    #[test]
    fn exact_string_is_shortest_round_trip() {
        assert_eq!(to_exact_string(0.1), "0.1");
        assert_eq!(to_exact_string(100.0), "100");
        assert_eq!(to_exact_string(-42.5), "-42.5");
    }
}

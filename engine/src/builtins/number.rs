// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Number` constructor slots and `toFixed`/`toExponential`/`toPrecision`/
//! `toString(radix)` (`spec.md` §6), grounded in
//! `examples/original_source/src/runtime/GlobalObjectBuiltinNumber.cpp`'s
//! format-string-driven implementation, reworked as direct digit
//! generation since Rust has no `sprintf`.

use super::{install_method, install_value, CONST_ATTRS};
use crate::agent::Agent;
use crate::error::{ErrorKind, JsResult};
use crate::object::ObjectRareData;
use crate::value::convert;
use crate::value::number::to_integer_or_infinity;
use crate::value::Value;
use std::rc::Rc;

pub fn install(agent: &mut Agent) {
    let number_prototype = agent.realm.number_prototype.clone();

    install_method(agent, &number_prototype, "valueOf", 0, Rc::new(|agent, this, _args| {
        Ok(Value::number(number_this_value(agent, &this)?))
    }));

    install_method(agent, &number_prototype, "toString", 1, Rc::new(|agent, this, args| {
        let n = number_this_value(agent, &this)?;
        let radix = match args.first() {
            Some(v) if !v.is_undefined() => to_integer_or_infinity(convert::to_number(agent, v)?) as u32,
            _ => 10,
        };
        if !(2..=36).contains(&radix) {
            return Err(agent.throw_error(ErrorKind::Range, "toString() radix must be between 2 and 36"));
        }
        Ok(Value::from_str(&if radix == 10 {
            crate::value::number::to_exact_string(n)
        } else {
            crate::value::number::to_string_radix(n, radix)
        }))
    }));

    install_method(agent, &number_prototype, "toLocaleString", 0, Rc::new(|agent, this, _args| {
        // `spec.md` §9 Open Question: delegate unconditionally to
        // `toString()`, ignoring locale/options arguments entirely.
        Ok(Value::from_str(&crate::value::number::to_exact_string(number_this_value(agent, &this)?)))
    }));

    install_method(agent, &number_prototype, "toFixed", 1, Rc::new(|agent, this, args| {
        let n = number_this_value(agent, &this)?;
        let digits = match args.first() {
            Some(v) if !v.is_undefined() => to_integer_or_infinity(convert::to_number(agent, v)?) as i64,
            _ => 0,
        };
        if !(0..=20).contains(&digits) {
            return Err(agent.throw_error(ErrorKind::Range, "toFixed() digits argument must be between 0 and 20"));
        }
        Ok(Value::from_str(&to_fixed(n, digits as u32)))
    }));

    install_method(agent, &number_prototype, "toExponential", 1, Rc::new(|agent, this, args| {
        let n = number_this_value(agent, &this)?;
        let digits = match args.first() {
            Some(v) if !v.is_undefined() => Some(to_integer_or_infinity(convert::to_number(agent, v)?) as i64),
            _ => None,
        };
        if let Some(d) = digits {
            if !(0..=20).contains(&d) {
                return Err(agent.throw_error(ErrorKind::Range, "toExponential() digits argument must be between 0 and 20"));
            }
        }
        Ok(Value::from_str(&to_exponential(n, digits)))
    }));

    install_method(agent, &number_prototype, "toPrecision", 1, Rc::new(|agent, this, args| {
        let n = number_this_value(agent, &this)?;
        let Some(precision) = args.first().filter(|v| !v.is_undefined()) else {
            return Ok(Value::from_str(&crate::value::number::to_exact_string(n)));
        };
        let p = to_integer_or_infinity(convert::to_number(agent, precision)?) as i64;
        if !(1..=21).contains(&p) {
            return Err(agent.throw_error(ErrorKind::Range, "toPrecision() argument must be between 1 and 21"));
        }
        Ok(Value::from_str(&to_precision(n, p as u32)))
    }));

    let ctor = super::make_constructor(agent, "Number", 1, &number_prototype, Rc::new(|agent, _this, args| {
        let n = match args.first() {
            Some(v) => convert::to_number(agent, v)?,
            None => 0.0,
        };
        Ok(Value::number(n))
    }));

    install_value(&ctor, "MAX_SAFE_INTEGER", Value::number(crate::value::number::MAX_SAFE_INTEGER), CONST_ATTRS);
    install_value(&ctor, "MIN_SAFE_INTEGER", Value::number(crate::value::number::MIN_SAFE_INTEGER), CONST_ATTRS);
    install_value(&ctor, "MAX_VALUE", Value::Double(f64::MAX), CONST_ATTRS);
    install_value(&ctor, "MIN_VALUE", Value::Double(5e-324), CONST_ATTRS);
    install_value(&ctor, "EPSILON", Value::Double(f64::EPSILON), CONST_ATTRS);
    install_value(&ctor, "POSITIVE_INFINITY", Value::Double(f64::INFINITY), CONST_ATTRS);
    install_value(&ctor, "NEGATIVE_INFINITY", Value::Double(f64::NEG_INFINITY), CONST_ATTRS);
    install_value(&ctor, "NaN", Value::Double(f64::NAN), CONST_ATTRS);
    install_method(agent, &ctor, "isInteger", 1, Rc::new(|_agent, _this, args| {
        Ok(Value::Bool(matches!(args.first(), Some(v) if v.is_number() && v.as_f64_unchecked().fract() == 0.0 && v.as_f64_unchecked().is_finite())))
    }));
    install_method(agent, &ctor, "isFinite", 1, Rc::new(|_agent, _this, args| {
        Ok(Value::Bool(matches!(args.first(), Some(v) if v.is_number() && v.as_f64_unchecked().is_finite())))
    }));
    install_method(agent, &ctor, "isNaN", 1, Rc::new(|_agent, _this, args| {
        Ok(Value::Bool(matches!(args.first(), Some(v) if v.is_number() && v.as_f64_unchecked().is_nan())))
    }));
}

fn number_this_value(agent: &mut Agent, this: &Value) -> JsResult<f64> {
    match this {
        Value::Int32(i) => Ok(*i as f64),
        Value::Double(d) => Ok(*d),
        Value::Object(o) => match o.borrow().rare.as_deref() {
            Some(ObjectRareData::NumberWrapper(n)) => Ok(*n),
            _ => Err(agent.throw_error(ErrorKind::Type, "Number.prototype method called on incompatible receiver")),
        },
        _ => Err(agent.throw_error(ErrorKind::Type, "Number.prototype method called on incompatible receiver")),
    }
}

/// ### [Number::toFixed ( f )](https://tc39.es/ecma262/#sec-number.prototype.tofixed)
///
/// Rounding is round-half-away-from-zero (`f64::round`'s behavior),
/// matching `GlobalObjectBuiltinNumber.cpp`'s `round(number)` call rather
/// than ES2018's round-half-to-even refinement. The scale-round-unscale
/// dance happens before handing off to the formatter so the formatter
/// never has to re-round a boundary value itself.
fn to_fixed(n: f64, digits: u32) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    let sign = if n.is_sign_negative() && n != 0.0 { "-" } else { "" };
    let abs = n.abs();
    if abs >= 1e21 {
        return format!("{sign}{}", crate::value::number::to_exact_string(abs));
    }
    let scale = 10f64.powi(digits as i32);
    let rounded = (abs * scale).round() / scale;
    format!("{sign}{:.*}", digits as usize, rounded)
}

/// ### [Number::toExponential ( fractionDigits )](https://tc39.es/ecma262/#sec-number.prototype.toexponential)
///
/// `digits = None` means "as many digits as needed" (default precision 15,
/// trailing zeros trimmed) — `spec.md` §9 calls out the infinite-argument
/// path as special-cased ahead of any fixed-width formatting so it can
/// never misread a "no digits requested" marker as a literal zero.
fn to_exponential(n: f64, digits: Option<i64>) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    let sign = if n.is_sign_negative() && n != 0.0 { "-" } else { "" };
    let abs = n.abs();

    match digits {
        Some(d) => {
            let formatted = format!("{:.*e}", d as usize, abs);
            format!("{sign}{}", normalize_exponent(&formatted))
        }
        None => {
            let mut formatted = format!("{:.*e}", 15, abs);
            formatted = trim_trailing_mantissa_zeros(&formatted);
            format!("{sign}{}", normalize_exponent(&formatted))
        }
    }
}

/// Rust's `{:e}` formatter writes `1.5e2`; ECMAScript wants `1.5e+2`.
fn normalize_exponent(s: &str) -> String {
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i64 = exp.parse().unwrap_or(0);
            let sign = if exp >= 0 { "+" } else { "-" };
            format!("{mantissa}e{sign}{}", exp.abs())
        }
        None => s.to_string(),
    }
}

fn trim_trailing_mantissa_zeros(s: &str) -> String {
    let Some((mantissa, exp)) = s.split_once('e') else {
        return s.to_string();
    };
    let trimmed = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{trimmed}e{exp}")
}

/// ### [Number::toPrecision ( p )](https://tc39.es/ecma262/#sec-number.prototype.toprecision)
fn to_precision(n: f64, p: u32) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    if n == 0.0 {
        return if p == 1 { "0".to_string() } else { format!("0.{}", "0".repeat(p as usize - 1)) };
    }

    let sign = if n.is_sign_negative() { "-" } else { "" };
    let abs = n.abs();
    let exponent = abs.log10().floor() as i64;

    if exponent < -6 || exponent >= p as i64 {
        format!("{sign}{}", normalize_exponent(&format!("{:.*e}", p as usize - 1, abs)))
    } else {
        let fractional_digits = (p as i64 - 1 - exponent).max(0) as usize;
        format!("{sign}{:.*}", fractional_digits, abs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_fixed_matches_known_rounding() {
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(1.5, 0), "2");
        assert_eq!(to_fixed(-1.5, 0), "-2");
        assert_eq!(to_fixed(0.0, 2), "0.00");
    }

    #[test]
    fn to_fixed_falls_back_to_plain_string_above_1e21() {
        assert_eq!(to_fixed(1e21, 2), crate::value::number::to_exact_string(1e21));
    }

    #[test]
    fn to_exponential_default_precision_trims_zeros() {
        assert_eq!(to_exponential(123.0, None), "1.23e+2");
    }

    #[test]
    fn to_exponential_explicit_digits() {
        assert_eq!(to_exponential(123.456, Some(2)), "1.23e+2");
    }

    #[test]
    fn to_precision_chooses_fixed_for_in_range_exponents() {
        assert_eq!(to_precision(123.456, 5), "123.46");
    }

    #[test]
    fn to_precision_chooses_exponential_outside_range() {
        assert_eq!(to_precision(0.0000001234, 3), "1.23e-7");
    }
}

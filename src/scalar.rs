// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! The scalar leaf codec: parsing and rendering of integers, booleans,
//! floats, and enum table lookups.
//!
//! Parse functions return a bare [`ErrorKind`]; the engines attach the
//! document position and path.

use crate::{modules::error::ErrorKind, schema::NamedValue};

/// Parses a signed integer against a slot width and optional range.
///
/// Grammar: optional surrounding whitespace, optional sign, optional
/// `0x`/`0X` or `0b`/`0B` base prefix, digits with `_` separators.
pub(crate) fn parse_int(
    s: &str,
    data_size: usize,
    range: Option<(i64, i64)>,
) -> Result<i64, ErrorKind> {
    let (negative, magnitude) = parse_magnitude(s)?;
    let value = if negative {
        if magnitude > (i64::MAX as u64) + 1 {
            return Err(ErrorKind::InvalidValue);
        }
        if magnitude == (i64::MAX as u64) + 1 {
            i64::MIN
        } else {
            -(magnitude as i64)
        }
    } else {
        if magnitude > i64::MAX as u64 {
            return Err(ErrorKind::InvalidValue);
        }
        magnitude as i64
    };
    let (lo, hi) = int_bounds(data_size);
    if value < lo || value > hi {
        return Err(ErrorKind::InvalidValue);
    }
    if let Some((min, max)) = range {
        if value < min || value > max {
            return Err(ErrorKind::InvalidValue);
        }
    }
    Ok(value)
}

/// Parses an unsigned integer against a slot width and optional range.
pub(crate) fn parse_uint(
    s: &str,
    data_size: usize,
    range: Option<(u64, u64)>,
) -> Result<u64, ErrorKind> {
    let (negative, magnitude) = parse_magnitude(s)?;
    if negative {
        return Err(ErrorKind::InvalidValue);
    }
    if magnitude > uint_max(data_size) {
        return Err(ErrorKind::InvalidValue);
    }
    if let Some((min, max)) = range {
        if magnitude < min || magnitude > max {
            return Err(ErrorKind::InvalidValue);
        }
    }
    Ok(magnitude)
}

fn parse_magnitude(s: &str) -> Result<(bool, u64), ErrorKind> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ErrorKind::InvalidValue);
    }
    let (negative, rest) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (base, digits) = if rest.starts_with("0x") || rest.starts_with("0X") {
        (16, &rest[2..])
    } else if rest.starts_with("0b") || rest.starts_with("0B") {
        (2, &rest[2..])
    } else {
        (10, rest)
    };
    let mut seen_digit = false;
    let mut accumulator: u64 = 0;
    for c in digits.chars() {
        if c == '_' {
            // Visual separator.
            continue;
        }
        let digit = c.to_digit(base).ok_or(ErrorKind::InvalidValue)?;
        accumulator = accumulator
            .checked_mul(u64::from(base))
            .and_then(|acc| acc.checked_add(u64::from(digit)))
            .ok_or(ErrorKind::InvalidValue)?;
        seen_digit = true;
    }
    if !seen_digit {
        return Err(ErrorKind::InvalidValue);
    }
    Ok((negative, accumulator))
}

fn int_bounds(data_size: usize) -> (i64, i64) {
    if data_size >= 8 {
        (i64::MIN, i64::MAX)
    } else {
        let hi = ((1u64 << (8 * data_size - 1)) - 1) as i64;
        (-hi - 1, hi)
    }
}

fn uint_max(data_size: usize) -> u64 {
    if data_size >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * data_size)) - 1
    }
}

const TRUE_TOKENS: &[&str] = &["true", "yes", "y", "on", "enable", "enabled", "1"];
const FALSE_TOKENS: &[&str] = &["false", "no", "n", "off", "disable", "disabled", "0"];

/// Parses a boolean token. Always case-insensitive.
pub(crate) fn parse_bool(s: &str) -> Result<bool, ErrorKind> {
    let trimmed = s.trim();
    if TRUE_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(trimmed)) {
        return Ok(true);
    }
    if FALSE_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(trimmed)) {
        return Ok(false);
    }
    Err(ErrorKind::InvalidValue)
}

/// Parses a float or double value.
///
/// Accepts the standard decimal grammar plus C-style hex floats. A finite
/// input that overflows the slot width is rejected; explicit `inf` and
/// `NaN` literals pass through. Sub-normal underflow is accepted (the
/// load engine reports it at notice level).
pub(crate) fn parse_float(s: &str, data_size: usize) -> Result<f64, ErrorKind> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ErrorKind::InvalidValue);
    }
    let unsigned = trimmed
        .strip_prefix(['+', '-'])
        .unwrap_or(trimmed);
    let value = if unsigned.starts_with("0x") || unsigned.starts_with("0X") {
        parse_hex_float(trimmed)?
    } else {
        trimmed.parse::<f64>().map_err(|_| ErrorKind::InvalidValue)?
    };
    if value.is_infinite() && !infinity_literal(trimmed) {
        return Err(ErrorKind::InvalidValue);
    }
    if data_size == 4 && value.is_finite() && (value as f32).is_infinite() {
        return Err(ErrorKind::InvalidValue);
    }
    Ok(value)
}

/// Whether a parsed value underflowed to a sub-normal at the slot width.
pub(crate) fn is_subnormal(value: f64, data_size: usize) -> bool {
    if data_size == 4 {
        (value as f32).is_subnormal()
    } else {
        value.is_subnormal()
    }
}

fn infinity_literal(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

fn parse_hex_float(s: &str) -> Result<f64, ErrorKind> {
    let (negative, rest) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .ok_or(ErrorKind::InvalidValue)?;
    let (mantissa, exponent) = match digits.find(['p', 'P']) {
        Some(split) => {
            let exponent = digits[split + 1..]
                .parse::<i32>()
                .map_err(|_| ErrorKind::InvalidValue)?;
            (&digits[..split], exponent)
        }
        None => (digits, 0),
    };
    let mut value = 0f64;
    let mut fraction_scale = 0f64;
    let mut seen_digit = false;
    let mut seen_point = false;
    for c in mantissa.chars() {
        if c == '.' {
            if seen_point {
                return Err(ErrorKind::InvalidValue);
            }
            seen_point = true;
            fraction_scale = 1.0 / 16.0;
            continue;
        }
        let digit = c.to_digit(16).ok_or(ErrorKind::InvalidValue)? as f64;
        if seen_point {
            value += digit * fraction_scale;
            fraction_scale /= 16.0;
        } else {
            value = value * 16.0 + digit;
        }
        seen_digit = true;
    }
    if !seen_digit {
        return Err(ErrorKind::InvalidValue);
    }
    value *= 2f64.powi(exponent);
    Ok(if negative { -value } else { value })
}

/// Finds a table entry matching `s` under the given case policy.
pub(crate) fn match_enum(
    table: &[NamedValue],
    s: &str,
    case_insensitive: bool,
) -> Option<i64> {
    table
        .iter()
        .find(|entry| {
            if case_insensitive {
                entry.name.eq_ignore_ascii_case(s)
            } else {
                entry.name == s
            }
        })
        .map(|entry| entry.value)
}

/// Finds the first table name bound to `value`, for emission.
pub(crate) fn enum_name(table: &[NamedValue], value: i64) -> Option<&str> {
    table
        .iter()
        .find(|entry| entry.value == value)
        .map(|entry| entry.name.as_str())
}

/// Renders a signed integer in decimal.
pub(crate) fn render_int(value: i64) -> String {
    itoa::Buffer::new().format(value).to_owned()
}

/// Renders an unsigned integer in decimal.
pub(crate) fn render_uint(value: u64) -> String {
    itoa::Buffer::new().format(value).to_owned()
}

/// Renders a float at the given slot width.
pub(crate) fn render_float(value: f64, data_size: usize) -> String {
    if data_size == 4 {
        ryu::Buffer::new().format(value as f32).to_owned()
    } else {
        ryu::Buffer::new().format(value).to_owned()
    }
}

/// Renders a boolean.
pub(crate) fn render_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_bases_and_separators() {
        assert_eq!(parse_int("90", 8, None), Ok(90));
        assert_eq!(parse_int("  -42  ", 8, None), Ok(-42));
        assert_eq!(parse_int("+7", 1, None), Ok(7));
        assert_eq!(parse_int("0xff", 2, None), Ok(255));
        assert_eq!(parse_int("0XFF", 2, None), Ok(255));
        assert_eq!(parse_int("0b101", 1, None), Ok(5));
        assert_eq!(parse_int("1_000_000", 4, None), Ok(1_000_000));
        assert_eq!(parse_int("0x_ff", 2, None), Ok(255));
    }

    #[test]
    fn test_int_rejects_garbage() {
        assert_eq!(parse_int("", 8, None), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_int("  ", 8, None), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_int("12x", 8, None), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_int("0x", 8, None), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_int("0b", 8, None), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_int("--1", 8, None), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_int("1.5", 8, None), Err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_int_width_bounds() {
        assert_eq!(parse_int("127", 1, None), Ok(127));
        assert_eq!(parse_int("128", 1, None), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_int("-128", 1, None), Ok(-128));
        assert_eq!(parse_int("-129", 1, None), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_int("9223372036854775807", 8, None), Ok(i64::MAX));
        assert_eq!(parse_int("-9223372036854775808", 8, None), Ok(i64::MIN));
        assert_eq!(
            parse_int("9223372036854775808", 8, None),
            Err(ErrorKind::InvalidValue)
        );
        assert_eq!(
            parse_int("99999999999999999999999", 8, None),
            Err(ErrorKind::InvalidValue)
        );
    }

    #[test]
    fn test_int_explicit_range() {
        let range = Some((-5, 5));
        assert_eq!(parse_int("5", 8, range), Ok(5));
        assert_eq!(parse_int("-5", 8, range), Ok(-5));
        assert_eq!(parse_int("6", 8, range), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_int("-6", 8, range), Err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_uint() {
        assert_eq!(parse_uint("255", 1, None), Ok(255));
        assert_eq!(parse_uint("256", 1, None), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_uint("-1", 8, None), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_uint("18446744073709551615", 8, None), Ok(u64::MAX));
        assert_eq!(parse_uint("0x55", 8, None), Ok(0x55));
    }

    #[test]
    fn test_bool_tokens() {
        for token in ["true", "Yes", "y", "ON", "Enable", "enabled", "1"] {
            assert_eq!(parse_bool(token), Ok(true), "{}", token);
        }
        for token in ["false", "No", "n", "OFF", "Disable", "disabled", "0"] {
            assert_eq!(parse_bool(token), Ok(false), "{}", token);
        }
        assert_eq!(parse_bool("maybe"), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_bool(""), Err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_float_decimal() {
        assert_eq!(parse_float("1.5", 8), Ok(1.5));
        assert_eq!(parse_float("-2.5e3", 8), Ok(-2500.0));
        assert_eq!(parse_float("bogus", 8), Err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_float_hex() {
        assert_eq!(parse_float("0x1.8p3", 8), Ok(12.0));
        assert_eq!(parse_float("0x10", 8), Ok(16.0));
        assert_eq!(parse_float("-0x1p-2", 8), Ok(-0.25));
        assert_eq!(parse_float("0x", 8), Err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_float_overflow_rejected_literals_pass() {
        assert_eq!(parse_float("1e999", 8), Err(ErrorKind::InvalidValue));
        assert_eq!(parse_float("1e50", 4), Err(ErrorKind::InvalidValue));
        assert!(parse_float("inf", 8).unwrap().is_infinite());
        assert!(parse_float("-Infinity", 8).unwrap().is_infinite());
        assert!(parse_float("NaN", 8).unwrap().is_nan());
    }

    #[test]
    fn test_float_subnormal_accepted() {
        let value = parse_float("1e-310", 8).unwrap();
        assert!(value > 0.0);
        assert!(is_subnormal(value, 8));
        let value = parse_float("1e-40", 4).unwrap();
        assert!(is_subnormal(value, 4));
        assert!(!is_subnormal(value, 8));
    }

    #[test]
    fn test_enum_matching() {
        let table = [
            NamedValue::new("first", 1),
            NamedValue::new("second", 2),
        ];
        assert_eq!(match_enum(&table, "first", false), Some(1));
        assert_eq!(match_enum(&table, "First", false), None);
        assert_eq!(match_enum(&table, "First", true), Some(1));
        assert_eq!(match_enum(&table, "third", true), None);
        assert_eq!(enum_name(&table, 2), Some("second"));
        assert_eq!(enum_name(&table, 9), None);
    }

    #[test]
    fn test_rendering() {
        assert_eq!(render_int(-42), "-42");
        assert_eq!(render_uint(1042), "1042");
        assert_eq!(render_bool(true), "true");
        assert_eq!(render_float(1.5, 8), "1.5");
    }
}

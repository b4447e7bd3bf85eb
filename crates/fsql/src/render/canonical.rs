//! Canonical text forms for JSON values.
//!
//! The layout matches what PostgreSQL prints for `jsonb`: object keys ordered by byte
//! length then bytewise, `": "` after keys, `", "` between items, and numbers in plain
//! decimal notation.

use serde_json::{Map, Number, Value};

/// Most digits PostgreSQL `numeric` accepts before the decimal point.
const MAX_INT_DIGITS: i64 = 131_072;
/// Most digits PostgreSQL `numeric` accepts after the decimal point.
const MAX_FRAC_DIGITS: i64 = 16_383;

/// Render a JSON number as plain decimal text.
///
/// Exponent notation is expanded, keeping the scale implied by the source text
/// (`1.50e1` renders as `15.0`, `1e3` as `1000`). Negative zero loses its sign.
pub fn canonical_number(n: &Number) -> String {
    canonical_decimal(&n.to_string())
}

pub(crate) fn canonical_decimal(text: &str) -> String {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(pos) => match unsigned[pos + 1..].parse::<i64>() {
            Ok(exp) => (&unsigned[..pos], exp),
            Err(_) => return text.to_string(),
        },
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let digits: String = int_part.chars().chain(frac_part.chars()).collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return text.to_string();
    }

    // Expansion stays within numeric's limits; anything larger keeps its source text.
    let Some(point) = i64::try_from(int_part.len())
        .ok()
        .and_then(|len| len.checked_add(exponent))
    else {
        return text.to_string();
    };
    let frac_len = i64::try_from(digits.len())
        .ok()
        .and_then(|len| len.checked_sub(point));
    match frac_len {
        Some(frac_len) if point <= MAX_INT_DIGITS && frac_len <= MAX_FRAC_DIGITS => {}
        _ => return text.to_string(),
    }

    let (int_digits, frac_digits) = if point <= 0 {
        let zeros = usize::try_from(-point).unwrap_or(0);
        ("0".to_string(), format!("{}{}", "0".repeat(zeros), digits))
    } else {
        let point = usize::try_from(point).unwrap_or(usize::MAX);
        if point >= digits.len() {
            let zeros = point - digits.len();
            (format!("{}{}", digits, "0".repeat(zeros)), String::new())
        } else {
            (digits[..point].to_string(), digits[point..].to_string())
        }
    };

    let int_digits = match int_digits.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };

    let is_zero = int_digits == "0" && frac_digits.bytes().all(|b| b == b'0');
    let mut out = String::with_capacity(int_digits.len() + frac_digits.len() + 2);
    if negative && !is_zero {
        out.push('-');
    }
    out.push_str(int_digits);
    if !frac_digits.is_empty() {
        out.push('.');
        out.push_str(&frac_digits);
    }
    out
}

/// Serialize a JSON value to canonical text.
pub fn to_canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Serialize a JSON object to canonical text.
pub fn object_to_canonical_json(map: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_object(map, &mut out);
    out
}

/// Append `s` as a JSON string literal, including the surrounding quotes.
///
/// Escapes `"`, `\`, newline, carriage return and tab with their short forms and every
/// other control character below 0x20 as `\u00XX`.
pub fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&canonical_number(n)),
        Value::String(s) => write_json_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(map, out),
    }
}

fn write_object(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes())));

    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_json_string(key, out);
        out.push_str(": ");
        write_value(&map[key.as_str()], out);
    }
    out.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimal_plain_values_are_unchanged() {
        assert_eq!(canonical_decimal("42"), "42");
        assert_eq!(canonical_decimal("-7"), "-7");
        assert_eq!(canonical_decimal("1.50"), "1.50");
        assert_eq!(canonical_decimal("0.0"), "0.0");
    }

    #[test]
    fn decimal_exponent_is_expanded() {
        assert_eq!(canonical_decimal("1e3"), "1000");
        assert_eq!(canonical_decimal("1E+3"), "1000");
        assert_eq!(canonical_decimal("1.5e-2"), "0.015");
        assert_eq!(canonical_decimal("1.50e1"), "15.0");
        assert_eq!(canonical_decimal("150e-1"), "15.0");
        assert_eq!(canonical_decimal("-2.5e2"), "-250");
    }

    #[test]
    fn decimal_huge_exponents_keep_source_text() {
        assert_eq!(
            canonical_decimal("1e9223372036854775807"),
            "1e9223372036854775807"
        );
        assert_eq!(
            canonical_decimal("1e-9223372036854775808"),
            "1e-9223372036854775808"
        );
        assert_eq!(canonical_decimal("-1.5e9223372036854775807"), "-1.5e9223372036854775807");
        assert_eq!(canonical_decimal("1e200000000"), "1e200000000");
        assert_eq!(canonical_decimal("1e-200000000"), "1e-200000000");
    }

    #[test]
    fn decimal_expansion_limits() {
        // 131072 integer digits is the largest expansion.
        assert_eq!(canonical_decimal("1e131071").len(), 131_072);
        assert_eq!(canonical_decimal("1e131072"), "1e131072");

        // 16383 fractional digits is the largest expansion.
        assert_eq!(canonical_decimal("1e-16383").len(), 16_385);
        assert_eq!(canonical_decimal("1e-16384"), "1e-16384");
    }

    #[test]
    fn decimal_negative_zero_drops_sign() {
        assert_eq!(canonical_decimal("-0"), "0");
        assert_eq!(canonical_decimal("-0.00"), "0.00");
    }

    #[test]
    fn json_string_escapes_control_characters() {
        let mut out = String::new();
        write_json_string("a\"b\\c\nd\re\tf\u{1}g", &mut out);
        assert_eq!(out, r#""a\"b\\c\nd\re\tf\u0001g""#);
    }

    #[test]
    fn object_keys_sorted_by_length_then_bytes() {
        let value = json!({"bb": 1, "a": 2, "c": [true, null], "aaa": {"z": "x"}});
        assert_eq!(
            to_canonical_json(&value),
            r#"{"a": 2, "c": [true, null], "bb": 1, "aaa": {"z": "x"}}"#
        );
    }

    #[test]
    fn empty_containers() {
        assert_eq!(to_canonical_json(&json!({})), "{}");
        assert_eq!(to_canonical_json(&json!([])), "[]");
    }
}

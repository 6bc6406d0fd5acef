//! Lenient conversions from workflow input values to typed fields.
//!
//! Node inputs arrive as whatever the generating tool wrote: numbers,
//! numeric strings, booleans, or link references. Each conversion returns
//! `None` instead of failing so a bad value only costs that one field.

use serde_json::Value;

/// Convert a value to an integer of type `T`.
///
/// Accepts integers, floats (truncated toward zero), booleans (`1`/`0`) and
/// base-10 integer strings with surrounding whitespace. Out-of-range values
/// for `T` yield `None`.
pub fn to_integer<T: TryFrom<i128>>(value: &Value) -> Option<T> {
    let wide = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i128::from(i)
            } else if let Some(u) = n.as_u64() {
                i128::from(u)
            } else {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                f.trunc() as i128
            }
        }
        Value::Bool(b) => i128::from(*b),
        Value::String(s) => s.trim().parse::<i128>().ok()?,
        _ => return None,
    };
    T::try_from(wide).ok()
}

/// Convert a value to `f64`. Accepts numbers, booleans and numeric strings.
pub fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Borrow a value as text when it is a non-empty string.
///
/// Link references (`["4", 0]`) and other non-string shapes are not text.
pub fn to_text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Render a scalar the way it would read in a summary line: strings
/// verbatim, everything else as compact JSON.
pub fn to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_from_numbers() {
        assert_eq!(to_integer::<u64>(&json!(42)), Some(42));
        assert_eq!(to_integer::<u64>(&json!(7.9)), Some(7));
        assert_eq!(to_integer::<i64>(&json!(-3.5)), Some(-3));
        assert_eq!(
            to_integer::<u64>(&json!(18446744073709551615u64)),
            Some(u64::MAX)
        );
    }

    #[test]
    fn integer_from_strings_and_bools() {
        assert_eq!(to_integer::<u64>(&json!(" 123 ")), Some(123));
        assert_eq!(to_integer::<u64>(&json!("+8")), Some(8));
        assert_eq!(to_integer::<u64>(&json!(true)), Some(1));
        assert_eq!(to_integer::<u64>(&json!("not-a-number")), None);
        assert_eq!(to_integer::<u64>(&json!("4.5")), None);
    }

    #[test]
    fn integer_rejects_out_of_range_and_shapes() {
        assert_eq!(to_integer::<u64>(&json!(-1)), None);
        assert_eq!(to_integer::<u64>(&json!(null)), None);
        assert_eq!(to_integer::<u64>(&json!(["4", 0])), None);
        assert_eq!(to_integer::<u64>(&json!({"seed": 1})), None);
    }

    #[test]
    fn float_conversions() {
        assert_eq!(to_float(&json!(7)), Some(7.0));
        assert_eq!(to_float(&json!(3.5)), Some(3.5));
        assert_eq!(to_float(&json!("2.25")), Some(2.25));
        assert_eq!(to_float(&json!(false)), Some(0.0));
        assert_eq!(to_float(&json!("high")), None);
        assert_eq!(to_float(&json!([1.0])), None);
    }

    #[test]
    fn text_requires_non_empty_string() {
        assert_eq!(to_text(&json!("a cat")), Some("a cat"));
        assert_eq!(to_text(&json!("")), None);
        assert_eq!(to_text(&json!(["6", 0])), None);
        assert_eq!(to_text(&json!(12)), None);
    }

    #[test]
    fn display_keeps_strings_bare() {
        assert_eq!(to_display(&json!("1920")), "1920");
        assert_eq!(to_display(&json!(1080)), "1080");
        assert_eq!(to_display(&json!(24.0)), "24.0");
    }
}

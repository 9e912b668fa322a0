//! Value rendering helpers shared by the decoder, encoder and serde glue.

use crate::error::{ExprError, Result};
use serde_json::Value;

/// Largest magnitude at which every integer is exactly representable in a
/// double (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

// ----------------------------------------------------------------- Diagnostics

/// Returns the JSON kind of a value.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders a JSON value in a human-readable, unquoted form for error
/// messages: `42`, `true`, `<nil>`, `text`, `[a 1]`, `map[k:v]`.
///
/// Object keys are rendered in sorted order.
pub fn render_value(value: &Value) -> String {
    let mut out = String::new();
    render_into(value, &mut out);
    out
}

fn render_into(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("<nil>"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => match n.as_f64() {
            Some(f) => out.push_str(&render_number(f)),
            None => out.push_str(&n.to_string()),
        },
        Value::String(s) => out.push_str(s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                render_into(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push_str("map[");
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(key);
                out.push(':');
                render_into(&map[key.as_str()], out);
            }
            out.push(']');
        }
    }
}

/// Renders a double with its shortest digits, in exponent form (`1e+06`,
/// `2.5e-05`) once the decimal exponent is below -4 or at least 6.
fn render_number(n: f64) -> String {
    let scientific = format!("{n:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return format!("{n}");
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return format!("{n}");
    };
    if (-4..6).contains(&exponent) {
        return format!("{n}");
    }
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

// ----------------------------------------------------------------- Numbers

fn is_exact_integer(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER
}

/// Converts a double into a `serde_json` number.
///
/// Integral values that fit a double exactly become JSON integers so that
/// `42.0` is written as `42`. NaN and infinities have no JSON form.
pub fn number_to_json(n: f64) -> Result<serde_json::Number> {
    if n.is_nan() {
        return Err(ExprError::UnsupportedValue("NaN".to_string()));
    }
    if n.is_infinite() {
        let sign = if n > 0.0 { "+Inf" } else { "-Inf" };
        return Err(ExprError::UnsupportedValue(sign.to_string()));
    }
    // -0.0 keeps its sign as a float.
    if is_exact_integer(n) && !(n == 0.0 && n.is_sign_negative()) {
        return Ok(serde_json::Number::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .ok_or_else(|| ExprError::UnsupportedValue(format!("{n}")))
}

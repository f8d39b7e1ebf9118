use serde_json::Value;

/// Best-effort numeric coercion for duck-typed upstream fields.
///
/// Accepts native numbers and strings (thousands-separator commas are
/// stripped before parsing). Anything that does not coerce to a finite
/// number is absent, not an error.
pub fn coerce_num(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Quantity coercion: non-negative whole count, or absent.
pub fn coerce_qty(value: &Value) -> Option<u32> {
    coerce_num(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n.trunc() as u32)
}

/// Upstream ids arrive as strings or bare numbers; render either as a string.
pub fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Truthiness for upstream flags: bool as-is, nonzero numbers, "true"/"y"/"yes".
pub fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "y" | "yes"
        ),
        _ => false,
    }
}

use serde_json::{Number, Value};

/// Infer a scalar from a CSV cell, already unquoted by the reader.
///
/// A cell becomes a number only when that number prints back as the exact
/// same text, so `"2012.10"`, `"007"` and `"1e3"` stay strings. Every other
/// cell, including an empty one, is kept verbatim.
pub fn parse_scalar(cell: &str) -> Value {
    if let Ok(i) = cell.parse::<i64>() {
        let n = Number::from(i);
        if n.to_string() == cell {
            return Value::Number(n);
        }
    }
    // "NaN"/"inf" parse as f64 but have no JSON form; from_f64 rejects them
    if let Some(n) = cell.parse::<f64>().ok().and_then(Number::from_f64) {
        if n.to_string() == cell {
            return Value::Number(n);
        }
    }
    Value::String(cell.to_string())
}

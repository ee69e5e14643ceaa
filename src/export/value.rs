//! Rendering of projected field values into output cells.
//!
//! The fields API hands back every field as a sequence of scalar items.
//! Each item is rendered by kind — text verbatim, booleans as `true`/`false`,
//! numbers in non-exponential decimal form — and multiple items of one field
//! are joined with a newline inside the single cell. A field the document
//! does not carry renders as the empty string.

use serde_json::{Number, Value};
use tracing::warn;

/// Closed classification of the scalar kinds a field item can take.
///
/// Anything outside the closed set (nested arrays, objects, null) is
/// `Unknown`: a reportable anomaly, rendered empty rather than failing
/// the record.
enum Scalar<'a> {
    Text(&'a str),
    Boolean(bool),
    Number(&'a Number),
    Unknown,
}

fn classify(item: &Value) -> Scalar<'_> {
    match item {
        Value::String(s) => Scalar::Text(s),
        Value::Bool(b) => Scalar::Boolean(*b),
        Value::Number(n) => Scalar::Number(n),
        _ => Scalar::Unknown,
    }
}

/// Render one output cell for `field` from the document's raw value.
pub fn render_cell(field: &str, value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| render_item(field, item))
            .collect::<Vec<_>>()
            .join("\n"),
        // The fields API returns arrays, but a bare scalar is accepted as a
        // one-item sequence.
        Some(single) => render_item(field, single),
    }
}

fn render_item(field: &str, item: &Value) -> String {
    match classify(item) {
        Scalar::Text(s) => s.to_string(),
        Scalar::Boolean(b) => b.to_string(),
        Scalar::Number(n) => render_number(n),
        Scalar::Unknown => {
            warn!(field, value = %item, "unexpected field value kind");
            String::new()
        }
    }
}

/// Integers render plainly; floats get a fixed six-decimal form so output
/// never contains exponential notation.
fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        format!("{:.6}", n.as_f64().unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_field_renders_empty() {
        assert_eq!(render_cell("name", None), "");
    }

    #[test]
    fn test_single_and_multi_valued_fields() {
        assert_eq!(render_cell("name", Some(&json!(["a"]))), "a");
        assert_eq!(render_cell("name", Some(&json!(["b", "c"]))), "b\nc");
        assert_eq!(render_cell("name", Some(&json!([]))), "");
    }

    #[test]
    fn test_multi_value_preserves_order() {
        let value = json!(["z", "a", "m"]);
        assert_eq!(render_cell("tags", Some(&value)), "z\na\nm");
    }

    #[test]
    fn test_boolean_rendering() {
        assert_eq!(render_cell("active", Some(&json!([true, false]))), "true\nfalse");
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(render_cell("n", Some(&json!([42]))), "42");
        assert_eq!(render_cell("n", Some(&json!([-7]))), "-7");
        assert_eq!(render_cell("n", Some(&json!([1.5]))), "1.500000");
        assert_eq!(render_cell("n", Some(&json!([1e3]))), "1000.000000");
    }

    #[test]
    fn test_unknown_kind_renders_empty() {
        assert_eq!(render_cell("x", Some(&json!([{"nested": 1}]))), "");
        assert_eq!(render_cell("x", Some(&json!([null]))), "");
        // A sane neighbor in the same sequence still renders.
        assert_eq!(render_cell("x", Some(&json!([null, "ok"]))), "\nok");
    }

    #[test]
    fn test_bare_scalar_treated_as_one_item() {
        assert_eq!(render_cell("name", Some(&json!("solo"))), "solo");
    }
}

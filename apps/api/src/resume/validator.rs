//! Structural reconciliation of generated resumes against their template.
//!
//! The template's key set wins at the top level and one level down:
//! unknown keys are dropped, missing keys take the template default.
//! Leaf values are never type-checked.

use serde_json::{Map, Value};

use crate::parser::json::Document;

/// Reshapes `generated` to the key set of `template`. Pure and total.
pub fn reconcile(generated: &Document, template: &Document) -> Document {
    template
        .iter()
        .map(|(key, default)| {
            let value = match (default, generated.get(key)) {
                (_, None) => default.clone(),
                (Value::Array(shape), Some(Value::Array(items))) => {
                    Value::Array(reconcile_list(items, shape.first()))
                }
                (Value::Object(shape), Some(Value::Object(record))) => {
                    Value::Object(fill_record(record, shape))
                }
                (_, Some(value)) => value.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Each object item is reshaped to the first template element; items left
/// with nothing but empty values are dropped.
fn reconcile_list(items: &[Value], shape: Option<&Value>) -> Vec<Value> {
    let empty = Map::new();
    match shape {
        Some(Value::Object(shape)) => reshape_items(items, shape),
        None => reshape_items(items, &empty),
        Some(_) => items.iter().filter(|item| is_truthy(item)).cloned().collect(),
    }
}

fn reshape_items(items: &[Value], shape: &Map<String, Value>) -> Vec<Value> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| fill_record(item, shape))
        .filter(|item| item.values().any(is_truthy))
        .map(Value::Object)
        .collect()
}

/// One level only: nested values are taken verbatim.
fn fill_record(record: &Map<String, Value>, shape: &Map<String, Value>) -> Map<String, Value> {
    shape
        .iter()
        .map(|(k, default)| (k.clone(), record.get(k).unwrap_or(default).clone()))
        .collect()
}

/// Null, false, zero, and empty strings or containers count as empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::template::default_template;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_empty_generation_yields_the_template() {
        let template = default_template();
        assert_eq!(reconcile(&Document::new(), &template), template);
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let result = reconcile(&doc(json!({"extra": 1})), &doc(json!({"a": ""})));
        assert_eq!(Value::Object(result), json!({"a": ""}));
    }

    #[test]
    fn test_nested_record_is_filled_one_level() {
        let template = doc(json!({"basics": {"name": "", "email": "", "location": {"city": ""}}}));
        let generated = doc(json!({
            "basics": {"name": "Ada", "nickname": "A", "location": {"country": "UK"}}
        }));

        let result = reconcile(&generated, &template);
        assert_eq!(
            Value::Object(result),
            json!({"basics": {"name": "Ada", "email": "", "location": {"country": "UK"}}})
        );
    }

    #[test]
    fn test_list_items_follow_first_template_element() {
        let template = doc(json!({"skills": [{"name": "", "keywords": []}]}));
        let generated = doc(json!({
            "skills": [
                {"name": "Rust", "years": 5},
                {"name": "", "keywords": []},
                "not a record",
                {"keywords": ["tokio"]}
            ]
        }));

        let result = reconcile(&generated, &template);
        assert_eq!(
            Value::Object(result),
            json!({"skills": [
                {"name": "Rust", "keywords": []},
                {"name": "", "keywords": ["tokio"]}
            ]})
        );
    }

    #[test]
    fn test_empty_template_list_drops_every_record() {
        let template = doc(json!({"projects": []}));
        let generated = doc(json!({"projects": [{"name": "x"}]}));
        assert_eq!(Value::Object(reconcile(&generated, &template)), json!({"projects": []}));
    }

    #[test]
    fn test_scalar_list_template_keeps_non_empty_scalars() {
        let template = doc(json!({"languages": [""]}));
        let generated = doc(json!({"languages": ["English", "", null, "French"]}));
        assert_eq!(
            Value::Object(reconcile(&generated, &template)),
            json!({"languages": ["English", "French"]})
        );
    }

    #[test]
    fn test_type_mismatch_keeps_generated_value() {
        let template = doc(json!({"summary": "", "skills": [{"name": ""}]}));
        let generated = doc(json!({"summary": ["a", "b"], "skills": "Rust, Go"}));
        assert_eq!(
            Value::Object(reconcile(&generated, &template)),
            json!({"summary": ["a", "b"], "skills": "Rust, Go"})
        );
    }

    #[test]
    fn test_output_follows_template_key_order() {
        let template = doc(json!({"b": "", "a": ""}));
        let generated = doc(json!({"a": "1", "b": "2"}));
        let keys: Vec<String> = reconcile(&generated, &template).keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_truthiness() {
        for v in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(!is_truthy(&v), "{v} should be empty");
        }
        for v in [json!(true), json!(1), json!("x"), json!([0]), json!({"k": null})] {
            assert!(is_truthy(&v), "{v} should be non-empty");
        }
    }
}

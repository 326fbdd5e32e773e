//! A small JSON-schema validator.
//!
//! Supports the keywords used by Arx object schemas: `type`, `properties`,
//! `required`, `additionalProperties`, `items`, `enum`, `const`, `minimum`,
//! `maximum`, `minItems`, `maxItems`, `minLength` and `anyOf`. Other keywords
//! are ignored.

use serde_json::{Map, Value as Json};

/// Validate `instance` against `schema`, returning every violation found.
///
/// Each message is prefixed by the JSON pointer of the offending value.
pub fn validate(schema: &Json, instance: &Json) -> Vec<String> {
    let mut errors = Vec::new();
    check(schema, instance, "", &mut errors);
    errors
}

fn type_matches(name: &str, value: &Json) -> bool {
    match name {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|x| x.fract() == 0.0),
        _ => false,
    }
}

fn check(schema: &Json, value: &Json, pointer: &str, errors: &mut Vec<String>) {
    let Some(schema) = schema.as_object() else {
        // `true`/`false` schemas
        if schema == &Json::Bool(false) {
            errors.push(format!("{pointer}: no value is allowed here"));
        }
        return;
    };
    let at = if pointer.is_empty() { "/" } else { pointer };

    if let Some(t) = schema.get("type") {
        let ok = match t {
            Json::String(name) => type_matches(name, value),
            Json::Array(names) => names.iter().filter_map(Json::as_str).any(|n| type_matches(n, value)),
            _ => true,
        };
        if !ok {
            errors.push(format!("{at}: expected type {t}, got {value}"));
            return;
        }
    }

    if let Some(c) = schema.get("const") {
        if c != value {
            errors.push(format!("{at}: expected {c}, got {value}"));
        }
    }
    if let Some(Json::Array(options)) = schema.get("enum") {
        if !options.contains(value) {
            errors.push(format!("{at}: {value} is not one of {}", Json::Array(options.clone())));
        }
    }

    if let Some(x) = value.as_f64() {
        if let Some(min) = schema.get("minimum").and_then(Json::as_f64) {
            if x < min {
                errors.push(format!("{at}: {x} is below the minimum {min}"));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(Json::as_f64) {
            if x > max {
                errors.push(format!("{at}: {x} is above the maximum {max}"));
            }
        }
    }

    if let (Some(s), Some(min)) = (value.as_str(), schema.get("minLength").and_then(Json::as_u64)) {
        if (s.chars().count() as u64) < min {
            errors.push(format!("{at}: string shorter than {min}"));
        }
    }

    if let Json::Array(items) = value {
        if let Some(min) = schema.get("minItems").and_then(Json::as_u64) {
            if (items.len() as u64) < min {
                errors.push(format!("{at}: fewer than {min} items"));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(Json::as_u64) {
            if (items.len() as u64) > max {
                errors.push(format!("{at}: more than {max} items"));
            }
        }
        if let Some(item_schema) = schema.get("items") {
            for (i, item) in items.iter().enumerate() {
                check(item_schema, item, &format!("{pointer}/{i}"), errors);
            }
        }
    }

    if let Json::Object(members) = value {
        check_object(schema, members, pointer, errors);
    }

    if let Some(Json::Array(options)) = schema.get("anyOf") {
        let any = options.iter().any(|option| validate_at(option, value, pointer).is_empty());
        if !any {
            errors.push(format!("{at}: matches none of the anyOf alternatives"));
        }
    }
}

fn validate_at(schema: &Json, value: &Json, pointer: &str) -> Vec<String> {
    let mut errors = Vec::new();
    check(schema, value, pointer, &mut errors);
    errors
}

fn check_object(schema: &Map<String, Json>, members: &Map<String, Json>, pointer: &str, errors: &mut Vec<String>) {
    let at = if pointer.is_empty() { "/" } else { pointer };
    if let Some(Json::Array(required)) = schema.get("required") {
        for name in required.iter().filter_map(Json::as_str) {
            if !members.contains_key(name) {
                errors.push(format!("{at}: missing required property {name}"));
            }
        }
    }

    let properties = schema.get("properties").and_then(Json::as_object);
    for (name, member) in members {
        let child = format!("{pointer}/{name}");
        match properties.and_then(|p| p.get(name)) {
            Some(s) => check(s, member, &child, errors),
            None => match schema.get("additionalProperties") {
                Some(Json::Bool(false)) => errors.push(format!("{at}: unexpected property {name}")),
                Some(s @ Json::Object(_)) => check(s, member, &child, errors),
                _ => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Json {
        json!({
            "type": "object",
            "properties": {
                "kind": {"const": "local"},
                "path": {"type": "string", "minLength": 1},
                "size": {"type": "integer", "minimum": 0},
                "tags": {"type": "array", "items": {"enum": ["a", "b"]}, "maxItems": 2},
                "extra": {"anyOf": [{"type": "string"}, {"type": "boolean"}]}
            },
            "required": ["kind", "path"],
            "additionalProperties": false
        })
    }

    #[test]
    fn accepts_conforming_record() {
        let ok = json!({"kind": "local", "path": "x", "size": 3, "tags": ["a"], "extra": true});
        assert!(validate(&schema(), &ok).is_empty());
    }

    #[test]
    fn reports_each_violation_with_its_pointer() {
        let bad = json!({
            "kind": "remote",
            "path": "",
            "size": -1,
            "tags": ["a", "c", "b"],
            "extra": 1,
            "other": 0
        });
        let errors = validate(&schema(), &bad);
        let has = |needle: &str| errors.iter().any(|e| e.contains(needle));
        assert!(has("/kind: expected"));
        assert!(has("/path: string shorter"));
        assert!(has("/size: -1 is below"));
        assert!(has("/tags/1:"));
        assert!(has("/tags: more than 2"));
        assert!(has("/extra: matches none"));
        assert!(has("unexpected property other"));
    }

    #[test]
    fn missing_required_and_wrong_type() {
        let errors = validate(&schema(), &json!({"kind": "local"}));
        assert_eq!(errors, vec!["/: missing required property path".to_string()]);
        let errors = validate(&schema(), &json!([1]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("/: expected type"));
    }

    #[test]
    fn integer_type_accepts_whole_floats() {
        let s = json!({"type": "integer"});
        assert!(validate(&s, &json!(2.0)).is_empty());
        assert!(!validate(&s, &json!(2.5)).is_empty());
    }
}

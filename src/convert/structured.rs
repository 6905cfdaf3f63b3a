use crate::types::{KeyStyle, StructuredOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// `authorId` / `author-id` / `AuthorId` → `author_id`
pub fn to_snake_case(name: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(name, "${1}_${2}")
        .replace('-', "_")
        .to_lowercase()
}

/// Prepare a nested object/array attribute value for typed decode
pub fn convert_structured(raw: &Value, options: &StructuredOptions) -> Value {
    match options.key_style {
        KeyStyle::AsIs => raw.clone(),
        KeyStyle::SnakeCase => rewrite_keys(raw),
    }
}

fn rewrite_keys(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let rewritten: Map<String, Value> = obj
                .iter()
                .map(|(key, value)| (to_snake_case(key), rewrite_keys(value)))
                .collect();
            Value::Object(rewritten)
        }
        Value::Array(items) => Value::Array(items.iter().map(rewrite_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("authorId"), "author_id");
        assert_eq!(to_snake_case("AuthorId"), "author_id");
        assert_eq!(to_snake_case("blog-owner"), "blog_owner");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_structured_key_rewrite_is_recursive() {
        let raw = json!({
            "streetName": "Main",
            "geo-point": {"lat": 1.0, "lngValue": 2.0},
            "tags": [{"tagName": "x"}]
        });

        let options = StructuredOptions {
            key_style: KeyStyle::SnakeCase,
        };
        let converted = convert_structured(&raw, &options);

        assert_eq!(
            converted,
            json!({
                "street_name": "Main",
                "geo_point": {"lat": 1.0, "lng_value": 2.0},
                "tags": [{"tag_name": "x"}]
            })
        );
    }

    #[test]
    fn test_structured_as_is() {
        let raw = json!({"streetName": "Main"});
        assert_eq!(convert_structured(&raw, &StructuredOptions::default()), raw);
    }
}

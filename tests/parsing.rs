//! Property tests for document parsing.

use polled_config::core::{Category, Config, Value, parse, parse_str};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Scalar {
    Text(String),
    Int(i32),
    Flag(bool),
    Texts(Vec<String>),
    Null,
}

impl Scalar {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Text(s) => serde_json::json!(s),
            Scalar::Int(n) => serde_json::json!(n),
            Scalar::Flag(b) => serde_json::json!(b),
            Scalar::Texts(items) => serde_json::json!(items),
            Scalar::Null => serde_json::Value::Null,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Scalar::Text(s) => Value::from(s.as_str()),
            Scalar::Int(n) => Value::Number(f64::from(*n)),
            Scalar::Flag(b) => Value::Bool(*b),
            Scalar::Texts(items) => Value::from(items.clone()),
            Scalar::Null => Value::Null,
        }
    }
}

fn scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        "[a-z0-9 ]{0,12}".prop_map(Scalar::Text),
        any::<i32>().prop_map(Scalar::Int),
        any::<bool>().prop_map(Scalar::Flag),
        prop::collection::vec("[a-z]{1,6}", 0..4).prop_map(Scalar::Texts),
        Just(Scalar::Null),
    ]
}

fn document() -> impl Strategy<Value = HashMap<String, HashMap<String, Scalar>>> {
    prop::collection::hash_map(
        "[a-z]{1,8}",
        prop::collection::hash_map("[a-z_]{1,10}", scalar(), 0..6),
        0..4,
    )
}

proptest! {
    #[test]
    fn parsed_document_matches_source(doc in document()) {
        let json: serde_json::Map<String, serde_json::Value> = doc
            .iter()
            .map(|(name, values)| {
                let category: serde_json::Map<String, serde_json::Value> = values
                    .iter()
                    .map(|(key, scalar)| (key.clone(), scalar.to_json()))
                    .collect();
                (name.clone(), serde_json::Value::Object(category))
            })
            .collect();
        let text = serde_json::Value::Object(json).to_string();

        let mut expected = Config::new();
        for (name, values) in &doc {
            let mut category = Category::new();
            for (key, scalar) in values {
                category.insert(key.clone(), scalar.to_value());
            }
            expected.insert_category(name.clone(), category);
        }

        let parsed = parse_str(&text).unwrap();
        prop_assert_eq!(&parsed, &expected);

        // Same bytes, same result.
        prop_assert_eq!(parse(text.as_bytes()).unwrap(), parsed);
    }

    #[test]
    fn nested_objects_never_parse(key in "[a-z]{1,8}", inner in "[a-z]{1,8}") {
        let text = format!(r#"{{"local": {{"{key}": {{"{inner}": 1}}}}}}"#);
        prop_assert!(parse_str(&text).is_err());
    }
}

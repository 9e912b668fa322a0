//! `serde` integration, so expressions can sit inside larger documents.
//!
//! Serializing validates each node pre-order, like [`Encoder`](crate::Encoder).
//! Deserializing applies the grammar with no validator attached; use
//! [`Decoder`](crate::Decoder) when a validator is needed.

use crate::decode::Decoder;
use crate::encode::serialize_validated;
use crate::types::{Argument, Expression};
use crate::util::number_to_json;
use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Error as _, Serialize, Serializer};
use serde_json::Value;

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_validated(self, serializer)
    }
}

impl Serialize for Argument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Argument::Expression(e) => e.serialize(serializer),
            Argument::String(s) => serializer.serialize_str(s),
            Argument::Number(n) => number_to_json(*n)
                .map_err(S::Error::custom)?
                .serialize(serializer),
            Argument::Bool(b) => serializer.serialize_bool(*b),
            Argument::Null => serializer.serialize_unit(),
            Argument::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Decoder::new().decode_value(value).map_err(D::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Argument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Argument::try_from(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Rule {
        name: String,
        when: Expression,
    }

    #[test]
    fn test_embedded_expression_roundtrip() {
        let rule: Rule = serde_json::from_value(json!({
            "name": "busy",
            "when": ["all", [">=", ["get", "count"], 10], ["<", ["get", "count"], 20]]
        }))
        .unwrap();
        assert_eq!(rule.when.operator, "all");
        assert_eq!(rule.when.depth(), 3);

        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            back,
            json!({
                "name": "busy",
                "when": ["all", [">=", ["get", "count"], 10], ["<", ["get", "count"], 20]]
            })
        );
    }

    #[test]
    fn test_deserialize_rejects_bad_grammar() {
        let err = serde_json::from_value::<Expression>(json!(["or", [true]])).unwrap_err();
        assert_eq!(err.to_string(), "arg 0 error: expected a string operator, got true");
    }

    #[test]
    fn test_serialize_validates() {
        let e = Expression::new("or").arg(Expression::new("gt").arg(1)).arg(Expression::new(""));
        let err = serde_json::to_string(&e).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to marshal argument 1: zero length operator name"
        );
    }

    #[test]
    fn test_serialize_matches_encoder() {
        let e = Expression::new(">").arg(Expression::new("get").arg("count")).arg(42.0);
        assert_eq!(serde_json::to_vec(&e).unwrap(), e.to_json_vec().unwrap());
    }

    #[test]
    fn test_serialize_nested_failure_keeps_chain() {
        let e = Expression::new("all")
            .arg(Expression::new("any").arg(Expression::new("gt").arg(f64::NAN)));
        let err = serde_json::to_value(&e).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to marshal argument 0: failed to marshal argument 0: \
             failed to marshal argument 0: unsupported value: NaN"
        );
    }

    #[test]
    fn test_argument_deserialize() {
        let args: Vec<Argument> = serde_json::from_str(r#"[1, "a", ["void"], {"k": null}]"#).unwrap();
        assert_eq!(args[0], Argument::Number(1.0));
        assert_eq!(args[1], Argument::String("a".to_string()));
        assert_eq!(args[2], Argument::Expression(Expression::new("void")));
        assert!(matches!(args[3], Argument::Object(_)));
    }
}

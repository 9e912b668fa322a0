//! Decoding: JSON bytes → expression tree.
//!
//! Nested expressions are built and validated before their parent, so
//! validation runs post-order, depth-first, left to right. The first failing
//! argument aborts the whole decode.

use crate::error::{ExprError, Result};
use crate::options::DecodeOptions;
use crate::parse::parse;
use crate::types::{Argument, Expression, SharedValidator};
use crate::util::{json_kind, render_value};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, trace};

/// Builds expression trees from JSON, handing one validator to every node.
///
/// # Example
///
/// ```
/// use jiffy::{Argument, Decoder};
///
/// let expr = Decoder::new().decode(br#"["gt", ["get", "count"], 42]"#).unwrap();
/// assert_eq!(expr.operator, "gt");
/// assert_eq!(expr.arguments[1], Argument::Number(42.0));
/// ```
#[derive(Clone, Default)]
pub struct Decoder {
    validator: Option<SharedValidator>,
    options: DecodeOptions,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder::default()
    }

    pub fn with_validator(mut self, validator: SharedValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn validator(&self) -> Option<&SharedValidator> {
        self.validator.as_ref()
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Parses `bytes` and decodes the resulting JSON value.
    pub fn decode(&self, bytes: &[u8]) -> Result<Expression> {
        let value = self.parse(bytes)?;
        self.decode_value(value)
    }

    pub fn decode_str(&self, json: &str) -> Result<Expression> {
        self.decode(json.as_bytes())
    }

    /// Decodes an already parsed JSON value.
    pub fn decode_value(&self, value: Value) -> Result<Expression> {
        decode_root(value, self.validator.as_ref(), self.options.max_depth)
    }

    fn parse(&self, bytes: &[u8]) -> Result<Value> {
        parse(bytes, self.options.max_depth).inspect_err(|e| {
            debug!(error = %e, "unreadable expression JSON");
        })
    }

    /// Populates `target` from `bytes`, using the target's own validator as
    /// the inherited one (this decoder's validator is not consulted).
    ///
    /// The candidate tree is fully built and validated before anything is
    /// written; on error `target` is left exactly as it was.
    pub fn decode_into(&self, bytes: &[u8], target: &mut Expression) -> Result<()> {
        let value = self.parse(bytes)?;
        let candidate = decode_root(value, target.validator.as_ref(), self.options.max_depth)?;
        target.operator = candidate.operator;
        target.arguments = candidate.arguments;
        Ok(())
    }
}

/// Decodes `bytes` into a new tree whose every node carries `validator`.
///
/// # Example
///
/// ```
/// use jiffy::{decode, Argument, Rejection, SharedValidator};
/// use std::sync::Arc;
///
/// let no_void_args: SharedValidator = Arc::new(|op: &str, args: &[Argument]| {
///     if op == "void" && !args.is_empty() {
///         return Err(Rejection::new("expected no arguments for void"));
///     }
///     Ok(())
/// });
///
/// assert!(decode(br#"["void"]"#, Some(no_void_args.clone())).is_ok());
/// let err = decode(br#"["or", ["void", 1]]"#, Some(no_void_args)).unwrap_err();
/// assert_eq!(err.to_string(), "arg 0 error: expected no arguments for void");
/// ```
pub fn decode(bytes: &[u8], validator: Option<SharedValidator>) -> Result<Expression> {
    let decoder = Decoder {
        validator,
        options: DecodeOptions::default(),
    };
    decoder.decode(bytes)
}

fn decode_root(
    value: Value,
    validator: Option<&SharedValidator>,
    max_depth: usize,
) -> Result<Expression> {
    match value {
        Value::Array(parts) => build(parts, validator, 1, max_depth),
        other => {
            let err = ExprError::NotAnArray(json_kind(&other).to_string());
            debug!(error = %err, "rejected top-level value");
            Err(err)
        }
    }
}

fn split_operator(parts: Vec<Value>) -> Result<(String, std::vec::IntoIter<Value>)> {
    let mut parts = parts.into_iter();
    match parts.next() {
        None => Err(ExprError::MissingOperator),
        Some(Value::String(operator)) => Ok((operator, parts)),
        Some(other) => Err(ExprError::InvalidOperatorType(render_value(&other))),
    }
}

/// Maps a non-array JSON value onto its terminal argument. Arrays are handed
/// back untouched since they can only be nested expressions.
fn terminal(value: Value) -> std::result::Result<Argument, Vec<Value>> {
    Ok(match value {
        Value::Array(parts) => return Err(parts),
        Value::String(s) => Argument::String(s),
        // `as_f64` only fails with serde_json's arbitrary_precision feature.
        Value::Number(n) => Argument::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::Bool(b) => Argument::Bool(b),
        Value::Null => Argument::Null,
        Value::Object(map) => Argument::Object(map),
    })
}

fn build(
    parts: Vec<Value>,
    validator: Option<&SharedValidator>,
    depth: usize,
    max_depth: usize,
) -> Result<Expression> {
    if depth > max_depth {
        debug!(max_depth, "expression nesting too deep");
        return Err(ExprError::MaxDepthExceeded { max: max_depth });
    }

    let (operator, rest) = split_operator(parts).inspect_err(|e| {
        debug!(error = %e, depth, "invalid operator");
    })?;

    let mut arguments = Vec::with_capacity(rest.len());
    for (index, part) in rest.enumerate() {
        let argument = match terminal(part) {
            Ok(argument) => argument,
            Err(nested) => {
                let nested = build(nested, validator, depth + 1, max_depth)
                    .map_err(|e| ExprError::nested(index, e))?;
                Argument::Expression(nested)
            }
        };
        arguments.push(argument);
    }

    let expression = Expression {
        operator,
        arguments,
        validator: validator.cloned(),
    };
    expression.validate().inspect_err(|e| {
        debug!(operator = %expression.operator, depth, error = %e, "validation failed");
    })?;

    trace!(
        operator = %expression.operator,
        depth,
        arguments = expression.arguments.len(),
        "decoded expression"
    );
    Ok(expression)
}

impl Expression {
    /// Populates this node from `bytes`, handing this node's validator to
    /// every nested expression.
    ///
    /// Atomic: on any error the node keeps its previous operator and
    /// arguments.
    pub fn decode_into(&mut self, bytes: &[u8]) -> Result<()> {
        Decoder::new().decode_into(bytes, self)
    }
}

impl TryFrom<Value> for Argument {
    type Error = ExprError;

    /// Arrays are decoded as nested expressions without a validator.
    fn try_from(value: Value) -> Result<Self> {
        match terminal(value) {
            Ok(argument) => Ok(argument),
            Err(parts) => Decoder::new()
                .decode_value(Value::Array(parts))
                .map(Argument::Expression),
        }
    }
}

impl FromStr for Expression {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self> {
        Decoder::new().decode_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rejection;
    use serde_json::json;
    use std::sync::Arc;

    fn reject_all() -> SharedValidator {
        Arc::new(|_: &str, _: &[Argument]| -> Result<(), Rejection> {
            Err(Rejection::new("rejected"))
        })
    }

    fn nested(depth: usize) -> String {
        let mut s = String::from(r#"["leaf"]"#);
        for _ in 1..depth {
            s = format!(r#"["wrap",{s}]"#);
        }
        s
    }

    #[test]
    fn test_nested_nodes_share_validator() {
        let v: SharedValidator = Arc::new(|_: &str, _: &[Argument]| -> Result<(), Rejection> {
            Ok(())
        });
        let e = decode(br#"["or",["gt","a",1],["and",["void"]]]"#, Some(v.clone())).unwrap();
        assert!(Arc::ptr_eq(e.validator.as_ref().unwrap(), &v));
        let and = e.arguments[1].as_expression().unwrap();
        assert!(Arc::ptr_eq(and.validator.as_ref().unwrap(), &v));
        let void = and.arguments[0].as_expression().unwrap();
        assert!(Arc::ptr_eq(void.validator.as_ref().unwrap(), &v));
    }

    #[test]
    fn test_decode_into_is_atomic_on_validator_rejection() {
        let mut target = Expression::with_validator(reject_all());
        target.operator = "before".to_string();
        target.arguments = vec![Argument::Bool(true)];

        let err = target.decode_into(br#"["after", 1]"#).unwrap_err();
        assert_eq!(err, ExprError::ValidatorRejected(Rejection::new("rejected")));
        assert_eq!(target.operator, "before");
        assert_eq!(target.arguments, vec![Argument::Bool(true)]);
    }

    #[test]
    fn test_decode_into_is_atomic_on_empty_operator() {
        let mut target = Expression::new("before");
        let err = target.decode_into(br#"["", 1]"#).unwrap_err();
        assert_eq!(err, ExprError::EmptyOperator);
        assert_eq!(target.operator, "before");
        assert!(target.arguments.is_empty());
    }

    #[test]
    fn test_decode_into_is_atomic_on_nested_failure() {
        let mut target = Expression::new("before").arg(1);
        let err = target.decode_into(br#"["or", ["ok"], [42]]"#).unwrap_err();
        assert_eq!(err.to_string(), "arg 1 error: expected a string operator, got 42");
        assert_eq!(target, Expression::new("before").arg(1));
    }

    #[test]
    fn test_decode_into_populates_and_keeps_validator() {
        let v: SharedValidator = Arc::new(|_: &str, _: &[Argument]| -> Result<(), Rejection> {
            Ok(())
        });
        let mut target = Expression::with_validator(v.clone());
        target.decode_into(br#"["in", "property", 42, 10]"#).unwrap();
        assert_eq!(target.operator, "in");
        assert_eq!(target.arguments.len(), 3);
        assert!(Arc::ptr_eq(target.validator.as_ref().unwrap(), &v));
    }

    #[test]
    fn test_max_depth_boundary() {
        let decoder = Decoder::new().with_max_depth(5);
        assert_eq!(decoder.decode_str(&nested(5)).unwrap().depth(), 5);

        let err = decoder.decode_str(&nested(6)).unwrap_err();
        assert_eq!(err.root_cause(), &ExprError::MaxDepthExceeded { max: 5 });
        assert_eq!(err.path(), vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_default_max_depth() {
        assert!(Decoder::new().decode_str(&nested(100)).is_ok());
        let err = Decoder::new().decode_str(&nested(101)).unwrap_err();
        assert_eq!(err.root_cause(), &ExprError::MaxDepthExceeded { max: 100 });

        let err = Decoder::new().decode_str(&nested(200)).unwrap_err();
        assert_eq!(err.root_cause(), &ExprError::MaxDepthExceeded { max: 100 });
    }

    #[test]
    fn test_max_depth_above_parser_recursion_limit() {
        let decoder = Decoder::new().with_max_depth(150);
        assert_eq!(decoder.decode_str(&nested(150)).unwrap().depth(), 150);
        let err = decoder.decode_str(&nested(151)).unwrap_err();
        assert_eq!(err.root_cause(), &ExprError::MaxDepthExceeded { max: 150 });
        assert_eq!(err.path().len(), 150);

        let mut target = Expression::new("before");
        Decoder::new()
            .with_max_depth(500)
            .decode_into(nested(200).as_bytes(), &mut target)
            .unwrap();
        assert_eq!(target.depth(), 200);
    }

    #[test]
    fn test_decode_value_not_an_array() {
        let err = Decoder::new().decode_value(json!({"op": "gt"})).unwrap_err();
        assert_eq!(err, ExprError::NotAnArray("object".to_string()));
        assert_eq!(err.to_string(), "expected a JSON array, got object");
    }

    #[test]
    fn test_from_str() {
        let e: Expression = r#"["void"]"#.parse().unwrap();
        assert_eq!(e, Expression::new("void"));
        assert!(e.validator.is_none());
    }

    #[test]
    fn test_argument_try_from_value() {
        assert_eq!(Argument::try_from(json!(1.5)).unwrap(), Argument::Number(1.5));
        assert_eq!(Argument::try_from(json!(null)).unwrap(), Argument::Null);
        assert_eq!(
            Argument::try_from(json!(["get", "count"])).unwrap(),
            Argument::Expression(Expression::new("get").arg("count"))
        );
        assert_eq!(
            Argument::try_from(json!([])).unwrap_err(),
            ExprError::MissingOperator
        );
    }

    #[test]
    fn test_objects_keep_inner_arrays_unchecked() {
        let e = Decoder::new()
            .decode_str(r#"["complex", {"list": [1, 2], "bad": [42]}]"#)
            .unwrap();
        match &e.arguments[0] {
            Argument::Object(map) => {
                assert_eq!(map["list"], json!([1, 2]));
                assert_eq!(map["bad"], json!([42]));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }
}

//! Encoding: expression tree → JSON bytes.
//!
//! Each node validates itself before any of its arguments are visited, so
//! validation runs pre-order, depth-first, left to right. Output is built in
//! a private buffer and only returned once the whole tree has been written.

use crate::error::{ExprError, Result};
use crate::options::EncodeOptions;
use crate::types::{Argument, Expression};
use crate::util::number_to_json;
use serde::ser::{Error as _, Serialize, SerializeSeq, Serializer};
use std::cell::RefCell;
use tracing::{debug, trace};

/// Writes validated expression trees as JSON.
///
/// # Example
///
/// ```
/// use jiffy::{Encoder, Expression};
///
/// let expr = Expression::new(">")
///     .arg(Expression::new("get").arg("count"))
///     .arg(42.0);
/// let bytes = Encoder::new().encode(&expr).unwrap();
/// assert_eq!(bytes, br#"[">",["get","count"],42]"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    options: EncodeOptions,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder::default()
    }

    pub fn with_options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.options.pretty = pretty;
        self
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    pub fn encode(&self, expression: &Expression) -> Result<Vec<u8>> {
        self.write(expression, |root, pretty| {
            if pretty {
                serde_json::to_vec_pretty(root)
            } else {
                serde_json::to_vec(root)
            }
        })
    }

    pub fn encode_to_string(&self, expression: &Expression) -> Result<String> {
        self.write(expression, |root, pretty| {
            if pretty {
                serde_json::to_string_pretty(root)
            } else {
                serde_json::to_string(root)
            }
        })
    }

    fn write<T>(
        &self,
        expression: &Expression,
        write: impl FnOnce(&Validated<'_>, bool) -> serde_json::Result<T>,
    ) -> Result<T> {
        let failure = RefCell::new(None);
        let root = Validated::root(expression, self.options.max_depth, &failure);
        write(&root, self.options.pretty).map_err(|e| {
            failure
                .take()
                .unwrap_or_else(|| ExprError::UnsupportedValue(e.to_string()))
        })
    }
}

/// Encodes `expression` with default options.
pub fn encode(expression: &Expression) -> Result<Vec<u8>> {
    Encoder::new().encode(expression)
}

/// Serializes `expression` into any `serde` serializer with the same
/// pre-order validation as [`Encoder`], but no depth limit.
pub(crate) fn serialize_validated<S: Serializer>(
    expression: &Expression,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let failure = RefCell::new(None);
    Validated::root(expression, usize::MAX, &failure)
        .serialize(serializer)
        .map_err(|e| match failure.take() {
            Some(failure) => S::Error::custom(failure),
            None => e,
        })
}

/// A node on its way out. The typed cause of a failure is parked in
/// `failure`, since a serializer only carries its own error type.
struct Validated<'a> {
    expression: &'a Expression,
    depth: usize,
    max_depth: usize,
    failure: &'a RefCell<Option<ExprError>>,
}

struct ValidatedArgument<'a> {
    argument: &'a Argument,
    depth: usize,
    max_depth: usize,
    failure: &'a RefCell<Option<ExprError>>,
}

impl<'a> Validated<'a> {
    fn root(
        expression: &'a Expression,
        max_depth: usize,
        failure: &'a RefCell<Option<ExprError>>,
    ) -> Self {
        Validated {
            expression,
            depth: 1,
            max_depth,
            failure,
        }
    }
}

fn fail<E: serde::ser::Error>(failure: &RefCell<Option<ExprError>>, error: ExprError) -> E {
    let e = E::custom(&error);
    *failure.borrow_mut() = Some(error);
    e
}

impl Serialize for Validated<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let expression = self.expression;
        let depth = self.depth;
        if depth > self.max_depth {
            debug!(max_depth = self.max_depth, "expression nesting too deep");
            return Err(fail(
                self.failure,
                ExprError::MaxDepthExceeded { max: self.max_depth },
            ));
        }
        if let Err(e) = expression.validate() {
            debug!(operator = %expression.operator, depth, error = %e, "validation failed");
            return Err(fail(self.failure, e));
        }

        let mut seq = serializer.serialize_seq(Some(1 + expression.arguments.len()))?;
        seq.serialize_element(&expression.operator).map_err(|e| {
            fail(
                self.failure,
                ExprError::OperatorEncode {
                    operator: expression.operator.clone(),
                    reason: e.to_string(),
                },
            )
        })?;
        for (index, argument) in expression.arguments.iter().enumerate() {
            let argument = ValidatedArgument {
                argument,
                depth,
                max_depth: self.max_depth,
                failure: self.failure,
            };
            seq.serialize_element(&argument).map_err(|e| {
                let cause = self
                    .failure
                    .take()
                    .unwrap_or_else(|| ExprError::UnsupportedValue(e.to_string()));
                *self.failure.borrow_mut() = Some(ExprError::argument_encode(index, cause));
                e
            })?;
        }

        trace!(
            operator = %expression.operator,
            depth,
            arguments = expression.arguments.len(),
            "encoded expression"
        );
        seq.end()
    }
}

impl Serialize for ValidatedArgument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.argument {
            Argument::Expression(nested) => Validated {
                expression: nested,
                depth: self.depth + 1,
                max_depth: self.max_depth,
                failure: self.failure,
            }
            .serialize(serializer),
            Argument::String(s) => serializer.serialize_str(s),
            Argument::Number(n) => match number_to_json(*n) {
                Ok(n) => n.serialize(serializer),
                Err(e) => Err(fail(self.failure, e)),
            },
            Argument::Bool(b) => serializer.serialize_bool(*b),
            Argument::Null => serializer.serialize_unit(),
            Argument::Object(map) => map.serialize(serializer),
        }
    }
}

impl Expression {
    /// Encodes this tree as compact JSON bytes.
    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Encodes this tree as a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        Encoder::new().encode_to_string(self)
    }
}

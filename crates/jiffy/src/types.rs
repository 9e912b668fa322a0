use crate::error::{ExprError, Rejection, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied check run against every expression node.
///
/// The hook sees the node's operator and its arguments (nested expressions
/// included, already decoded) and decides whether the node is acceptable.
/// It defines the meaning of operators; the grammar itself does not.
pub trait Validator: Send + Sync {
    fn check(&self, operator: &str, arguments: &[Argument]) -> Result<(), Rejection>;
}

impl<F> Validator for F
where
    F: Fn(&str, &[Argument]) -> Result<(), Rejection> + Send + Sync,
{
    fn check(&self, operator: &str, arguments: &[Argument]) -> Result<(), Rejection> {
        self(operator, arguments)
    }
}

/// Shared handle to a validator. Decoding hands the same handle to every
/// nested node it builds.
pub type SharedValidator = Arc<dyn Validator>;

/// One element after the operator: a terminal JSON value or a nested
/// expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    String(String),
    /// JSON number, held as an IEEE-754 double.
    Number(f64),
    Bool(bool),
    Null,
    /// Untyped JSON object. Arrays inside it are not expression-checked.
    Object(Map<String, Value>),
    Expression(Expression),
}

impl Argument {
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Argument::Expression(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Argument::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Argument::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Argument::Null)
    }

    /// Name of the variant as a JSON kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Argument::String(_) => "string",
            Argument::Number(_) => "number",
            Argument::Bool(_) => "boolean",
            Argument::Null => "null",
            Argument::Object(_) => "object",
            Argument::Expression(_) => "expression",
        }
    }
}

impl From<Expression> for Argument {
    fn from(e: Expression) -> Self {
        Argument::Expression(e)
    }
}

impl From<String> for Argument {
    fn from(s: String) -> Self {
        Argument::String(s)
    }
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Argument::String(s.to_string())
    }
}

impl From<f64> for Argument {
    fn from(n: f64) -> Self {
        Argument::Number(n)
    }
}

impl From<i64> for Argument {
    fn from(n: i64) -> Self {
        Argument::Number(n as f64)
    }
}

impl From<i32> for Argument {
    fn from(n: i32) -> Self {
        Argument::Number(f64::from(n))
    }
}

impl From<bool> for Argument {
    fn from(b: bool) -> Self {
        Argument::Bool(b)
    }
}

impl From<Map<String, Value>> for Argument {
    fn from(m: Map<String, Value>) -> Self {
        Argument::Object(m)
    }
}

/// A JSON Expression node: `[operator, ...arguments]`.
///
/// Nodes own their arguments outright, nested expressions included. The
/// optional validator belongs to this node only; [`Expression::validate`]
/// never looks at descendants.
#[derive(Clone, Default)]
pub struct Expression {
    pub operator: String,
    pub arguments: Vec<Argument>,
    pub validator: Option<SharedValidator>,
}

impl Expression {
    pub fn new(operator: impl Into<String>) -> Self {
        Expression {
            operator: operator.into(),
            arguments: Vec::new(),
            validator: None,
        }
    }

    pub fn with_arguments(operator: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Expression {
            operator: operator.into(),
            arguments,
            validator: None,
        }
    }

    /// Creates an empty target node carrying `validator`, ready for
    /// [`Expression::decode_into`].
    pub fn with_validator(validator: SharedValidator) -> Self {
        Expression {
            validator: Some(validator),
            ..Expression::default()
        }
    }

    /// Appends an argument, builder style.
    pub fn arg(mut self, argument: impl Into<Argument>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// Replaces this node's validator. Nested nodes are left alone.
    pub fn set_validator(&mut self, validator: Option<SharedValidator>) {
        self.validator = validator;
    }

    /// Installs `validator` on this node and on every nested expression
    /// beneath it. Hand-built trees do not inherit validators otherwise.
    pub fn set_validator_recursive(&mut self, validator: Option<SharedValidator>) {
        for argument in &mut self.arguments {
            if let Argument::Expression(nested) = argument {
                nested.set_validator_recursive(validator.clone());
            }
        }
        self.validator = validator;
    }

    /// Checks this node alone.
    ///
    /// An empty operator is rejected before any validator runs. Otherwise the
    /// result is exactly the validator's verdict, or success when none is set.
    ///
    /// # Example
    ///
    /// ```
    /// use jiffy::{Expression, ExprError};
    ///
    /// assert!(Expression::new("void").validate().is_ok());
    /// assert_eq!(Expression::new("").validate(), Err(ExprError::EmptyOperator));
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.operator.is_empty() {
            return Err(ExprError::EmptyOperator);
        }
        if let Some(validator) = &self.validator {
            validator.check(&self.operator, &self.arguments)?;
        }
        Ok(())
    }

    /// Maximum nesting depth of this tree; a node without nested expressions
    /// has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .arguments
            .iter()
            .filter_map(Argument::as_expression)
            .map(Expression::depth)
            .max()
            .unwrap_or(0)
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.operator == other.operator && self.arguments == other.arguments
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("operator", &self.operator)
            .field("arguments", &self.arguments)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

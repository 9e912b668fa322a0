use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = ExprError> = std::result::Result<T, E>;

/// A rejection returned by a caller-supplied [`Validator`](crate::Validator).
///
/// The message is surfaced verbatim as the error text of
/// [`ExprError::ValidatorRejected`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Rejection {
    message: String,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Rejection {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for Rejection {
    fn from(message: String) -> Self {
        Rejection { message }
    }
}

impl From<&str> for Rejection {
    fn from(message: &str) -> Self {
        Rejection::new(message)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("{0}")]
    MalformedJson(String),

    #[error("expected a JSON array, got {0}")]
    NotAnArray(String),

    #[error("expression must have an operator")]
    MissingOperator,

    #[error("expected a string operator, got {0}")]
    InvalidOperatorType(String),

    #[error("zero length operator name")]
    EmptyOperator,

    #[error(transparent)]
    ValidatorRejected(#[from] Rejection),

    #[error("arg {index} error: {source}")]
    NestedArgument {
        index: usize,
        #[source]
        source: Box<ExprError>,
    },

    #[error("failed to marshal argument {index}: {source}")]
    ArgumentEncode {
        index: usize,
        #[source]
        source: Box<ExprError>,
    },

    #[error("failed to marshal operator \"{operator}\": {reason}")]
    OperatorEncode { operator: String, reason: String },

    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("expression nesting exceeds maximum depth of {max}")]
    MaxDepthExceeded { max: usize },
}

impl ExprError {
    pub(crate) fn nested(index: usize, source: ExprError) -> Self {
        ExprError::NestedArgument {
            index,
            source: Box::new(source),
        }
    }

    pub(crate) fn argument_encode(index: usize, source: ExprError) -> Self {
        ExprError::ArgumentEncode {
            index,
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, skipping every positional wrapper.
    pub fn root_cause(&self) -> &ExprError {
        let mut current = self;
        while let ExprError::NestedArgument { source, .. }
        | ExprError::ArgumentEncode { source, .. } = current
        {
            current = &**source;
        }
        current
    }

    /// Returns the chain of argument indices leading to the failing node,
    /// outermost first. Empty when the root node itself failed.
    pub fn path(&self) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = self;
        while let ExprError::NestedArgument { index, source }
        | ExprError::ArgumentEncode { index, source } = current
        {
            path.push(*index);
            current = &**source;
        }
        path
    }
}

impl From<serde_json::Error> for ExprError {
    fn from(e: serde_json::Error) -> Self {
        ExprError::MalformedJson(e.to_string())
    }
}

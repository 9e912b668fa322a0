//! Ready-made [`Validator`] implementations.
//!
//! None of these give operators a meaning; they only restrict which
//! operators may appear and how many arguments each one takes.

use crate::error::Rejection;
use crate::types::{Argument, SharedValidator, Validator};
use std::collections::{BTreeSet, HashMap};

/// Accepts only operators from a fixed allow-list.
#[derive(Debug, Clone, Default)]
pub struct OperatorSet {
    operators: BTreeSet<String>,
}

impl OperatorSet {
    pub fn new<I, S>(operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OperatorSet {
            operators: operators.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, operator: &str) -> bool {
        self.operators.contains(operator)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl Validator for OperatorSet {
    fn check(&self, operator: &str, _arguments: &[Argument]) -> Result<(), Rejection> {
        if self.contains(operator) {
            Ok(())
        } else {
            Err(Rejection::new(format!("unknown operator \"{operator}\"")))
        }
    }
}

/// Allowed argument count for one operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Fixed(usize),
    /// Between `min` and `max` arguments. `None` for max = unlimited.
    Range(usize, Option<usize>),
}

impl Arity {
    fn check(&self, operator: &str, count: usize) -> Result<(), Rejection> {
        match *self {
            Arity::Fixed(n) if count != n => Err(Rejection::new(format!(
                "\"{operator}\" operator expects exactly {n} arguments"
            ))),
            Arity::Range(min, _) if count < min => Err(Rejection::new(format!(
                "\"{operator}\" operator expects at least {min} arguments"
            ))),
            Arity::Range(_, Some(max)) if count > max => Err(Rejection::new(format!(
                "\"{operator}\" operator expects at most {max} arguments"
            ))),
            _ => Ok(()),
        }
    }
}

/// Per-operator argument counts. Operators missing from the table pass
/// unless the table is strict.
#[derive(Debug, Clone, Default)]
pub struct ArityTable {
    arities: HashMap<String, Arity>,
    strict: bool,
}

impl ArityTable {
    pub fn new() -> Self {
        ArityTable::default()
    }

    pub fn with(mut self, operator: impl Into<String>, arity: Arity) -> Self {
        self.arities.insert(operator.into(), arity);
        self
    }

    /// Rejects operators that have no entry.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn get(&self, operator: &str) -> Option<Arity> {
        self.arities.get(operator).copied()
    }
}

impl Validator for ArityTable {
    fn check(&self, operator: &str, arguments: &[Argument]) -> Result<(), Rejection> {
        match self.arities.get(operator) {
            Some(arity) => arity.check(operator, arguments.len()),
            None if self.strict => Err(Rejection::new(format!(
                "unknown operator \"{operator}\""
            ))),
            None => Ok(()),
        }
    }
}

/// Runs validators in order and returns the first rejection.
#[derive(Clone, Default)]
pub struct AllOf {
    validators: Vec<SharedValidator>,
}

impl AllOf {
    pub fn new(validators: Vec<SharedValidator>) -> Self {
        AllOf { validators }
    }

    pub fn push(&mut self, validator: SharedValidator) {
        self.validators.push(validator);
    }
}

impl Validator for AllOf {
    fn check(&self, operator: &str, arguments: &[Argument]) -> Result<(), Rejection> {
        self.validators
            .iter()
            .try_for_each(|v| v.check(operator, arguments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use std::sync::Arc;

    #[test]
    fn test_operator_set() {
        let ops = OperatorSet::new(["gt", "get"]);
        assert!(ops.check("gt", &[]).is_ok());
        assert_eq!(
            ops.check("lt", &[]).unwrap_err().message(),
            "unknown operator \"lt\""
        );
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_operator_set_applies_to_nested_nodes() {
        let ops: SharedValidator = Arc::new(OperatorSet::new(["gt", "get"]));
        assert!(decode(br#"["gt",["get","count"],42]"#, Some(ops.clone())).is_ok());
        let err = decode(br#"["gt",["lookup","count"],42]"#, Some(ops)).unwrap_err();
        assert_eq!(err.to_string(), "arg 0 error: unknown operator \"lookup\"");
    }

    #[test]
    fn test_arity_table() {
        let table = ArityTable::new()
            .with("not", Arity::Fixed(1))
            .with("and", Arity::Range(2, None))
            .with("slice", Arity::Range(1, Some(3)));
        let one = [Argument::Bool(true)];
        let four = [Argument::Null, Argument::Null, Argument::Null, Argument::Null];

        assert!(table.check("not", &one).is_ok());
        assert_eq!(
            table.check("not", &[]).unwrap_err().message(),
            "\"not\" operator expects exactly 1 arguments"
        );
        assert_eq!(
            table.check("and", &one).unwrap_err().message(),
            "\"and\" operator expects at least 2 arguments"
        );
        assert_eq!(
            table.check("slice", &four).unwrap_err().message(),
            "\"slice\" operator expects at most 3 arguments"
        );
        assert!(table.check("other", &[]).is_ok());
        assert!(table.strict(true).check("other", &[]).is_err());
    }

    #[test]
    fn test_all_of_returns_first_rejection() {
        let all = AllOf::new(vec![
            Arc::new(OperatorSet::new(["not"])) as SharedValidator,
            Arc::new(ArityTable::new().with("not", Arity::Fixed(1))),
        ]);
        assert!(all.check("not", &[Argument::Null]).is_ok());
        assert_eq!(
            all.check("and", &[]).unwrap_err().message(),
            "unknown operator \"and\""
        );
        assert_eq!(
            all.check("not", &[]).unwrap_err().message(),
            "\"not\" operator expects exactly 1 arguments"
        );
    }
}

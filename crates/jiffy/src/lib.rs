//! JSON Expressions: decoding, validation and encoding.
//!
//! # Overview
//!
//! A JSON Expression is a JSON array `[operator, ...arguments]` where the
//! operator is a non-empty string and every argument that is itself an array
//! must be a JSON Expression too:
//!
//! ```text
//! expression = begin-array operator *( value-separator argument ) end-array
//! operator   = quotation-mark 1*char quotation-mark
//! argument   = false / null / true / object / number / string / expression
//! ```
//!
//! For example, matching items whose `count` lies in `[10, 20)`:
//!
//! ```json
//! ["all", [">=", ["get", "count"], 10], ["<", ["get", "count"], 20]]
//! ```
//!
//! This crate gives operators no meaning. Callers attach a [`Validator`] that
//! is run on every node: post-order while decoding, pre-order while encoding.
//!
//! # Example
//!
//! ```
//! use jiffy::{decode, encode, Argument, Expression, Rejection, SharedValidator};
//! use std::sync::Arc;
//!
//! let needs_args: SharedValidator = Arc::new(|op: &str, args: &[Argument]| {
//!     if op != "void" && args.is_empty() {
//!         return Err(Rejection::new("expected some arguments"));
//!     }
//!     Ok(())
//! });
//!
//! let expr = decode(br#"["or", ["void"], ["add", 2, 2]]"#, Some(needs_args.clone())).unwrap();
//! assert_eq!(expr.arguments.len(), 2);
//!
//! let err = decode(br#"["or", ["or", ["void"], ["oops"]]]"#, Some(needs_args)).unwrap_err();
//! assert_eq!(err.to_string(), "arg 0 error: arg 1 error: expected some arguments");
//!
//! let built = Expression::new(">").arg(Expression::new("get").arg("count")).arg(42.0);
//! assert_eq!(encode(&built).unwrap(), br#"[">",["get","count"],42]"#);
//! ```

pub mod cli;
pub mod decode;
pub mod encode;
pub mod error;
pub mod options;
mod parse;
pub mod serialize;
pub mod types;
pub mod util;
pub mod validators;

// Re-export the core public API
pub use decode::{decode, Decoder};
pub use encode::{encode, Encoder};
pub use error::{ExprError, Rejection, Result};
pub use options::{DecodeOptions, EncodeOptions, DEFAULT_MAX_DEPTH};
pub use types::{Argument, Expression, SharedValidator, Validator};

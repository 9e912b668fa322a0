//! Core logic behind the `jiffy` binary.
//!
//! - `jiffy check`: decode an expression and report whether it is valid
//! - `jiffy normalize`: decode, then re-encode in canonical form

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::ExprError;
use crate::options::DEFAULT_MAX_DEPTH;
use crate::types::{Expression, SharedValidator};
use crate::validators::OperatorSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum CliError {
    Io(std::io::Error),
    Expression(ExprError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e)         => write!(f, "{e}"),
            CliError::Expression(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self { CliError::Io(e) }
}

impl From<ExprError> for CliError {
    fn from(e: ExprError) -> Self { CliError::Expression(e) }
}

// ── Options ───────────────────────────────────────────────────────────────

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    /// Operators to accept; empty accepts any operator.
    pub allow: Vec<String>,
    pub max_depth: usize,
    pub pretty: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions {
            allow: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            pretty: false,
        }
    }
}

impl CliOptions {
    fn decoder(&self) -> Decoder {
        let decoder = Decoder::new().with_max_depth(self.max_depth);
        if self.allow.is_empty() {
            return decoder;
        }
        let allowed: SharedValidator = Arc::new(OperatorSet::new(self.allow.iter().cloned()));
        decoder.with_validator(allowed)
    }

    fn encoder(&self) -> Encoder {
        Encoder::new()
            .with_max_depth(self.max_depth)
            .pretty(self.pretty)
    }
}

// ── Input ─────────────────────────────────────────────────────────────────

/// Reads the whole of `path`, or stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match path {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

// ── check / normalize ─────────────────────────────────────────────────────

/// Decodes `input`, returning the validated tree.
pub fn check(input: &[u8], options: &CliOptions) -> Result<Expression, CliError> {
    let expression = options.decoder().decode(input)?;
    info!(
        operator = %expression.operator,
        depth = expression.depth(),
        "expression is valid"
    );
    Ok(expression)
}

/// Decodes `input` and re-encodes it, compact unless `options.pretty`.
pub fn normalize(input: &[u8], options: &CliOptions) -> Result<Vec<u8>, CliError> {
    let expression = check(input, options)?;
    Ok(options.encoder().encode(&expression)?)
}

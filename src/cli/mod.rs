//! CLI support for policy-expr
//!
//! Provides programmatic access to the command-line functionality so other
//! tools can embed it.

mod check;
mod convert;
mod inspect;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use convert::{json_to_context, json_to_value, value_to_json};
pub use inspect::{describe_operators, render_tokens, render_tree};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The context must be a JSON object of named values
    #[error("Context must be a JSON object, got {0}")]
    ContextNotObject(&'static str),
}

impl From<crate::Error> for CliError {
    fn from(e: crate::Error) -> Self {
        match e {
            crate::Error::Parse(e) => CliError::Parse(e),
            crate::Error::Eval(e) => CliError::Eval(e),
        }
    }
}

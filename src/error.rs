//! Error types shared by the parser and the evaluator.

use thiserror::Error;

/// Errors raised while turning a token stream into an expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A specific token (usually `)`) was required but something else was found.
    #[error("Expected token {expected} got {found}")]
    UnexpectedToken { expected: String, found: String },

    /// The token cannot start an expression (e.g. a bare `==` at the start).
    #[error("Token {token} does not have a null denotation")]
    NoNullDenotation { token: String },

    /// The token cannot follow an already parsed operand.
    #[error("Token {token} does not have a left denotation")]
    NoLeftDenotation { token: String },
}

/// Errors raised while resolving an expression tree against a context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// None of the lookup strategies found the dotted-name segment.
    #[error("Failed lookup for key [{segment}] in {value}")]
    VariableNotFound { segment: String, value: String },

    /// A node with no evaluation semantics reached `resolve`.
    #[error("Abstract token {token} can not be resolved")]
    AbstractTokenResolved { token: String },

    /// The operator is not defined for the operand types.
    #[error("Cannot apply {operator} to {left} and {right}")]
    TypeMismatch {
        operator: String,
        left: &'static str,
        right: &'static str,
    },

    /// Integer arithmetic left the 64-bit range.
    #[error("Integer overflow evaluating {operator}")]
    Overflow { operator: String },
}

/// Any failure of [`crate::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

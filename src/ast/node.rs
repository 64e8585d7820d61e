use std::fmt;

use crate::{
    ast::Variable, context::Context, error::EvalError, grammar::Operator, value::Value,
};

/// A node of the expression tree. Each node exclusively owns its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal or dotted name
    Variable(Variable),

    /// Unary operator applied to the expression on its right
    ///
    /// # Example
    /// ```text
    /// not user.is_active
    /// ```
    Prefix {
        operator: Operator,
        token: String,
        operand: Box<Node>,
    },

    /// Binary operator
    ///
    /// # Example
    /// ```text
    /// attempts + 1
    /// ```
    Infix {
        operator: Operator,
        token: String,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// `(` directly after an operand, as in `f(x)`
    ///
    /// The grammar reserves this shape for calls or subscripts. No
    /// evaluation is defined for it yet.
    Apply {
        token: String,
        callee: Box<Node>,
        argument: Box<Node>,
    },
}

/// The operands handed to an operator's evaluation function.
///
/// Operands are resolved on demand, so short-circuiting operators can skip
/// the right-hand side.
#[derive(Debug, Clone, Copy)]
pub struct Operands<'a> {
    token: &'a str,
    first: &'a Node,
    second: Option<&'a Node>,
}

impl<'a> Operands<'a> {
    /// The token the operator was written as (`==`, `is`, `and`, ...).
    pub fn token(&self) -> &'a str {
        self.token
    }

    pub fn left(&self, context: &Context) -> Result<Value, EvalError> {
        self.first.resolve(context)
    }

    /// For a prefix operator the only operand is its right one.
    pub fn right(&self, context: &Context) -> Result<Value, EvalError> {
        self.second.unwrap_or(self.first).resolve(context)
    }
}

impl Node {
    /// The source token this node was built from.
    pub fn token(&self) -> &str {
        match self {
            Node::Variable(var) => var.name(),
            Node::Prefix { token, .. } | Node::Infix { token, .. } | Node::Apply { token, .. } => {
                token
            }
        }
    }

    pub fn first(&self) -> Option<&Node> {
        match self {
            Node::Variable(_) => None,
            Node::Prefix { operand, .. } => Some(operand.as_ref()),
            Node::Infix { left, .. } => Some(left.as_ref()),
            Node::Apply { callee, .. } => Some(callee.as_ref()),
        }
    }

    pub fn second(&self) -> Option<&Node> {
        match self {
            Node::Variable(_) | Node::Prefix { .. } => None,
            Node::Infix { right, .. } => Some(right.as_ref()),
            Node::Apply { argument, .. } => Some(argument.as_ref()),
        }
    }

    /// Evaluates the subtree against `context`.
    pub fn resolve(&self, context: &Context) -> Result<Value, EvalError> {
        match self {
            Node::Variable(var) => var.resolve(context),
            Node::Prefix {
                operator,
                token,
                operand,
            } => (operator.apply)(
                &Operands {
                    token,
                    first: operand,
                    second: None,
                },
                context,
            ),
            Node::Infix {
                operator,
                token,
                left,
                right,
            } => (operator.apply)(
                &Operands {
                    token,
                    first: left,
                    second: Some(right.as_ref()),
                },
                context,
            ),
            Node::Apply { token, .. } => Err(EvalError::AbstractTokenResolved {
                token: token.clone(),
            }),
        }
    }
}

/// S-expression form: `(token first second)`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Variable(var) => write!(f, "(variable {})", var.name()),
            Node::Prefix { token, operand, .. } => write!(f, "({} {})", token, operand),
            Node::Infix {
                token, left, right, ..
            } => write!(f, "({} {} {})", token, left, right),
            Node::Apply {
                token,
                callee,
                argument,
            } => write!(f, "({} {} {})", token, callee, argument),
        }
    }
}

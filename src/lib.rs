//! # policy-expr
//!
//! A small expression language for policy predicates. Administrators write
//! expressions such as
//!
//! ```text
//! review_request.submitter.username == user.username or 'reviewers' in user.groups
//! ```
//!
//! and the engine evaluates them against a [`Context`] of named values:
//! text is tokenized ([`lexer`]), parsed by a Pratt parser driven by an
//! operator [`grammar`], and the resulting tree ([`ast`]) resolves itself.
//!
//! ```
//! use policy_expr::{evaluate, Context, Value};
//!
//! let user: Value = [("username", Value::from("admin")), ("level", Value::Integer(3))]
//!     .into_iter()
//!     .collect();
//! let ctx = Context::new().with("user", user);
//!
//! let result = evaluate("user.username == 'admin' and user.level >= 2", &ctx).unwrap();
//! assert_eq!(result, Value::Boolean(true));
//! ```
pub mod ast;
pub mod cli;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod policy;
pub mod value;

pub use ast::{Node, Variable};
pub use context::Context;
pub use error::{Error, EvalError, ParseError};
pub use evaluator::{Expression, evaluate};
pub use grammar::{Fixity, Operator, Registry, SymbolKind};
pub use lexer::{Lexer, tokenize};
pub use parser::Parser;
pub use policy::Policy;
pub use value::{Attribute, Entity, MethodError, Value};

//! # Expression tree
//!
//! The parser produces a tree of [`Node`]s. Every node knows how to
//! [`resolve`](Node::resolve) itself against a [`Context`](crate::Context):
//!
//! - **[variable]** - leaves: literals fixed at parse time, or dotted names
//!   looked up at resolve time
//! - **[node]** - prefix and infix operator nodes, plus the reserved
//!   application node built by `(` after an operand
//! - **[operators]** - the standard operator table
//!
//! ## Grammar
//!
//! ```text
//! user.is_staff or (review_request.status == 'P' and attempts < 3)
//! 'admins' in user.groups
//! not review_request.public
//! ```
//!
//! | operators | binding |
//! |---|---|
//! | `*` `/` | 60, left |
//! | `+` `-` | 50, left |
//! | `in` | 40, left |
//! | `==` `is` `!=` `<` `<=` `>` `>=` | 40, right |
//! | `and` `&&` `or` `\|\|` | 30, right |
//! | `not` | prefix, operand parsed at 70 |
pub mod node;
pub mod operators;
pub mod variable;

pub use node::{Node, Operands};
pub use variable::Variable;

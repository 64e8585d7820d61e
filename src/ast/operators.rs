//! The standard operator table.

use crate::{
    evaluator,
    grammar::{Fixity, Operator},
};

// Arithmetic
pub const PLUS: Operator = Operator {
    name: "plus",
    aliases: &["+"],
    precedence: 50,
    binding_power: 0,
    fixity: Fixity::InfixLeft,
    apply: evaluator::add,
};

pub const MINUS: Operator = Operator {
    name: "minus",
    aliases: &["-"],
    precedence: 50,
    binding_power: 0,
    fixity: Fixity::InfixLeft,
    apply: evaluator::subtract,
};

pub const TIMES: Operator = Operator {
    name: "times",
    aliases: &["*"],
    precedence: 60,
    binding_power: 0,
    fixity: Fixity::InfixLeft,
    apply: evaluator::multiply,
};

pub const DIVIDE: Operator = Operator {
    name: "divide",
    aliases: &["/"],
    precedence: 60,
    binding_power: 0,
    fixity: Fixity::InfixLeft,
    apply: evaluator::divide,
};

// Boolean
pub const AND: Operator = Operator {
    name: "and",
    aliases: &["&&", "and"],
    precedence: 30,
    binding_power: 0,
    fixity: Fixity::InfixRight,
    apply: evaluator::and,
};

pub const OR: Operator = Operator {
    name: "or",
    aliases: &["||", "or"],
    precedence: 30,
    binding_power: 0,
    fixity: Fixity::InfixRight,
    apply: evaluator::or,
};

pub const NOT: Operator = Operator {
    name: "not",
    aliases: &["not"],
    precedence: 0,
    binding_power: 0,
    fixity: Fixity::Prefix,
    apply: evaluator::not,
};

// Membership and comparison
pub const IN: Operator = Operator {
    name: "in",
    aliases: &["in"],
    precedence: 40,
    binding_power: 0,
    fixity: Fixity::InfixLeft,
    apply: evaluator::contains,
};

/// One entry serves every comparison; evaluation dispatches on the token.
pub const COMPARISON: Operator = Operator {
    name: "comparison",
    aliases: &["==", "is", "!=", "<", "<=", ">", ">="],
    precedence: 40,
    binding_power: 0,
    fixity: Fixity::InfixRight,
    apply: evaluator::compare,
};

pub const STANDARD: &[Operator] = &[PLUS, MINUS, TIMES, DIVIDE, AND, OR, IN, COMPARISON, NOT];

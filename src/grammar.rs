//! The symbol registry: which token strings are operators, and how they bind.
//!
//! Grammar is data. Each [`Operator`] entry carries its aliases, precedence,
//! fixity and evaluation function; the [`Registry`] maps every alias to a
//! [`SymbolKind`]. Any token without an entry is a variable or literal.
//!
//! The standard registry is built once, on first use, and is read-only from
//! then on, so concurrent evaluations share it without locking.

use std::{collections::HashMap, fmt, sync::LazyLock};

use crate::{ast::operators, ast::Operands, context::Context, error::EvalError, value::Value};

const LOG_TARGET: &str = "policy_expr::grammar";

/// Highest precedence an operator may declare.
pub const MAX_PRECEDENCE: u8 = 100;

/// Binding power of `(` used after an operand.
pub const GROUPING_BINDING_POWER: u8 = 80;

/// Binding power a prefix operator parses its operand with.
pub const PREFIX_BINDING_POWER: u8 = 70;

/// Evaluation function of an operator.
pub type Apply = fn(&Operands<'_>, &Context) -> Result<Value, EvalError>;

/// How an operator takes its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    /// Unary, operand on the right (`not a`).
    Prefix,
    /// Binary; the right operand is parsed at the operator's own binding power.
    InfixLeft,
    /// Binary; the right operand is parsed at one less, so chains nest right.
    InfixRight,
}

impl fmt::Display for Fixity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fixity::Prefix => write!(f, "prefix"),
            Fixity::InfixLeft => write!(f, "infix, left-associative"),
            Fixity::InfixRight => write!(f, "infix, right-associative"),
        }
    }
}

/// One entry of the operator table.
#[derive(Clone, Copy)]
pub struct Operator {
    /// Descriptive name, e.g. `"comparison"`.
    pub name: &'static str,
    /// Token strings that select this operator.
    pub aliases: &'static [&'static str],
    /// 0 to 100, higher binds tighter.
    pub precedence: u8,
    /// Explicit left binding power; the effective one is never below `precedence`.
    pub binding_power: u8,
    pub fixity: Fixity,
    pub apply: Apply,
}

impl Operator {
    pub const fn left_binding_power(&self) -> u8 {
        if self.binding_power > self.precedence {
            self.binding_power
        } else {
            self.precedence
        }
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("precedence", &self.precedence)
            .field("fixity", &self.fixity)
            .finish()
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.aliases == other.aliases
    }
}

/// What a token means to the parser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SymbolKind {
    /// Name or literal, resolved against the context.
    Variable,
    /// Sentinel installed when the tokens run out.
    End,
    /// `(`
    OpenGroup,
    /// `)`
    CloseGroup,
    Operator(Operator),
}

impl SymbolKind {
    pub fn left_binding_power(&self) -> u8 {
        match self {
            SymbolKind::Variable | SymbolKind::End | SymbolKind::CloseGroup => 0,
            SymbolKind::OpenGroup => GROUPING_BINDING_POWER,
            SymbolKind::Operator(op) => op.left_binding_power(),
        }
    }
}

/// Maps token strings to symbol kinds.
#[derive(Debug, Clone)]
pub struct Registry {
    symbols: HashMap<&'static str, SymbolKind>,
    operators: Vec<Operator>,
}

static STANDARD: LazyLock<Registry> = LazyLock::new(|| {
    let mut registry = Registry::new();
    for op in operators::STANDARD {
        registry.register_operator(*op);
    }
    log::debug!(
        target: LOG_TARGET,
        "Built standard registry with {} operators",
        registry.operators.len()
    );
    registry
});

impl Registry {
    /// A registry that knows only the grouping parentheses.
    pub fn new() -> Self {
        let mut registry = Registry {
            symbols: HashMap::new(),
            operators: Vec::new(),
        };
        registry.register(&["("], SymbolKind::OpenGroup);
        registry.register(&[")"], SymbolKind::CloseGroup);
        registry
    }

    /// The process-wide registry holding the standard operator library.
    pub fn standard() -> &'static Registry {
        &STANDARD
    }

    /// Registers every alias for `kind`. Aliases containing whitespace could
    /// never come out of the tokenizer; they are logged and skipped.
    ///
    /// Returns the number of aliases registered.
    pub fn register(&mut self, aliases: &[&'static str], kind: SymbolKind) -> usize {
        let mut registered = 0;
        for &alias in aliases {
            if alias.is_empty() || alias.chars().any(char::is_whitespace) {
                log::error!(
                    target: LOG_TARGET,
                    "Invalid operator [{}]. No spaces in operator names. Use underscore.",
                    alias
                );
                continue;
            }
            if self.symbols.insert(alias, kind).is_some() {
                log::debug!(target: LOG_TARGET, "Operator [{}] re-registered", alias);
            }
            registered += 1;
        }
        registered
    }

    /// Registers an operator table entry under all of its aliases.
    pub fn register_operator(&mut self, operator: Operator) -> usize {
        if operator.precedence > MAX_PRECEDENCE {
            log::error!(
                target: LOG_TARGET,
                "Operator {} declares precedence {} above {}",
                operator.name,
                operator.precedence,
                MAX_PRECEDENCE
            );
            return 0;
        }
        let registered = self.register(operator.aliases, SymbolKind::Operator(operator));
        if registered > 0 {
            self.operators.push(operator);
        }
        registered
    }

    /// `None` means the token is a variable or literal.
    pub fn lookup(&self, token: &str) -> Option<SymbolKind> {
        self.symbols.get(token).copied()
    }

    /// Operator entries in registration order.
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

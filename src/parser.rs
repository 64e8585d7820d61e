//! Top-down operator precedence (Pratt) parser.
//!
//! Every token has a left binding power. [`Parser::expression`] parses one
//! operand through the token's null denotation, then keeps handing the
//! result to the left denotation of the following operator for as long as
//! that operator binds tighter than the caller's right binding power.

use crate::{
    ast::{Node, Variable},
    error::ParseError,
    grammar::{Fixity, PREFIX_BINDING_POWER, Registry, SymbolKind},
    lexer::Lexer,
};

const LOG_TARGET: &str = "policy_expr::parser";

const END_OF_INPUT: &str = "end of input";

/// A token together with what the registry says it means.
#[derive(Debug, Clone, Copy)]
struct Symbol<'src> {
    token: &'src str,
    kind: SymbolKind,
}

impl Symbol<'_> {
    fn describe(&self) -> String {
        match self.kind {
            SymbolKind::End => END_OF_INPUT.to_string(),
            _ => self.token.to_string(),
        }
    }
}

pub struct Parser<'src, 'r> {
    registry: &'r Registry,
    tokens: Vec<&'src str>,
    position: usize,
    current: Symbol<'src>,
}

impl<'src> Parser<'src, 'static> {
    /// A parser over the standard operator registry.
    pub fn new(lexer: Lexer<'src>) -> Self {
        Parser::with_registry(lexer, Registry::standard())
    }
}

impl<'src, 'r> Parser<'src, 'r> {
    pub fn with_registry(lexer: Lexer<'src>, registry: &'r Registry) -> Self {
        let tokens = lexer.tokenize();
        let mut parser = Parser {
            registry,
            tokens,
            position: 0,
            current: Symbol {
                token: "",
                kind: SymbolKind::End,
            },
        };
        parser.current = parser.next_symbol();
        parser
    }

    /// Parses the whole token stream into a single expression.
    pub fn parse(&mut self) -> Result<Node, ParseError> {
        let node = self.expression(0)?;
        if !matches!(self.current.kind, SymbolKind::End) {
            return Err(ParseError::UnexpectedToken {
                expected: END_OF_INPUT.to_string(),
                found: self.current.describe(),
            });
        }
        log::trace!(target: LOG_TARGET, "Parsed {}", node);
        Ok(node)
    }

    /// Parses the longest expression whose operators all bind tighter than
    /// `right_binding_power`.
    pub fn expression(&mut self, right_binding_power: u8) -> Result<Node, ParseError> {
        let previous = self.current;
        self.advance(None)?;
        let mut left = self.nud(previous)?;

        while right_binding_power < self.current.kind.left_binding_power() {
            let previous = self.current;
            self.advance(None)?;
            left = self.led(previous, left)?;
        }

        Ok(left)
    }

    /// Moves to the next token. With `expected`, first checks that the
    /// current token is of the kind registered for `expected`.
    fn advance(&mut self, expected: Option<&str>) -> Result<(), ParseError> {
        if let Some(expected) = expected
            && let Some(kind) = self.registry.lookup(expected)
            && !same_kind(&self.current.kind, &kind)
        {
            return Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.current.describe(),
            });
        }

        self.current = self.next_symbol();
        Ok(())
    }

    fn next_symbol(&mut self) -> Symbol<'src> {
        let Some(&token) = self.tokens.get(self.position) else {
            return Symbol {
                token: "",
                kind: SymbolKind::End,
            };
        };
        self.position += 1;

        let kind = self.registry.lookup(token).unwrap_or(SymbolKind::Variable);
        Symbol { token, kind }
    }

    /// Null denotation: the symbol starts an expression.
    fn nud(&mut self, symbol: Symbol<'src>) -> Result<Node, ParseError> {
        match symbol.kind {
            SymbolKind::Variable => Ok(Node::Variable(Variable::new(symbol.token))),
            SymbolKind::OpenGroup => {
                // The group leaves no node of its own behind.
                let inner = self.expression(0)?;
                self.advance(Some(")"))?;
                Ok(inner)
            }
            SymbolKind::Operator(operator) if operator.fixity == Fixity::Prefix => {
                let operand = self.expression(PREFIX_BINDING_POWER)?;
                Ok(Node::Prefix {
                    operator,
                    token: symbol.token.to_string(),
                    operand: Box::new(operand),
                })
            }
            _ => Err(ParseError::NoNullDenotation {
                token: symbol.describe(),
            }),
        }
    }

    /// Left denotation: the symbol follows an already parsed operand.
    fn led(&mut self, symbol: Symbol<'src>, left: Node) -> Result<Node, ParseError> {
        match symbol.kind {
            SymbolKind::Operator(operator) if operator.fixity != Fixity::Prefix => {
                let binding_power = match operator.fixity {
                    Fixity::InfixRight => operator.left_binding_power().saturating_sub(1),
                    _ => operator.left_binding_power(),
                };
                let right = self.expression(binding_power)?;
                Ok(Node::Infix {
                    operator,
                    token: symbol.token.to_string(),
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            SymbolKind::OpenGroup => {
                let argument = self.expression(0)?;
                self.advance(Some(")"))?;
                Ok(Node::Apply {
                    token: symbol.token.to_string(),
                    callee: Box::new(left),
                    argument: Box::new(argument),
                })
            }
            _ => Err(ParseError::NoLeftDenotation {
                token: symbol.describe(),
            }),
        }
    }
}

fn same_kind(a: &SymbolKind, b: &SymbolKind) -> bool {
    match (a, b) {
        (SymbolKind::Operator(x), SymbolKind::Operator(y)) => x == y,
        _ => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

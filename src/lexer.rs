use std::sync::LazyLock;

use regex::Regex;

const LOG_TARGET: &str = "policy_expr::lexer";

// Alternatives are tried left to right at each position, so a digit run wins
// over an identifier and a quoted string wins over an operator run. Names are
// ASCII only; other letters fall into operator runs.
static TOKENIZER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?xs)
        \s*(
            [0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?   # number
          | '[^'\\]*(?:\\.[^'\\]*)*'                  # single quoted string
          | "[^"\\]*(?:\\.[^"\\]*)*"                  # double quoted string
          | [0-9A-Za-z_.]+                            # dotted identifier
          | [()]                                      # parenthesis
          | [^0-9A-Za-z_\s()'"]+                      # operator run
          | ['"]                                      # unbalanced quote
        )"#,
    )
    .expect("invalid tokenizer regex")
});

/// Splits expression text into token slices.
///
/// The lexer cannot fail: anything that is not a number, string, identifier
/// or parenthesis becomes an operator-like token and is left for the parser
/// to accept or reject.
pub struct Lexer<'src> {
    input: &'src str,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Lexer { input }
    }

    pub fn input(&self) -> &'src str {
        self.input
    }

    /// Returns the tokens of the input in source order.
    pub fn tokenize(&self) -> Vec<&'src str> {
        let tokens: Vec<&'src str> = TOKENIZER
            .captures_iter(self.input)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect();
        log::trace!(target: LOG_TARGET, "Tokenized {:?} into {:?}", self.input, tokens);
        tokens
    }
}

/// Shorthand for `Lexer::new(input).tokenize()`.
pub fn tokenize(input: &str) -> Vec<&str> {
    Lexer::new(input).tokenize()
}

#[test]
fn test_keywords_are_identifiers() {
    assert_eq!(tokenize("a and not b"), vec!["a", "and", "not", "b"]);
}

#[test]
fn test_operator_runs() {
    assert_eq!(tokenize("a<=b&&c"), vec!["a", "<=", "b", "&&", "c"]);
    assert_eq!(tokenize("(a)==(b)"), vec!["(", "a", ")", "==", "(", "b", ")"]);
}

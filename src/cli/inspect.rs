//! Token, tree and grammar listings

use crate::{Lexer, Parser, Registry};

use super::CliError;

/// One token per line.
pub fn render_tokens(expression: &str) -> String {
    let mut out = String::new();
    for token in Lexer::new(expression).tokenize() {
        out.push_str(token);
        out.push('\n');
    }
    out
}

/// The parsed tree as an s-expression.
pub fn render_tree(expression: &str) -> Result<String, CliError> {
    let node = Parser::new(Lexer::new(expression)).parse()?;
    Ok(format!("{}\n", node))
}

/// Table of the registered operators, tightest binding first.
pub fn describe_operators(registry: &Registry) -> String {
    let mut operators = registry.operators().to_vec();
    operators.sort_by(|a, b| b.left_binding_power().cmp(&a.left_binding_power()));

    let mut out = String::from("OPERATORS\n\n");
    for op in operators {
        out.push_str(&format!(
            "  {:<28} {:>3}  {}\n",
            op.aliases.join(" "),
            op.left_binding_power(),
            op.fixity
        ));
    }
    out.push_str("\n  ( )                            grouping\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tokens() {
        assert_eq!(render_tokens("a.b>=1"), "a.b\n>=\n1\n");
    }

    #[test]
    fn test_render_tree() {
        assert_eq!(
            render_tree("not a").unwrap(),
            "(not (variable a))\n"
        );
    }

    #[test]
    fn test_describe_operators_lists_every_alias() {
        let listing = describe_operators(Registry::standard());
        assert!(listing.contains("== is != < <= > >="));
        assert!(listing.contains("&& and"));
        assert!(listing.contains("prefix"));
    }
}

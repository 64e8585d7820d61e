//! Evaluate expressions against JSON contexts

use crate::{Context, Expression, Policy};

use super::{CliError, json_to_context, value_to_json};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON object holding the named values (empty context if not provided)
    pub context: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
    /// Evaluate as a policy expecting this result
    pub expect: Option<bool>,
}

/// Result of a check operation
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated successfully with JSON output
    Success(serde_json::Value),
    /// Policy mode: whether the policy applies
    Policy { applies: bool },
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    if let Some(expected) = options.expect {
        // Policy mode never fails on the expression itself.
        let context = parse_context(options.context.as_deref())?;
        let policy = Policy::new(0, "check", options.expression.clone()).expecting(expected);
        return Ok(CheckResult::Policy {
            applies: policy.applies(&context),
        });
    }

    let expression = Expression::parse(&options.expression)?;
    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let context = parse_context(options.context.as_deref())?;
    let result = expression.resolve(&context)?;
    Ok(CheckResult::Success(value_to_json(result)))
}

fn parse_context(json: Option<&str>) -> Result<Context, CliError> {
    match json {
        Some(s) if !s.trim().is_empty() => json_to_context(serde_json::from_str(s)?),
        _ => Ok(Context::new()),
    }
}

//! The boundary with stored policy rules.
//!
//! A policy pairs expression text with the result it must produce for the
//! policy to apply. Storage and ordering of policies live elsewhere; this
//! module only decides whether one policy holds for one context.

use std::fmt;

use crate::{context::Context, error::Error, evaluator::evaluate, value::Value};

const LOG_TARGET: &str = "policy_expr::policy";

const PREVIEW_LENGTH: usize = 100;

/// A user-configurable expression that decides whether an action is allowed.
///
/// # Examples
///
/// ```
/// use policy_expr::{Context, Policy};
///
/// let policy = Policy::new(1, "close_review", "user.is_staff");
/// let ctx = Context::new().with(
///     "user",
///     [("is_staff", true)].into_iter().collect::<policy_expr::Value>(),
/// );
///
/// assert!(policy.applies(&ctx));
/// assert!(!policy.clone().expecting(false).applies(&ctx));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub id: u64,
    /// The action this policy guards, e.g. `close_review`.
    pub action: String,
    pub expression: String,
    /// The result the expression must produce (positive evaluation by default).
    pub expected_result: bool,
}

impl Policy {
    pub fn new(id: u64, action: impl Into<String>, expression: impl Into<String>) -> Self {
        Policy {
            id,
            action: action.into(),
            expression: expression.into(),
            expected_result: true,
        }
    }

    /// Builder-style setter for [`Policy::expected_result`].
    pub fn expecting(mut self, expected_result: bool) -> Self {
        self.expected_result = expected_result;
        self
    }

    /// Evaluates the expression and compares the result with the expected one.
    pub fn check(&self, context: &Context) -> Result<bool, Error> {
        let result = evaluate(&self.expression, context)?;
        Ok(result == Value::Boolean(self.expected_result))
    }

    /// Like [`Policy::check`], but a failing expression never applies. The
    /// failure is logged with the policy id.
    pub fn applies(&self, context: &Context) -> bool {
        match self.check(context) {
            Ok(matched) => matched,
            Err(err) => {
                log::error!(
                    target: LOG_TARGET,
                    "Expression for policy id {} failed with message {}",
                    self.id,
                    err
                );
                false
            }
        }
    }

    /// Single-line expression, cut at 100 characters for listings.
    pub fn preview(&self) -> String {
        let flat = self.expression.replace('\n', " ");
        if flat.chars().count() > PREVIEW_LENGTH {
            let cut: String = flat.chars().take(PREVIEW_LENGTH).collect();
            format!("{} ...", cut)
        } else {
            flat
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} policy number: {}", self.action, self.id)
    }
}

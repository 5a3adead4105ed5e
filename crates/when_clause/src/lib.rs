//! Boolean "when-clause" expressions gating command enablement.
//!
//! A when-clause is parsed once into an immutable [`WhenClause`] and evaluated against a
//! [`WhenClauseContext`] of named facts. [`WhenClauseCache`] memoizes parses by source text
//! because the same few conditions are checked on every render and search pass.

mod cache;
mod context;
mod error;
mod lexer;
mod parser;

pub use cache::WhenClauseCache;
pub use context::WhenClauseContext;
pub use error::WhenClauseError;

use parser::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    #[default]
    Standard,
    /// Fails on keys that are absent from the context instead of treating them as falsy.
    Developer,
}

impl EvaluationMode {
    pub fn from_dev_mode(dev_mode: bool) -> Self {
        if dev_mode {
            Self::Developer
        } else {
            Self::Standard
        }
    }
}

#[derive(Debug, Clone)]
pub struct WhenClause {
    source: String,
    expr: Expr,
    keys: Vec<String>,
}

impl WhenClause {
    pub fn parse(source: &str) -> Result<Self, WhenClauseError> {
        let expr = parser::parse(source)?;
        let mut keys = Vec::new();
        expr.collect_keys(&mut keys);
        Ok(Self {
            source: source.to_string(),
            expr,
            keys,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Context keys referenced by the expression, in order of first appearance.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn evaluate(&self, context: &WhenClauseContext) -> bool {
        self.expr.evaluate(context)
    }

    pub fn evaluate_with(
        &self,
        context: &WhenClauseContext,
        mode: EvaluationMode,
    ) -> Result<bool, WhenClauseError> {
        if mode == EvaluationMode::Developer {
            if let Some(key) = self.keys.iter().find(|key| !context.contains_key(key)) {
                return Err(WhenClauseError::UnknownContextKey {
                    key: key.clone(),
                    source_text: self.source.clone(),
                });
            }
        }
        Ok(self.evaluate(context))
    }
}

#[cfg(test)]
#[path = "tests/evaluate_tests.rs"]
mod tests;

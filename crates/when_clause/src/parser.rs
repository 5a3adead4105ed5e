use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::{
    context::WhenClauseContext,
    error::WhenClauseError,
    lexer::{Lexer, Spanned, Token},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn apply(self, left: f64, right: f64) -> bool {
        match self {
            Self::Lt => left < right,
            Self::LtEq => left <= right,
            Self::Gt => left > right,
            Self::GtEq => left >= right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    Bool(bool),
    Number { value: f64, raw: String },
    Text(String),
}

impl Literal {
    fn from_word(word: String) -> Self {
        match word.as_str() {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => match word.parse::<f64>() {
                Ok(value) if value.is_finite() => Self::Number { value, raw: word },
                _ => Self::Text(word),
            },
        }
    }

    fn text(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Number { raw, .. } => raw.clone(),
            Self::Text(text) => text.clone(),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool(expected), Value::Bool(actual)) => expected == actual,
            (Self::Number { value: expected, .. }, Value::Number(actual)) => {
                actual.as_f64() == Some(*expected)
            }
            _ => string_form(value).is_some_and(|actual| actual == self.text()),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Constant(bool),
    Has(String),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Equals {
        key: String,
        value: Literal,
        negated: bool,
    },
    Matches {
        key: String,
        regex: Regex,
    },
    Compare {
        key: String,
        op: CompareOp,
        value: f64,
    },
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(value) => *value,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn string_form(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn numeric_form(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

impl Expr {
    pub(crate) fn evaluate(&self, context: &WhenClauseContext) -> bool {
        match self {
            Self::Constant(value) => *value,
            Self::Has(key) => context.get(key).is_some_and(is_truthy),
            Self::Not(inner) => !inner.evaluate(context),
            Self::And(terms) => terms.iter().all(|term| term.evaluate(context)),
            Self::Or(terms) => terms.iter().any(|term| term.evaluate(context)),
            Self::Equals {
                key,
                value,
                negated,
            } => context.get(key).is_some_and(|actual| value.matches(actual)) != *negated,
            Self::Matches { key, regex } => context
                .get(key)
                .and_then(string_form)
                .is_some_and(|actual| regex.is_match(&actual)),
            Self::Compare { key, op, value } => context
                .get(key)
                .and_then(numeric_form)
                .is_some_and(|actual| op.apply(actual, *value)),
        }
    }

    pub(crate) fn collect_keys(&self, out: &mut Vec<String>) {
        let key = match self {
            Self::Constant(_) => return,
            Self::Not(inner) => return inner.collect_keys(out),
            Self::And(terms) | Self::Or(terms) => {
                for term in terms {
                    term.collect_keys(out);
                }
                return;
            }
            Self::Has(key)
            | Self::Equals { key, .. }
            | Self::Matches { key, .. }
            | Self::Compare { key, .. } => key,
        };
        if !out.iter().any(|existing| existing == key) {
            out.push(key.clone());
        }
    }
}

/// Deepest run of nested `!` and parentheses accepted by [`parse`].
const MAX_NESTING: usize = 256;

pub(crate) fn parse(source: &str) -> Result<Expr, WhenClauseError> {
    let mut parser = Parser {
        source,
        lexer: Lexer::new(source),
        peeked: None,
        depth: 0,
    };

    if parser.peek()?.token == Token::End {
        return Err(WhenClauseError::malformed(source, 0, "empty expression"));
    }

    let expr = parser.or()?;
    let trailing = parser.advance()?;
    if trailing.token != Token::End {
        return Err(parser.unexpected(&trailing, "end of input"));
    }
    Ok(expr)
}

struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    peeked: Option<Spanned>,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&mut self) -> Result<&Spanned, WhenClauseError> {
        let spanned = match self.peeked.take() {
            Some(spanned) => spanned,
            None => self.lexer.next_token()?,
        };
        Ok(self.peeked.insert(spanned))
    }

    fn advance(&mut self) -> Result<Spanned, WhenClauseError> {
        match self.peeked.take() {
            Some(spanned) => Ok(spanned),
            None => self.lexer.next_token(),
        }
    }

    fn descend(&mut self, offset: usize) -> Result<(), WhenClauseError> {
        if self.depth >= MAX_NESTING {
            return Err(WhenClauseError::malformed(
                self.source,
                offset,
                "expression nested too deeply",
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn unexpected(&self, found: &Spanned, expected: &str) -> WhenClauseError {
        WhenClauseError::malformed(
            self.source,
            found.offset,
            format!("expected {expected} but found {}", found.token.describe()),
        )
    }

    fn or(&mut self) -> Result<Expr, WhenClauseError> {
        let mut terms = vec![self.and()?];
        while self.peek()?.token == Token::Or {
            self.advance()?;
            terms.push(self.and()?);
        }
        Ok(if terms.len() == 1 {
            terms.swap_remove(0)
        } else {
            Expr::Or(terms)
        })
    }

    fn and(&mut self) -> Result<Expr, WhenClauseError> {
        let mut terms = vec![self.unary()?];
        while self.peek()?.token == Token::And {
            self.advance()?;
            terms.push(self.unary()?);
        }
        Ok(if terms.len() == 1 {
            terms.swap_remove(0)
        } else {
            Expr::And(terms)
        })
    }

    fn unary(&mut self) -> Result<Expr, WhenClauseError> {
        if self.peek()?.token == Token::Not {
            let offset = self.advance()?.offset;
            self.descend(offset)?;
            let inner = self.unary();
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, WhenClauseError> {
        let spanned = self.advance()?;
        match spanned.token {
            Token::LParen => {
                self.descend(spanned.offset)?;
                let inner = self.or();
                self.depth -= 1;
                let inner = inner?;
                let close = self.advance()?;
                if close.token != Token::RParen {
                    return Err(self.unexpected(&close, "')'"));
                }
                Ok(inner)
            }
            Token::Word(word) if word == "true" => Ok(Expr::Constant(true)),
            Token::Word(word) if word == "false" => Ok(Expr::Constant(false)),
            Token::Word(key) => self.key_expr(key),
            _ => Err(self.unexpected(&spanned, "a context key")),
        }
    }

    fn key_expr(&mut self, key: String) -> Result<Expr, WhenClauseError> {
        let next = self.peek()?.token.clone();
        let op = match next {
            Token::Eq | Token::NotEq => {
                let negated = self.advance()?.token == Token::NotEq;
                let value = self.value()?;
                return Ok(Expr::Equals {
                    key,
                    value,
                    negated,
                });
            }
            Token::Match => {
                self.advance()?;
                let regex = self.regex()?;
                return Ok(Expr::Matches { key, regex });
            }
            Token::Lt => CompareOp::Lt,
            Token::LtEq => CompareOp::LtEq,
            Token::Gt => CompareOp::Gt,
            Token::GtEq => CompareOp::GtEq,
            _ => return Ok(Expr::Has(key)),
        };

        self.advance()?;
        let operand = self.advance()?;
        match &operand.token {
            Token::Word(word) => match word.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Expr::Compare { key, op, value }),
                _ => Err(self.unexpected(&operand, "a number")),
            },
            _ => Err(self.unexpected(&operand, "a number")),
        }
    }

    fn value(&mut self) -> Result<Literal, WhenClauseError> {
        let spanned = self.advance()?;
        match spanned.token {
            Token::Word(word) => Ok(Literal::from_word(word)),
            Token::Quoted(text) => Ok(Literal::Text(text)),
            _ => Err(self.unexpected(&spanned, "a value")),
        }
    }

    fn regex(&mut self) -> Result<Regex, WhenClauseError> {
        let (pattern, flags, offset) = self.lexer.regex_literal()?;
        let mut builder = RegexBuilder::new(&pattern);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                other => {
                    return Err(WhenClauseError::malformed(
                        self.source,
                        offset,
                        format!("unsupported regex flag {other:?}"),
                    ));
                }
            };
        }
        builder.build().map_err(|err| {
            WhenClauseError::malformed(self.source, offset, format!("invalid regex: {err}"))
        })
    }
}

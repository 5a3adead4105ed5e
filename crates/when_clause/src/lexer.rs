//! Tokenizer for when-clause sources.
//!
//! Regex literals are context dependent (`/` is an ordinary word character elsewhere), so the
//! parser asks for them explicitly with [`Lexer::regex_literal`] right after an `=~` operator.

use crate::error::WhenClauseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LParen,
    RParen,
    Not,
    And,
    Or,
    Eq,
    NotEq,
    Match,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Word(String),
    Quoted(String),
    End,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
            Self::Not => "'!'".into(),
            Self::And => "'&&'".into(),
            Self::Or => "'||'".into(),
            Self::Eq => "'=='".into(),
            Self::NotEq => "'!='".into(),
            Self::Match => "'=~'".into(),
            Self::Lt => "'<'".into(),
            Self::LtEq => "'<='".into(),
            Self::Gt => "'>'".into(),
            Self::GtEq => "'>='".into(),
            Self::Word(word) => format!("word {word:?}"),
            Self::Quoted(text) => format!("string {text:?}"),
            Self::End => "end of input".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) struct Lexer<'a> {
    source: &'a str,
    offset: usize,
}

pub(crate) fn is_word_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '(' | ')' | '!' | '&' | '|' | '=' | '<' | '>' | '\'' | '"')
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self { source, offset: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.offset += ch.len_utf8();
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> WhenClauseError {
        WhenClauseError::malformed(self.source, offset, message)
    }

    pub(crate) fn next_token(&mut self) -> Result<Spanned, WhenClauseError> {
        self.skip_whitespace();
        let start = self.offset;
        let Some(ch) = self.peek_char() else {
            return Ok(Spanned {
                token: Token::End,
                offset: start,
            });
        };

        let rest = self.rest();
        let (token, len) = match ch {
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '!' if rest.starts_with("!=") => (Token::NotEq, 2),
            '!' => (Token::Not, 1),
            '&' if rest.starts_with("&&") => (Token::And, 2),
            '|' if rest.starts_with("||") => (Token::Or, 2),
            '=' if rest.starts_with("==") => (Token::Eq, 2),
            '=' if rest.starts_with("=~") => (Token::Match, 2),
            '<' if rest.starts_with("<=") => (Token::LtEq, 2),
            '<' => (Token::Lt, 1),
            '>' if rest.starts_with(">=") => (Token::GtEq, 2),
            '>' => (Token::Gt, 1),
            '\'' | '"' => return self.quoted(ch),
            '&' | '|' | '=' => {
                return Err(self.error(start, format!("unexpected character {ch:?}")));
            }
            _ => {
                let len = rest
                    .char_indices()
                    .find(|(_, c)| !is_word_char(*c))
                    .map(|(idx, _)| idx)
                    .unwrap_or(rest.len());
                (Token::Word(rest[..len].to_string()), len)
            }
        };

        self.offset += len;
        Ok(Spanned {
            token,
            offset: start,
        })
    }

    fn quoted(&mut self, quote: char) -> Result<Spanned, WhenClauseError> {
        let start = self.offset;
        self.offset += quote.len_utf8();
        let mut text = String::new();
        let mut escaped = false;
        while let Some(ch) = self.peek_char() {
            self.offset += ch.len_utf8();
            if escaped {
                text.push(ch);
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                return Ok(Spanned {
                    token: Token::Quoted(text),
                    offset: start,
                });
            } else {
                text.push(ch);
            }
        }
        Err(self.error(start, "unterminated string literal"))
    }

    /// Reads `/pattern/flags` starting at the next non-blank character.
    pub(crate) fn regex_literal(&mut self) -> Result<(String, String, usize), WhenClauseError> {
        self.skip_whitespace();
        let start = self.offset;
        if self.peek_char() != Some('/') {
            return Err(self.error(start, "expected a /regex/ after '=~'"));
        }
        self.offset += 1;

        let mut pattern = String::new();
        let mut escaped = false;
        loop {
            let Some(ch) = self.peek_char() else {
                return Err(self.error(start, "unterminated regex literal"));
            };
            self.offset += ch.len_utf8();
            if escaped {
                if ch != '/' {
                    pattern.push('\\');
                }
                pattern.push(ch);
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '/' {
                break;
            } else {
                pattern.push(ch);
            }
        }

        let flags_len = self
            .rest()
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphabetic())
            .map(|(idx, _)| idx)
            .unwrap_or(self.rest().len());
        let flags = self.rest()[..flags_len].to_string();
        self.offset += flags_len;
        Ok((pattern, flags, start))
    }
}

// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::expression::ast::{Argument, Ast, FunctionCall, POSITIONAL_ARGUMENT};
use thiserror::Error;

/// Deepest `{...}` nesting accepted before parsing gives up.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expression is empty")]
    Empty,
    #[error("Expected a function name at offset {offset}")]
    ExpectedFunction { offset: usize },
    #[error("Unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter { found: char, offset: usize },
    #[error("Unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("Unterminated subexpression starting at offset {offset}")]
    UnterminatedSubexpression { offset: usize },
    #[error("Missing value for argument '{name}' at offset {offset}")]
    MissingArgumentValue { name: String, offset: usize },
    #[error("Subexpressions nested deeper than {MAX_NESTING_DEPTH} levels at offset {offset}")]
    NestingTooDeep { offset: usize },
}

impl ParseError {
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::Empty => None,
            ParseError::ExpectedFunction { offset }
            | ParseError::UnexpectedCharacter { offset, .. }
            | ParseError::UnterminatedString { offset }
            | ParseError::UnterminatedSubexpression { offset }
            | ParseError::MissingArgumentValue { offset, .. }
            | ParseError::NestingTooDeep { offset } => Some(*offset),
        }
    }
}

/// Parses `fn arg=value | fn2 {sub | expr}` pipeline text into an [`Ast`].
pub fn parse_expression(input: &str) -> Result<Ast, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = ExpressionParser::new(input);
    parser.parse_chain(None)
}

pub(crate) fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '|' | '{' | '}' | '=' | '"' | '\'')
}

/// Interprets an unquoted word the way the interpreter grammar does.
pub(crate) fn literal_from_word(word: &str) -> Argument {
    match word {
        "true" => return Argument::Bool(true),
        "false" => return Argument::Bool(false),
        "null" => return Argument::Null,
        _ => {}
    }
    let numeric_start = word
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if numeric_start {
        if let Ok(n) = word.parse::<f64>() {
            if n.is_finite() {
                return Argument::Number(n);
            }
        }
    }
    Argument::String(word.to_string())
}

struct ExpressionParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> ExpressionParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn read_word(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_word_char) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// `opened_at` is the offset of the `{` when parsing a subexpression.
    fn parse_chain(&mut self, opened_at: Option<usize>) -> Result<Ast, ParseError> {
        let mut chain = Vec::new();
        loop {
            self.skip_whitespace();
            chain.push(self.parse_function()?);
            self.skip_whitespace();
            match self.peek() {
                Some('|') => {
                    self.bump();
                }
                Some('}') if opened_at.is_some() => {
                    self.bump();
                    return Ok(Ast::new(chain));
                }
                None => {
                    return match opened_at {
                        Some(offset) => Err(ParseError::UnterminatedSubexpression { offset }),
                        None => Ok(Ast::new(chain)),
                    };
                }
                Some(found) => {
                    return Err(ParseError::UnexpectedCharacter {
                        found,
                        offset: self.pos,
                    })
                }
            }
        }
    }

    fn parse_function(&mut self) -> Result<FunctionCall, ParseError> {
        let offset = self.pos;
        let name = self.read_word();
        if name.is_empty() {
            return Err(ParseError::ExpectedFunction { offset });
        }
        let mut call = FunctionCall::new(name);
        loop {
            self.skip_whitespace();
            match self.peek() {
                None | Some('|') | Some('}') => return Ok(call),
                Some('"') | Some('\'') | Some('{') => {
                    let value = self.parse_value(POSITIONAL_ARGUMENT)?;
                    call.push_arg(POSITIONAL_ARGUMENT, value);
                }
                Some('=') => {
                    return Err(ParseError::UnexpectedCharacter {
                        found: '=',
                        offset: self.pos,
                    })
                }
                Some(_) => {
                    let word = self.read_word();
                    if self.peek() == Some('=') {
                        self.bump();
                        self.skip_whitespace();
                        let value = self.parse_value(word)?;
                        call.push_arg(word, value);
                    } else {
                        call.push_arg(POSITIONAL_ARGUMENT, literal_from_word(word));
                    }
                }
            }
        }
    }

    fn parse_value(&mut self, name: &str) -> Result<Argument, ParseError> {
        let offset = self.pos;
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                self.parse_quoted(quote, offset).map(Argument::String)
            }
            Some('{') => {
                if self.depth >= MAX_NESTING_DEPTH {
                    return Err(ParseError::NestingTooDeep { offset });
                }
                self.bump();
                self.depth += 1;
                let chain = self.parse_chain(Some(offset));
                self.depth -= 1;
                chain.map(Argument::Expression)
            }
            Some(c) if is_word_char(c) => Ok(literal_from_word(self.read_word())),
            _ => Err(ParseError::MissingArgumentValue {
                name: name.to_string(),
                offset,
            }),
        }
    }

    fn parse_quoted(&mut self, quote: char, offset: usize) -> Result<String, ParseError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString { offset }),
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    None => return Err(ParseError::UnterminatedString { offset }),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(escaped) => value.push(escaped),
                },
                Some(c) => value.push(c),
            }
        }
    }
}

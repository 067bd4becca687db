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

pub mod ast;
pub mod parser;

pub use ast::{Argument, Ast, ExpressionFingerprint, FunctionCall, POSITIONAL_ARGUMENT};
pub use parser::{parse_expression, ParseError};

/// Expression output of a plugin, either already structured or as text still to be parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionSource {
    Text(String),
    Ast(Ast),
}

impl ExpressionSource {
    pub fn into_ast(self) -> Result<Ast, ParseError> {
        match self {
            ExpressionSource::Text(text) => parse_expression(&text),
            ExpressionSource::Ast(ast) => Ok(ast),
        }
    }
}

impl From<Ast> for ExpressionSource {
    fn from(ast: Ast) -> Self {
        ExpressionSource::Ast(ast)
    }
}

impl From<String> for ExpressionSource {
    fn from(text: String) -> Self {
        ExpressionSource::Text(text)
    }
}

impl From<&str> for ExpressionSource {
    fn from(text: &str) -> Self {
        ExpressionSource::Text(text.to_string())
    }
}

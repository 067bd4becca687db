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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Argument name used for values given without a `name=` prefix.
pub const POSITIONAL_ARGUMENT: &str = "_";

/// A pipeline of function calls. Serialises as `{"type": "expression", "chain": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "expression")]
pub struct Ast {
    pub chain: Vec<FunctionCall>,
}

/// One step of a chain. Serialises as `{"type": "function", "function": ..., "arguments": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "function")]
pub struct FunctionCall {
    pub function: String,
    pub arguments: BTreeMap<String, Vec<Argument>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Expression(Ast),
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Ast {
    pub fn new(chain: Vec<FunctionCall>) -> Self {
        Self { chain }
    }

    /// A chain holding a single call without arguments.
    pub fn function(name: impl Into<String>) -> Self {
        Self::new(vec![FunctionCall::new(name)])
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn fingerprint(&self) -> ExpressionFingerprint {
        ExpressionFingerprint::of(self)
    }
}

impl FunctionCall {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Argument>) -> Self {
        self.push_arg(name, value);
        self
    }

    pub fn with_args<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Argument>,
    {
        let entry = self.arguments.entry(name.into()).or_default();
        entry.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn push_arg(&mut self, name: impl Into<String>, value: impl Into<Argument>) {
        self.arguments
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    pub fn arg(&self, name: &str) -> &[Argument] {
        self.arguments.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn first_str(&self, name: &str) -> Option<&str> {
        self.arg(name).iter().find_map(Argument::as_str)
    }
}

impl Argument {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Ast> {
        match self {
            Argument::Expression(ast) => Some(ast),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Argument::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<Ast> for Argument {
    fn from(ast: Ast) -> Self {
        Argument::Expression(ast)
    }
}

impl From<String> for Argument {
    fn from(s: String) -> Self {
        Argument::String(s)
    }
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Argument::String(s.to_string())
    }
}

impl From<&String> for Argument {
    fn from(s: &String) -> Self {
        Argument::String(s.clone())
    }
}

impl From<f64> for Argument {
    fn from(n: f64) -> Self {
        Argument::Number(n)
    }
}

impl From<bool> for Argument {
    fn from(b: bool) -> Self {
        Argument::Bool(b)
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, call) in self.chain.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{call}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function)?;
        for value in self.arg(POSITIONAL_ARGUMENT) {
            write!(f, " {value}")?;
        }
        for (name, values) in &self.arguments {
            if name == POSITIONAL_ARGUMENT {
                continue;
            }
            for value in values {
                write!(f, " {name}={value}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Expression(ast) => write!(f, "{{{ast}}}"),
            Argument::String(s) => write_string(f, s),
            Argument::Number(n) => write!(f, "{n}"),
            Argument::Bool(b) => write!(f, "{b}"),
            Argument::Null => write!(f, "null"),
        }
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if is_bare_word(s) {
        return write!(f, "{s}");
    }
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            _ => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

/// True when `s` reads back as the same string without quoting.
fn is_bare_word(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(super::parser::is_word_char)
        && matches!(super::parser::literal_from_word(s), Argument::String(_))
}

/// Stable digest of an expression tree.
///
/// Hashes the JSON form rather than the display text: distinct trees such as
/// `vis x` (one word) and `vis` with a positional `x` print identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpressionFingerprint([u8; 32]);

impl ExpressionFingerprint {
    pub fn of(ast: &Ast) -> Self {
        let encoded = serde_json::to_vec(ast).unwrap_or_else(|_| ast.to_string().into_bytes());
        Self(*blake3::hash(&encoded).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First eight hex digits, enough to correlate log lines.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ExpressionFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

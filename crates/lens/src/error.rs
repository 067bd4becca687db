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

use crate::expression::ParseError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("Expression parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Expression assembly error: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Plugin registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Editor state error: {0}")]
    State(#[from] StateError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] SerialisationError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which participant produced an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionOrigin {
    Datasource { datasource_id: String, layer_id: String },
    Visualization { visualization_id: String },
}

impl fmt::Display for ExpressionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionOrigin::Datasource {
                datasource_id,
                layer_id,
            } => write!(f, "datasource '{datasource_id}' layer '{layer_id}'"),
            ExpressionOrigin::Visualization { visualization_id } => {
                write!(f, "visualization '{visualization_id}'")
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("Malformed expression from {origin}: {source}")]
    MalformedExpression {
        origin: ExpressionOrigin,
        #[source]
        source: ParseError,
    },
}

/// Failure reported by the external expression renderer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct RenderError {
    pub kind: String,
    pub message: String,
}

impl RenderError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Datasource '{id}' is already registered")]
    DuplicateDatasource { id: String },
    #[error("Visualization '{id}' is already registered")]
    DuplicateVisualization { id: String },
    #[error("Datasource '{id}' is not registered")]
    UnknownDatasource { id: String },
    #[error("Visualization '{id}' is not registered")]
    UnknownVisualization { id: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Visualization state updated without an active visualization")]
    NoActiveVisualization,
    #[error("No active datasource to receive the update")]
    NoActiveDatasource,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SerialisationError {
    #[error("JSON serialisation failed: {source}")]
    JsonSerialisationError {
        #[from]
        source: serde_json::Error,
    },
    #[error("Plugin state for '{plugin}' has an unexpected shape: {reason}")]
    InvalidPluginState { plugin: String, reason: String },
}

pub type Result<T> = std::result::Result<T, LensError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl From<serde_json::Error> for LensError {
    fn from(err: serde_json::Error) -> Self {
        LensError::Serialisation(SerialisationError::JsonSerialisationError { source: err })
    }
}

impl LensError {
    /// Errors the user can get past by changing the editor configuration.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LensError::Parse(_)
                | LensError::Assembly(_)
                | LensError::Render(_)
                | LensError::State(_)
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            LensError::Parse(_) => "Parse",
            LensError::Assembly(_) => "Assembly",
            LensError::Render(_) => "Render",
            LensError::Registry(_) => "Registry",
            LensError::State(_) => "State",
            LensError::Config(_) => "Configuration",
            LensError::Serialisation(_) => "Serialisation",
            LensError::Io(_) => "I/O",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LensError::Parse(_) | LensError::Assembly(_) | LensError::Render(_) => {
                ErrorSeverity::Warning
            }
            LensError::Registry(_) | LensError::Config(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            LensError::Parse(_) | LensError::Assembly(_) => {
                "The visualization could not be built from the current configuration.".to_string()
            }
            LensError::Render(_) => {
                "The visualization failed to render. Change the configuration to try again."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
    pub fn color_code(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "\x1b[36m",
            ErrorSeverity::Warning => "\x1b[33m",
            ErrorSeverity::Error => "\x1b[31m",
            ErrorSeverity::Critical => "\x1b[35m",
        }
    }
}

pub struct ErrorReporter {
    pub colored_output: bool,
    pub show_category: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            colored_output: true,
            show_category: true,
        }
    }

    pub fn plain() -> Self {
        Self {
            colored_output: false,
            show_category: true,
        }
    }

    pub fn report(&self, error: &LensError) -> String {
        let severity = error.severity();
        let mut output = String::new();
        if self.colored_output {
            output.push_str(severity.color_code());
        }
        output.push_str(&format!("[{}] ", severity.as_str()));
        if self.show_category {
            output.push_str(&format!("{}: ", error.category()));
        }
        output.push_str(&error.to_string());
        if self.colored_output {
            output.push_str("\x1b[0m");
        }
        output.push('\n');
        if error.is_recoverable() {
            output.push_str(&format!("  • {}\n", error.user_message()));
        }
        output
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

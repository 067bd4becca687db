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

use crate::error::{ConfigError, ConfigResult};
use crate::expression::parser::is_word_char;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MERGE_FUNCTION: &str = "lens_merge_tables";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Function that joins the per-layer tables ahead of the visualization chain.
    pub merge_function: String,
    pub suggestions: SuggestionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Suggestions scoring below this are never applied. Unset keeps every score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    /// Apply the best suggestion of a drop immediately.
    pub auto_apply: bool,
    pub max_suggestions: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            merge_function: DEFAULT_MERGE_FUNCTION.to_string(),
            suggestions: SuggestionConfig::default(),
        }
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            min_score: None,
            auto_apply: true,
            max_suggestions: 10,
        }
    }
}

impl FrameConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: FrameConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.merge_function.is_empty() || !self.merge_function.chars().all(is_word_char) {
            return Err(ConfigError::InvalidValue {
                field: "merge_function".to_string(),
                reason: format!("'{}' is not a valid function name", self.merge_function),
            });
        }
        self.suggestions.validate()
    }

    /// Collects suggestions without switching the chart on drop.
    pub fn for_review() -> Self {
        Self {
            suggestions: SuggestionConfig {
                auto_apply: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl SuggestionConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_score.is_some_and(|min| !min.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "suggestions.min_score".to_string(),
                reason: "must be a finite number".to_string(),
            });
        }
        if self.max_suggestions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "suggestions.max_suggestions".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
